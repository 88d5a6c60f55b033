use roxmltree::{Document, Node};

use crate::api::error::Error;
use crate::api::response;
use crate::model::{LastDataExact, Yield};

fn day_yield(node: Node) -> Result<Option<Yield>, Error> {
    match response::abs_diff(node)? {
        (Some(absolute), Some(difference)) => {
            let date = response::parse_date(response::attr(node, "timestamp")?)?;
            Ok(Some(Yield {
                timestamp: response::midnight(date),
                absolute,
                difference,
            }))
        }
        _ => Ok(None),
    }
}

pub fn parse(data: &str) -> Result<LastDataExact, Error> {
    let document = Document::parse(data)?;
    let envelope = response::envelope(&document, None)?;
    let channel = response::find(response::find(envelope.payload, "Energy")?, "channel")?;

    let day = day_yield(response::find(channel, "day")?)?;

    let hour_node = response::find(channel, "hour")?;
    let hour = match response::abs_diff(hour_node)? {
        (Some(absolute), Some(difference)) => {
            // The hour tag carries no date of its own; a populated hour
            // without a day summary cannot be anchored to a date.
            let day = day
                .as_ref()
                .ok_or_else(|| Error::MalformedResponse("hour data without day data".to_string()))?;
            let time = response::parse_time(response::attr(hour_node, "timestamp")?)?;
            Some(Yield {
                timestamp: day.timestamp.date().and_time(time),
                absolute,
                difference,
            })
        }
        _ => None,
    };

    Ok(LastDataExact { day, hour })
}
