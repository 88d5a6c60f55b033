use roxmltree::Document;

use crate::api::error::Error;
use crate::api::response;
use crate::model::{AllData, AllDataSeries, Yield};

pub fn parse(data: &str) -> Result<AllData, Error> {
    let document = Document::parse(data)?;
    let envelope = response::envelope(&document, None)?;
    let infinite = response::find(
        response::find(response::find(envelope.payload, "Energy")?, "channel")?,
        "infinite",
    )?;

    let start_timestamp =
        response::parse_datetime(response::attr(infinite, "timestamp")?, "%d/%m/%Y %H:%M")?;

    // Granularity is detected, not requested: a month child means monthly
    // buckets, otherwise yearly.
    let monthly = response::child(infinite, "month").is_some();
    let entry_tag = if monthly { "month" } else { "year" };

    let mut entries = Vec::new();
    for entry in infinite
        .children()
        .filter(|node| node.is_element() && node.tag_name().name() == entry_tag)
    {
        if let (Some(absolute), Some(difference)) = response::abs_diff(entry)? {
            let timestamp = response::attr(entry, "timestamp")?;
            let date = if monthly {
                response::parse_month(timestamp)?
            } else {
                response::parse_year(timestamp)?
            };
            entries.push(Yield {
                timestamp: response::midnight(date),
                absolute,
                difference,
            });
        }
    }

    let series = if monthly {
        AllDataSeries::Months(entries)
    } else {
        AllDataSeries::Years(entries)
    };

    Ok(AllData {
        start_timestamp,
        series,
    })
}
