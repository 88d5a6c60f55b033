use chrono::NaiveDate;
use roxmltree::{Document, Node};

use crate::api::error::Error;
use crate::api::response;
use crate::model::{DayOverview, MonthOverview, Power, YearOverview, Yield};

/// The summary value for an overview period: a `[@absolute]`-qualified
/// channel element when present (carrying absolute/difference), otherwise
/// the plain element, which then only contributes the date.
fn summary<'a, 'input>(
    tag: Node<'a, 'input>,
    period: &str,
) -> Result<(Option<i64>, Option<i64>, Node<'a, 'input>), Error> {
    let candidates = response::iter_path(tag, &["channel", period]);
    if let Some(node) = candidates.iter().find(|node| node.has_attribute("absolute")) {
        let (absolute, difference) = response::abs_diff(*node)?;
        Ok((absolute, difference, *node))
    } else {
        let node = candidates.first().copied().ok_or_else(|| {
            Error::MalformedResponse(format!("missing channel/{} tag", period))
        })?;
        Ok((None, None, node))
    }
}

pub fn parse_day(data: &str, quarter: bool, include_all: bool) -> Result<DayOverview, Error> {
    let root_tag = if quarter {
        "overview-day-fifteen-total"
    } else {
        "overview-day-total"
    };
    let entry_tag = if quarter { "fiveteen" } else { "hour" };

    let document = Document::parse(data)?;
    let envelope = response::envelope(&document, None)?;
    let tag = response::find(envelope.payload, root_tag)?;

    let (absolute, difference, summary) = summary(tag, "day")?;
    let date = response::parse_date(response::attr(summary, "timestamp")?)?;

    let mut power_measurements = Vec::new();
    for entry in response::iter_path(tag, &["channel", "day", entry_tag]) {
        let mean = response::kw_to_w(entry.attribute("mean"))?;
        if include_all || mean.is_some() {
            let time = response::parse_time(response::attr(entry, "timestamp")?)?;
            power_measurements.push(Power {
                timestamp: date.and_time(time),
                power: mean,
                min: response::kw_to_w(entry.attribute("min"))?,
                max: response::kw_to_w(entry.attribute("max"))?,
            });
        }
    }

    Ok(DayOverview {
        date,
        absolute,
        difference,
        power_measurements,
    })
}

fn yields(
    tag: Node,
    path: &[&str],
    parse_timestamp: fn(&str) -> Result<NaiveDate, Error>,
) -> Result<Vec<Yield>, Error> {
    let mut entries = Vec::new();
    for entry in response::iter_path(tag, path) {
        if let (Some(absolute), Some(difference)) = response::abs_diff(entry)? {
            let date = parse_timestamp(response::attr(entry, "timestamp")?)?;
            entries.push(Yield {
                timestamp: response::midnight(date),
                absolute,
                difference,
            });
        }
    }
    Ok(entries)
}

pub fn parse_month(data: &str) -> Result<MonthOverview, Error> {
    let document = Document::parse(data)?;
    let envelope = response::envelope(&document, None)?;
    let tag = response::find(envelope.payload, "overview-month-total")?;

    let (absolute, difference, summary) = summary(tag, "month")?;
    let date = response::parse_month(response::attr(summary, "timestamp")?)?;

    Ok(MonthOverview {
        date,
        absolute,
        difference,
        days: yields(tag, &["channel", "month", "day"], response::parse_date)?,
    })
}

pub fn parse_year(data: &str) -> Result<YearOverview, Error> {
    let document = Document::parse(data)?;
    let envelope = response::envelope(&document, None)?;
    let tag = response::find(envelope.payload, "overview-year-total")?;

    let (absolute, difference, summary) = summary(tag, "year")?;
    let date = response::parse_year(response::attr(summary, "timestamp")?)?;

    Ok(YearOverview {
        date,
        absolute,
        difference,
        months: yields(tag, &["channel", "year", "month"], response::parse_month)?,
    })
}
