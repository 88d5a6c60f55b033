use chrono::NaiveDate;
use roxmltree::{Document, Node};

use crate::api::error::Error;
use crate::api::response;
use crate::model::{Battery, Consumption, EnergyBalance, EnergyBalanceSeries, Generation};

/// The energybalance tag declares its own unit; kWh values are scaled and
/// truncated, Wh values are truncated as-is.
#[derive(Clone, Copy)]
enum Unit {
    KiloWattHours,
    WattHours,
}

impl Unit {
    fn convert(self, value: Option<&str>) -> Result<Option<i64>, Error> {
        match self {
            Unit::KiloWattHours => response::kwh_to_wh(value),
            Unit::WattHours => match value {
                None => Ok(None),
                Some(text) => {
                    let wh: f64 = text.parse().map_err(|_| {
                        Error::MalformedResponse(format!("invalid energy value {:?}", text))
                    })?;
                    Ok(Some(wh as i64))
                }
            },
        }
    }
}

/// One period entry. All six consumption/generation values must be present
/// for the record to exist at all; battery is independently optional.
fn entry(
    node: Node,
    unit: Unit,
    parse_timestamp: fn(&str) -> Result<NaiveDate, Error>,
) -> Result<Option<EnergyBalance>, Error> {
    let external = unit.convert(node.attribute("external-supply"))?;
    let internal = unit.convert(node.attribute("self-supply"))?;
    let direct = unit.convert(node.attribute("direct-consumption"))?;
    let total = unit.convert(node.attribute("pv-generation"))?;
    let self_consumption = unit.convert(node.attribute("self-consumption"))?;
    let feed_in = unit.convert(node.attribute("feed-in"))?;
    let charge = unit.convert(node.attribute("battery-charging"))?;
    let discharge = unit.convert(node.attribute("battery-discharging"))?;

    match (external, internal, direct, total, self_consumption, feed_in) {
        (
            Some(external),
            Some(internal),
            Some(direct),
            Some(total),
            Some(self_consumption),
            Some(feed_in),
        ) => {
            let battery = if charge.is_none() && discharge.is_none() {
                None
            } else {
                Some(Battery { charge, discharge })
            };
            let date = parse_timestamp(response::attr(node, "timestamp")?)?;
            Ok(Some(EnergyBalance {
                timestamp: response::midnight(date),
                consumption: Consumption {
                    external,
                    internal,
                    direct,
                },
                generation: Generation {
                    total,
                    self_consumption,
                    feed_in,
                },
                battery,
            }))
        }
        _ => Ok(None),
    }
}

fn entries(
    nodes: &[Node],
    unit: Unit,
    parse_timestamp: fn(&str) -> Result<NaiveDate, Error>,
) -> Result<Vec<EnergyBalance>, Error> {
    let mut result = Vec::new();
    for node in nodes {
        if let Some(balance) = entry(*node, unit, parse_timestamp)? {
            result.push(balance);
        }
    }
    Ok(result)
}

pub fn parse(data: &str) -> Result<EnergyBalanceSeries, Error> {
    let document = Document::parse(data)?;
    let envelope = response::envelope(&document, None)?;
    let tag = response::find(envelope.payload, "energybalance")?;

    let unit = match response::attr(tag, "unit")? {
        "kWh" => Unit::KiloWattHours,
        "Wh" => Unit::WattHours,
        other => {
            return Err(Error::MalformedResponse(format!(
                "unknown energybalance unit {:?}",
                other
            )))
        }
    };

    // The document shape depends on the requested period/interval; probe
    // for monthly buckets, then daily buckets, then a single day.
    let months = response::iter_path(tag, &["*", "month"]);
    if !months.is_empty() {
        return Ok(EnergyBalanceSeries::Months(entries(
            &months,
            unit,
            response::parse_month,
        )?));
    }

    let days = response::iter_path(tag, &["*", "day"]);
    if !days.is_empty() {
        return Ok(EnergyBalanceSeries::Days(entries(
            &days,
            unit,
            response::parse_date,
        )?));
    }

    let day = response::find(tag, "day")?;
    Ok(EnergyBalanceSeries::Day(entry(
        day,
        unit,
        response::parse_date,
    )?))
}
