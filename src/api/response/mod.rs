pub mod all_data;
pub mod authentication;
pub mod device_list;
pub mod device_parameters;
pub mod energy_balance;
pub mod last_data_exact;
pub mod logbook;
pub mod overview;
pub mod plant_list;
pub mod plant_profile;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use roxmltree::{Document, Node};

use crate::api::error::Error;

const ROOT_TAG: &str = "sma.sunnyportal.services";

pub(crate) const CREATION_DATE_FORMAT: &str = "%m/%d/%Y %I:%M:%S %p";

/// Validated envelope around a per-service payload element.
pub(crate) struct Envelope<'a, 'input> {
    pub payload: Node<'a, 'input>,
    pub creation_date: &'a str,
    pub method: String,
}

/// Validates the fixed response envelope and locates the payload element.
///
/// Order matters: an embedded `<error>` payload is reported before the
/// creation-date/method attributes are required, since error envelopes may
/// omit them.
pub(crate) fn envelope<'a, 'input>(
    document: &'a Document<'input>,
    payload_name: Option<&str>,
) -> Result<Envelope<'a, 'input>, Error> {
    let root = document.root_element();
    if root.tag_name().name() != ROOT_TAG {
        return Err(Error::MalformedResponse("unknown root tag".to_string()));
    }

    let mut services = root
        .children()
        .filter(|node| node.is_element() && node.tag_name().name() == "service");
    let service = services
        .next()
        .ok_or_else(|| Error::MalformedResponse("missing service tag".to_string()))?;
    if services.next().is_some() {
        return Err(Error::MalformedResponse("multiple service tags".to_string()));
    }

    if let Some(error) = child(service, "error") {
        let message = match child(error, "message").and_then(|node| node.text()) {
            Some(text) if !text.is_empty() => text.to_string(),
            _ => "Invalid response error".to_string(),
        };
        let code = child(error, "code")
            .and_then(|node| node.text())
            .unwrap_or("unknown-error")
            .to_string();
        return Err(Error::Response { message, code });
    }

    let creation_date = attr(service, "creation-date")?;
    let method = attr(service, "method")?.to_uppercase();

    let name = match payload_name {
        Some(name) => name.to_string(),
        None => attr(service, "name")?.to_string(),
    };
    let payload = find(service, &name)?;

    Ok(Envelope {
        payload,
        creation_date,
        method,
    })
}

pub(crate) fn child<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|node| node.is_element() && node.tag_name().name() == tag)
}

pub(crate) fn find<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Result<Node<'a, 'input>, Error> {
    child(node, tag).ok_or_else(|| Error::MalformedResponse(format!("missing {} tag", tag)))
}

pub(crate) fn attr<'a>(node: Node<'a, '_>, name: &str) -> Result<&'a str, Error> {
    node.attribute(name).ok_or_else(|| {
        Error::MalformedResponse(format!(
            "missing {} attribute in {} tag",
            name,
            node.tag_name().name()
        ))
    })
}

/// Walks a `channel/day`-style element path, collecting every node matched
/// on the final segment, in document order. A `*` segment matches any
/// element.
pub(crate) fn iter_path<'a, 'input>(node: Node<'a, 'input>, path: &[&str]) -> Vec<Node<'a, 'input>> {
    let mut matches = vec![node];
    for segment in path {
        let mut next = Vec::new();
        for node in matches {
            next.extend(node.children().filter(|child| {
                child.is_element() && (*segment == "*" || child.tag_name().name() == *segment)
            }));
        }
        matches = next;
    }
    matches
}

/// Kilowatt-hours to watt-hours the way the portal rounds: multiply and
/// truncate toward zero. `None` stands for "no data for this period" and is
/// passed through.
pub(crate) fn kwh_to_wh(value: Option<&str>) -> Result<Option<i64>, Error> {
    match value {
        None => Ok(None),
        Some(text) => {
            let kwh: f64 = text
                .parse()
                .map_err(|_| Error::MalformedResponse(format!("invalid energy value {:?}", text)))?;
            Ok(Some((kwh * 1000.0) as i64))
        }
    }
}

/// Same scale factor, for kW readings.
pub(crate) fn kw_to_w(value: Option<&str>) -> Result<Option<i64>, Error> {
    kwh_to_wh(value)
}

/// The optional absolute/difference attribute pair carried by yield tags.
pub(crate) fn abs_diff(node: Node) -> Result<(Option<i64>, Option<i64>), Error> {
    Ok((
        kwh_to_wh(node.attribute("absolute"))?,
        kwh_to_wh(node.attribute("difference"))?,
    ))
}

pub(crate) fn parse_datetime(text: &str, format: &str) -> Result<NaiveDateTime, Error> {
    NaiveDateTime::parse_from_str(text, format)
        .map_err(|_| Error::MalformedResponse(format!("invalid timestamp {:?}", text)))
}

/// `%d/%m/%Y`
pub(crate) fn parse_date(text: &str) -> Result<NaiveDate, Error> {
    NaiveDate::parse_from_str(text, "%d/%m/%Y")
        .map_err(|_| Error::MalformedResponse(format!("invalid date {:?}", text)))
}

/// `%H:%M`
pub(crate) fn parse_time(text: &str) -> Result<NaiveTime, Error> {
    NaiveTime::parse_from_str(text, "%H:%M")
        .map_err(|_| Error::MalformedResponse(format!("invalid time {:?}", text)))
}

/// `%m/%Y`; chrono cannot parse an incomplete date, so the components are
/// taken apart by hand and pinned to the first of the month.
pub(crate) fn parse_month(text: &str) -> Result<NaiveDate, Error> {
    let invalid = || Error::MalformedResponse(format!("invalid month {:?}", text));
    let mut parts = text.splitn(2, '/');
    let month: u32 = parts.next().ok_or_else(invalid)?.parse().map_err(|_| invalid())?;
    let year: i32 = parts.next().ok_or_else(invalid)?.parse().map_err(|_| invalid())?;
    NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)
}

/// `%Y`, pinned to January 1st.
pub(crate) fn parse_year(text: &str) -> Result<NaiveDate, Error> {
    let invalid = || Error::MalformedResponse(format!("invalid year {:?}", text));
    let year: i32 = text.parse().map_err(|_| invalid())?;
    NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(invalid)
}

pub(crate) fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::api::error::Error;
    use crate::model::*;
    use chrono::{Duration, NaiveDate};
    use std::fs;
    use std::path::PathBuf;

    fn read_resource(filename: &str) -> String {
        let mut d = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        d.push(format!("resources/test/{}", filename));
        fs::read_to_string(d.as_path()).unwrap()
    }

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn kwh_to_wh_truncates() {
        assert_eq!(Some(1234), kwh_to_wh(Some("1.2345")).unwrap());
        assert_eq!(Some(2009), kwh_to_wh(Some("2.0095")).unwrap());
        assert_eq!(Some(100), kwh_to_wh(Some("0.1")).unwrap());
        assert_eq!(Some(4590), kwh_to_wh(Some("4.59")).unwrap());
        assert_eq!(None, kwh_to_wh(None).unwrap());
        assert!(matches!(
            kwh_to_wh(Some("n/a")),
            Err(Error::MalformedResponse(_))
        ));
    }

    #[test]
    fn wrong_root_is_malformed() {
        let input = read_resource("wrong_root.xml");
        match plant_list::parse(&input) {
            Err(Error::MalformedResponse(message)) => assert_eq!("unknown root tag", message),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn embedded_error_is_reported_with_code() {
        let input = read_resource("error.xml");
        match plant_list::parse(&input) {
            Err(Error::Response { message, code }) => {
                assert_eq!("Invalid session", message);
                assert_eq!("401", code);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn authentication_token() {
        let input = read_resource("authentication.xml");
        let now = at(2020, 1, 2, 16, 4, 5);
        let auth = authentication::parse(&input, now).unwrap();
        assert_eq!("abc", auth.identifier);
        assert_eq!(Some("secret".to_string()), auth.key);
        /* creation-date is 01/02/2020 03:04:05 PM */
        assert_eq!(Duration::hours(1), auth.server_offset);
    }

    #[test]
    fn logout_response_has_no_key() {
        let input = read_resource("logout.xml");
        let auth = authentication::parse(&input, at(2020, 1, 2, 16, 4, 5)).unwrap();
        assert_eq!("abc", auth.identifier);
        assert_eq!(None, auth.key);
    }

    #[test]
    fn authentication_failure() {
        let input = read_resource("authentication_failed.xml");
        match authentication::parse(&input, at(2020, 1, 2, 16, 4, 5)) {
            Err(Error::Response { message, .. }) => assert_eq!("Authentication failed", message),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn plant_list_in_document_order() {
        let input = read_resource("plantlist.xml");
        let plants = plant_list::parse(&input).unwrap();
        assert_eq!(
            vec![
                Plant {
                    oid: "oid1".to_string(),
                    name: "First Plant".to_string()
                },
                Plant {
                    oid: "oid2".to_string(),
                    name: "Second Plant".to_string()
                },
            ],
            plants
        );
    }

    #[test]
    fn decoding_is_idempotent() {
        let input = read_resource("plantlist.xml");
        assert_eq!(
            plant_list::parse(&input).unwrap(),
            plant_list::parse(&input).unwrap()
        );
    }

    #[test]
    fn plant_profile_fields() {
        let input = read_resource("plantprofile.xml");
        let profile = plant_profile::parse(&input).unwrap();
        assert_eq!("Home", profile.name);
        assert_eq!(4590, profile.peak_power);
        assert_eq!("Smallville, SE", profile.city_country);
        assert_eq!(NaiveDate::from_ymd_opt(2015, 12, 24).unwrap(), profile.start_date);
        assert_eq!(Some("South roof".to_string()), profile.description);

        let image = profile.plant_image.unwrap();
        assert_eq!("aW1hZ2U=", image.image);
        assert_eq!(64, image.width);
        assert_eq!(48, image.height);

        assert_eq!(
            Some(&Some("1234".to_string())),
            profile.production_data.get("co2-reduction")
        );
        assert_eq!(
            vec![DeviceSummary {
                count: 2,
                device_icon: "inverter.png".to_string(),
                name: Some("SB 4000TL-21".to_string()),
            }],
            profile.inverters
        );
        assert_eq!(
            vec![DeviceSummary {
                count: 1,
                device_icon: "webconnect.png".to_string(),
                name: Some("Webconnect".to_string()),
            }],
            profile.communication_products
        );
    }

    #[test]
    fn plant_profile_tolerates_missing_sections() {
        let input = read_resource("plantprofile_minimal.xml");
        let profile = plant_profile::parse(&input).unwrap();
        assert_eq!(None, profile.description);
        assert_eq!(None, profile.plant_image);
        assert!(profile.production_data.is_empty());
        assert!(profile.inverters.is_empty());
        assert!(profile.communication_products.is_empty());
    }

    #[test]
    fn device_list() {
        let input = read_resource("devicelist.xml");
        let devices = device_list::parse(&input).unwrap();
        assert_eq!(2, devices.len());
        assert_eq!("dev1", devices[0].oid);
        assert_eq!("SB 4000TL-21", devices[0].name);
        assert_eq!("Inverter", devices[0].class);
        assert_eq!("21001234", devices[0].serialnumber);
        assert_eq!("9074", devices[0].type_id);
        assert_eq!(at(2015, 12, 24, 13, 15, 0), devices[0].startdate);
    }

    #[test]
    fn device_parameters() {
        let input = read_resource("deviceparameters.xml");
        let parameters = device_parameters::parse(&input).unwrap();
        assert_eq!(2, parameters.len());
        let limit = &parameters["Plimit"];
        assert_eq!("4000", limit.value);
        assert_eq!(at(2020, 1, 2, 15, 4, 5), limit.changed);
    }

    #[test]
    fn last_data_exact_combines_hour_with_day_date() {
        let input = read_resource("lastdataexact.xml");
        let data = last_data_exact::parse(&input).unwrap();

        let day = data.day.unwrap();
        assert_eq!(at(2020, 1, 2, 0, 0, 0), day.timestamp);
        assert_eq!(101500, day.absolute);
        assert_eq!(2500, day.difference);

        let hour = data.hour.unwrap();
        assert_eq!(at(2020, 1, 2, 13, 15, 0), hour.timestamp);
        assert_eq!(101250, hour.absolute);
        assert_eq!(250, hour.difference);
    }

    #[test]
    fn last_data_exact_drops_partial_records() {
        let input = read_resource("lastdataexact_partial.xml");
        let data = last_data_exact::parse(&input).unwrap();
        assert_eq!(None, data.day);
        assert_eq!(None, data.hour);
    }

    #[test]
    fn last_data_exact_hour_without_day_is_malformed() {
        let input = read_resource("lastdataexact_no_day.xml");
        assert!(matches!(
            last_data_exact::parse(&input),
            Err(Error::MalformedResponse(_))
        ));
    }

    #[test]
    fn all_data_monthly() {
        let input = read_resource("alldata_month.xml");
        let data = all_data::parse(&input).unwrap();
        assert_eq!(at(2015, 12, 24, 13, 15, 0), data.start_timestamp);
        match data.series {
            AllDataSeries::Months(months) => {
                /* the incomplete third month is dropped */
                assert_eq!(2, months.len());
                assert_eq!(at(2020, 1, 1, 0, 0, 0), months[0].timestamp);
                assert_eq!(1000100, months[0].absolute);
                assert_eq!(50500, months[0].difference);
                assert_eq!(at(2020, 2, 1, 0, 0, 0), months[1].timestamp);
            }
            other => panic!("unexpected series: {:?}", other),
        }
    }

    #[test]
    fn all_data_yearly() {
        let input = read_resource("alldata_year.xml");
        let data = all_data::parse(&input).unwrap();
        match data.series {
            AllDataSeries::Years(years) => {
                assert_eq!(2, years.len());
                assert_eq!(at(2019, 1, 1, 0, 0, 0), years[0].timestamp);
                assert_eq!(at(2020, 1, 1, 0, 0, 0), years[1].timestamp);
            }
            other => panic!("unexpected series: {:?}", other),
        }
    }

    #[test]
    fn day_overview_quarter_hour() {
        let input = read_resource("dayoverview_quarter.xml");
        let overview = overview::parse_day(&input, true, false).unwrap();
        assert_eq!(NaiveDate::from_ymd_opt(2020, 1, 2).unwrap(), overview.date);
        assert_eq!(Some(100500), overview.absolute);
        assert_eq!(Some(2500), overview.difference);

        /* the entry without a mean is dropped unless include_all is set */
        assert_eq!(2, overview.power_measurements.len());
        let first = overview.power_measurements[0];
        assert_eq!(at(2020, 1, 2, 0, 15, 0), first.timestamp);
        assert_eq!(Some(100), first.power);
        assert_eq!(Some(50), first.min);
        assert_eq!(Some(200), first.max);
        assert_eq!(None, overview.power_measurements[1].min);
    }

    #[test]
    fn day_overview_include_all_keeps_empty_means() {
        let input = read_resource("dayoverview_quarter.xml");
        let overview = overview::parse_day(&input, true, true).unwrap();
        assert_eq!(3, overview.power_measurements.len());
        assert_eq!(None, overview.power_measurements[2].power);
    }

    #[test]
    fn day_overview_hourly_uses_fallback_summary() {
        let input = read_resource("dayoverview_hour.xml");
        let overview = overview::parse_day(&input, false, false).unwrap();
        /* summary tag has no absolute attribute: date only */
        assert_eq!(NaiveDate::from_ymd_opt(2020, 1, 2).unwrap(), overview.date);
        assert_eq!(None, overview.absolute);
        assert_eq!(None, overview.difference);
        assert_eq!(2, overview.power_measurements.len());
        assert_eq!(at(2020, 1, 2, 11, 0, 0), overview.power_measurements[0].timestamp);
    }

    #[test]
    fn month_overview() {
        let input = read_resource("monthoverview.xml");
        let overview = overview::parse_month(&input).unwrap();
        assert_eq!(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(), overview.date);
        assert_eq!(Some(1000500), overview.absolute);
        assert_eq!(Some(100500), overview.difference);
        assert_eq!(2, overview.days.len());
        assert_eq!(at(2020, 1, 1, 0, 0, 0), overview.days[0].timestamp);
        assert_eq!(at(2020, 1, 2, 0, 0, 0), overview.days[1].timestamp);
    }

    #[test]
    fn year_overview() {
        let input = read_resource("yearoverview.xml");
        let overview = overview::parse_year(&input).unwrap();
        assert_eq!(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(), overview.date);
        assert_eq!(Some(5000500), overview.absolute);
        assert_eq!(2, overview.months.len());
        assert_eq!(at(2020, 2, 1, 0, 0, 0), overview.months[1].timestamp);
    }

    #[test]
    fn energy_balance_months() {
        let input = read_resource("energybalance_month.xml");
        match energy_balance::parse(&input).unwrap() {
            EnergyBalanceSeries::Months(months) => {
                /* the incomplete third month is dropped */
                assert_eq!(2, months.len());

                let first = months[0];
                assert_eq!(at(2020, 1, 1, 0, 0, 0), first.timestamp);
                assert_eq!(10500, first.consumption.external);
                assert_eq!(20500, first.consumption.internal);
                assert_eq!(15500, first.consumption.direct);
                assert_eq!(50500, first.generation.total);
                assert_eq!(30500, first.generation.self_consumption);
                assert_eq!(20000, first.generation.feed_in);
                let battery = first.battery.unwrap();
                assert_eq!(Some(5500), battery.charge);
                assert_eq!(Some(4500), battery.discharge);

                /* both battery attributes absent collapses to None */
                assert_eq!(None, months[1].battery);
            }
            other => panic!("unexpected series: {:?}", other),
        }
    }

    #[test]
    fn energy_balance_days() {
        let input = read_resource("energybalance_days.xml");
        match energy_balance::parse(&input).unwrap() {
            EnergyBalanceSeries::Days(days) => {
                assert_eq!(2, days.len());
                assert_eq!(at(2020, 1, 1, 0, 0, 0), days[0].timestamp);
                assert_eq!(at(2020, 1, 2, 0, 0, 0), days[1].timestamp);
            }
            other => panic!("unexpected series: {:?}", other),
        }
    }

    #[test]
    fn energy_balance_single_day_in_watt_hours() {
        let input = read_resource("energybalance_day.xml");
        match energy_balance::parse(&input).unwrap() {
            EnergyBalanceSeries::Day(day) => {
                let day = day.unwrap();
                /* unit="Wh": values are taken as-is */
                assert_eq!(100, day.consumption.external);
                assert_eq!(500, day.generation.total);
                /* one battery attribute is enough to keep the record */
                let battery = day.battery.unwrap();
                assert_eq!(Some(50), battery.charge);
                assert_eq!(None, battery.discharge);
            }
            other => panic!("unexpected series: {:?}", other),
        }
    }

    #[test]
    fn logbook_entries() {
        let input = read_resource("logbook.xml");
        let entries = logbook::parse(&input).unwrap();
        assert_eq!(2, entries.len());

        let entry = &entries[0];
        assert_eq!("100123", entry.event_id);
        assert_eq!(at(2020, 1, 2, 13, 15, 0), entry.date);
        assert_eq!("1", entry.id);
        assert_eq!("Warning", entry.kind);
        assert_eq!("Open", entry.status);
        /* &apos; unescaped and trailing <br /> stripped */
        assert_eq!("Fault 'X' occurred", entry.description);
        assert_eq!("dev1", entry.device_oid);
        assert_eq!("SB 4000TL-21", entry.device_name);
        assert_eq!("21001234", entry.device_serial);
    }
}
