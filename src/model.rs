use std::collections::HashMap;

use chrono::{Duration, NaiveDate, NaiveDateTime};

pub type WattHours = i64;
pub type Watts = i64;

/// Credentials and server coordinates, before authentication.
#[derive(Debug, Clone)]
pub struct Api {
    pub server: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

impl Api {
    pub(crate) fn origin(&self) -> String {
        format!("https://{}:{}", self.server, self.port)
    }
}

/// An authenticated session. `api::logout` consumes it; the token is never
/// renewed otherwise.
#[derive(Debug)]
pub struct LoggedInApi {
    pub server: String,
    pub port: u16,
    pub token: Token,
    pub client: reqwest::Client,
}

impl LoggedInApi {
    pub(crate) fn origin(&self) -> String {
        format!("https://{}:{}", self.server, self.port)
    }
}

/// Portal-issued session token: identifier plus HMAC key, and the offset
/// between the local clock and the server clock at authentication time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub identifier: String,
    pub key: String,
    pub server_offset: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plant {
    pub oid: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub oid: String,
    pub name: String,
    pub class: String,
    pub serialnumber: String,
    pub type_id: String,
    pub startdate: NaiveDateTime,
}

/// Cumulative energy reading plus its delta from the previous period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Yield {
    pub timestamp: NaiveDateTime,
    pub absolute: WattHours,
    pub difference: WattHours,
}

/// Instantaneous power sample. `power` is only absent for entries the
/// portal has not published yet (requested with `include_all`); `min` and
/// `max` only appear in day overviews.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Power {
    pub timestamp: NaiveDateTime,
    pub power: Option<Watts>,
    pub min: Option<Watts>,
    pub max: Option<Watts>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlantImage {
    pub image: String,
    pub width: u32,
    pub height: u32,
}

/// Count/icon/name triple used for both inverters and communication
/// products in the plant profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSummary {
    pub count: u32,
    pub device_icon: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlantProfile {
    pub name: String,
    pub peak_power: Watts,
    pub city_country: String,
    pub start_date: NaiveDate,
    pub description: Option<String>,
    pub plant_image: Option<PlantImage>,
    pub production_data: HashMap<String, Option<String>>,
    pub inverters: Vec<DeviceSummary>,
    pub communication_products: Vec<DeviceSummary>,
}

/// Device configuration/state snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub value: String,
    pub changed: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogbookEntry {
    pub event_id: String,
    pub date: NaiveDateTime,
    pub id: String,
    pub kind: String,
    pub status: String,
    pub description: String,
    pub device_oid: String,
    pub device_name: String,
    pub device_serial: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LastDataExact {
    pub day: Option<Yield>,
    pub hour: Option<Yield>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interval {
    Year,
    Month,
}

impl Interval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::Year => "year",
            Interval::Month => "month",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllDataSeries {
    Years(Vec<Yield>),
    Months(Vec<Yield>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllData {
    pub start_timestamp: NaiveDateTime,
    pub series: AllDataSeries,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayOverview {
    pub date: NaiveDate,
    pub absolute: Option<WattHours>,
    pub difference: Option<WattHours>,
    pub power_measurements: Vec<Power>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthOverview {
    pub date: NaiveDate,
    pub absolute: Option<WattHours>,
    pub difference: Option<WattHours>,
    pub days: Vec<Yield>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearOverview {
    pub date: NaiveDate,
    pub absolute: Option<WattHours>,
    pub difference: Option<WattHours>,
    pub months: Vec<Yield>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Consumption {
    pub external: WattHours,
    pub internal: WattHours,
    pub direct: WattHours,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation {
    pub total: WattHours,
    pub self_consumption: WattHours,
    pub feed_in: WattHours,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Battery {
    pub charge: Option<WattHours>,
    pub discharge: Option<WattHours>,
}

/// Decomposition of consumption/generation/battery flow for one period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnergyBalance {
    pub timestamp: NaiveDateTime,
    pub consumption: Consumption,
    pub generation: Generation,
    pub battery: Option<Battery>,
}

/// Shape of an energy-balance response, as picked by the requested period
/// and interval: monthly buckets, daily buckets, or a single day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnergyBalanceSeries {
    Months(Vec<EnergyBalance>),
    Days(Vec<EnergyBalance>),
    Day(Option<EnergyBalance>),
}
