pub mod endpoint;
pub mod error;
pub mod request;
pub mod response;

use std::collections::HashMap;

use chrono::{Local, NaiveDate, NaiveDateTime};
use reqwest::Method;

use crate::model;
use crate::model::{
    AllData, Device, EnergyBalanceSeries, Interval, LastDataExact, LogbookEntry, Parameter, Plant,
    PlantProfile, Token,
};
pub use error::Error;

pub fn api(server: String, port: u16, username: String, password: String) -> model::Api {
    model::Api {
        server,
        port,
        username,
        password,
    }
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// One signed GET round-trip against `service`, returning the raw body.
async fn get(
    api: &model::LoggedInApi,
    service: &str,
    segments: &[&str],
    params: &[(&str, String)],
) -> Result<String, Error> {
    let url = request::build_url(&Method::GET, service, segments, params, Some(&api.token), now())?;
    log::debug!("GET {}", url);
    request::perform(&api.client, &api.origin(), Method::GET, service, &url).await
}

/// Plant-service request shared by profile, device list and device
/// parameters: only the view and the path segments differ.
async fn get_plant_view(
    api: &model::LoggedInApi,
    segments: &[&str],
    view: &str,
) -> Result<String, Error> {
    let params = [
        ("view", view.to_string()),
        ("culture", endpoint::CULTURE.to_string()),
        ("plant-image-size", endpoint::PLANT_IMAGE_SIZE.to_string()),
        ("identifier", api.token.identifier.clone()),
    ];
    get(api, endpoint::PLANT, segments, &params).await
}

/// Data-service request: `{oid}/{data_type}/{DD/MM/YYYY}` plus per-endpoint
/// parameters. A fresh parameter list is built per call.
async fn get_data(
    api: &model::LoggedInApi,
    oid: &str,
    data_type: &str,
    date: NaiveDate,
    extra: &[(&str, String)],
) -> Result<String, Error> {
    let date = date.format("%d/%m/%Y").to_string();
    let mut params: Vec<(&str, String)> = extra.to_vec();
    params.push(("culture", endpoint::CULTURE.to_string()));
    params.push(("identifier", api.token.identifier.clone()));
    get(api, endpoint::DATA, &[oid, data_type, &date], &params).await
}

/// Authenticates and returns a logged-in session. The password only ever
/// appears redacted in the request log.
pub async fn login(api: &model::Api) -> Result<model::LoggedInApi, Error> {
    let client = reqwest::Client::new();

    let url = request::build_url(
        &Method::GET,
        endpoint::AUTHENTICATION,
        &[&api.username],
        &[("password", api.password.clone())],
        None,
        now(),
    )?;
    let encoded_password: String =
        url::form_urlencoded::byte_serialize(api.password.as_bytes()).collect();
    log::debug!("GET {}", url.replace(&encoded_password, "<password>"));

    let data = request::perform(
        &client,
        &api.origin(),
        Method::GET,
        endpoint::AUTHENTICATION,
        &url,
    )
    .await?;
    let auth = response::authentication::parse(&data, now())?;
    let key = auth.key.ok_or_else(|| {
        Error::MalformedResponse("missing key attribute in authentication tag".to_string())
    })?;

    Ok(model::LoggedInApi {
        server: api.server.clone(),
        port: api.port,
        token: Token {
            identifier: auth.identifier,
            key,
            server_offset: auth.server_offset,
        },
        client,
    })
}

/// Invalidates the session token; the session is consumed either way.
pub async fn logout(api: model::LoggedInApi) -> Result<(), Error> {
    let url = request::build_url(
        &Method::DELETE,
        endpoint::AUTHENTICATION,
        &[&api.token.identifier],
        &[],
        Some(&api.token),
        now(),
    )?;
    log::debug!("DELETE {}", url);

    let data = request::perform(
        &api.client,
        &api.origin(),
        Method::DELETE,
        endpoint::AUTHENTICATION,
        &url,
    )
    .await?;
    response::authentication::parse(&data, now())?;
    Ok(())
}

pub async fn plants(api: &model::LoggedInApi) -> Result<Vec<Plant>, Error> {
    let data = get(api, endpoint::PLANT_LIST, &[&api.token.identifier], &[]).await?;
    response::plant_list::parse(&data)
}

pub async fn plant_profile(api: &model::LoggedInApi, oid: &str) -> Result<PlantProfile, Error> {
    let data = get_plant_view(api, &[oid], "profile").await?;
    response::plant_profile::parse(&data)
}

pub async fn plant_devices(api: &model::LoggedInApi, oid: &str) -> Result<Vec<Device>, Error> {
    let data = get_plant_view(api, &[oid], "devicelist").await?;
    response::device_list::parse(&data)
}

pub async fn device_parameters(
    api: &model::LoggedInApi,
    plant_oid: &str,
    device_oid: &str,
) -> Result<HashMap<String, Parameter>, Error> {
    let data = get_plant_view(api, &[plant_oid, device_oid], "deviceparameter").await?;
    response::device_parameters::parse(&data)
}

/// Most recent day and hour yields for `date`.
pub async fn last_data_exact(
    api: &model::LoggedInApi,
    oid: &str,
    date: NaiveDate,
) -> Result<LastDataExact, Error> {
    let params = [
        ("unit", "kWh".to_string()),
        ("view", "lastdataexact".to_string()),
    ];
    let data = get_data(api, oid, "Energy", date, &params).await?;
    response::last_data_exact::parse(&data)
}

/// Whole-lifetime yield series, bucketed per year or per month.
pub async fn all_data(
    api: &model::LoggedInApi,
    oid: &str,
    interval: Interval,
) -> Result<AllData, Error> {
    let params = [
        ("period", "infinite".to_string()),
        ("interval", interval.as_str().to_string()),
        ("unit", "kWh".to_string()),
    ];
    let data = get_data(api, oid, "Energy", Local::now().date_naive(), &params).await?;
    response::all_data::parse(&data)
}

/// Day overview: quarter-hour resolution with `quarter`, hourly otherwise.
/// `include_all` keeps samples the portal has not published a mean for.
pub async fn day_overview(
    api: &model::LoggedInApi,
    oid: &str,
    date: NaiveDate,
    quarter: bool,
    include_all: bool,
) -> Result<model::DayOverview, Error> {
    let data_type = if quarter {
        "overview-day-fifteen-total"
    } else {
        "overview-day-total"
    };
    let data = get_data(api, oid, data_type, date, &[]).await?;
    response::overview::parse_day(&data, quarter, include_all)
}

pub async fn month_overview(
    api: &model::LoggedInApi,
    oid: &str,
    date: NaiveDate,
) -> Result<model::MonthOverview, Error> {
    let data = get_data(api, oid, "overview-month-total", date, &[]).await?;
    response::overview::parse_month(&data)
}

pub async fn year_overview(
    api: &model::LoggedInApi,
    oid: &str,
    date: NaiveDate,
) -> Result<model::YearOverview, Error> {
    let data = get_data(api, oid, "overview-year-total", date, &[]).await?;
    response::overview::parse_year(&data)
}

pub async fn energy_balance(
    api: &model::LoggedInApi,
    oid: &str,
    date: NaiveDate,
    period: &str,
    interval: &str,
) -> Result<EnergyBalanceSeries, Error> {
    let params = [
        ("period", period.to_string()),
        ("interval", interval.to_string()),
        ("unit", "kWh".to_string()),
    ];
    let data = get_data(api, oid, "energybalance", date, &params).await?;
    response::energy_balance::parse(&data)
}

pub async fn year_energy_balance(
    api: &model::LoggedInApi,
    oid: &str,
    date: NaiveDate,
) -> Result<EnergyBalanceSeries, Error> {
    energy_balance(api, oid, date, "year", "month").await
}

pub async fn month_energy_balance(
    api: &model::LoggedInApi,
    oid: &str,
    date: NaiveDate,
) -> Result<EnergyBalanceSeries, Error> {
    energy_balance(api, oid, date, "month", "day").await
}

pub async fn day_energy_balance(
    api: &model::LoggedInApi,
    oid: &str,
    date: NaiveDate,
) -> Result<EnergyBalanceSeries, Error> {
    energy_balance(api, oid, date, "day", "day").await
}

/// Logbook events for a plant, optionally from a start date, filtered by
/// severity.
pub async fn logbook(
    api: &model::LoggedInApi,
    oid: &str,
    date_from: Option<NaiveDate>,
    info: bool,
    warning: bool,
    failure: bool,
    error: bool,
) -> Result<Vec<LogbookEntry>, Error> {
    let mut params: Vec<(&str, String)> = Vec::new();
    if let Some(date_from) = date_from {
        params.push(("date-from", date_from.format("%d/%m/%Y").to_string()));
    }
    params.push(("info", info.to_string()));
    params.push(("warning", warning.to_string()));
    params.push(("failure", failure.to_string()));
    params.push(("error", error.to_string()));
    params.push(("culture", endpoint::CULTURE.to_string()));
    params.push(("identifier", api.token.identifier.clone()));

    let data = get(api, endpoint::LOGBOOK, &[oid], &params).await?;
    response::logbook::parse(&data)
}
