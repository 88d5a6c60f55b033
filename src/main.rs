use chrono::{Duration, Local};
use config::Config;
use sunnyportal_rs::api;
use sunnyportal_rs::api::endpoint;

#[derive(Clone, serde::Deserialize)]
pub struct SunnyPortalConfig {
    server: String,
    port: u16,
    email: String,
    password: String,
    plant: String,
}

pub fn read_settings() -> SunnyPortalConfig {
    let mut settings = Config::default();
    settings
        .merge(config::Environment::with_prefix("SP"))
        .unwrap()
        .set_default("server", endpoint::DEFAULT_SERVER)
        .unwrap()
        .set_default("port", i64::from(endpoint::DEFAULT_PORT))
        .unwrap();

    settings.try_into().expect("Configuration error")
}

#[tokio::main]
async fn main() -> Result<(), api::Error> {
    env_logger::init();

    let settings = read_settings();
    let api = api::api(
        settings.server,
        settings.port,
        settings.email,
        settings.password,
    );
    let session = api::login(&api).await?;

    for plant in api::plants(&session).await? {
        if plant.name != settings.plant {
            continue;
        }
        log::debug!("Found plant {}", plant.name);

        let today = Local::now().date_naive();
        let mut date = today - Duration::days(7);
        while date <= today {
            let day = api::day_overview(&session, &plant.oid, date, true, false).await?;
            for power in &day.power_measurements {
                if let Some(watts) = power.power {
                    println!("{} {}", power.timestamp, watts);
                }
            }
            date += Duration::days(1);
        }
    }

    api::logout(session).await
}
