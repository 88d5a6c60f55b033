use chrono::{Duration, NaiveDateTime};
use roxmltree::Document;

use crate::api::error::Error;
use crate::api::response;

/// Outcome of an authentication exchange. `key` is absent for logout
/// responses (method DELETE).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authentication {
    pub identifier: String,
    pub key: Option<String>,
    pub server_offset: Duration,
}

pub fn parse(data: &str, now: NaiveDateTime) -> Result<Authentication, Error> {
    let document = Document::parse(data)?;
    let envelope = response::envelope(&document, None)?;

    if envelope.payload.text() != Some("OK") {
        return Err(Error::Response {
            message: "Authentication failed".to_string(),
            code: "unknown-error".to_string(),
        });
    }

    let creation_date =
        response::parse_datetime(envelope.creation_date, response::CREATION_DATE_FORMAT)?;
    let identifier = response::attr(envelope.payload, "identifier")?.to_string();
    let key = if envelope.method != "DELETE" {
        Some(response::attr(envelope.payload, "key")?.to_string())
    } else {
        None
    };

    Ok(Authentication {
        identifier,
        key,
        server_offset: now - creation_date,
    })
}
