use base64::engine::general_purpose::STANDARD as b64;
use base64::Engine;
use chrono::NaiveDateTime;
use hmac::Mac;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::Method;

use crate::api::endpoint;
use crate::api::error::Error;
use crate::model::Token;

type HmacSha1 = hmac::Hmac<sha1::Sha1>;

/// Unreserved characters and `/` stay literal in path segments, so a
/// `DD/MM/YYYY` date segment keeps its slashes on the wire.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

/// Computes the request timestamp (local clock minus the server offset
/// learned at authentication) and the HMAC-SHA1 signature over
/// method + service + timestamp + identifier, keyed by the token key.
///
/// Deterministic for a given `now`; recomputed per request since the
/// timestamp changes every call.
pub(crate) fn sign(
    method: &Method,
    service: &str,
    token: &Token,
    now: NaiveDateTime,
) -> Result<(String, String), Error> {
    let timestamp = (now - token.server_offset)
        .format("%Y-%m-%dT%H:%M:%S")
        .to_string();

    let mut mac = HmacSha1::new_from_slice(token.key.as_bytes()).map_err(|_| Error::Internal)?;
    mac.update(method.as_str().to_lowercase().as_bytes());
    mac.update(service.to_lowercase().as_bytes());
    mac.update(timestamp.as_bytes());
    mac.update(token.identifier.to_lowercase().as_bytes());

    let signature = b64.encode(mac.finalize().into_bytes());
    Ok((timestamp, signature))
}

/// Builds the canonical `/services/{service}/100/{segments}?query` URL.
/// With a token, the signature fields are appended to the query.
pub(crate) fn build_url(
    method: &Method,
    service: &str,
    segments: &[&str],
    params: &[(&str, String)],
    token: Option<&Token>,
    now: NaiveDateTime,
) -> Result<String, Error> {
    let mut query: Vec<(String, String)> = params
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect();

    if let Some(token) = token {
        let (timestamp, signature) = sign(method, service, token, now)?;
        query.push(("timestamp".to_string(), timestamp));
        query.push(("signature-method".to_string(), "auth".to_string()));
        query.push(("signature-version".to_string(), endpoint::VERSION.to_string()));
        query.push(("signature".to_string(), signature));
    }

    let mut url = format!("{}/{}/{}/", endpoint::BASE_PATH, service, endpoint::VERSION);
    url.push_str(
        &segments
            .iter()
            .map(|segment| utf8_percent_encode(segment, PATH_SEGMENT).to_string())
            .collect::<Vec<_>>()
            .join("/"),
    );

    if !query.is_empty() {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (name, value) in &query {
            serializer.append_pair(name, value);
        }
        url.push('?');
        url.push_str(&serializer.finish());
    }

    Ok(url)
}

/// Performs exactly one HTTP round-trip and returns the raw body text on
/// 200; any other status is a transport error carrying status and reason.
pub(crate) async fn perform(
    client: &reqwest::Client,
    origin: &str,
    method: Method,
    service: &str,
    url: &str,
) -> Result<String, Error> {
    let full_url = format!("{}{}", origin, url);
    let response = client.request(method, full_url).send().await?;

    let status = response.status();
    if status != reqwest::StatusCode::OK {
        return Err(Error::Http {
            service: service.to_string(),
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("").to_string(),
        });
    }

    Ok(response.text().await?)
}
