use roxmltree::Document;

use crate::api::error::Error;
use crate::api::response;
use crate::model::LogbookEntry;

/// Descriptions come double-escaped and with HTML line breaks; undo both
/// on top of the XML parser's own unescaping.
fn clean_description(text: &str) -> String {
    text.replace("&apos;", "'")
        .replace("&quot;", "\"")
        .replace("<br />", "")
        .trim_end()
        .to_string()
}

pub fn parse(data: &str) -> Result<Vec<LogbookEntry>, Error> {
    let document = Document::parse(data)?;
    let envelope = response::envelope(&document, None)?;

    envelope
        .payload
        .children()
        .filter(|node| node.is_element() && node.tag_name().name() == "entry")
        .map(|entry| {
            Ok(LogbookEntry {
                event_id: response::attr(entry, "event-id")?.to_string(),
                date: response::parse_datetime(
                    response::attr(entry, "date")?,
                    "%d/%m/%Y %H:%M:%S",
                )?,
                id: response::attr(entry, "id")?.to_string(),
                kind: response::attr(entry, "type")?.to_string(),
                status: response::attr(entry, "status")?.to_string(),
                description: clean_description(response::attr(entry, "description")?),
                device_oid: response::attr(entry, "device-oid")?.to_string(),
                device_name: response::attr(entry, "device-name")?.to_string(),
                device_serial: response::attr(entry, "device-serial")?.to_string(),
            })
        })
        .collect()
}
