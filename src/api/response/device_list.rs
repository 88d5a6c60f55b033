use roxmltree::Document;

use crate::api::error::Error;
use crate::api::response;
use crate::model::Device;

pub fn parse(data: &str) -> Result<Vec<Device>, Error> {
    let document = Document::parse(data)?;
    let envelope = response::envelope(&document, None)?;

    envelope
        .payload
        .children()
        .filter(|node| node.is_element() && node.tag_name().name() == "device")
        .map(|device| {
            Ok(Device {
                oid: response::attr(device, "oid")?.to_string(),
                name: response::attr(device, "name")?.to_string(),
                class: response::attr(device, "class")?.to_string(),
                serialnumber: response::attr(device, "serialnumber")?.to_string(),
                type_id: response::attr(device, "type-id")?.to_string(),
                startdate: response::parse_datetime(
                    response::attr(device, "startdate")?,
                    response::CREATION_DATE_FORMAT,
                )?,
            })
        })
        .collect()
}
