use roxmltree::Document;

use crate::api::error::Error;
use crate::api::response;
use crate::model::Plant;

pub fn parse(data: &str) -> Result<Vec<Plant>, Error> {
    let document = Document::parse(data)?;
    let envelope = response::envelope(&document, None)?;

    envelope
        .payload
        .children()
        .filter(|node| node.is_element() && node.tag_name().name() == "plant")
        .map(|plant| {
            Ok(Plant {
                oid: response::attr(plant, "oid")?.to_string(),
                name: response::attr(plant, "name")?.to_string(),
            })
        })
        .collect()
}
