use std::collections::HashMap;

use roxmltree::Document;

use crate::api::error::Error;
use crate::api::response;
use crate::model::Parameter;

pub fn parse(data: &str) -> Result<HashMap<String, Parameter>, Error> {
    let document = Document::parse(data)?;
    let envelope = response::envelope(&document, None)?;

    envelope
        .payload
        .children()
        .filter(|node| node.is_element() && node.tag_name().name() == "parameter")
        .map(|parameter| {
            Ok((
                response::attr(parameter, "name")?.to_string(),
                Parameter {
                    value: response::attr(parameter, "value")?.to_string(),
                    changed: response::parse_datetime(
                        response::attr(parameter, "changed")?,
                        response::CREATION_DATE_FORMAT,
                    )?,
                },
            ))
        })
        .collect()
}
