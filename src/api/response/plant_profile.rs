use std::collections::HashMap;

use roxmltree::{Document, Node};

use crate::api::error::Error;
use crate::api::response;
use crate::model::{DeviceSummary, PlantImage, PlantProfile};

fn text_or_raise<'a>(node: Node<'a, '_>, tag: &str) -> Result<&'a str, Error> {
    response::find(node, tag)?
        .text()
        .ok_or_else(|| Error::MalformedResponse(format!("missing {} value", tag)))
}

fn parse_count(node: Node) -> Result<u32, Error> {
    response::attr(node, "count")?
        .parse()
        .map_err(|_| Error::MalformedResponse("invalid count attribute".to_string()))
}

/// inverters and communicationProducts share one element shape; a missing
/// parent element means an empty list.
fn device_summaries(
    payload: Node,
    parent: &str,
    entry: &str,
) -> Result<Vec<DeviceSummary>, Error> {
    let parent = match response::child(payload, parent) {
        Some(parent) => parent,
        None => return Ok(Vec::new()),
    };
    parent
        .children()
        .filter(|node| node.is_element() && node.tag_name().name() == entry)
        .map(|node| {
            Ok(DeviceSummary {
                count: parse_count(node)?,
                device_icon: response::attr(node, "deviceIcon")?.to_string(),
                name: node.text().map(str::to_string),
            })
        })
        .collect()
}

pub fn parse(data: &str) -> Result<PlantProfile, Error> {
    let document = Document::parse(data)?;
    let envelope = response::envelope(&document, None)?;
    let payload = envelope.payload;

    let name = text_or_raise(payload, "name")?.to_string();
    let peak_power = response::kwh_to_wh(response::find(payload, "peak-power")?.text())?
        .ok_or_else(|| Error::MalformedResponse("missing peak-power value".to_string()))?;
    let city_country = text_or_raise(payload, "city-country")?.to_string();
    let start_date = response::parse_date(text_or_raise(payload, "start-date")?)?;

    let description = response::child(payload, "description").map(|node| {
        node.text()
            .unwrap_or_default()
            .replace("<br />", "")
            .trim_end()
            .to_string()
    });

    let plant_image = match response::child(payload, "plant-image") {
        Some(node) => Some(PlantImage {
            image: node.text().unwrap_or_default().to_string(),
            width: response::attr(node, "width")?
                .parse()
                .map_err(|_| Error::MalformedResponse("invalid width attribute".to_string()))?,
            height: response::attr(node, "height")?
                .parse()
                .map_err(|_| Error::MalformedResponse("invalid height attribute".to_string()))?,
        }),
        None => None,
    };

    let mut production_data = HashMap::new();
    if let Some(parent) = response::child(payload, "production-data") {
        for channel in parent
            .children()
            .filter(|node| node.is_element() && node.tag_name().name() == "channel")
        {
            production_data.insert(
                response::attr(channel, "meta-name")?.to_string(),
                channel.text().map(str::to_string),
            );
        }
    }

    Ok(PlantProfile {
        name,
        peak_power,
        city_country,
        start_date,
        description,
        plant_image,
        production_data,
        inverters: device_summaries(payload, "inverters", "inverter")?,
        communication_products: device_summaries(
            payload,
            "communicationProducts",
            "communicationProduct",
        )?,
    })
}
