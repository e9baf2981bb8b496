//! `reverse_geocode`: nearest address for a coordinate.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::registry::{RegistryError, ToolDescriptor, ToolError, ToolFuture, ToolHandler};
use crate::upstream::nominatim::{self, ReverseQuery};
use crate::upstream::UpstreamClient;

use super::{latitude, longitude};

pub const NAME: &str = "reverse_geocode";

const DESCRIPTION: &str = "Convert coordinates into the nearest address using Nominatim.";

pub fn input_schema() -> Value {
    let mut lat = latitude();
    lat["description"] = json!("Latitude");
    let mut lon = longitude();
    lon["description"] = json!("Longitude");

    json!({
        "type": "object",
        "required": ["lat", "lon"],
        "properties": { "lat": lat, "lon": lon }
    })
}

pub fn parse_arguments(arguments: &Value) -> Result<ReverseQuery, serde_json::Error> {
    ReverseQuery::deserialize(arguments)
}

struct ReverseGeocode {
    client: Arc<UpstreamClient>,
}

impl ToolHandler for ReverseGeocode {
    fn call<'a>(&'a self, arguments: &'a Value) -> ToolFuture<'a> {
        Box::pin(async move {
            let query = parse_arguments(arguments)?;
            let envelope = nominatim::reverse_geocode(&self.client, &query).await;
            Ok::<_, ToolError>(envelope.into_json()?)
        })
    }
}

pub fn descriptor(client: Arc<UpstreamClient>) -> Result<ToolDescriptor, RegistryError> {
    ToolDescriptor::new(NAME, DESCRIPTION, input_schema(), ReverseGeocode { client })
}
