//! `route`: turn-by-turn directions through OSRM.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::registry::{RegistryError, ToolDescriptor, ToolError, ToolFuture, ToolHandler};
use crate::upstream::osrm::{self, RouteQuery, TravelMode};
use crate::upstream::UpstreamClient;

use super::point;

pub const NAME: &str = "route";

const DESCRIPTION: &str =
    "Calculate a route between two points with distance, duration and turn-by-turn steps, using OSRM.";

pub fn input_schema() -> Value {
    let mut start = point();
    start["description"] = json!("Start point as [lat, lon]");
    let mut end = point();
    end["description"] = json!("End point as [lat, lon]");

    json!({
        "type": "object",
        "required": ["start", "end"],
        "properties": {
            "start": start,
            "end": end,
            "mode": {
                "type": "string",
                "enum": TravelMode::NAMES,
                "default": "driving",
                "description": "Travel mode"
            }
        }
    })
}

pub fn parse_arguments(arguments: &Value) -> Result<RouteQuery, serde_json::Error> {
    RouteQuery::deserialize(arguments)
}

struct Route {
    client: Arc<UpstreamClient>,
}

impl ToolHandler for Route {
    fn call<'a>(&'a self, arguments: &'a Value) -> ToolFuture<'a> {
        Box::pin(async move {
            let query = parse_arguments(arguments)?;
            let envelope = osrm::route(&self.client, &query).await;
            Ok::<_, ToolError>(envelope.into_json()?)
        })
    }
}

pub fn descriptor(client: Arc<UpstreamClient>) -> Result<ToolDescriptor, RegistryError> {
    ToolDescriptor::new(NAME, DESCRIPTION, input_schema(), Route { client })
}
