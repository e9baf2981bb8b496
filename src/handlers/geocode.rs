//! `geocode`: free-text place search through Nominatim.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::registry::{RegistryError, ToolDescriptor, ToolError, ToolFuture, ToolHandler};
use crate::schema::ORDERED_ITEMS;
use crate::upstream::nominatim::{self, GeocodeQuery};
use crate::upstream::UpstreamClient;

use super::{latitude, longitude};

pub const NAME: &str = "geocode";

const DESCRIPTION: &str =
    "Convert an address or place name into coordinates. Returns up to 10 candidate matches from Nominatim.";

pub fn input_schema() -> Value {
    json!({
        "type": "object",
        "required": ["query"],
        "properties": {
            "query": {
                "type": "string",
                "pattern": "\\S",
                "description": "Address or place name, e.g. \"1600 Pennsylvania Ave, Washington\""
            },
            "bbox": {
                "type": "array",
                "prefixItems": [longitude(), latitude(), longitude(), latitude()],
                "minItems": 4,
                "maxItems": 4,
                ORDERED_ITEMS: [
                    { "lower": 0, "upper": 2, "message": "minLon must not be greater than maxLon" },
                    { "lower": 1, "upper": 3, "message": "minLat must not be greater than maxLat" }
                ],
                "description": "Restrict results to [minLon, minLat, maxLon, maxLat]"
            },
            "country_code": {
                "type": "string",
                "pattern": "^[A-Za-z]{2}$",
                "description": "ISO 3166-1 alpha-2 country code"
            }
        }
    })
}

/// Read arguments that already passed [`input_schema`].
pub fn parse_arguments(arguments: &Value) -> Result<GeocodeQuery, serde_json::Error> {
    GeocodeQuery::deserialize(arguments)
}

struct Geocode {
    client: Arc<UpstreamClient>,
}

impl ToolHandler for Geocode {
    fn call<'a>(&'a self, arguments: &'a Value) -> ToolFuture<'a> {
        Box::pin(async move {
            let query = parse_arguments(arguments)?;
            let envelope = nominatim::geocode(&self.client, &query).await;
            Ok::<_, ToolError>(envelope.into_json()?)
        })
    }
}

pub fn descriptor(client: Arc<UpstreamClient>) -> Result<ToolDescriptor, RegistryError> {
    ToolDescriptor::new(NAME, DESCRIPTION, input_schema(), Geocode { client })
}
