//! `poi_search`: tag-filtered element search through Overpass.

use std::fmt;
use std::sync::Arc;

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::registry::{RegistryError, ToolDescriptor, ToolError, ToolFuture, ToolHandler};
use crate::schema::ORDERED_ITEMS;
use crate::upstream::overpass::{self, PoiQuery, SearchArea, AROUND_RADIUS_M, DEFAULT_LIMIT, MAX_LIMIT};
use crate::upstream::UpstreamClient;

use super::{latitude, longitude, point};

pub const NAME: &str = "poi_search";

const DESCRIPTION: &str = "Find points of interest by OpenStreetMap tags inside a bounding box \
     or around a center point, using the Overpass API.";

pub fn input_schema() -> Value {
    let mut center = point();
    center["description"] = json!(format!("Search within {AROUND_RADIUS_M} m of [lat, lon]"));

    json!({
        "type": "object",
        "required": ["tags"],
        "properties": {
            "tags": {
                "type": "object",
                "minProperties": 1,
                "additionalProperties": { "type": "string" },
                "description": "Tag filters that must all match, e.g. {\"amenity\": \"cafe\"}"
            },
            "bbox": {
                "type": "array",
                "prefixItems": [latitude(), longitude(), latitude(), longitude()],
                "minItems": 4,
                "maxItems": 4,
                ORDERED_ITEMS: [
                    { "lower": 0, "upper": 2, "message": "south must not be greater than north" }
                ],
                "description": "Search area as [south, west, north, east]"
            },
            "center": center,
            "limit": {
                "type": "integer",
                "minimum": 1,
                "maximum": MAX_LIMIT,
                "default": DEFAULT_LIMIT,
                "description": "Maximum number of results"
            }
        },
        "oneOf": [
            { "required": ["bbox"] },
            { "required": ["center"] }
        ]
    })
}

#[derive(Debug, Deserialize)]
struct PoiArgs {
    #[serde(deserialize_with = "tag_pairs")]
    tags: Vec<(String, String)>,
    bbox: Option<[f64; 4]>,
    center: Option<[f64; 2]>,
    /// JSON Schema counts `5.0` as an integer, so read it as a float.
    limit: Option<f64>,
}

/// Object entries in document order.
fn tag_pairs<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<(String, String)>, D::Error> {
    struct Pairs;

    impl<'de> Visitor<'de> for Pairs {
        type Value = Vec<(String, String)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an object of string tag values")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut pairs = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some(entry) = map.next_entry()? {
                pairs.push(entry);
            }
            Ok(pairs)
        }
    }

    deserializer.deserialize_map(Pairs)
}

pub fn parse_arguments(arguments: &Value) -> Result<PoiQuery, serde_json::Error> {
    let args = PoiArgs::deserialize(arguments)?;
    let area = match (args.bbox, args.center) {
        (Some(bbox), None) => SearchArea::BoundingBox(bbox),
        (None, Some(center)) => SearchArea::Around(center),
        _ => return Err(serde::de::Error::custom("exactly one of bbox or center is required")),
    };

    Ok(PoiQuery {
        tags: args.tags,
        area,
        limit: args.limit.map_or(DEFAULT_LIMIT, |limit| limit as u64),
    })
}

struct PoiSearch {
    client: Arc<UpstreamClient>,
}

impl ToolHandler for PoiSearch {
    fn call<'a>(&'a self, arguments: &'a Value) -> ToolFuture<'a> {
        Box::pin(async move {
            let query = parse_arguments(arguments)?;
            let envelope = overpass::poi_search(&self.client, &query).await;
            Ok::<_, ToolError>(envelope.into_json()?)
        })
    }
}

pub fn descriptor(client: Arc<UpstreamClient>) -> Result<ToolDescriptor, RegistryError> {
    ToolDescriptor::new(NAME, DESCRIPTION, input_schema(), PoiSearch { client })
}
