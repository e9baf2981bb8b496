//! Overpass tag search.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

use super::{UpstreamClient, UpstreamError};
use crate::envelope::{Envelope, ErrorCode, Source};

/// Radius in meters used when searching around a center point.
pub const AROUND_RADIUS_M: u32 = 1000;

pub const DEFAULT_LIMIT: u64 = 25;
pub const MAX_LIMIT: u64 = 100;

/// Server-side Overpass timeout in seconds, embedded in the query.
const QUERY_TIMEOUT_SECS: u32 = 25;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SearchArea {
    /// `[south, west, north, east]`
    BoundingBox([f64; 4]),
    /// `[lat, lon]`, searched within [`AROUND_RADIUS_M`].
    Around([f64; 2]),
}

/// Validated input for the `poi_search` tool.
#[derive(Debug, Clone, PartialEq)]
pub struct PoiQuery {
    /// Tag filters in caller order. Every filter must match.
    pub tags: Vec<(String, String)>,
    pub area: SearchArea,
    pub limit: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Node,
    Way,
    Relation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Poi {
    pub id: u64,
    pub name: Option<String>,
    pub lat: f64,
    pub lon: f64,
    pub tags: Map<String, Value>,
    #[serde(rename = "type")]
    pub kind: ElementKind,
}

#[derive(Debug, Clone, Deserialize)]
struct RawResponse {
    elements: Vec<RawElement>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct RawCenter {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct RawElement {
    #[serde(rename = "type")]
    kind: ElementKind,
    id: u64,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
    #[serde(default)]
    center: Option<RawCenter>,
    #[serde(default)]
    tags: Option<Map<String, Value>>,
}

impl RawElement {
    /// Direct coordinates for nodes, `center` for ways and relations.
    fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.lat, self.lon, self.center) {
            (Some(lat), Some(lon), _) => Some((lat, lon)),
            (_, _, Some(center)) => Some((center.lat, center.lon)),
            _ => None,
        }
    }
}

/// Quote a string for use inside an Overpass QL `"..."` literal.
fn escape_ql(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out
}

pub fn build_query(query: &PoiQuery) -> String {
    let filters: String = query
        .tags
        .iter()
        .map(|(key, value)| format!("[\"{}\"=\"{}\"]", escape_ql(key), escape_ql(value)))
        .collect();

    let area = match query.area {
        SearchArea::BoundingBox([south, west, north, east]) => {
            format!("({south},{west},{north},{east})")
        }
        SearchArea::Around([lat, lon]) => format!("(around:{AROUND_RADIUS_M},{lat},{lon})"),
    };

    format!(
        "[out:json][timeout:{QUERY_TIMEOUT_SECS}];\
         (node{filters}{area};way{filters}{area};relation{filters}{area};);\
         out center {limit};",
        limit = query.limit
    )
}

/// Search for elements matching every tag filter inside the area.
///
/// Elements with no usable coordinate are dropped with a warning; that never
/// fails the call.
pub async fn poi_search(client: &UpstreamClient, query: &PoiQuery) -> Envelope<Vec<Poi>> {
    let ql = build_query(query);
    let form = [("data", ql)];

    let raw: RawResponse = match client.post_form_json(&client.endpoints().overpass, &form).await {
        Ok(raw) => raw,
        Err(UpstreamError::Status { status, reason }) => {
            return Envelope::failure(
                ErrorCode::OverpassError,
                format!("Overpass API error: {status} {reason}"),
            );
        }
        Err(e) => {
            return Envelope::failure(ErrorCode::PoiSearchError, format!("Failed to search POIs: {e}"));
        }
    };

    let mut warnings = Vec::new();
    let mut pois = Vec::with_capacity(raw.elements.len());

    for element in raw.elements {
        let Some((lat, lon)) = element.coordinates() else {
            warn!(element_id = element.id, "overpass element without coordinates");
            warnings.push(format!("Element {} has no coordinates, skipping", element.id));
            continue;
        };

        let tags = element.tags.unwrap_or_default();
        let name = tags.get("name").and_then(Value::as_str).map(String::from);

        pois.push(Poi {
            id: element.id,
            name,
            lat,
            lon,
            tags,
            kind: element.kind,
        });
    }

    info!(results = pois.len(), skipped = warnings.len(), "poi search completed");
    Envelope::success(Source::Overpass, pois, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn bbox_query_filters_every_element_kind() {
        let query = PoiQuery {
            tags: tags(&[("amenity", "cafe"), ("cuisine", "coffee_shop")]),
            area: SearchArea::BoundingBox([52.5, 13.3, 52.6, 13.5]),
            limit: 25,
        };

        assert_eq!(
            build_query(&query),
            "[out:json][timeout:25];\
             (node[\"amenity\"=\"cafe\"][\"cuisine\"=\"coffee_shop\"](52.5,13.3,52.6,13.5);\
             way[\"amenity\"=\"cafe\"][\"cuisine\"=\"coffee_shop\"](52.5,13.3,52.6,13.5);\
             relation[\"amenity\"=\"cafe\"][\"cuisine\"=\"coffee_shop\"](52.5,13.3,52.6,13.5););\
             out center 25;"
        );
    }

    #[test]
    fn center_query_uses_fixed_radius() {
        let query = PoiQuery {
            tags: tags(&[("shop", "bakery")]),
            area: SearchArea::Around([48.8566, 2.3522]),
            limit: 5,
        };

        let ql = build_query(&query);
        assert!(ql.contains("node[\"shop\"=\"bakery\"](around:1000,48.8566,2.3522);"));
        assert!(ql.ends_with("out center 5;"));
    }

    #[test]
    fn quotes_in_tags_cannot_escape_the_literal() {
        let query = PoiQuery {
            tags: tags(&[("name", "Joe's \"Diner\"\"];out;")]),
            area: SearchArea::Around([0.0, 0.0]),
            limit: 1,
        };

        let ql = build_query(&query);
        assert!(ql.contains(r#"["name"="Joe's \"Diner\"\"];out;"]"#));
    }

    #[test]
    fn backslashes_are_escaped_first() {
        assert_eq!(escape_ql(r#"a\"b"#), r#"a\\\"b"#);
        assert_eq!(escape_ql("line\nbreak"), "line\\nbreak");
    }

    #[test]
    fn coordinates_fall_back_to_center() {
        let way: RawElement = serde_json::from_str(
            r#"{"type":"way","id":7,"center":{"lat":1.5,"lon":2.5},"tags":{}}"#,
        )
        .unwrap();
        assert_eq!(way.coordinates(), Some((1.5, 2.5)));

        let bare: RawElement = serde_json::from_str(r#"{"type":"node","id":8}"#).unwrap();
        assert_eq!(bare.coordinates(), None);
    }
}
