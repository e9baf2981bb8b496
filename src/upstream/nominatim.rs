//! Nominatim forward and reverse geocoding.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

use super::{UpstreamClient, UpstreamError};
use crate::envelope::{Envelope, ErrorCode, Source};

const SEARCH_LIMIT: u32 = 10;

/// Validated input for the `geocode` tool.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeocodeQuery {
    pub query: String,
    /// `[min_lon, min_lat, max_lon, max_lat]`
    pub bbox: Option<[f64; 4]>,
    pub country_code: Option<String>,
}

/// Validated input for the `reverse_geocode` tool.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ReverseQuery {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeocodeResult {
    pub lat: f64,
    pub lon: f64,
    pub display_name: String,
    #[serde(rename = "type")]
    pub place_type: Option<String>,
    pub importance: Option<f64>,
    pub place_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub osm_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub osm_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boundingbox: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReverseResult {
    pub lat: f64,
    pub lon: f64,
    pub display_name: String,
    pub address: Map<String, Value>,
    pub place_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub osm_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub osm_id: Option<u64>,
}

/// One place record as Nominatim returns it. Coordinates arrive as strings.
#[derive(Debug, Clone, Deserialize)]
struct RawPlace {
    place_id: u64,
    #[serde(default)]
    osm_type: Option<String>,
    #[serde(default)]
    osm_id: Option<u64>,
    lat: String,
    lon: String,
    display_name: String,
    #[serde(default, rename = "type")]
    place_type: Option<String>,
    #[serde(default)]
    importance: Option<f64>,
    #[serde(default)]
    boundingbox: Option<Vec<String>>,
    #[serde(default)]
    address: Map<String, Value>,
}

/// `/reverse` answers with either a place or `{"error": "..."}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawReverse {
    NotFound { error: String },
    Place(RawPlace),
}

fn parse_coord(raw: &str, field: &str) -> Result<f64, UpstreamError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| UpstreamError::Decode(format!("{field} '{raw}' is not a number")))
}

fn search_params(query: &GeocodeQuery) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("q", query.query.clone()),
        ("format", "json".to_string()),
        ("addressdetails", "1".to_string()),
        ("limit", SEARCH_LIMIT.to_string()),
    ];

    if let Some([min_lon, min_lat, max_lon, max_lat]) = query.bbox {
        // Nominatim wants x1,y1,x2,y2 as left,top,right,bottom.
        params.push(("viewbox", format!("{min_lon},{max_lat},{max_lon},{min_lat}")));
        params.push(("bounded", "1".to_string()));
    }

    if let Some(code) = &query.country_code {
        params.push(("countrycodes", code.to_lowercase()));
    }

    params
}

fn upstream_failure<T>(err: UpstreamError, local: ErrorCode, action: &str) -> Envelope<T> {
    match err {
        UpstreamError::Status { status, reason } => Envelope::failure(
            ErrorCode::NominatimError,
            format!("Nominatim API error: {status} {reason}"),
        ),
        other => Envelope::failure(local, format!("Failed to {action}: {other}")),
    }
}

/// Forward geocode a free-text query. An empty upstream array is a
/// successful, empty result.
pub async fn geocode(client: &UpstreamClient, query: &GeocodeQuery) -> Envelope<Vec<GeocodeResult>> {
    let url = format!("{}/search", client.endpoints().nominatim);
    let params = search_params(query);

    let raw: Vec<RawPlace> = match client.get_json(&url, &params).await {
        Ok(raw) => raw,
        Err(e) => return upstream_failure(e, ErrorCode::GeocodeError, "geocode"),
    };

    let results = match raw.into_iter().map(to_geocode_result).collect::<Result<Vec<_>, _>>() {
        Ok(results) => results,
        Err(e) => {
            warn!(error = %e, "nominatim search returned malformed place");
            return Envelope::failure(ErrorCode::GeocodeError, format!("Failed to geocode: {e}"));
        }
    };

    info!(results = results.len(), "geocode completed");
    Envelope::success(Source::Nominatim, results, Vec::new())
}

fn to_geocode_result(place: RawPlace) -> Result<GeocodeResult, UpstreamError> {
    Ok(GeocodeResult {
        lat: parse_coord(&place.lat, "lat")?,
        lon: parse_coord(&place.lon, "lon")?,
        display_name: place.display_name,
        place_type: place.place_type,
        importance: place.importance,
        place_id: place.place_id,
        osm_type: place.osm_type,
        osm_id: place.osm_id,
        boundingbox: place.boundingbox,
    })
}

/// Reverse geocode a coordinate to the nearest addressable place.
pub async fn reverse_geocode(client: &UpstreamClient, query: &ReverseQuery) -> Envelope<ReverseResult> {
    let url = format!("{}/reverse", client.endpoints().nominatim);
    let params = [
        ("lat", query.lat.to_string()),
        ("lon", query.lon.to_string()),
        ("format", "json".to_string()),
        ("addressdetails", "1".to_string()),
    ];

    let place = match client.get_json::<RawReverse>(&url, &params).await {
        Ok(RawReverse::Place(place)) => place,
        Ok(RawReverse::NotFound { error }) => {
            info!(lat = query.lat, lon = query.lon, reason = %error, "reverse geocode found nothing");
            return Envelope::failure(ErrorCode::NominatimNotFound, error);
        }
        Err(e) => return upstream_failure(e, ErrorCode::ReverseGeocodeError, "reverse geocode"),
    };

    match to_reverse_result(place) {
        Ok(result) => Envelope::success(Source::Nominatim, result, Vec::new()),
        Err(e) => Envelope::failure(
            ErrorCode::ReverseGeocodeError,
            format!("Failed to reverse geocode: {e}"),
        ),
    }
}

fn to_reverse_result(place: RawPlace) -> Result<ReverseResult, UpstreamError> {
    Ok(ReverseResult {
        lat: parse_coord(&place.lat, "lat")?,
        lon: parse_coord(&place.lon, "lon")?,
        display_name: place.display_name,
        address: place.address,
        place_id: place.place_id,
        osm_type: place.osm_type,
        osm_id: place.osm_id,
    })
}
