//! OSRM turn-by-turn routing.
//!
//! Callers give coordinates as `[lat, lon]`; OSRM wants `lon,lat` in the
//! request path. [`coordinate_path`] owns that swap.

use serde::{Deserialize, Serialize};
use tracing::info;

use super::{UpstreamClient, UpstreamError};
use crate::envelope::{Envelope, ErrorCode, Source};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    #[default]
    Driving,
    Cycling,
    Walking,
}

impl TravelMode {
    /// Wire names, in the order `tools/list` advertises them.
    pub const NAMES: [&'static str; 3] = ["driving", "cycling", "walking"];

    /// OSRM profile token for this mode.
    pub fn profile(self) -> &'static str {
        match self {
            Self::Driving => "car",
            Self::Cycling => "bike",
            Self::Walking => "foot",
        }
    }
}

/// Validated input for the `route` tool.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct RouteQuery {
    /// `[lat, lon]`
    pub start: [f64; 2],
    /// `[lat, lon]`
    pub end: [f64; 2],
    #[serde(default)]
    pub mode: TravelMode,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteStep {
    pub instruction: String,
    pub name: String,
    pub distance_km: f64,
    pub duration_minutes: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteSummary {
    pub distance_km: f64,
    pub duration_minutes: f64,
    pub summary: String,
    /// Encoded polyline, passed through from OSRM.
    pub geometry: String,
    pub steps: Vec<RouteStep>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<RawRoute>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawRoute {
    distance: f64,
    duration: f64,
    #[serde(default)]
    geometry: String,
    #[serde(default)]
    legs: Vec<RawLeg>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawLeg {
    #[serde(default)]
    summary: String,
    #[serde(default)]
    steps: Vec<RawStep>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawStep {
    #[serde(default)]
    name: String,
    #[serde(default)]
    distance: f64,
    #[serde(default)]
    duration: f64,
    maneuver: Maneuver,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Maneuver {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub modifier: Option<String>,
}

impl Maneuver {
    /// Human-readable instruction for this maneuver.
    pub fn instruction(&self) -> String {
        let modifier = self.modifier.as_deref();
        match self.kind.as_str() {
            "depart" => "Depart".to_string(),
            "arrive" => "Arrive at destination".to_string(),
            "turn" => format!("Turn {}", modifier.unwrap_or("ahead")),
            "continue" => "Continue straight".to_string(),
            "merge" => format!("Merge {}", modifier.unwrap_or("")).trim().to_string(),
            "fork" => format!("Take the {}", modifier.unwrap_or("fork")),
            "roundabout" => "Enter roundabout".to_string(),
            "exit roundabout" => "Exit roundabout".to_string(),
            "new name" => "Continue".to_string(),
            "end of road" => format!("At end of road, turn {}", modifier.unwrap_or("ahead")),
            "notification" => modifier.unwrap_or("Continue").to_string(),
            other => match modifier {
                Some(m) => format!("{other} {m}"),
                None => other.to_string(),
            },
        }
    }
}

/// `lon,lat;lon,lat` path segment for a `[lat, lon]` pair of points.
pub fn coordinate_path(start: [f64; 2], end: [f64; 2]) -> String {
    let [start_lat, start_lon] = start;
    let [end_lat, end_lon] = end;
    format!("{start_lon},{start_lat};{end_lon},{end_lat}")
}

fn summarize(route: RawRoute) -> RouteSummary {
    let summary = route
        .legs
        .iter()
        .map(|leg| leg.summary.as_str())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" via ");

    let steps = route
        .legs
        .into_iter()
        .flat_map(|leg| leg.steps)
        .map(|step| RouteStep {
            instruction: step.maneuver.instruction(),
            name: step.name,
            distance_km: step.distance / 1000.0,
            duration_minutes: step.duration / 60.0,
        })
        .collect();

    RouteSummary {
        distance_km: route.distance / 1000.0,
        duration_minutes: route.duration / 60.0,
        summary,
        geometry: route.geometry,
        steps,
    }
}

/// Plan a route between two points using the first candidate OSRM returns.
pub async fn route(client: &UpstreamClient, query: &RouteQuery) -> Envelope<RouteSummary> {
    let url = format!(
        "{}/route/v1/{}/{}",
        client.endpoints().osrm,
        query.mode.profile(),
        coordinate_path(query.start, query.end)
    );
    let params = [
        ("overview", "full".to_string()),
        ("geometries", "polyline".to_string()),
        ("steps", "true".to_string()),
    ];

    let raw: RawResponse = match client.get_json(&url, &params).await {
        Ok(raw) => raw,
        Err(UpstreamError::Status { status, reason }) => {
            return Envelope::failure(ErrorCode::OsrmError, format!("OSRM API error: {status} {reason}"));
        }
        Err(e) => {
            return Envelope::failure(ErrorCode::RouteError, format!("Failed to calculate route: {e}"));
        }
    };

    if raw.code != "Ok" {
        let detail = raw.message.map(|m| format!(": {m}")).unwrap_or_default();
        return Envelope::failure(
            ErrorCode::OsrmRouteError,
            format!("OSRM returned code {}{detail}", raw.code),
        );
    }

    let Some(first) = raw.routes.into_iter().next() else {
        return Envelope::failure(ErrorCode::OsrmNoRoute, "No route found between the given points");
    };

    let summary = summarize(first);
    info!(
        profile = query.mode.profile(),
        distance_km = summary.distance_km,
        steps = summary.steps.len(),
        "route completed"
    );
    Envelope::success(Source::Osrm, summary, Vec::new())
}
