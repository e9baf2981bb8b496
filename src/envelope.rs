//! Uniform success/failure wrapper returned by every tool.
//!
//! ```json
//! {"ok":true,"data":[...],"meta":{"retrieved_at":"...","warnings":[],"source":"nominatim","pagination":{"next_cursor":null}}}
//! {"ok":false,"error":{"code":"OSRM_NO_ROUTE","message":"..."},"meta":{"retrieved_at":"...","warnings":[]}}
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Upstream service that produced a successful response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Nominatim,
    Overpass,
    Osrm,
}

/// Domain error codes carried inside a failure envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    InternalError,
    NominatimError,
    NominatimNotFound,
    GeocodeError,
    ReverseGeocodeError,
    OverpassError,
    PoiSearchError,
    OsrmError,
    OsrmRouteError,
    OsrmNoRoute,
    RouteError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationError => "VALIDATION_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
            Self::NominatimError => "NOMINATIM_ERROR",
            Self::NominatimNotFound => "NOMINATIM_NOT_FOUND",
            Self::GeocodeError => "GEOCODE_ERROR",
            Self::ReverseGeocodeError => "REVERSE_GEOCODE_ERROR",
            Self::OverpassError => "OVERPASS_ERROR",
            Self::PoiSearchError => "POI_SEARCH_ERROR",
            Self::OsrmError => "OSRM_ERROR",
            Self::OsrmRouteError => "OSRM_ROUTE_ERROR",
            Self::OsrmNoRoute => "OSRM_NO_ROUTE",
            Self::RouteError => "ROUTE_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// None of the upstreams paginate, so `next_cursor` is always `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeMeta {
    pub retrieved_at: DateTime<Utc>,
    /// Non-fatal notices in the order they were raised.
    pub warnings: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeError {
    pub code: ErrorCode,
    pub message: String,
}

/// Exactly one of `data` / `error` is present, selected by `ok`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Envelope<T> {
    Success {
        ok: True,
        data: T,
        meta: EnvelopeMeta,
    },
    Failure {
        ok: False,
        error: EnvelopeError,
        meta: EnvelopeMeta,
    },
}

impl<T> Envelope<T> {
    pub fn success(source: Source, data: T, warnings: Vec<String>) -> Self {
        Self::Success {
            ok: True,
            data,
            meta: EnvelopeMeta {
                retrieved_at: Utc::now(),
                warnings,
                source: Some(source),
                pagination: Some(Pagination::default()),
            },
        }
    }

    pub fn failure(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Failure {
            ok: False,
            error: EnvelopeError {
                code,
                message: message.into(),
            },
            meta: EnvelopeMeta {
                retrieved_at: Utc::now(),
                warnings: Vec::new(),
                source: None,
                pagination: None,
            },
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn meta(&self) -> &EnvelopeMeta {
        match self {
            Self::Success { meta, .. } | Self::Failure { meta, .. } => meta,
        }
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Success { data, .. } => Some(data),
            Self::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&EnvelopeError> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error, .. } => Some(error),
        }
    }
}

impl<T: Serialize> Envelope<T> {
    /// Erase the payload type so the dispatcher can treat every tool alike.
    pub fn into_json(self) -> Result<Envelope<Value>, serde_json::Error> {
        Ok(match self {
            Self::Success { ok, data, meta } => Envelope::Success {
                ok,
                data: serde_json::to_value(data)?,
                meta,
            },
            Self::Failure { ok, error, meta } => Envelope::Failure { ok, error, meta },
        })
    }
}

/// Serializes as the JSON literal `true`; rejects anything else on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct True;

/// Serializes as the JSON literal `false`; rejects anything else on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct False;

macro_rules! bool_literal {
    ($ty:ident, $value:literal) => {
        impl Serialize for $ty {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_bool($value)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                if bool::deserialize(deserializer)? == $value {
                    Ok($ty)
                } else {
                    Err(serde::de::Error::custom(concat!("expected ok: ", stringify!($value))))
                }
            }
        }
    };
}

bool_literal!(True, true);
bool_literal!(False, false);
