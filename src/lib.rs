//! JSON-RPC tool server for OpenStreetMap services.
//!
//! Exposes `geocode`, `reverse_geocode` (Nominatim), `poi_search` (Overpass)
//! and `route` (OSRM) as MCP tools over a single HTTP JSON-RPC 2.0 endpoint.
//! Every tool answers with the same `{ok, data | error, meta}` envelope, and
//! every outbound request shares one throttle gate.

pub mod config;
pub mod envelope;
pub mod handlers;
pub mod logging;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod throttle;
pub mod upstream;
pub mod validation;

pub mod schema;
