#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the violence map server.
//!
//! Map responses are raw `GeoJSON` and municipality responses reuse the
//! query summary types, so only the envelopes specific to HTTP live here.

use serde::{Deserialize, Serialize};
use violence_map_query_models::Scenario;

/// Plain-text body of `GET /`.
pub const ROOT_HEALTH_TEXT: &str = "API de Violência Doméstica - PE Online!";

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
}

/// Error body returned with every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Message safe to show to the caller.
    pub error: String,
}

/// Body of `POST /api/comparar`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareRequest {
    /// First municipality and period.
    pub scenario_a: Scenario,
    /// Second municipality and period.
    pub scenario_b: Scenario,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compare_request_reads_camel_case() {
        let request: CompareRequest = serde_json::from_str(
            r#"{"scenarioA": {"municipality": "Recife", "year": 2024, "month": 3},
                "scenarioB": {"municipality": "Olinda", "year": 2023, "month": 0}}"#,
        )
        .unwrap();

        assert_eq!(request.scenario_a.municipality, "Recife");
        assert_eq!(request.scenario_b.month, 0);
    }
}
