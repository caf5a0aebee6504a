use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::config::Config;

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub environment: String,
    pub gateways_enabled: Vec<String>,
    pub default_currency: String,
}

pub async fn health_check(
    State(config): State<Config>,
) -> Result<Json<HealthResponse>, StatusCode> {
    let version = env!("CARGO_PKG_VERSION").to_string();

    let response = HealthResponse {
        status: "healthy".to_string(),
        version,
        environment: config.server.environment.clone(),
        gateways_enabled: config.gateways.enabled.clone(),
        default_currency: config.gateways.default_currency.clone(),
    };

    Ok(Json(response))
}
