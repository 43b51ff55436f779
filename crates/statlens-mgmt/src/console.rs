//! HTTP management console.
//!
//! - `GET  /registries`                                 : published addresses
//! - `GET  /registries/:address`                        : visible descriptors
//! - `GET  /registries/:address/attributes/:name`       : attribute value
//! - `POST /registries/:address/operations/:name`       : invoke (JSON array body)

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use dashmap::DashMap;
use serde_json::{json, Value};
use thiserror::Error;
use tokio::net::TcpListener;

use statlens_core::error::{ErrorCode, Result, StatsError};

use crate::descriptor::{AttributeValue, RegistryInfo};
use crate::publish::{validate_address, Publisher};
use crate::registry::ManagementRegistry;

/// In-process directory of published registries, served over HTTP.
#[derive(Clone, Default)]
pub struct ConsolePublisher {
    registries: Arc<DashMap<String, Arc<ManagementRegistry>>>,
}

impl ConsolePublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Published addresses, sorted.
    pub fn addresses(&self) -> Vec<String> {
        let mut out: Vec<String> = self.registries.iter().map(|e| e.key().clone()).collect();
        out.sort();
        out
    }

    pub fn get(&self, address: &str) -> Option<Arc<ManagementRegistry>> {
        self.registries.get(address).map(|e| Arc::clone(e.value()))
    }

    fn lookup(&self, address: &str) -> Result<Arc<ManagementRegistry>> {
        self.get(address)
            .ok_or_else(|| StatsError::NotFound(format!("no registry published at {address}")))
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/registries", get(list_registries))
            .route("/registries/:address", get(registry_info))
            .route("/registries/:address/attributes/:name", get(get_attribute))
            .route("/registries/:address/operations/:name", post(invoke_operation))
            .with_state(self.clone())
    }
}

impl Publisher for ConsolePublisher {
    fn publish(&self, registry: Arc<ManagementRegistry>) -> Result<()> {
        validate_address(registry.address())?;
        let address = registry.address().to_string();
        let existing = self
            .registries
            .entry(address.clone())
            .or_insert_with(|| Arc::clone(&registry))
            .value()
            .clone();
        if Arc::ptr_eq(&existing, &registry) {
            Ok(())
        } else {
            Err(StatsError::AlreadyPublished(address))
        }
    }

    fn unpublish(&self, address: &str) -> Result<()> {
        validate_address(address)?;
        self.registries
            .remove(address)
            .map(|_| ())
            .ok_or_else(|| StatsError::NotFound(format!("no registry published at {address}")))
    }
}

/// Serve the console until the listener fails.
pub async fn serve(listener: TcpListener, publisher: ConsolePublisher) -> Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "management console listening");
    }
    axum::serve(listener, publisher.router())
        .await
        .map_err(|e| StatsError::Internal(format!("console server failed: {e}")))
}

/// Error body: `{"code": "...", "msg": "..."}`.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ConsoleError(#[from] pub StatsError);

impl ConsoleError {
    pub fn status(&self) -> StatusCode {
        match self.0.code() {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::InvalidArgument | ErrorCode::InvalidAddress => StatusCode::BAD_REQUEST,
            ErrorCode::AlreadyPublished => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ConsoleError {
    fn into_response(self) -> Response {
        let body = json!({
            "code": self.0.code().as_str(),
            "msg": self.0.to_string(),
        });
        (self.status(), Json(body)).into_response()
    }
}

pub async fn list_registries(State(console): State<ConsolePublisher>) -> Json<Vec<String>> {
    Json(console.addresses())
}

pub async fn registry_info(
    State(console): State<ConsolePublisher>,
    Path(address): Path<String>,
) -> std::result::Result<Json<RegistryInfo>, ConsoleError> {
    Ok(Json(console.lookup(&address)?.info()))
}

pub async fn get_attribute(
    State(console): State<ConsolePublisher>,
    Path((address, name)): Path<(String, String)>,
) -> std::result::Result<Json<AttributeValue>, ConsoleError> {
    let registry = console.lookup(&address)?;
    Ok(Json(registry.attribute(&name)?))
}

/// A missing body means no arguments.
pub async fn invoke_operation(
    State(console): State<ConsolePublisher>,
    Path((address, name)): Path<(String, String)>,
    args: Option<Json<Vec<Value>>>,
) -> std::result::Result<StatusCode, ConsoleError> {
    let registry = console.lookup(&address)?;
    let args = args.map(|Json(a)| a).unwrap_or_default();
    registry.invoke(&name, &args)?;
    tracing::debug!(registry = %address, operation = %name, "invoked");
    Ok(StatusCode::NO_CONTENT)
}
