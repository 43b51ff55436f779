//! Publishing registries to an external management surface.

use std::sync::Arc;

use statlens_core::error::{Result, StatsError};

use crate::registry::ManagementRegistry;

/// Surface registries are exposed on. Failures are reported to the caller,
/// who logs them; a registry keeps working unpublished.
pub trait Publisher: Send + Sync {
    /// Expose `registry` under its address. Publishing the same registry twice
    /// is a no-op; a different registry at a taken address is `AlreadyPublished`.
    fn publish(&self, registry: Arc<ManagementRegistry>) -> Result<()>;

    fn unpublish(&self, address: &str) -> Result<()>;
}

/// Validates addresses and otherwise exposes nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPublisher;

impl Publisher for NoopPublisher {
    fn publish(&self, registry: Arc<ManagementRegistry>) -> Result<()> {
        validate_address(registry.address())
    }

    fn unpublish(&self, address: &str) -> Result<()> {
        validate_address(address)
    }
}

const RESERVED: [char; 5] = [',', '=', ':', '*', '?'];

/// Check `<domain>:<key>=<value>[,<key>=<value>...]`.
pub fn validate_address(address: &str) -> Result<()> {
    let invalid = |why: &str| Err(StatsError::InvalidAddress(format!("{address}: {why}")));

    let Some((domain, props)) = address.split_once(':') else {
        return invalid("missing ':' after domain");
    };
    if domain.is_empty() {
        return invalid("empty domain");
    }
    if domain.contains(['*', '?', '\n']) {
        return invalid("domain contains a pattern character");
    }
    if props.is_empty() {
        return invalid("missing key properties");
    }
    for prop in props.split(',') {
        let Some((key, value)) = prop.split_once('=') else {
            return invalid("key property without '='");
        };
        if key.is_empty() || value.is_empty() {
            return invalid("empty key or value");
        }
        if key.contains(RESERVED) || value.contains(RESERVED) {
            return invalid("reserved character in key property");
        }
    }
    Ok(())
}
