//! Trait definitions for the delivery module.

use async_trait::async_trait;
use std::path::Path;

use super::error::DeliveryError;
use super::types::Delivery;

/// A backend that places converted artifacts at their final destination.
#[async_trait]
pub trait DeliveryBackend: Send + Sync {
    /// Returns the name of this delivery implementation.
    fn name(&self) -> &str;

    /// Delivers an artifact under the given output key.
    ///
    /// On success the scratch artifact has been consumed (removed). On
    /// failure the artifact is left in place for the caller to dispose of
    /// or retain for diagnostics.
    async fn deliver(&self, artifact: &Path, output_key: &str) -> Result<Delivery, DeliveryError>;

    /// Validates that the backend is properly configured and ready.
    async fn validate(&self) -> Result<(), DeliveryError>;
}
