//! Types shared by the delivery module.

/// Receipt for a delivered artifact.
#[derive(Debug, Clone)]
pub struct Delivery {
    /// The derived output key the artifact was delivered under.
    pub output_key: String,
    /// Human-readable final destination (path or bucket/key).
    pub destination: String,
    /// Delivered size in bytes.
    pub size_bytes: u64,
    /// Wall-clock delivery time in milliseconds.
    pub duration_ms: u64,
}
