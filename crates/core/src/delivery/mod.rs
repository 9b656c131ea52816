//! Delivery of converted artifacts to their final destination.
//!
//! Exactly one backend is active per process: a filesystem tree rooted at a
//! configured directory, or a second storage bucket. Both consume the
//! artifact: on success the scratch copy is removed.

mod bucket;
mod error;
mod fs;
mod traits;
mod types;

pub use bucket::BucketDelivery;
pub use error::DeliveryError;
pub use fs::FsDelivery;
pub use traits::DeliveryBackend;
pub use types::Delivery;
