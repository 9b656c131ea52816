//! Object storage abstraction.
//!
//! The pipeline consumes object storage only through the `ObjectStore`
//! trait: authenticated transport details belong to the implementation.
//! `HttpObjectStore` is a reference client for S3-compatible path-style
//! endpoints.

mod error;
mod http;
mod traits;

pub use error::StorageError;
pub use http::HttpObjectStore;
pub use traits::ObjectStore;
