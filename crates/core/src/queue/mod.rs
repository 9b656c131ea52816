//! Inbound notification queue abstraction.
//!
//! The pipeline consumes the queue only through the `QueueClient` trait:
//! long-poll receive and batch acknowledge. `SqsQueueClient` is a reference
//! client speaking the SQS JSON protocol against a compatible endpoint.
//!
//! Message bodies are object-storage event documents; each record in a body
//! becomes one `InboundMessage` carrying the parsed notification and the
//! opaque acknowledgment token of the queue message it arrived in.

mod error;
mod sqs;
mod traits;
mod types;

pub use error::QueueError;
pub use sqs::SqsQueueClient;
pub use traits::QueueClient;
pub use types::{parse_notification_body, AckToken, InboundMessage, Notification};
