pub mod config;
pub mod converter;
pub mod delivery;
pub mod metrics;
pub mod pipeline;
pub mod queue;
pub mod resolver;
pub mod storage;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, AdminConfig, Config, ConfigError,
    NameRuleConfig, OutputConfig, QueueConfig, StorageConfig,
};
pub use converter::{Converter, ConverterConfig, ConverterError, ToolConverter};
pub use delivery::{BucketDelivery, DeliveryBackend, DeliveryError, FsDelivery};
pub use pipeline::{Job, JobOutcome, JobPipeline, PipelineConfig, SkipReason, WorkerPool};
pub use queue::{AckToken, InboundMessage, Notification, QueueClient, QueueError, SqsQueueClient};
pub use resolver::{ResolverError, RuleSet};
pub use storage::{HttpObjectStore, ObjectStore, StorageError};
