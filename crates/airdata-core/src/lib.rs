pub mod config;
pub mod encoder;
pub mod error;
pub mod fetcher;
pub mod model;
pub mod pipeline;
pub mod publisher;

pub use config::{AwairConfig, ExportConfig};
pub use encoder::encode;
pub use error::{ConfigError, EncodeError, ExportError, FetchError, PublishError};
pub use fetcher::{AirDataSource, AwairClient};
pub use model::{storage_key, Reading, TimePoint, TimeWindow, TriggerEvent};
pub use pipeline::{prepare_export, run_export, ExportOptions, ExportSummary, PreparedExport};
pub use publisher::Publisher;
