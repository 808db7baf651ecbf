mod settings;

pub use settings::{LoggingConfig, RenderConfig, ServerConfig, Settings, StoreConfig};
