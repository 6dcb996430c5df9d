//! 日志初始化
//! Logging initialization

use crate::error::{FlockError, FlockResult};
use flock_kernel::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// 安装全局 `tracing` 订阅者
/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` wins over the configured level. Fails if a subscriber is
/// already installed.
pub fn init_logging(config: &LoggingConfig) -> FlockResult<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level).map_err(|e| FlockError::Logging(e.to_string()))?,
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    let result = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| FlockError::Logging(e.to_string()))
}
