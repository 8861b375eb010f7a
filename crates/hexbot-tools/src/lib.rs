//! # HexBot Tools - 配置文件与热加载
//!
//! **依赖原则**: 只依赖 `hexbot-protocol`，不引入串口和驱动
//!
//! ## 包含模块
//!
//! - `sequence_file` - 步态序列文件（扁平 TOML 表，缺失键取默认值）
//! - `config` - 串口与运行参数配置
//! - `watcher` - 序列文件热加载（轮询修改时间）

pub mod config;
pub mod sequence_file;
pub mod watcher;

use std::path::PathBuf;
use thiserror::Error;

// 重新导出常用类型
pub use config::HexbotConfig;
pub use sequence_file::{load_sequence, parse_sequence, save_sequence};
pub use watcher::{SequenceFile, SequenceWatcher};

/// 配置文件错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid value: {0}")]
    Validation(#[from] hexbot_protocol::ValidationError),

    #[error("Unsupported baud rate {0} (expected 9600, 38400 or 115200)")]
    UnsupportedBaudRate(u32),
}

impl ConfigError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::Io {
            path: path.into(),
            source,
        }
    }
}
