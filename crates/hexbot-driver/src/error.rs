//! 驱动层错误类型定义

use hexbot_protocol::{ProtocolError, ValidationError};
use hexbot_serial::SerialError;
use thiserror::Error;

/// 驱动层错误类型
#[derive(Error, Debug)]
pub enum DriverError {
    /// 参数校验失败（未写入任何字节）
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// 串口传输错误
    #[error("Serial transport error: {0}")]
    Serial(#[from] SerialError),

    /// 应答解析错误
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// 操作超时
    #[error("Operation timeout")]
    Timeout,

    /// 命令通道已关闭（控制线程退出）
    #[error("Command channel closed")]
    ChannelClosed,

    /// 命令通道已满（缓冲区容量 10）
    #[error("Command channel full (buffer size: 10)")]
    ChannelFull,

    /// 控制线程错误
    #[error("IO thread error: {0}")]
    IoThread(String),

    /// 无效输入
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl DriverError {
    /// 是否为传输层错误（链路未打开、写入失败）
    pub fn is_transport(&self) -> bool {
        matches!(self, DriverError::Serial(_))
    }

    /// 是否为参数校验错误（调用方需要修正输入）
    pub fn is_validation(&self) -> bool {
        matches!(self, DriverError::Validation(_) | DriverError::InvalidInput(_))
    }
}
