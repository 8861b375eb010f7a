//! # HexBot Serial Adapter Layer
//!
//! 串口硬件抽象层，为 SSC-32 控制板和蓝牙串口提供统一的字节流接口。
//!
//! - [`SerialAdapter`]：写入/带超时读取的最小接口
//! - [`SerialPortAdapter`]：基于 `serialport` 的真实串口（feature `hardware`）
//! - [`LineBuffer`]：把分片到达的字节流切分为文本行
//! - [`MockSerialAdapter`]：记录写入、回放预置应答（feature `mock` 或测试）

use std::time::Duration;
use thiserror::Error;

pub mod line;

pub use line::LineBuffer;

#[cfg(feature = "hardware")]
pub mod port;

#[cfg(feature = "hardware")]
pub use port::SerialPortAdapter;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

#[cfg(any(test, feature = "mock"))]
pub use mock::{MockHandle, MockSerialAdapter};

/// 串口适配层统一错误类型
#[derive(Error, Debug)]
pub enum SerialError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Port Error: {0}")]
    Port(String),
    #[error("Read timeout")]
    Timeout,
    #[error("Port not open")]
    NotOpen,
}

#[cfg(feature = "hardware")]
impl From<serialport::Error> for SerialError {
    fn from(e: serialport::Error) -> Self {
        match e.kind() {
            serialport::ErrorKind::Io(kind) => SerialError::Io(std::io::Error::new(kind, e.description)),
            _ => SerialError::Port(e.to_string()),
        }
    }
}

/// 串口适配器
///
/// 实现方只负责字节搬运，不理解协议内容。所有方法都是阻塞的，
/// 读取以超时为界。
pub trait SerialAdapter: Send {
    /// 写入全部字节并刷新
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), SerialError>;

    /// 读取当前可用的全部字节
    ///
    /// 在 `timeout` 内没有任何字节到达时返回 [`SerialError::Timeout`]。
    fn read_available(&mut self, timeout: Duration) -> Result<Vec<u8>, SerialError>;

    /// 读取单个字节
    fn read_byte(&mut self, timeout: Duration) -> Result<u8, SerialError>;

    /// 端口名称（用于日志）
    fn name(&self) -> &str;

    fn is_open(&self) -> bool {
        true
    }

    /// 关闭端口，之后的读写返回 [`SerialError::NotOpen`]
    fn close(&mut self) {}
}

impl<T: SerialAdapter + ?Sized> SerialAdapter for Box<T> {
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), SerialError> {
        (**self).write_all(bytes)
    }

    fn read_available(&mut self, timeout: Duration) -> Result<Vec<u8>, SerialError> {
        (**self).read_available(timeout)
    }

    fn read_byte(&mut self, timeout: Duration) -> Result<u8, SerialError> {
        (**self).read_byte(timeout)
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn close(&mut self) {
        (**self).close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(SerialError::Timeout.to_string(), "Read timeout");
        assert_eq!(SerialError::NotOpen.to_string(), "Port not open");
        let err = SerialError::Port("no such device".to_string());
        assert!(err.to_string().contains("no such device"));
    }

    #[test]
    fn test_boxed_adapter_forwards() {
        let (adapter, handle) = MockSerialAdapter::new("mock0");
        let mut boxed: Box<dyn SerialAdapter> = Box::new(adapter);
        boxed.write_all(b"VER\r").unwrap();
        assert_eq!(boxed.name(), "mock0");
        assert_eq!(handle.written_lines(), vec!["VER\r".to_string()]);
    }
}
