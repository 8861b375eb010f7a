//! 基于 `serialport` 的真实串口适配器

use crate::{SerialAdapter, SerialError};
use serialport::{ClearBuffer, SerialPort};
use std::io::{ErrorKind, Read, Write};
use std::time::Duration;
use tracing::{debug, trace};

/// 单次读取的缓冲区大小（控制板应答都很短）
const READ_CHUNK: usize = 256;

/// 真实串口
pub struct SerialPortAdapter {
    port: Option<Box<dyn SerialPort>>,
    name: String,
    read_timeout: Duration,
}

impl SerialPortAdapter {
    /// 打开串口（8N1，无流控）
    pub fn open(path: &str, baud_rate: u32, read_timeout: Duration) -> Result<Self, SerialError> {
        let port = serialport::new(path, baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .timeout(read_timeout)
            .open()?;
        // 丢弃打开前残留在接收缓冲里的字节
        port.clear(ClearBuffer::Input)?;
        debug!("Opened serial port {} at {} bps", path, baud_rate);
        Ok(Self {
            port: Some(port),
            name: path.to_string(),
            read_timeout,
        })
    }

    fn port_mut(&mut self) -> Result<&mut Box<dyn SerialPort>, SerialError> {
        self.port.as_mut().ok_or(SerialError::NotOpen)
    }

    fn apply_timeout(&mut self, timeout: Duration) -> Result<(), SerialError> {
        if timeout != self.read_timeout {
            self.port_mut()?.set_timeout(timeout)?;
            self.read_timeout = timeout;
        }
        Ok(())
    }
}

impl SerialAdapter for SerialPortAdapter {
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), SerialError> {
        let port = self.port_mut()?;
        port.write_all(bytes)?;
        port.flush()?;
        trace!("Wrote {} bytes", bytes.len());
        Ok(())
    }

    fn read_available(&mut self, timeout: Duration) -> Result<Vec<u8>, SerialError> {
        self.apply_timeout(timeout)?;
        let port = self.port_mut()?;
        let mut buf = [0u8; READ_CHUNK];
        let mut data = Vec::new();
        loop {
            match port.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    data.extend_from_slice(&buf[..n]);
                    // 只取已经到达的字节，不再等待后续数据
                    if port.bytes_to_read()? == 0 {
                        break;
                    }
                },
                Err(e) if e.kind() == ErrorKind::TimedOut => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        if data.is_empty() {
            return Err(SerialError::Timeout);
        }
        Ok(data)
    }

    fn read_byte(&mut self, timeout: Duration) -> Result<u8, SerialError> {
        self.apply_timeout(timeout)?;
        let port = self.port_mut()?;
        let mut buf = [0u8; 1];
        match port.read_exact(&mut buf) {
            Ok(()) => Ok(buf[0]),
            Err(e) if e.kind() == ErrorKind::TimedOut => Err(SerialError::Timeout),
            Err(e) => Err(e.into()),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            debug!("Closed serial port {}", self.name);
        }
    }
}
