//! Mock 串口适配器
//!
//! 记录所有写入的字节，并按顺序回放预置的应答。适配器本身会被移交给
//! 驱动层，测试代码通过共享的 [`MockHandle`] 检查写入和注入应答。

use crate::{SerialAdapter, SerialError};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Default)]
struct MockState {
    written: Vec<Vec<u8>>,
    responses: VecDeque<Vec<u8>>,
    fail_writes: bool,
    closed: bool,
}

/// Mock 串口
#[derive(Debug)]
pub struct MockSerialAdapter {
    name: String,
    state: Arc<Mutex<MockState>>,
}

/// 测试侧句柄（线程安全，可克隆）
#[derive(Debug, Clone)]
pub struct MockHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockSerialAdapter {
    pub fn new(name: &str) -> (Self, MockHandle) {
        let state = Arc::new(Mutex::new(MockState::default()));
        let adapter = Self {
            name: name.to_string(),
            state: state.clone(),
        };
        (adapter, MockHandle { state })
    }
}

impl SerialAdapter for MockSerialAdapter {
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), SerialError> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(SerialError::NotOpen);
        }
        if state.fail_writes {
            return Err(SerialError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "mock write failure",
            )));
        }
        state.written.push(bytes.to_vec());
        Ok(())
    }

    fn read_available(&mut self, _timeout: Duration) -> Result<Vec<u8>, SerialError> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(SerialError::NotOpen);
        }
        state.responses.pop_front().ok_or(SerialError::Timeout)
    }

    fn read_byte(&mut self, _timeout: Duration) -> Result<u8, SerialError> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(SerialError::NotOpen);
        }
        let chunk = state.responses.front_mut().ok_or(SerialError::Timeout)?;
        if chunk.is_empty() {
            state.responses.pop_front();
            return Err(SerialError::Timeout);
        }
        let byte = chunk.remove(0);
        if chunk.is_empty() {
            state.responses.pop_front();
        }
        Ok(byte)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn is_open(&self) -> bool {
        !self.state.lock().closed
    }

    fn close(&mut self) {
        self.state.lock().closed = true;
    }
}

impl MockHandle {
    /// 预置一段应答（一次读取返回一段）
    pub fn queue_response(&self, bytes: impl AsRef<[u8]>) {
        self.state.lock().responses.push_back(bytes.as_ref().to_vec());
    }

    /// 预置多段应答
    pub fn queue_responses<I, B>(&self, responses: I)
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        let mut state = self.state.lock();
        for response in responses {
            state.responses.push_back(response.as_ref().to_vec());
        }
    }

    /// 剩余未被读取的应答数
    pub fn pending_responses(&self) -> usize {
        self.state.lock().responses.len()
    }

    /// 之后的写入全部失败
    pub fn set_fail_writes(&self, fail: bool) {
        self.state.lock().fail_writes = fail;
    }

    /// 每次写入的内容（按文本解码）
    pub fn written_lines(&self) -> Vec<String> {
        self.state
            .lock()
            .written
            .iter()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .collect()
    }

    /// 取出并清空写入记录
    pub fn take_written_lines(&self) -> Vec<String> {
        std::mem::take(&mut self.state.lock().written)
            .into_iter()
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .collect()
    }

    pub fn write_count(&self) -> usize {
        self.state.lock().written.len()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_millis(100);

    #[test]
    fn test_records_writes() {
        let (mut adapter, handle) = MockSerialAdapter::new("mock");
        adapter.write_all(b"#6P1000\r").unwrap();
        adapter.write_all(b"XSTOP\r").unwrap();
        assert_eq!(handle.write_count(), 2);
        assert_eq!(handle.take_written_lines(), vec!["#6P1000\r", "XSTOP\r"]);
        assert_eq!(handle.write_count(), 0);
    }

    #[test]
    fn test_replays_responses_in_order() {
        let (mut adapter, handle) = MockSerialAdapter::new("mock");
        handle.queue_responses(["+", "."]);
        assert_eq!(adapter.read_available(TIMEOUT).unwrap(), b"+");
        assert_eq!(adapter.read_available(TIMEOUT).unwrap(), b".");
        assert!(matches!(
            adapter.read_available(TIMEOUT),
            Err(SerialError::Timeout)
        ));
    }

    #[test]
    fn test_read_byte_consumes_chunk() {
        let (mut adapter, handle) = MockSerialAdapter::new("mock");
        handle.queue_response([150u8, 200u8]);
        assert_eq!(adapter.read_byte(TIMEOUT).unwrap(), 150);
        assert_eq!(handle.pending_responses(), 1);
        assert_eq!(adapter.read_byte(TIMEOUT).unwrap(), 200);
        assert_eq!(handle.pending_responses(), 0);
        assert!(matches!(adapter.read_byte(TIMEOUT), Err(SerialError::Timeout)));
    }

    #[test]
    fn test_write_failure_and_close() {
        let (mut adapter, handle) = MockSerialAdapter::new("mock");
        handle.set_fail_writes(true);
        assert!(matches!(adapter.write_all(b"Q\r"), Err(SerialError::Io(_))));
        handle.set_fail_writes(false);

        adapter.close();
        assert!(handle.is_closed());
        assert!(!adapter.is_open());
        assert!(matches!(adapter.write_all(b"Q\r"), Err(SerialError::NotOpen)));
        assert_eq!(handle.write_count(), 0);
    }
}
