//! 行缓冲
//!
//! 串口读取得到的是任意分片的字节块，一行可能分几次到达，
//! 一次读取也可能包含多行。`LineBuffer` 累积字节并按 `\r`、`\n`
//! 或 `\r\n` 切分出完整的行。

use std::collections::VecDeque;

/// 单行长度上限，超出后丢弃已累积的内容
pub const MAX_LINE_LENGTH: usize = 1024;

#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
    lines: VecDeque<String>,
    /// 上一个字节是 `\r`，紧随其后的 `\n` 属于同一个行结束符
    after_cr: bool,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一段字节
    pub fn push(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            match byte {
                b'\n' if self.after_cr => {
                    self.after_cr = false;
                },
                b'\r' | b'\n' => {
                    self.after_cr = byte == b'\r';
                    self.complete_line();
                },
                _ => {
                    self.after_cr = false;
                    if self.pending.len() >= MAX_LINE_LENGTH {
                        tracing::warn!("Discarding over-long line ({} bytes)", self.pending.len());
                        self.pending.clear();
                    }
                    self.pending.push(byte);
                },
            }
        }
    }

    /// 取出下一条完整的行（不含行结束符）
    pub fn next_line(&mut self) -> Option<String> {
        self.lines.pop_front()
    }

    /// 尚未结束的半行
    pub fn partial(&self) -> &[u8] {
        &self.pending
    }

    fn complete_line(&mut self) {
        let line = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        self.lines.push_back(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_across_chunks() {
        let mut buf = LineBuffer::new();
        buf.push(b"SPE");
        assert_eq!(buf.next_line(), None);
        assert_eq!(buf.partial(), b"SPE");
        buf.push(b"ED+\r");
        assert_eq!(buf.next_line().as_deref(), Some("SPEED+"));
        assert_eq!(buf.next_line(), None);
    }

    #[test]
    fn test_multiple_lines_and_terminators() {
        let mut buf = LineBuffer::new();
        buf.push(b"F\r\nB\nSTOP\r");
        assert_eq!(buf.next_line().as_deref(), Some("F"));
        assert_eq!(buf.next_line().as_deref(), Some("B"));
        assert_eq!(buf.next_line().as_deref(), Some("STOP"));
        assert_eq!(buf.next_line(), None);
    }

    #[test]
    fn test_crlf_split_between_chunks() {
        let mut buf = LineBuffer::new();
        buf.push(b"L\r");
        buf.push(b"\nR\r");
        assert_eq!(buf.next_line().as_deref(), Some("L"));
        assert_eq!(buf.next_line().as_deref(), Some("R"));
        assert_eq!(buf.next_line(), None);
    }

    #[test]
    fn test_empty_lines_are_kept() {
        let mut buf = LineBuffer::new();
        buf.push(b"\n\n");
        assert_eq!(buf.next_line().as_deref(), Some(""));
        assert_eq!(buf.next_line().as_deref(), Some(""));
    }

    #[test]
    fn test_over_long_line_is_discarded() {
        let mut buf = LineBuffer::new();
        buf.push(&vec![b'x'; MAX_LINE_LENGTH]);
        buf.push(b"QUIT\r");
        assert_eq!(buf.next_line().as_deref(), Some("QUIT"));
    }
}
