//! 串口会话指标
//!
//! 原子计数器，可以在任何线程读取，不引入锁竞争。

use std::sync::atomic::{AtomicU64, Ordering};

/// 会话实时指标
#[derive(Debug, Default)]
pub struct SessionMetrics {
    /// 写入的指令行数
    pub lines_written: AtomicU64,

    /// 写入的总字节数（含行结束符）
    pub bytes_written: AtomicU64,

    /// 写入失败次数
    pub write_errors: AtomicU64,

    /// 运动状态查询次数
    pub status_queries: AtomicU64,

    /// 状态查询得到 Unknown 的次数（无应答或应答无法识别）
    pub unknown_statuses: AtomicU64,

    /// 读取重试全部超时的次数
    pub read_timeouts: AtomicU64,
}

impl SessionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_write(&self, bytes: usize) {
        self.lines_written.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// 获取指标快照
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            lines_written: self.lines_written.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            write_errors: self.write_errors.load(Ordering::Relaxed),
            status_queries: self.status_queries.load(Ordering::Relaxed),
            unknown_statuses: self.unknown_statuses.load(Ordering::Relaxed),
            read_timeouts: self.read_timeouts.load(Ordering::Relaxed),
        }
    }
}

/// 指标快照（不可变，用于读取）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub lines_written: u64,
    pub bytes_written: u64,
    pub write_errors: u64,
    pub status_queries: u64,
    pub unknown_statuses: u64,
    pub read_timeouts: u64,
}

impl MetricsSnapshot {
    /// 状态查询中 Unknown 的比例（百分比）
    ///
    /// `status_queries` 为 0 时返回 0.0。
    pub fn unknown_status_rate(&self) -> f64 {
        if self.status_queries == 0 {
            return 0.0;
        }
        (self.unknown_statuses as f64 / self.status_queries as f64) * 100.0
    }
}
