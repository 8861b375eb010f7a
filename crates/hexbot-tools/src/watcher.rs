//! # 序列文件热加载
//!
//! 后台线程按固定间隔检查文件的修改时间，变化时重新解析并通过通道发布
//! 新的 [`GaitSequence`]。解析失败时记录告警并重新发布上一份有效序列，
//! 由消费方重新下发。

use crate::ConfigError;
use crate::sequence_file::load_sequence;
use crossbeam_channel::{Receiver, Sender, bounded, select};
use hexbot_protocol::GaitSequence;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread::JoinHandle;
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};

/// 默认轮询间隔
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// 单个序列文件的跟踪状态
#[derive(Debug)]
pub struct SequenceFile {
    path: PathBuf,
    modified: Option<SystemTime>,
    current: GaitSequence,
}

impl SequenceFile {
    /// 加载初始序列（初次加载失败直接返回错误）
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref().to_path_buf();
        let modified = modified_time(&path);
        let current = load_sequence(&path)?;
        Ok(Self {
            path,
            modified,
            current,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 最近一次有效的序列
    pub fn current(&self) -> GaitSequence {
        self.current
    }

    /// 检查文件是否变化
    ///
    /// 未变化返回 `None`；变化且解析成功返回新序列；变化但解析失败返回
    /// 上一份有效序列。文件暂时不可读时不发布任何内容。
    pub fn poll(&mut self) -> Option<GaitSequence> {
        let modified = modified_time(&self.path)?;
        if self.modified == Some(modified) {
            return None;
        }
        self.modified = Some(modified);

        match load_sequence(&self.path) {
            Ok(sequence) => {
                info!("Reloaded gait sequence from {}", self.path.display());
                self.current = sequence;
            },
            Err(ConfigError::Io { source, .. }) => {
                warn!("Cannot read {}: {}", self.path.display(), source);
                // 下次轮询重试
                self.modified = None;
                return None;
            },
            Err(e) => {
                warn!(
                    "Invalid gait sequence in {}, keeping previous: {}",
                    self.path.display(),
                    e
                );
            },
        }
        Some(self.current)
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// 序列文件监听器
///
/// Drop 时停止后台线程。
pub struct SequenceWatcher {
    initial: GaitSequence,
    updates: Receiver<GaitSequence>,
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl SequenceWatcher {
    /// 加载文件并启动监听线程
    pub fn spawn<P: AsRef<Path>>(path: P, poll_interval: Duration) -> Result<Self, ConfigError> {
        let file = SequenceFile::open(path)?;
        let initial = file.current();
        let (update_tx, updates) = bounded(1);
        let (stop_tx, stop_rx) = bounded::<()>(0);

        let path = file.path().to_path_buf();
        let handle = std::thread::Builder::new()
            .name(format!("hexbot-watch-{}", file_name(&path)))
            .spawn(move || watch_loop(file, poll_interval, update_tx, stop_rx))
            .map_err(|e| ConfigError::io(&path, e))?;

        Ok(Self {
            initial,
            updates,
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }

    /// 启动时加载的序列
    pub fn initial(&self) -> GaitSequence {
        self.initial
    }

    /// 更新通道（每次文件变化发布一个序列）
    pub fn updates(&self) -> &Receiver<GaitSequence> {
        &self.updates
    }

    /// 停止监听线程
    pub fn stop(&mut self) {
        self.stop_tx.take();
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            warn!("Sequence watcher thread panicked");
        }
    }
}

impl Drop for SequenceWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

fn watch_loop(
    mut file: SequenceFile,
    poll_interval: Duration,
    update_tx: Sender<GaitSequence>,
    stop_rx: Receiver<()>,
) {
    debug!("Watching {}", file.path().display());
    loop {
        select! {
            recv(stop_rx) -> _ => break,
            default(poll_interval) => {
                let Some(sequence) = file.poll() else {
                    continue;
                };
                // 消费方未及时取走时，停止信号仍然可以打断等待
                select! {
                    send(update_tx, sequence) -> sent => {
                        if sent.is_err() {
                            break;
                        }
                    },
                    recv(stop_rx) -> _ => break,
                }
            },
        }
    }
    debug!("Stopped watching {}", file.path().display());
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "sequence".to_string())
}
