//! run 命令
//!
//! 按步态序列文件行走，文件修改后自动重新下发（先停止再全量下发）

use anyhow::{Context, Result};
use clap::Args;
use crossbeam_channel::{Receiver, select};
use hexbot_driver::{ControllerTask, Intent, Reply};
use hexbot_protocol::GaitSequence;
use hexbot_tools::SequenceWatcher;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

use crate::commands::walk::Direction;
use crate::modes::oneshot::{OneShotConfig, interrupt_signal};

/// 文件驱动行走命令参数
#[derive(Args, Debug)]
pub struct RunCommand {
    /// 步态序列文件（覆盖配置）
    #[arg(short, long)]
    pub sequence: Option<PathBuf>,

    /// 行走方向
    #[arg(short, long, value_enum, default_value = "forward")]
    pub direction: Direction,

    /// 速度百分比（0..=200，覆盖配置）
    #[arg(long)]
    pub speed: Option<u8>,

    /// 文件检查间隔（毫秒）
    #[arg(long, default_value_t = 500)]
    pub poll_ms: u64,
}

impl RunCommand {
    pub fn execute(&self, config: &OneShotConfig) -> Result<()> {
        let path = self
            .sequence
            .clone()
            .or_else(|| config.sequence.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("未指定步态序列文件，请使用 --sequence 或 config set --sequence")
            })?;

        println!("📜 加载步态序列: {}", path.display());
        let watcher = SequenceWatcher::spawn(&path, Duration::from_millis(self.poll_ms))
            .with_context(|| format!("加载步态序列 {} 失败", path.display()))?;

        let controller = config.connect_with(watcher.initial())?;
        let task = ControllerTask::spawn(controller)?;
        if let Some(speed) = self.speed {
            task.request(Intent::SetSpeed(speed))?;
        }
        task.request(Intent::Walk(self.direction.into()))?;
        println!("🚶 行走中，修改 {} 后自动重新下发（Ctrl+C 停止）", path.display());

        let stop_rx = interrupt_signal()?;
        let reloads = follow_updates(&task, watcher.updates(), &stop_rx);
        println!("📊 重新下发 {} 次", reloads);

        drop(task);
        println!("🛑 已停止");
        Ok(())
    }
}

/// 把文件更新转交给控制线程，直到退出信号或监听结束，返回重新下发次数
pub fn follow_updates(
    task: &ControllerTask,
    updates: &Receiver<GaitSequence>,
    stop_rx: &Receiver<()>,
) -> usize {
    let mut reloads = 0;
    loop {
        select! {
            recv(updates) -> update => {
                let Ok(sequence) = update else {
                    warn!("Sequence watcher stopped");
                    break;
                };
                match task.request(Intent::ReloadSequence(sequence)) {
                    Ok(Reply::Done) => {
                        reloads += 1;
                        info!("Gait sequence re-applied");
                    },
                    Ok(other) => warn!("Unexpected reply {:?}", other),
                    Err(e) => warn!("Failed to re-apply gait sequence: {}", e),
                }
            },
            recv(stop_rx) -> _ => break,
        }
    }
    reloads
}
