//! 行走与停止命令

use anyhow::Result;
use clap::{Args, ValueEnum};
use hexbot_driver::{Controller, WalkDirection};
use hexbot_protocol::STOP_SEQUENCER_TOKEN;
use std::time::Duration;

use crate::modes::oneshot::interrupt_signal;

/// 行走方向
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
    Left,
    Right,
}

impl From<Direction> for WalkDirection {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Forward => WalkDirection::Forward,
            Direction::Backward => WalkDirection::Backward,
            Direction::Left => WalkDirection::TurnLeft,
            Direction::Right => WalkDirection::TurnRight,
        }
    }
}

/// 行走命令参数
#[derive(Args, Debug)]
pub struct WalkCommand {
    /// 行走方向
    #[arg(value_enum)]
    pub direction: Direction,

    /// 速度百分比（0..=200，覆盖配置）
    #[arg(short, long)]
    pub speed: Option<u8>,

    /// 行走时长（秒）；不指定时一直行走到 Ctrl+C
    #[arg(short, long)]
    pub duration: Option<f64>,
}

impl WalkCommand {
    pub fn execute(&self, controller: &mut Controller) -> Result<()> {
        if let Some(speed) = self.speed {
            controller.set_speed(speed)?;
        }
        if controller.model().speed() == 0 {
            println!("⚠️  速度为 0，序列器启动后不会移动（使用 --speed 设置）");
        }

        let stop_rx = interrupt_signal()?;
        controller.walk(self.direction.into())?;
        println!(
            "🚶 {} (速度 {})",
            WalkDirection::from(self.direction),
            controller.model().speed()
        );

        match self.duration {
            Some(secs) => {
                let duration = Duration::try_from_secs_f64(secs)
                    .map_err(|_| anyhow::anyhow!("无效的时长: {}", secs))?;
                if stop_rx.recv_timeout(duration).is_ok() {
                    println!("\n收到退出信号");
                }
            },
            None => {
                println!("按 Ctrl+C 停止");
                let _ = stop_rx.recv();
            },
        }

        controller.stop()?;
        println!("🛑 已停止");
        Ok(())
    }
}

/// 停止命令参数
#[derive(Args, Debug)]
pub struct StopCommand {
    /// 同时释放的舵机通道
    #[arg(short, long, value_delimiter = ',')]
    pub release: Vec<u8>,
}

impl StopCommand {
    /// 停止序列器
    ///
    /// 新进程不知道控制板上序列器的状态，直接写出 `XSTOP`。
    pub fn execute(&self, controller: &mut Controller) -> Result<()> {
        println!("🛑 停止序列器...");
        controller.session_mut().write_line(STOP_SEQUENCER_TOKEN)?;
        if !self.release.is_empty() {
            controller.release_servos(&self.release)?;
            println!("✅ 已释放通道 {:?}", self.release);
        }
        println!("✅ 已停止");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_mapping() {
        assert_eq!(
            WalkDirection::from(Direction::Left),
            WalkDirection::TurnLeft
        );
        assert_eq!(
            WalkDirection::from(Direction::Backward).travel(),
            (-100, -100)
        );
    }

    #[test]
    fn test_direction_value_names() {
        assert_eq!(Direction::from_str("forward", true), Ok(Direction::Forward));
        assert_eq!(Direction::from_str("RIGHT", true), Ok(Direction::Right));
        assert!(Direction::from_str("up", true).is_err());
    }
}
