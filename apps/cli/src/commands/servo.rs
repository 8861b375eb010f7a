//! 舵机命令
//!
//! 直接控制单个舵机：移动、位置偏移、释放

use anyhow::{Context, Result};
use clap::Args;
use hexbot_driver::Controller;

use crate::modes::oneshot::OneShotConfig;
use crate::utils::movement_label;

/// 移动舵机命令参数
#[derive(Args, Debug)]
pub struct ServoCommand {
    /// 目标位置，格式 `通道:脉宽`，多个舵机在同一行中下发
    /// 例如：6:1500 7:1500 8:1200
    #[arg(required = true)]
    pub moves: Vec<String>,

    /// 运动速度（µs/s），作用于每个舵机
    #[arg(short, long)]
    pub speed: Option<u16>,

    /// 运动时间（ms），作用于每个舵机
    #[arg(short, long)]
    pub time: Option<u16>,

    /// 等待运动完成
    #[arg(short, long)]
    pub wait: bool,
}

impl ServoCommand {
    /// 解析 `通道:脉宽` 列表
    pub fn parse_moves(&self) -> Result<Vec<(u8, u16)>> {
        self.moves
            .iter()
            .map(|item| {
                let (channel, pulse) = item
                    .split_once(':')
                    .ok_or_else(|| anyhow::anyhow!("格式错误 '{}'，应为 通道:脉宽", item))?;
                let channel = channel
                    .trim()
                    .parse::<u8>()
                    .with_context(|| format!("无效的通道号 '{}'", channel))?;
                let pulse = pulse
                    .trim()
                    .parse::<u16>()
                    .with_context(|| format!("无效的脉宽 '{}'", pulse))?;
                Ok((channel, pulse))
            })
            .collect()
    }

    /// 先解析参数再连接，参数错误时不打开串口
    pub fn execute(&self, config: &OneShotConfig) -> Result<()> {
        let moves = self.parse_moves()?;
        let mut controller = config.connect()?;

        let mut command = controller.command();
        for &(channel, pulse) in &moves {
            command = command.single_servo_with(channel, pulse, self.speed, self.time)?;
        }
        command.execute()?;
        println!("✅ 已移动 {} 个舵机", moves.len());

        if self.wait {
            println!("⏳ 等待运动完成...");
            let status = controller.wait_until_movement_complete()?;
            println!("运动状态: {}", movement_label(status));
        }
        Ok(())
    }
}

/// 位置偏移命令参数
#[derive(Args, Debug)]
pub struct OffsetCommand {
    /// 通道号（0..=31）
    pub channel: u8,

    /// 偏移量（-100..=100 µs）
    #[arg(allow_negative_numbers = true)]
    pub offset: i8,
}

impl OffsetCommand {
    pub fn execute(&self, controller: &mut Controller) -> Result<()> {
        controller
            .command()
            .servo_position_offset(self.channel, self.offset)?
            .execute()?;
        println!("✅ 通道 {} 偏移 {} µs", self.channel, self.offset);
        Ok(())
    }
}

/// 释放舵机命令参数
#[derive(Args, Debug)]
pub struct ReleaseCommand {
    /// 通道号列表
    #[arg(required = true)]
    pub channels: Vec<u8>,
}

impl ReleaseCommand {
    pub fn execute(&self, controller: &mut Controller) -> Result<()> {
        controller.release_servos(&self.channels)?;
        println!("✅ 已释放通道 {:?}", self.channels);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn servo(moves: &[&str]) -> ServoCommand {
        ServoCommand {
            moves: moves.iter().map(|m| m.to_string()).collect(),
            speed: None,
            time: None,
            wait: false,
        }
    }

    #[test]
    fn test_parse_moves() {
        let cmd = servo(&["6:1500", "7: 1400"]);
        assert_eq!(cmd.parse_moves().unwrap(), vec![(6, 1500), (7, 1400)]);
    }

    #[test]
    fn test_parse_moves_errors() {
        assert!(servo(&["6=1500"]).parse_moves().is_err());
        assert!(servo(&["x:1500"]).parse_moves().is_err());
        assert!(servo(&["6:-1"]).parse_moves().is_err());
    }
}
