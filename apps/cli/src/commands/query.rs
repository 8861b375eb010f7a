//! 查询命令
//!
//! 运动状态、固件版本、通道脉宽

use anyhow::Result;
use clap::Args;
use hexbot_driver::Controller;

use crate::utils::{format_status, movement_label};

/// 状态查询命令参数
#[derive(Args, Debug)]
pub struct StatusCommand {
    /// 等待运动完成后再输出
    #[arg(short, long)]
    pub wait: bool,
}

impl StatusCommand {
    pub fn execute(&self, controller: &mut Controller) -> Result<()> {
        let movement = if self.wait {
            println!("⏳ 等待运动完成...");
            controller.wait_until_movement_complete()?
        } else {
            controller.query_movement_status()?
        };
        println!("运动状态: {}", movement_label(movement));
        println!("{}", format_status(&controller.status()));
        Ok(())
    }
}

/// 查询固件版本
pub fn print_version(controller: &mut Controller) -> Result<()> {
    let version = controller.get_version()?;
    println!("固件版本: {}", version);
    Ok(())
}

/// 脉宽查询命令参数
#[derive(Args, Debug)]
pub struct PulseCommand {
    /// 通道号列表
    #[arg(required = true)]
    pub channels: Vec<u8>,
}

impl PulseCommand {
    pub fn execute(&self, controller: &mut Controller) -> Result<()> {
        for &channel in &self.channels {
            let pulse = controller.query_pulse_width(channel)?;
            println!("通道 {:>2}: {} µs", channel, pulse);
        }
        Ok(())
    }
}
