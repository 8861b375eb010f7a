//! # HexBot CLI
//!
//! Command-line interface for SSC-32 hexapod walking robots.
//!
//! ## 双模式架构
//!
//! ### One-shot 模式（推荐用于脚本）
//!
//! ```bash
//! # 配置默认串口
//! hexbot-cli config set --port /dev/ttyUSB0 --baud 115200
//!
//! # 执行操作（内部：连接 -> 下发 -> 断开）
//! hexbot-cli servo 6:1500 7:1500 --time 1000 --wait
//! hexbot-cli walk forward --speed 60 --duration 5
//! ```
//!
//! ### REPL 模式（推荐用于调试）
//!
//! ```bash
//! $ hexbot-cli shell
//! hexbot> F
//! hexbot> SPEED+
//! hexbot> SET horizontal_movement_time 1200
//! hexbot> STOP
//! hexbot> quit
//! ```
//!
//! ### 遥控模式
//!
//! `bluetooth` 从蓝牙串口读取行协议指令，`run` 按步态序列文件行走并在文件
//! 修改后自动重新下发。

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod actions;
mod commands;
mod modes;
mod utils;

use commands::config::{config_file, load_config};
use commands::query::print_version;
use commands::{
    BluetoothCommand, ConfigCommand, OffsetCommand, PulseCommand, ReleaseCommand, RunCommand,
    ServoCommand, StatusCommand, StopCommand, WalkCommand,
};
use modes::oneshot::OneShotConfig;
use modes::repl::run_repl;

/// HexBot CLI - 六足机器人命令行工具
#[derive(Parser, Debug)]
#[command(name = "hexbot-cli")]
#[command(about = "Command-line interface for SSC-32 hexapod walking robots", long_about = None)]
#[command(version)]
struct Cli {
    /// SSC-32 串口（覆盖配置）
    #[arg(short, long, global = true)]
    port: Option<String>,

    /// SSC-32 波特率（覆盖配置）
    #[arg(short, long, global = true)]
    baud: Option<u32>,

    /// 配置文件路径（默认 ~/.config/hexbot/config.toml）
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),

    /// 移动舵机
    Servo {
        #[command(flatten)]
        args: ServoCommand,
    },

    /// 舵机位置偏移
    Offset {
        #[command(flatten)]
        args: OffsetCommand,
    },

    /// 释放舵机
    Release {
        #[command(flatten)]
        args: ReleaseCommand,
    },

    /// 按方向行走
    Walk {
        #[command(flatten)]
        args: WalkCommand,
    },

    /// 停止序列器
    Stop {
        #[command(flatten)]
        args: StopCommand,
    },

    /// 查询运动状态
    Status {
        #[command(flatten)]
        args: StatusCommand,
    },

    /// 查询固件版本
    Version,

    /// 查询通道脉宽
    Pulse {
        #[command(flatten)]
        args: PulseCommand,
    },

    /// 按步态序列文件行走（文件修改后自动重新下发）
    Run {
        #[command(flatten)]
        args: RunCommand,
    },

    /// 启动交互式 Shell（REPL 模式）
    Shell,

    /// 蓝牙遥控（行协议）
    Bluetooth {
        #[command(flatten)]
        args: BluetoothCommand,
    },
}

fn main() -> Result<()> {
    // 初始化日志
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("hexbot_cli=info,hexbot_driver=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    let config_path = match cli.config {
        Some(path) => path,
        None => config_file()?,
    };

    if let Commands::Config(cmd) = cli.command {
        return cmd.execute(&config_path, cli.port, cli.baud);
    }

    let config = load_config(&config_path)?;
    let oneshot = OneShotConfig::resolve(&config, cli.port, cli.baud);

    match cli.command {
        Commands::Config(_) => Ok(()),

        Commands::Servo { args } => args.execute(&oneshot),

        Commands::Offset { args } => args.execute(&mut oneshot.connect()?),

        Commands::Release { args } => args.execute(&mut oneshot.connect()?),

        Commands::Walk { args } => args.execute(&mut oneshot.connect()?),

        Commands::Stop { args } => args.execute(&mut oneshot.connect()?),

        Commands::Status { args } => args.execute(&mut oneshot.connect()?),

        Commands::Version => print_version(&mut oneshot.connect()?),

        Commands::Pulse { args } => args.execute(&mut oneshot.connect()?),

        Commands::Run { args } => args.execute(&oneshot),

        Commands::Shell => run_repl(&oneshot),

        Commands::Bluetooth { args } => args.execute(&oneshot, &config.bluetooth),
    }
}
