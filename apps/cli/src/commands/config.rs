//! 配置管理命令
//!
//! 用于管理 CLI 配置（串口、蓝牙串口、默认速度、步态序列文件）

use anyhow::{Context, Result};
use clap::Subcommand;
use hexbot_tools::{HexbotConfig, load_sequence};
use std::path::{Path, PathBuf};

/// 默认配置文件路径
///
/// - Linux: `~/.config/hexbot/config.toml`
/// - macOS: `~/Library/Application Support/hexbot/config.toml`
/// - Windows: `%APPDATA%\hexbot\config.toml`
pub fn config_file() -> Result<PathBuf> {
    let mut path = dirs::config_dir().ok_or_else(|| anyhow::anyhow!("无法确定配置目录"))?;
    path.push("hexbot");
    path.push("config.toml");
    Ok(path)
}

/// 加载配置（文件不存在时使用默认配置）
pub fn load_config(path: &Path) -> Result<HexbotConfig> {
    HexbotConfig::load_from_file(path)
        .with_context(|| format!("读取配置文件 {} 失败", path.display()))
}

/// 配置命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 设置配置项（SSC-32 串口与波特率使用全局参数 --port / --baud）
    Set {
        /// 状态查询读超时（毫秒）
        #[arg(long)]
        read_timeout: Option<u64>,

        /// 默认速度（0..=200）
        #[arg(long)]
        speed: Option<u8>,

        /// 步态序列文件
        #[arg(long)]
        sequence: Option<PathBuf>,

        /// 蓝牙串口（如 /dev/rfcomm0）
        #[arg(long)]
        bluetooth_port: Option<String>,

        /// 蓝牙串口波特率
        #[arg(long)]
        bluetooth_baud: Option<u32>,
    },

    /// 获取配置项
    Get {
        /// 配置项名称（port, baud, read_timeout, speed, sequence, bluetooth_port,
        /// bluetooth_baud）
        #[arg(default_value = "all")]
        key: String,
    },

    /// 检查配置
    Check,
}

impl ConfigCommand {
    /// 执行配置命令
    ///
    /// `port` / `baud` 来自全局参数，只有 `set` 使用。
    pub fn execute(self, path: &Path, port: Option<String>, baud: Option<u32>) -> Result<()> {
        match self {
            ConfigCommand::Set {
                read_timeout,
                speed,
                sequence,
                bluetooth_port,
                bluetooth_baud,
            } => {
                let mut config = load_config(path)?;

                if let Some(port) = port {
                    println!("✅ 设置串口: {}", port);
                    config.serial.port = port;
                }
                if let Some(baud) = baud {
                    println!("✅ 设置波特率: {}", baud);
                    config.serial.baud_rate = baud;
                }
                if let Some(timeout) = read_timeout {
                    println!("✅ 设置读超时: {} ms", timeout);
                    config.serial.read_timeout_ms = timeout;
                }
                if let Some(speed) = speed {
                    println!("✅ 设置默认速度: {}", speed);
                    config.gait.default_speed = speed;
                }
                if let Some(sequence) = sequence {
                    println!("✅ 设置步态序列文件: {}", sequence.display());
                    config.gait.sequence = Some(sequence);
                }
                if let Some(port) = bluetooth_port {
                    println!("✅ 设置蓝牙串口: {}", port);
                    config.bluetooth.port = port;
                }
                if let Some(baud) = bluetooth_baud {
                    println!("✅ 设置蓝牙波特率: {}", baud);
                    config.bluetooth.baud_rate = baud;
                }

                config.validate()?;
                config
                    .save_to_file(path)
                    .with_context(|| format!("写入配置文件 {} 失败", path.display()))?;
                Ok(())
            },

            ConfigCommand::Get { key } => {
                let config = load_config(path)?;
                match get_value(&config, &key) {
                    Some(value) => println!("{}", value),
                    None => print_config(&config),
                }
                Ok(())
            },

            ConfigCommand::Check => {
                println!("配置文件: {}", path.display());
                if !path.exists() {
                    println!("  (文件不存在，使用默认配置)");
                }
                let config = load_config(path)?;
                print_config(&config);

                if let Some(sequence) = &config.gait.sequence {
                    load_sequence(sequence).with_context(|| {
                        format!("步态序列文件 {} 无效", sequence.display())
                    })?;
                    println!("✅ 步态序列文件有效");
                }
                println!("✅ 配置有效");
                Ok(())
            },
        }
    }
}

/// 按名称读取单个配置项（未知名称返回 None）
fn get_value(config: &HexbotConfig, key: &str) -> Option<String> {
    let value = match key {
        "port" => config.serial.port.clone(),
        "baud" => config.serial.baud_rate.to_string(),
        "read_timeout" => config.serial.read_timeout_ms.to_string(),
        "speed" => config.gait.default_speed.to_string(),
        "sequence" => match &config.gait.sequence {
            Some(path) => path.display().to_string(),
            None => "(未设置)".to_string(),
        },
        "bluetooth_port" => config.bluetooth.port.clone(),
        "bluetooth_baud" => config.bluetooth.baud_rate.to_string(),
        _ => return None,
    };
    Some(value)
}

fn print_config(config: &HexbotConfig) {
    println!("HexBot CLI 配置:");
    println!("  串口: {}", config.serial.port);
    println!("  波特率: {}", config.serial.baud_rate);
    println!("  读超时: {} ms", config.serial.read_timeout_ms);
    println!("  默认速度: {}", config.gait.default_speed);
    println!(
        "  步态序列: {}",
        get_value(config, "sequence").unwrap_or_default()
    );
    println!(
        "  蓝牙串口: {} @ {}",
        config.bluetooth.port, config.bluetooth.baud_rate
    );
}
