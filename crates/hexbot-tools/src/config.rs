//! # 运行配置
//!
//! 串口、蓝牙串口与步态相关的配置，保存为 TOML：
//!
//! ```toml
//! [serial]
//! port = "/dev/ttyUSB0"
//! baud_rate = 115200
//! read_timeout_ms = 100
//!
//! [bluetooth]
//! port = "/dev/rfcomm0"
//! baud_rate = 115200
//!
//! [gait]
//! default_speed = 50
//! sequence = "/etc/hexbot/sequence.toml"
//! ```
//!
//! 所有字段都有默认值，文件中只需写出要修改的部分。

use crate::ConfigError;
use hexbot_protocol::{
    BAUD_GREEN_RED_115200, MAX_SPEED_PERCENTAGE, SUPPORTED_BAUD_RATES, ValidationError,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// 运行配置
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HexbotConfig {
    /// SSC-32 串口
    pub serial: SerialSettings,

    /// 蓝牙串口（行协议输入源）
    pub bluetooth: BluetoothSettings,

    /// 步态设置
    pub gait: GaitSettings,
}

/// SSC-32 串口设置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialSettings {
    pub port: String,
    pub baud_rate: u32,
    /// 状态查询的读超时
    pub read_timeout_ms: u64,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB0".to_string(),
            baud_rate: BAUD_GREEN_RED_115200,
            read_timeout_ms: 100,
        }
    }
}

/// 蓝牙串口设置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BluetoothSettings {
    pub port: String,
    pub baud_rate: u32,
}

impl Default for BluetoothSettings {
    fn default() -> Self {
        Self {
            port: "/dev/rfcomm0".to_string(),
            baud_rate: 115_200,
        }
    }
}

/// 步态设置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaitSettings {
    /// 启动时的速度百分比（0..=200）
    pub default_speed: u8,

    /// 步态序列文件（None 时使用内置默认序列）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence: Option<PathBuf>,
}

impl Default for GaitSettings {
    fn default() -> Self {
        Self {
            default_speed: 50,
            sequence: None,
        }
    }
}

impl HexbotConfig {
    /// 从文件加载配置
    ///
    /// 文件不存在时返回默认配置。
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        Self::from_toml(&content)
    }

    /// 解析并校验配置文本
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: HexbotConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// 保存配置到文件（自动创建父目录）
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| ConfigError::io(parent, e))?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| ConfigError::io(path, e))
    }

    /// 检查取值范围
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !SUPPORTED_BAUD_RATES.contains(&self.serial.baud_rate) {
            return Err(ConfigError::UnsupportedBaudRate(self.serial.baud_rate));
        }
        if self.gait.default_speed > MAX_SPEED_PERCENTAGE {
            return Err(ValidationError::SpeedPercentageOutOfRange {
                percentage: self.gait.default_speed,
            }
            .into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HexbotConfig::default();
        assert_eq!(config.serial.port, "/dev/ttyUSB0");
        assert_eq!(config.serial.baud_rate, 115_200);
        assert_eq!(config.serial.read_timeout_ms, 100);
        assert_eq!(config.bluetooth.port, "/dev/rfcomm0");
        assert_eq!(config.gait.default_speed, 50);
        assert!(config.gait.sequence.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file() {
        let config = HexbotConfig::from_toml(
            r#"
[serial]
port = "/dev/ttyACM0"
baud_rate = 38400

[gait]
sequence = "walk.toml"
"#,
        )
        .unwrap();
        assert_eq!(config.serial.port, "/dev/ttyACM0");
        assert_eq!(config.serial.baud_rate, 38_400);
        assert_eq!(config.serial.read_timeout_ms, 100);
        assert_eq!(config.gait.default_speed, 50);
        assert_eq!(config.gait.sequence, Some(PathBuf::from("walk.toml")));
    }

    #[test]
    fn test_invalid_values() {
        let err = HexbotConfig::from_toml("[serial]\nbaud_rate = 57600\n").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedBaudRate(57_600)));

        let err = HexbotConfig::from_toml("[gait]\ndefault_speed = 201\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hexbot").join("config.toml");

        let mut config = HexbotConfig::default();
        config.serial.port = "COM3".to_string();
        config.gait.default_speed = 120;
        config.save_to_file(&path).unwrap();

        assert_eq!(HexbotConfig::load_from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = HexbotConfig::load_from_file(dir.path().join("none.toml")).unwrap();
        assert_eq!(config, HexbotConfig::default());
    }
}
