//! # 步态序列文件
//!
//! 扁平的 TOML 表，键名与 `GaitSequence` 字段名一致，缺失的键取默认值：
//!
//! ```toml
//! vertical_left_high = 1600
//! horizontal_movement_time = 1200
//! travel_percentage_left = -100
//! ```

use crate::ConfigError;
use hexbot_protocol::GaitSequence;
use std::fs;
use std::path::Path;

/// 解析并校验序列文本
pub fn parse_sequence(text: &str) -> Result<GaitSequence, ConfigError> {
    let sequence: GaitSequence = toml::from_str(text)?;
    sequence.validate()?;
    Ok(sequence)
}

/// 从文件加载序列
pub fn load_sequence<P: AsRef<Path>>(path: P) -> Result<GaitSequence, ConfigError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
    parse_sequence(&text)
}

/// 保存序列到文件（写出全部键）
pub fn save_sequence<P: AsRef<Path>>(sequence: &GaitSequence, path: P) -> Result<(), ConfigError> {
    let path = path.as_ref();
    let text = toml::to_string(sequence)?;
    fs::write(path, text).map_err(|e| ConfigError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(parse_sequence("").unwrap(), GaitSequence::default());
    }

    #[test]
    fn test_partial_table() {
        let seq = parse_sequence(
            r#"
horizontal_movement_time = 1200
travel_percentage_left = -100
travel_percentage_right = -100
"#,
        )
        .unwrap();
        assert_eq!(seq.horizontal_movement_time, 1200);
        let expected = GaitSequence {
            horizontal_movement_time: 1200,
            ..GaitSequence::backward()
        };
        assert_eq!(seq, expected);
    }

    #[test]
    fn test_legacy_key_names() {
        let seq =
            parse_sequence("VerticalServo_Left_HighValue = 1700\nTravelPercentage_Right = 50\n")
                .unwrap();
        assert_eq!(seq.vertical_left_high, 1700);
        assert_eq!(seq.travel_percentage_right, 50);
    }

    #[test]
    fn test_out_of_range_is_rejected() {
        let err = parse_sequence("vertical_left_high = 3000").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));

        let err = parse_sequence("travel_percentage_left = 300").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));

        let err = parse_sequence("travel_percentage_left = \"full\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sequence.toml");
        let seq = GaitSequence::turn_left();
        save_sequence(&seq, &path).unwrap();
        assert_eq!(load_sequence(&path).unwrap(), seq);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_sequence(dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("missing.toml"));
    }
}
