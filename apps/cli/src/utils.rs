//! 输出格式化工具

use hexbot_driver::{ControllerStatus, Reply};
use hexbot_protocol::MovementStatus;

/// 把控制线程的应答格式化为一行文本
pub fn format_reply(reply: &Reply) -> String {
    match reply {
        Reply::Done => "✅ OK".to_string(),
        Reply::Speed(speed) => format!("✅ 速度: {}", speed),
        Reply::Status(status) => format_status(status),
        Reply::Version(version) => format!("固件版本: {}", version),
        Reply::Movement(status) => format!("运动状态: {}", movement_label(*status)),
        Reply::PulseWidth(pulse) => format!("脉宽: {} µs", pulse),
    }
}

pub fn movement_label(status: MovementStatus) -> &'static str {
    match status {
        MovementStatus::Complete => "已完成",
        MovementStatus::InProgress => "运动中",
        MovementStatus::Unknown => "未知",
    }
}

/// 控制器状态（多行）
pub fn format_status(status: &ControllerStatus) -> String {
    let mut out = format!(
        "📊 {} ({})\n  状态: {}\n  速度: {}",
        status.port,
        if status.open { "已打开" } else { "已关闭" },
        status.state,
        status.speed
    );
    if let Some(baseline) = &status.baseline {
        out.push_str(&format!(
            "\n  行程: XL{} XR{}",
            baseline.sequence.travel_percentage_left, baseline.sequence.travel_percentage_right
        ));
    }
    let m = &status.metrics;
    out.push_str(&format!(
        "\n  已写入: {} 行 / {} 字节，写入失败 {}",
        m.lines_written, m.bytes_written, m.write_errors
    ));
    out.push_str(&format!(
        "\n  状态查询: {}（未知 {:.1}%，读超时 {}）",
        m.status_queries,
        m.unknown_status_rate(),
        m.read_timeouts
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use hexbot_driver::{MetricsSnapshot, MovementState};

    #[test]
    fn test_format_reply() {
        assert_eq!(format_reply(&Reply::Speed(60)), "✅ 速度: 60");
        assert_eq!(format_reply(&Reply::PulseWidth(1500)), "脉宽: 1500 µs");
        assert_eq!(
            format_reply(&Reply::Movement(MovementStatus::Complete)),
            "运动状态: 已完成"
        );
    }

    #[test]
    fn test_format_status() {
        let status = ControllerStatus {
            port: "/dev/ttyUSB0".to_string(),
            open: true,
            state: MovementState::Stopped,
            speed: 50,
            baseline: None,
            metrics: MetricsSnapshot::default(),
        };
        let text = format_status(&status);
        assert!(text.starts_with("📊 /dev/ttyUSB0 (已打开)"));
        assert!(text.contains("速度: 50"));
        assert!(!text.contains("行程"));
    }
}
