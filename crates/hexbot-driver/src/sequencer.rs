//! 步态序列下发
//!
//! - [`Command::start_sequence`]：全量下发，用于首次下发或控制板上的序列未知时
//! - [`Command::update_sequence`]：只下发与上一次不同的参数
//!
//! 两者都以 `XS {speed}` 结尾（`update_sequence` 在序列器已运行且速度未变时省略），
//! 由它启动或保持序列器运行。

use crate::command::Command;
use crate::state::MovementState;
use hexbot_protocol::{GaitSequence, ValidationError};

impl Command<'_> {
    /// 全量下发步态序列并启动序列器
    ///
    /// 序列器正在运行时，先单独写出一行 `XSTOP`，控制板要求在改写整套几何参数前停止序列器。
    pub fn start_sequence(self, sequence: &GaitSequence) -> Result<Self, ValidationError> {
        let mut command = self;
        if command.projected_state() == MovementState::InWalkSequence {
            command = command.stop_hex_sequencer().line_break();
        }
        for sub_command in sequence.geometry_commands() {
            command = command.push(sub_command)?;
        }
        let speed = command.speed();
        command.set_horizontal_speed_percentage(speed)
    }

    /// 差分下发步态序列
    ///
    /// 只为取值变化的参数生成子指令（顺序与全量下发相同）。之后仅当序列器处于停止状态，
    /// 或当前速度与 `old_speed` 不同时，才追加 `XS`。
    pub fn update_sequence(
        self,
        old: &GaitSequence,
        old_speed: u8,
        new: &GaitSequence,
    ) -> Result<Self, ValidationError> {
        let mut command = self;
        for sub_command in old.diff(new) {
            command = command.push(sub_command)?;
        }
        let speed = command.speed();
        if command.projected_state() == MovementState::Stopped || speed != old_speed {
            command = command.set_horizontal_speed_percentage(speed)?;
        }
        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use crate::controller::Controller;
    use crate::ssc32::SessionConfig;
    use crate::state::MovementState;
    use hexbot_protocol::GaitSequence;
    use hexbot_serial::{MockHandle, MockSerialAdapter};

    const DEFAULT_GEOMETRY: &str = "LH 1600LM 1300LL 1000RH 1000RM 1300RL 1600VS 3000\
                                    LF 700LR 1600RF 1600RR 700HT 1500XL100XR100";

    fn controller(speed: u8) -> (Controller, MockHandle) {
        let (adapter, handle) = MockSerialAdapter::new("mock");
        let mut ctl = Controller::with_adapter(adapter, SessionConfig::default());
        ctl.model_mut().set_speed(speed).unwrap();
        (ctl, handle)
    }

    #[test]
    fn test_start_sequence_from_stopped() {
        let (mut ctl, handle) = controller(50);
        ctl.command()
            .start_sequence(&GaitSequence::default())
            .unwrap()
            .execute()
            .unwrap();

        assert_eq!(
            handle.written_lines(),
            vec![format!("{}XS 50\r", DEFAULT_GEOMETRY)]
        );
        assert_eq!(ctl.model().state(), MovementState::InWalkSequence);
    }

    #[test]
    fn test_start_sequence_while_walking_stops_first() {
        let (mut ctl, handle) = controller(50);
        ctl.command()
            .start_sequence(&GaitSequence::default())
            .unwrap()
            .execute()
            .unwrap();
        handle.take_written_lines();

        ctl.command()
            .start_sequence(&GaitSequence::backward())
            .unwrap()
            .execute()
            .unwrap();

        let lines = handle.written_lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "XSTOP\r");
        assert!(lines[1].starts_with("LH 1600"));
        assert!(lines[1].ends_with("XL-100XR-100XS 50\r"));
        assert_eq!(ctl.model().state(), MovementState::InWalkSequence);
    }

    #[test]
    fn test_update_sequence_single_field_while_walking() {
        let (mut ctl, handle) = controller(50);
        let old = GaitSequence::default();
        ctl.command().start_sequence(&old).unwrap().execute().unwrap();
        handle.take_written_lines();

        let new = old.with_travel(-30, 100);
        ctl.command()
            .update_sequence(&old, 50, &new)
            .unwrap()
            .execute()
            .unwrap();
        assert_eq!(handle.written_lines(), vec!["XL-30\r"]);
    }

    #[test]
    fn test_update_sequence_sends_speed_when_stopped() {
        let (mut ctl, handle) = controller(50);
        let old = GaitSequence::default();
        let new = old.with_travel(-30, 100);
        ctl.command()
            .update_sequence(&old, 50, &new)
            .unwrap()
            .execute()
            .unwrap();
        assert_eq!(handle.written_lines(), vec!["XL-30XS 50\r"]);
        assert_eq!(ctl.model().state(), MovementState::InWalkSequence);
    }

    #[test]
    fn test_update_sequence_sends_speed_when_changed() {
        let (mut ctl, handle) = controller(50);
        let seq = GaitSequence::default();
        ctl.command().start_sequence(&seq).unwrap().execute().unwrap();
        handle.take_written_lines();

        ctl.model_mut().set_speed(70).unwrap();
        ctl.command()
            .update_sequence(&seq, 50, &seq)
            .unwrap()
            .execute()
            .unwrap();
        assert_eq!(handle.written_lines(), vec!["XS 70\r"]);
    }

    #[test]
    fn test_identical_update_while_walking_is_silent() {
        let (mut ctl, handle) = controller(50);
        let seq = GaitSequence::default();
        ctl.command().start_sequence(&seq).unwrap().execute().unwrap();
        handle.take_written_lines();

        let cmd = ctl.command().update_sequence(&seq, 50, &seq).unwrap();
        assert!(cmd.is_empty());
        cmd.execute().unwrap();
        assert_eq!(handle.write_count(), 0);
    }

    #[test]
    fn test_invalid_sequence_writes_nothing() {
        let (mut ctl, handle) = controller(50);
        let mut seq = GaitSequence::default();
        seq.horizontal_movement_time = 0;
        assert!(ctl.command().start_sequence(&seq).is_err());
        assert_eq!(handle.write_count(), 0);
        assert_eq!(ctl.model().state(), MovementState::Stopped);
    }
}
