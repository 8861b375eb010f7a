//! 命令定义和实现

pub mod bluetooth;
pub mod config;
pub mod query;
pub mod run;
pub mod servo;
pub mod walk;

pub use bluetooth::BluetoothCommand;
pub use config::ConfigCommand;
pub use query::{PulseCommand, StatusCommand};
pub use run::RunCommand;
pub use servo::{OffsetCommand, ReleaseCommand, ServoCommand};
pub use walk::{StopCommand, WalkCommand};
