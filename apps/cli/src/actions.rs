//! 行协议
//!
//! 蓝牙串口与交互式 Shell 共用的一行一条指令的文本协议（大小写不敏感）：
//!
//! | 指令 | 含义 |
//! |---|---|
//! | `F` / `B` / `L` / `R` | 前进 / 后退 / 左转 / 右转 |
//! | `STOP` | 停止序列器 |
//! | `SPEED+` / `SPEED-` | 速度加 / 减 10 |
//! | `SPEED <n>` | 设置速度 |
//! | `S <ch> <pulse> [<ch> <pulse> ...]` | 在一行中移动多个舵机 |
//! | `REL <ch> [<ch> ...]` | 释放舵机 |
//! | `SET <param> <value>` | 修改步态参数 |
//! | `STATUS` / `VER` / `Q` / `QP <ch>` / `WAIT` | 查询 |
//! | `HELP` / `QUIT` | 帮助 / 退出 |

use hexbot_driver::{Intent, SPEED_STEP, WalkDirection};
use std::str::FromStr;
use thiserror::Error;

/// 解析结果
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// 交给控制线程处理
    Intent(Intent),
    Help,
    Quit,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ActionError {
    #[error("Empty line")]
    Empty,

    #[error("Unknown command: {0}")]
    Unknown(String),

    #[error("{command}: missing {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    #[error("{command}: invalid number '{value}'")]
    InvalidNumber { command: &'static str, value: String },

    #[error("{command}: unexpected argument '{value}'")]
    UnexpectedArgument { command: &'static str, value: String },
}

/// 解析一行指令
pub fn parse_action(line: &str) -> Result<Action, ActionError> {
    let mut parts = line.split_whitespace();
    let Some(head) = parts.next() else {
        return Err(ActionError::Empty);
    };
    let args: Vec<&str> = parts.collect();
    let head = head.to_ascii_uppercase();

    let intent = match head.as_str() {
        "F" => walk(WalkDirection::Forward, &args)?,
        "B" => walk(WalkDirection::Backward, &args)?,
        "L" => walk(WalkDirection::TurnLeft, &args)?,
        "R" => walk(WalkDirection::TurnRight, &args)?,
        "STOP" => no_args("STOP", &args, Intent::Stop)?,
        "SPEED+" => no_args("SPEED+", &args, Intent::AdjustSpeed(SPEED_STEP))?,
        "SPEED-" => no_args("SPEED-", &args, Intent::AdjustSpeed(-SPEED_STEP))?,
        "SPEED" => {
            let [value] = exact("SPEED", &args, ["speed"])?;
            Intent::SetSpeed(number("SPEED", value)?)
        },
        "S" => {
            if args.is_empty() {
                return Err(ActionError::MissingArgument {
                    command: "S",
                    argument: "channel",
                });
            }
            let mut moves = Vec::with_capacity(args.len() / 2);
            for pair in args.chunks(2) {
                let [channel, pulse] = pair else {
                    return Err(ActionError::MissingArgument {
                        command: "S",
                        argument: "pulse",
                    });
                };
                moves.push((number("S", channel)?, number("S", pulse)?));
            }
            Intent::MoveServos(moves)
        },
        "REL" => {
            if args.is_empty() {
                return Err(ActionError::MissingArgument {
                    command: "REL",
                    argument: "channel",
                });
            }
            let channels = args
                .iter()
                .map(|a| number("REL", a))
                .collect::<Result<Vec<u8>, _>>()?;
            Intent::ReleaseServos(channels)
        },
        "SET" => {
            let [name, value] = exact("SET", &args, ["parameter", "value"])?;
            Intent::SetParameter {
                name: name.to_string(),
                value: number("SET", value)?,
            }
        },
        "STATUS" => no_args("STATUS", &args, Intent::Status)?,
        "VER" => no_args("VER", &args, Intent::Version)?,
        "Q" => no_args("Q", &args, Intent::MovementStatus)?,
        "QP" => {
            let [channel] = exact("QP", &args, ["channel"])?;
            Intent::PulseWidth(number("QP", channel)?)
        },
        "WAIT" => no_args("WAIT", &args, Intent::WaitComplete)?,
        "HELP" | "?" => return Ok(Action::Help),
        "QUIT" | "EXIT" => return Ok(Action::Quit),
        _ => return Err(ActionError::Unknown(line.trim().to_string())),
    };
    Ok(Action::Intent(intent))
}

fn walk(direction: WalkDirection, args: &[&str]) -> Result<Intent, ActionError> {
    let command = match direction {
        WalkDirection::Forward => "F",
        WalkDirection::Backward => "B",
        WalkDirection::TurnLeft => "L",
        WalkDirection::TurnRight => "R",
    };
    no_args(command, args, Intent::Walk(direction))
}

fn no_args(command: &'static str, args: &[&str], intent: Intent) -> Result<Intent, ActionError> {
    match args.first() {
        None => Ok(intent),
        Some(extra) => Err(ActionError::UnexpectedArgument {
            command,
            value: extra.to_string(),
        }),
    }
}

fn exact<'a, const N: usize>(
    command: &'static str,
    args: &[&'a str],
    names: [&'static str; N],
) -> Result<[&'a str; N], ActionError> {
    if args.len() > N {
        return Err(ActionError::UnexpectedArgument {
            command,
            value: args[N].to_string(),
        });
    }
    let mut out = [""; N];
    for (i, name) in names.into_iter().enumerate() {
        out[i] = *args.get(i).ok_or(ActionError::MissingArgument {
            command,
            argument: name,
        })?;
    }
    Ok(out)
}

fn number<T: FromStr>(command: &'static str, value: &str) -> Result<T, ActionError> {
    value.parse().map_err(|_| ActionError::InvalidNumber {
        command,
        value: value.to_string(),
    })
}

/// Shell 帮助文本
pub const HELP: &str = "\
指令（大小写不敏感）:
  F | B | L | R                 前进 / 后退 / 左转 / 右转
  STOP                          停止
  SPEED+ | SPEED-               速度 +10 / -10
  SPEED <n>                     设置速度（0..=200）
  S <ch> <pulse> [...]          移动舵机
  REL <ch> [...]                释放舵机
  SET <param> <value>           修改步态参数（如 SET horizontal_movement_time 1200）
  STATUS | VER | Q | QP <ch>    状态 / 固件版本 / 运动状态 / 脉宽
  WAIT                          等待运动完成
  HELP | QUIT";
