//! 协议常量定义

/// 行结束符（回车）
pub const LINE_TERMINATOR: char = '\r';

// ============================================================================
// 取值范围
// ============================================================================

/// 最大舵机通道号（含），通道范围 0..=31
pub const MAX_SERVO_CHANNEL: u8 = 31;

/// 最小脉宽（微秒）
pub const MIN_PULSE_WIDTH_US: u16 = 500;

/// 最大脉宽（微秒）
pub const MAX_PULSE_WIDTH_US: u16 = 2500;

/// 中位偏移下限（微秒，约 -15°）
pub const MIN_POSITION_OFFSET_US: i8 = -100;

/// 中位偏移上限（微秒，约 +15°）
pub const MAX_POSITION_OFFSET_US: i8 = 100;

/// 水平运动时间下限（微秒）
pub const MIN_HORIZONTAL_TIME_US: u16 = 1;

/// 行程百分比下限（负值表示该侧腿反向运动）
pub const MIN_TRAVEL_PERCENTAGE: i8 = -100;

/// 行程百分比上限
pub const MAX_TRAVEL_PERCENTAGE: i8 = 100;

/// 水平速度百分比上限（100% 对应 `HT` 设定的时间）
pub const MAX_SPEED_PERCENTAGE: u8 = 200;

// ============================================================================
// 串口参数
// ============================================================================

/// 板载跳线 GREEN：9600 bps
pub const BAUD_GREEN_9600: u32 = 9_600;

/// 板载跳线 RED：38400 bps
pub const BAUD_RED_38400: u32 = 38_400;

/// 板载跳线 GREEN + RED：115200 bps
pub const BAUD_GREEN_RED_115200: u32 = 115_200;

/// 控制板支持的波特率
pub const SUPPORTED_BAUD_RATES: [u32; 3] =
    [BAUD_GREEN_9600, BAUD_RED_38400, BAUD_GREEN_RED_115200];

// ============================================================================
// 指令与应答
// ============================================================================

/// 固件版本查询
pub const QUERY_VERSION: &str = "VER";

/// 运动状态查询
pub const QUERY_MOVEMENT_STATUS: &str = "Q";

/// 脉宽查询（后跟空格和通道号）
pub const QUERY_PULSE_WIDTH: &str = "QP";

/// 停止步态序列器
pub const STOP_SEQUENCER_TOKEN: &str = "XSTOP";

/// 运动完成应答
pub const STATUS_COMPLETE: &str = ".";

/// 同样按“完成”处理的应答
pub const STATUS_COMPLETE_ALT: &str = "+";

/// 脉宽查询应答单位：每个字节值代表 10 微秒
pub const PULSE_WIDTH_RESPONSE_SCALE: u16 = 10;

/// 检查波特率是否被控制板支持
pub fn is_supported_baud_rate(baud_rate: u32) -> bool {
    SUPPORTED_BAUD_RATES.contains(&baud_rate)
}
