/// 每个像素参与隐写的颜色通道数 (R, G, B)。
/// Alpha 等额外通道既不写入也不参与分析。
pub const CHANNELS_PER_PIXEL: usize = 3;

/// 长度前缀模式下头部的默认位宽。
/// 头部记录的是所需像素数，而不是字节数。
pub const DEFAULT_HEADER_BITS: u32 = 32;

/// 终止符模式下追加在消息末尾的默认字节序列。
pub const DEFAULT_TERMINATOR: &[u8] = b"endmessage";

/// 概率高于此阈值时判定为隐写图像。
pub const STEGO_THRESHOLD: f64 = 0.5;

/// 扫描时每个字节包含的位数。
pub const BITS_PER_BYTE: usize = 8;
