//! # 错误类型模块
//!
//! 隐写与隐写分析核心的全部失败情形。每一种都可由调用方恢复，
//! 不会被静默折算为默认值。

use thiserror::Error;

/// 核心操作的结果类型。
pub type Result<T> = std::result::Result<T, StegoError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StegoError {
    /// 载荷所需像素数超过图像像素总数，图像未被修改。
    #[error("Not enough space in the image: {needed} pixels required, {available} available")]
    CapacityError { needed: usize, available: usize },

    /// 位串长度不是 8 的整数倍，或包含 '0'/'1' 以外的符号。
    #[error("Malformed bit string: {reason}")]
    MalformedInput { reason: String },

    /// 数值无法用给定位宽表示。
    #[error("Value {value} does not fit into a {width}-bit header")]
    ValueOutOfRange { value: u64, width: u32 },

    /// 扫描完整幅图像仍未找到终止符；`partial` 为已读出的全部完整字节。
    #[error("Terminator not found after reading {} bytes", .partial.len())]
    TerminatorNotFound { partial: Vec<u8> },

    /// 图像容纳不下头部，或头部声明的像素数多于图像实际像素数。
    #[error("Truncated header: {needed} required, only {available} available")]
    TruncatedHeader { needed: usize, available: usize },

    /// 头部声明的像素数连头部本身都装不下。
    #[error("Invalid header: {pixels_needed} pixels cannot hold a {header_bits}-bit header")]
    InvalidHeader { pixels_needed: u64, header_bits: u32 },

    /// 某个颜色通道的二次方程退化为 0/0 或除以零。
    #[error("Sample pairs analysis is indeterminate for channel {channel}")]
    IndeterminateChannel { channel: usize },

    /// 空终止符无法在提取时被定位。
    #[error("The terminator must not be empty")]
    EmptyTerminator,

    /// 像素数据与声明的尺寸或通道数不一致。
    #[error("Invalid pixel grid: {reason}")]
    InvalidGrid { reason: String },

    #[error("Unsupported pixel layout with {channels} channels")]
    UnsupportedLayout { channels: usize },
}
