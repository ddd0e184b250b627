//! # lsb_spa 库
//!
//! 本库包含 LSB 隐写 (嵌入与提取) 以及采样对分析 (SPA) 隐写检测的核心逻辑。

// 声明库包含的所有模块。

pub mod analysis;
pub mod bitstream;
pub mod cli;
pub mod constants;
pub mod error;
pub mod grid;
pub mod handler;
pub mod steganography;
pub mod sweep;

pub use error::{Result, StegoError};
pub use grid::PixelGrid;
