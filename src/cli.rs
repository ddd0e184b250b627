//! # 命令行接口模块
//!
//! 使用 `clap` 定义了程序的命令行结构，包括子命令和参数。
//! 所有用户通过命令行与程序交互的入口点都在此模块中定义。

use crate::constants::{DEFAULT_HEADER_BITS, DEFAULT_TERMINATOR};
use crate::steganography::Mode;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// 基于 LSB (最低有效位) 的隐写与采样对分析工具，适用于无损格式图像 (如 PNG, BMP)。
#[derive(Parser, Debug)]
#[command(
    version,
    about,
    long_about = "在无损格式图像 (如 PNG, BMP) 中隐藏或恢复数据，并通过采样对分析 (SPA) 估计图像含有隐写内容的概率。"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 在无损格式图像中隐藏文件内容。
    Hide(HideArgs),

    /// 从经过隐写的图像中恢复隐藏的数据。
    Recover(RecoverArgs),

    /// 用采样对分析估计图像被隐写的概率与载荷大小。
    Analyze(AnalyzeArgs),

    /// 清除图像全部 RGB 最低有效位。
    Sanitize(SanitizeArgs),

    /// 以逐步增大的随机载荷测量检测概率。
    Sweep(SweepArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ModeKind {
    /// 载荷前写入记录像素数的定宽头部。
    #[default]
    Length,
    /// 载荷后追加终止符。
    Terminator,
}

/// 载荷定界方式，`hide` 与 `recover` 必须使用相同的设置。
#[derive(Args, Clone, Debug)]
pub struct ModeArgs {
    #[arg(long, value_enum, default_value_t = ModeKind::Length)]
    pub mode: ModeKind,

    /// 长度头部的位宽。
    #[arg(long, default_value_t = DEFAULT_HEADER_BITS)]
    pub header_bits: u32,

    /// 终止符模式使用的终止符。
    #[arg(long, default_value = "endmessage")]
    pub terminator: String,
}

impl ModeArgs {
    pub fn to_mode(&self) -> Mode {
        match self.mode {
            ModeKind::Length => Mode::LengthPrefixed {
                header_bits: self.header_bits,
            },
            ModeKind::Terminator => Mode::Terminator(self.terminator.as_bytes().to_vec()),
        }
    }
}

impl Default for ModeArgs {
    fn default() -> Self {
        Self {
            mode: ModeKind::default(),
            header_bits: DEFAULT_HEADER_BITS,
            terminator: String::from_utf8_lossy(DEFAULT_TERMINATOR).into_owned(),
        }
    }
}

/// 'hide' 命令所需的参数。
#[derive(Args, Debug)]
pub struct HideArgs {
    /// 用于隐写的输入图像文件路径 (如 PNG, BMP)。
    #[arg(short, long)]
    pub image: PathBuf,

    /// 要隐藏的内容的文件路径。
    #[arg(short, long)]
    pub text: PathBuf,

    /// 结果图像的输出路径，默认为输入图像旁的 `doctored_<名称>.png`。
    #[arg(short, long)]
    pub dest: Option<PathBuf>,

    /// 覆盖已存在的输出文件。
    #[arg(short, long)]
    pub force: bool,

    #[command(flatten)]
    pub mode: ModeArgs,
}

/// 'recover' 命令所需的参数。
#[derive(Args, Debug)]
pub struct RecoverArgs {
    /// 已隐藏数据的图像文件路径。
    #[arg(short, long)]
    pub image: PathBuf,

    /// 恢复内容的输出路径，默认为图像旁的 `recovered_<名称>.txt`。
    #[arg(short, long)]
    pub text: Option<PathBuf>,

    /// 覆盖已存在的输出文件。
    #[arg(short, long)]
    pub force: bool,

    #[command(flatten)]
    pub mode: ModeArgs,
}

/// 'analyze' 命令所需的参数。
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// 待分析的图像文件路径。
    #[arg(short, long)]
    pub image: PathBuf,
}

/// 'sanitize' 命令所需的参数。
#[derive(Args, Debug)]
pub struct SanitizeArgs {
    #[arg(short, long)]
    pub image: PathBuf,

    /// 默认为输入图像旁的 `sanitized_<名称>.png`。
    #[arg(short, long)]
    pub dest: Option<PathBuf>,

    #[arg(short, long)]
    pub force: bool,
}

/// 'sweep' 命令所需的参数。
#[derive(Args, Debug)]
pub struct SweepArgs {
    /// 作为载体的图像文件路径，只读。
    #[arg(short, long)]
    pub image: PathBuf,

    #[arg(long, default_value_t = 20)]
    pub steps: usize,

    /// 每个载荷长度的重复次数。
    #[arg(long, default_value_t = 5)]
    pub trials: usize,

    #[arg(long, default_value = "endmessage")]
    pub terminator: String,
}
