//! # 命令处理逻辑模块
//!
//! 包含各子命令的高级业务逻辑。
//! 本模块负责协调图像与文件 I/O、调用核心算法以及向用户报告结果。

use crate::analysis::{analyze, SpaReport};
use crate::cli::{AnalyzeArgs, HideArgs, RecoverArgs, SanitizeArgs, SweepArgs};
use crate::constants::STEGO_THRESHOLD;
use crate::error::StegoError;
use crate::grid::PixelGrid;
use crate::steganography::{capacity, embed, extract, sanitize};
use crate::sweep::{run_sweep, SweepConfig, SweepPoint};
use anyhow::{Context, Result};
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};

/// 读取并解码图像，转换为像素网格。
fn load_grid(path: &Path) -> Result<PixelGrid> {
    let image = image::open(path).with_context(|| {
        format!(
            "Unable to read image file: {}",
            path.to_string_lossy().red().bold()
        )
    })?;
    Ok(PixelGrid::from(&image))
}

/// 将像素网格编码后写入 `path`，格式由扩展名决定。
fn save_grid(grid: PixelGrid, path: &Path) -> Result<()> {
    let image = grid
        .into_dynamic_image()
        .context("Unable to convert the pixel grid back into an image")?;
    image.save(path).with_context(|| {
        format!(
            "Unable to write to target image file: {}",
            path.to_string_lossy().red().bold()
        )
    })
}

/// 在输入文件所在目录下生成 `<prefix>_<名称>.<extension>`。
fn default_output(input: &Path, prefix: &str, extension: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{}_{}.{}", prefix, stem, extension))
}

/// 除非指定了 `--force`，否则拒绝覆盖已存在的文件。
fn ensure_writable(path: &Path, force: bool) -> Result<()> {
    anyhow::ensure!(
        force || !path.exists(),
        "Output file already exists: {} \nUse --force to overwrite it.",
        path.to_string_lossy().red().bold()
    );
    Ok(())
}

/// 处理 'Hide' 命令的执行逻辑。
///
/// 负责读取图像和载荷文件、检查隐写空间是否足够、调用核心函数嵌入载荷，
/// 最后将结果写入目标图像文件。
///
/// # Arguments
///
/// * `args` - 包含输入/输出路径与模式设置的 `HideArgs` 结构体。
///
/// # Errors
///
/// 如果发生以下任一情况，将返回错误：
/// * 目标文件已存在且未指定 `--force`。
/// * 无法读取输入的图像或载荷文件。
/// * 图像没有足够的空间来隐藏载荷。
/// * 无法写入到目标图像文件。
pub fn handle_hide(args: HideArgs) -> Result<()> {
    let dest = args
        .dest
        .clone()
        .unwrap_or_else(|| default_output(&args.image, "doctored", "png"));
    ensure_writable(&dest, args.force)?;

    let mut grid = load_grid(&args.image)?;

    let text = fs::read(&args.text).with_context(|| {
        format!(
            "Unable to read text file: {}",
            args.text.to_string_lossy().red().bold()
        )
    })?;

    let mode = args.mode.to_mode();
    let available_space = capacity(&grid, &mode);

    anyhow::ensure!(
        text.len() <= available_space,
        "Not enough space in the image to hide the text. \nRequired: {} bytes, Available: {} bytes",
        text.len().to_string().red().bold(),
        available_space.to_string().green().bold()
    );

    let summary = embed(&mut grid, &text, &mode).with_context(|| {
        format!(
            "Failed to hide {} bytes in the image.",
            text.len().to_string().red().bold()
        )
    })?;

    save_grid(grid, &dest)?;

    println!(
        "The text has been successfully hidden in {} pixels and saved: {}",
        summary.pixels_used.to_string().green(),
        dest.to_string_lossy().green().bold()
    );

    Ok(())
}

/// 处理 'Recover' 命令的执行逻辑。
///
/// 负责读取经过隐写的图像文件、按指定模式提取载荷，并写入目标文件。
///
/// # Errors
///
/// 如果发生以下任一情况，将返回错误：
/// * 目标文件已存在且未指定 `--force`。
/// * 无法读取输入的图像文件。
/// * 提取失败。终止符模式下找不到终止符时，已读出的部分数据仍会写入目标文件，
///   但依然返回错误以标明结果未终止。
/// * 无法写入到目标文件。
pub fn handle_recover(args: RecoverArgs) -> Result<()> {
    let text_path = args
        .text
        .clone()
        .unwrap_or_else(|| default_output(&args.image, "recovered", "txt"));
    ensure_writable(&text_path, args.force)?;

    let grid = load_grid(&args.image)?;

    let write_text = |bytes: &[u8]| {
        fs::write(&text_path, bytes).with_context(|| {
            format!(
                "Unable to write to target text file: {}",
                text_path.to_string_lossy().red().bold()
            )
        })
    };

    let text = match extract(&grid, &args.mode.to_mode()) {
        Ok(text) => text,
        Err(StegoError::TerminatorNotFound { partial }) => {
            write_text(&partial)?;
            anyhow::bail!(
                "Terminator not found in '{}'. \n{} unterminated bytes were written to {}",
                args.image.to_string_lossy().red().bold(),
                partial.len().to_string().red().bold(),
                text_path.to_string_lossy().yellow()
            );
        }
        Err(e) => {
            return Err(e).with_context(|| {
                format!(
                    "Failed to recover data from '{}'. \nThe image may not contain a hidden message or is corrupted.",
                    args.image.to_string_lossy().red().bold()
                )
            });
        }
    };

    write_text(&text)?;

    println!(
        "The text has been successfully recovered and saved: {}",
        text_path.to_string_lossy().green().bold()
    );
    Ok(())
}

/// 处理 'Analyze' 命令的执行逻辑，打印并返回分析报告。
///
/// # Errors
///
/// 无法读取图像，或某个颜色通道的分析结果不确定时返回错误。
pub fn handle_analyze(args: AnalyzeArgs) -> Result<SpaReport> {
    let grid = load_grid(&args.image)?;

    let report = analyze(&grid).with_context(|| {
        format!(
            "Unable to analyze '{}'. \nThe image is too small or too uniform for sample pairs analysis.",
            args.image.to_string_lossy().red().bold()
        )
    })?;

    println!(
        "Probability of being a stego image: {}",
        format!("{:.4}", report.probability).bold()
    );
    if report.is_stego {
        println!("{}", "This is probably a stego image.".red().bold());
    } else {
        println!("{}", "This is probably not a stego image.".green().bold());
    }
    println!(
        "Channel rates: R {:.4}, G {:.4}, B {:.4}",
        report.channel_rates[0], report.channel_rates[1], report.channel_rates[2]
    );
    println!(
        "Estimated message size: {:.0} bits, {} bytes",
        report.estimated_payload_bits, report.estimated_payload_bytes
    );

    Ok(report)
}

/// 处理 'Sanitize' 命令的执行逻辑：清除全部 RGB 最低有效位后另存图像。
pub fn handle_sanitize(args: SanitizeArgs) -> Result<()> {
    let dest = args
        .dest
        .clone()
        .unwrap_or_else(|| default_output(&args.image, "sanitized", "png"));
    ensure_writable(&dest, args.force)?;

    let mut grid = load_grid(&args.image)?;
    let changed = sanitize(&mut grid);
    save_grid(grid, &dest)?;

    println!(
        "{} channels were cleared and the image was saved: {}",
        changed.to_string().green(),
        dest.to_string_lossy().green().bold()
    );
    Ok(())
}

/// 处理 'Sweep' 命令的执行逻辑，逐行打印并返回测量结果。
pub fn handle_sweep(args: SweepArgs) -> Result<Vec<SweepPoint>> {
    let cover = load_grid(&args.image)?;
    let config = SweepConfig {
        steps: args.steps,
        trials: args.trials,
        terminator: args.terminator.into_bytes(),
        ..Default::default()
    };

    let points = run_sweep(&cover, &config, &mut rand::rng()).with_context(|| {
        format!(
            "Payload sweep failed on '{}'.",
            args.image.to_string_lossy().red().bold()
        )
    })?;

    for point in &points {
        let probability = match point.mean_probability {
            Some(p) if p > STEGO_THRESHOLD => format!("{:.4}", p).red().bold(),
            Some(p) => format!("{:.4}", p).green(),
            None => "indeterminate".yellow(),
        };
        println!(
            "{:>8} bytes ({:>6.2}% of RGB channels): average probability {}",
            point.payload_bytes,
            point.fraction * 100.0,
            probability
        );
    }

    Ok(points)
}
