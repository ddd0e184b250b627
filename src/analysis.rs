//! # 采样对分析 (Sample Pairs Analysis) 模块
//!
//! 估计图像 RGB 通道最低有效位被改写的比例。
//!
//! 对每个颜色通道，把相邻样本组成互不重叠的水平对与垂直对，
//! 按 LSB 与大小关系统计 W、X、Y、Z 四类计数，再解二次方程
//! `a·r² + b·r + c = 0` 得到该通道的嵌入率估计。三个通道取平均，
//! 其绝对值 (上限为 1) 即为隐写概率。

use crate::constants::{CHANNELS_PER_PIXEL, STEGO_THRESHOLD};
use crate::error::{Result, StegoError};
use crate::grid::PixelGrid;
use log::debug;

/// 单个颜色通道的采样对计数。各类别互不排斥，一个样本对可以同时计入多类。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PairCounts {
    pub w: u64,
    pub x: u64,
    pub y: u64,
    pub z: u64,
    /// 样本对总数，无论是否计入任何类别。
    pub pairs: u64,
}

impl PairCounts {
    fn record(&mut self, u: u8, v: u8) {
        // 比较的是 u 的 LSB 与 v 去掉 LSB 后的值，这一不对称正是该检验的定义。
        if (u >> 1) == (v >> 1) && (u & 1) != (v >> 1) {
            self.w += 1;
        }
        if u == v {
            self.z += 1;
        }
        let v_even = v & 1 == 0;
        if (v_even && u < v) || (!v_even && u > v) {
            self.x += 1;
        }
        if (v_even && u > v) || (!v_even && u < v) {
            self.y += 1;
        }
        self.pairs += 1;
    }
}

/// 一次分析的结果。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpaReport {
    pub is_stego: bool,
    /// `min(|三个通道嵌入率的平均值|, 1)`
    pub probability: f64,
    pub channel_rates: [f64; CHANNELS_PER_PIXEL],
    /// `probability * width * height * 3`
    pub estimated_payload_bits: f64,
    pub estimated_payload_bytes: u64,
}

/// 统计通道 `channel` 上的全部采样对。
///
/// 先遍历水平对 `(x, y)-(x + 1, y)` (x 为偶数，奇数宽度时丢弃最后一列)，
/// 再遍历垂直对 `(x, y)-(x, y + 1)` (y 为偶数，奇数高度时丢弃最后一行)。
pub fn count_pairs(grid: &PixelGrid, channel: usize) -> PairCounts {
    let (width, height) = (grid.width(), grid.height());
    let sample = |x: u32, y: u32| grid.channel(x, y, channel);
    let mut counts = PairCounts::default();

    for y in 0..height {
        for x in (0..width.saturating_sub(1)).step_by(2) {
            if let Some((u, v)) = sample(x, y).zip(sample(x + 1, y)) {
                counts.record(u, v);
            }
        }
    }

    for y in (0..height.saturating_sub(1)).step_by(2) {
        for x in 0..width {
            if let Some((u, v)) = sample(x, y).zip(sample(x, y + 1)) {
                counts.record(u, v);
            }
        }
    }

    counts
}

/// 由计数求解嵌入率。
///
/// `a = (W + Z) / 2`，`b = 2X - P`，`c = Y - X`。`a == 0` 或判别式为负时退化为 `c / b`；
/// 否则取两个实根中绝对值较小者 (相等时取 `(-b + √d) / 2a`)。
/// 退化路径中 `b == 0` 时结果不确定，返回 `None`。
pub fn estimate_rate(counts: &PairCounts) -> Option<f64> {
    let a = (counts.w + counts.z) as f64 / 2.0;
    let b = 2.0 * counts.x as f64 - counts.pairs as f64;
    let c = counts.y as f64 - counts.x as f64;
    let linear = || (b != 0.0).then(|| c / b);

    if a == 0.0 {
        return linear();
    }

    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return linear();
    }

    let root = discriminant.sqrt();
    let plus = (-b + root) / (2.0 * a);
    let minus = (-b - root) / (2.0 * a);
    Some(if plus.abs() <= minus.abs() { plus } else { minus })
}

/// 单个通道的嵌入率估计。
///
/// # Errors
///
/// 方程退化为 0/0 或除以零时返回 `IndeterminateChannel`。
pub fn channel_rate(grid: &PixelGrid, channel: usize) -> Result<f64> {
    let counts = count_pairs(grid, channel);
    debug!("channel {}: {:?}", channel, counts);
    estimate_rate(&counts).ok_or(StegoError::IndeterminateChannel { channel })
}

/// 对 `grid` 做采样对分析。输入网格不会被修改。
///
/// # Errors
///
/// 任一通道不确定时返回 `IndeterminateChannel`，而不是把它当作概率 0。
pub fn analyze(grid: &PixelGrid) -> Result<SpaReport> {
    let mut channel_rates = [0.0; CHANNELS_PER_PIXEL];
    for (channel, rate) in channel_rates.iter_mut().enumerate() {
        *rate = channel_rate(grid, channel)?;
    }

    let average = channel_rates.iter().sum::<f64>() / CHANNELS_PER_PIXEL as f64;
    let probability = average.abs().min(1.0);
    let estimated_payload_bits = probability * grid.slot_count() as f64;

    debug!("channel rates {:?}, probability {:.4}", channel_rates, probability);

    Ok(SpaReport {
        is_stego: probability > STEGO_THRESHOLD,
        probability,
        channel_rates,
        estimated_payload_bits,
        estimated_payload_bytes: (estimated_payload_bits / 8.0) as u64,
    })
}
