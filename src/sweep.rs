//! # 载荷扫描模块
//!
//! 在同一张载体图像上以逐步增大的随机载荷 (终止符模式) 反复嵌入，
//! 并用采样对分析测量检测概率随载荷大小的变化。

use crate::analysis::analyze;
use crate::constants::{BITS_PER_BYTE, DEFAULT_TERMINATOR};
use crate::error::{Result, StegoError};
use crate::grid::PixelGrid;
use crate::steganography::{capacity, embed, Mode};
use log::{info, warn};
use rand::Rng;

/// 随机载荷使用的字符集：大写字母与数字。
const PAYLOAD_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// 扫描的起始载荷长度 (字节)。
const MIN_SWEEP_LEN: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepConfig {
    /// 在 `[10, capacity]` 区间内取样的步数，区间包含容量本身。
    pub steps: usize,
    /// 每个载荷长度重复嵌入与分析的次数。
    pub trials: usize,
    pub terminator: Vec<u8>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            steps: 20,
            trials: 5,
            terminator: DEFAULT_TERMINATOR.to_vec(),
        }
    }
}

/// 某一载荷长度下的测量结果。
#[derive(Debug, Clone, PartialEq)]
pub struct SweepPoint {
    pub payload_bytes: usize,
    /// 载荷位数占全部 RGB 槽位的比例。
    pub fraction: f64,
    /// 可确定的试验的平均概率；全部试验都不确定时为 `None`。
    pub mean_probability: Option<f64>,
    /// 分析结果不确定的试验次数，不计入平均值。
    pub indeterminate: usize,
}

/// 计算待测的载荷长度序列。
pub fn sweep_lengths(capacity: usize, config: &SweepConfig) -> Vec<usize> {
    if capacity == 0 {
        return Vec::new();
    }
    let step = (capacity / config.steps.max(1)).max(1);
    (MIN_SWEEP_LEN.min(capacity)..=capacity)
        .step_by(step)
        .collect()
}

fn random_payload<R: Rng + ?Sized>(rng: &mut R, len: usize) -> Vec<u8> {
    (0..len)
        .map(|_| PAYLOAD_ALPHABET[rng.random_range(0..PAYLOAD_ALPHABET.len())])
        .collect()
}

/// 对 `cover` 的副本执行扫描，`cover` 本身不会被修改。
///
/// # Errors
///
/// 嵌入失败或出现 `IndeterminateChannel` 以外的分析错误时返回。
pub fn run_sweep<R: Rng + ?Sized>(
    cover: &PixelGrid,
    config: &SweepConfig,
    rng: &mut R,
) -> Result<Vec<SweepPoint>> {
    let mode = Mode::Terminator(config.terminator.clone());
    let lengths = sweep_lengths(capacity(cover, &mode), config);
    let total_slots = cover.slot_count() as f64;

    lengths
        .into_iter()
        .map(|payload_bytes| -> Result<SweepPoint> {
            let mut sum = 0.0;
            let mut determinate = 0;
            let mut indeterminate = 0;

            for _ in 0..config.trials {
                let mut grid = cover.clone();
                embed(&mut grid, &random_payload(rng, payload_bytes), &mode)?;
                match analyze(&grid) {
                    Ok(report) => {
                        sum += report.probability;
                        determinate += 1;
                    }
                    Err(StegoError::IndeterminateChannel { channel }) => {
                        warn!(
                            "channel {} indeterminate for a {}-byte payload",
                            channel, payload_bytes
                        );
                        indeterminate += 1;
                    }
                    Err(e) => return Err(e),
                }
            }

            let point = SweepPoint {
                payload_bytes,
                fraction: (payload_bytes * BITS_PER_BYTE) as f64 / total_slots,
                mean_probability: (determinate > 0).then(|| sum / determinate as f64),
                indeterminate,
            };
            info!("{:?}", point);
            Ok(point)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn gradient_cover(width: u32, height: u32) -> PixelGrid {
        let mut grid = PixelGrid::new(width, height, 3).unwrap();
        for y in 0..height {
            for x in 0..width {
                for c in 0..3 {
                    *grid.channel_mut(x, y, c).unwrap() =
                        ((x * 3 + y * 2 + c as u32 * 40) % 200 + 20) as u8;
                }
            }
        }
        grid
    }

    #[test]
    fn test_sweep_lengths() {
        let config = SweepConfig {
            steps: 4,
            ..Default::default()
        };
        assert_eq!(sweep_lengths(206, &config), vec![10, 61, 112, 163]);
        assert_eq!(sweep_lengths(5, &config), vec![5]);
        assert!(sweep_lengths(0, &config).is_empty());
    }

    #[test]
    fn test_run_sweep_leaves_cover_untouched() {
        let cover = gradient_cover(24, 24);
        let original = cover.clone();
        let config = SweepConfig {
            steps: 4,
            trials: 2,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(7);

        let points = run_sweep(&cover, &config, &mut rng).unwrap();

        assert_eq!(cover, original);
        assert_eq!(
            points.iter().map(|p| p.payload_bytes).collect::<Vec<_>>(),
            vec![10, 61, 112, 163]
        );
        for point in &points {
            assert!(point.fraction > 0.0 && point.fraction < 1.0);
            assert!(point.indeterminate <= 2);
            assert_eq!(point.mean_probability.is_some(), point.indeterminate < 2);
            if let Some(p) = point.mean_probability {
                assert!((0.0..=1.0).contains(&p));
            }
        }
    }

    #[test]
    fn test_random_payload_uses_alphabet() {
        let mut rng = StdRng::seed_from_u64(1);
        let payload = random_payload(&mut rng, 64);
        assert_eq!(payload.len(), 64);
        assert!(payload.iter().all(|b| PAYLOAD_ALPHABET.contains(b)));
    }
}
