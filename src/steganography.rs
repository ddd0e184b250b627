//! # LSB 隐写核心模块
//!
//! 负责把位流写入像素网格 RGB 通道的最低有效位，并按相同的规范扫描顺序读回。
//! 支持两种互斥的模式，由调用方通过 [`Mode`] 显式选择，从不自动猜测。

use crate::bitstream::{
    decode_bits, decode_length_header, encode_bytes, encode_length_header, pack_byte, BitString,
};
use crate::constants::{BITS_PER_BYTE, CHANNELS_PER_PIXEL, DEFAULT_HEADER_BITS, DEFAULT_TERMINATOR};
use crate::error::{Result, StegoError};
use crate::grid::PixelGrid;
use log::{debug, info};

/// 载荷的定界方式。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// 在载荷后追加终止符，提取时扫描到终止符为止。
    Terminator(Vec<u8>),
    /// 在载荷前写入 `header_bits` 位的头部，记录所需像素数。
    LengthPrefixed { header_bits: u32 },
}

impl Mode {
    pub fn terminator() -> Self {
        Mode::Terminator(DEFAULT_TERMINATOR.to_vec())
    }
}

impl Default for Mode {
    fn default() -> Self {
        Mode::LengthPrefixed {
            header_bits: DEFAULT_HEADER_BITS,
        }
    }
}

/// 一次成功嵌入的统计信息。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbedSummary {
    pub bits_written: usize,
    pub pixels_used: usize,
    /// LSB 实际发生翻转的通道数。
    pub channels_changed: usize,
}

/// 按模式构建完整的待写入位流。
///
/// 长度前缀模式下头部记录的是像素数：`ceil((header_bits + 8 * L) / 3)`。
pub fn payload_bits(payload: &[u8], mode: &Mode) -> Result<BitString> {
    match mode {
        Mode::Terminator(terminator) => {
            if terminator.is_empty() {
                return Err(StegoError::EmptyTerminator);
            }
            let mut framed = Vec::with_capacity(payload.len() + terminator.len());
            framed.extend_from_slice(payload);
            framed.extend_from_slice(terminator);
            Ok(encode_bytes(&framed))
        }
        Mode::LengthPrefixed { header_bits } => {
            let total_bits = *header_bits as usize + payload.len() * BITS_PER_BYTE;
            let pixels_needed = total_bits.div_ceil(CHANNELS_PER_PIXEL);
            let mut bits = encode_length_header(pixels_needed as u64, *header_bits)?;
            bits.append(&encode_bytes(payload));
            Ok(bits)
        }
    }
}

/// 将 `payload` 写入 `grid` 的 RGB 最低有效位。
///
/// 容量检查先于任何修改：失败时网格保持原样。每个被写入的通道都执行
/// `(old & !1) | bit`，因此通道值最多变化 1，且以相同位重复写入是幂等的。
///
/// # Errors
///
/// * `CapacityError` - 所需像素数超过网格像素总数。
/// * `ValueOutOfRange` - 所需像素数无法用头部位宽表示。
/// * `EmptyTerminator` - 终止符模式下终止符为空。
pub fn embed(grid: &mut PixelGrid, payload: &[u8], mode: &Mode) -> Result<EmbedSummary> {
    let bits = payload_bits(payload, mode)?;
    let pixels_needed = bits.len().div_ceil(CHANNELS_PER_PIXEL);
    let available = grid.pixel_count();

    if pixels_needed > available {
        return Err(StegoError::CapacityError {
            needed: pixels_needed,
            available,
        });
    }

    let mut channels_changed = 0;
    grid.slots_mut().zip(bits.iter()).for_each(|(value, bit)| {
        let updated = (*value & !1) | u8::from(bit);
        if updated != *value {
            channels_changed += 1;
        }
        *value = updated;
    });

    info!(
        "embedded {} bytes as {} bits into {} of {} pixels",
        payload.len(),
        bits.len(),
        pixels_needed,
        available
    );

    Ok(EmbedSummary {
        bits_written: bits.len(),
        pixels_used: pixels_needed,
        channels_changed,
    })
}

/// 按 `mode` 从 `grid` 中提取原始字节，不做任何字符过滤。
///
/// # Errors
///
/// * `TerminatorNotFound` - 扫描完整幅图像仍未遇到终止符，携带已读出的部分字节。
/// * `TruncatedHeader` - 图像装不下头部，或头部声明的像素数超过图像像素数。
/// * `InvalidHeader` - 头部声明的像素数连头部本身都装不下。
/// * `EmptyTerminator` - 终止符为空。
pub fn extract(grid: &PixelGrid, mode: &Mode) -> Result<Vec<u8>> {
    match mode {
        Mode::Terminator(terminator) => extract_terminated(grid, terminator),
        Mode::LengthPrefixed { header_bits } => extract_length_prefixed(grid, *header_bits),
    }
}

fn lsb_bits(grid: &PixelGrid) -> impl Iterator<Item = bool> + '_ {
    grid.slots().map(|value| value & 1 == 1)
}

fn extract_terminated(grid: &PixelGrid, terminator: &[u8]) -> Result<Vec<u8>> {
    if terminator.is_empty() {
        return Err(StegoError::EmptyTerminator);
    }

    let mut message = Vec::new();
    let mut pending = Vec::with_capacity(BITS_PER_BYTE);

    for bit in lsb_bits(grid) {
        pending.push(bit);
        if pending.len() < BITS_PER_BYTE {
            continue;
        }
        message.push(pack_byte(&pending));
        pending.clear();

        if message.ends_with(terminator) {
            message.truncate(message.len() - terminator.len());
            debug!("terminator found after {} message bytes", message.len());
            return Ok(message);
        }
    }

    Err(StegoError::TerminatorNotFound { partial: message })
}

fn extract_length_prefixed(grid: &PixelGrid, header_bits: u32) -> Result<Vec<u8>> {
    let header_len = header_bits as usize;
    let available_slots = grid.slot_count();
    if header_len > available_slots {
        return Err(StegoError::TruncatedHeader {
            needed: header_len,
            available: available_slots,
        });
    }

    let mut bits = lsb_bits(grid);
    let header: Vec<bool> = bits.by_ref().take(header_len).collect();
    let pixels_needed = decode_length_header(&header)?;

    let available = grid.pixel_count();
    let pixels = usize::try_from(pixels_needed)
        .ok()
        .filter(|&pixels| pixels <= available)
        .ok_or(StegoError::TruncatedHeader {
            needed: usize::try_from(pixels_needed).unwrap_or(usize::MAX),
            available,
        })?;

    let payload_slots = (pixels * CHANNELS_PER_PIXEL)
        .checked_sub(header_len)
        .ok_or(StegoError::InvalidHeader {
            pixels_needed,
            header_bits,
        })?;

    // 最后一个像素中可能有最多两个填充位，只取完整字节。
    let byte_len = payload_slots / BITS_PER_BYTE;
    let body: BitString = bits.take(byte_len * BITS_PER_BYTE).collect();
    debug!("header announces {} pixels, reading {} bytes", pixels, byte_len);

    decode_bits(&body)
}

/// `embed` 在该模式下能接受的最大载荷字节数。
///
/// 头部或终止符本身都放不下时返回 0。
pub fn capacity(grid: &PixelGrid, mode: &Mode) -> usize {
    match mode {
        Mode::Terminator(terminator) => {
            (grid.slot_count() / BITS_PER_BYTE).saturating_sub(terminator.len())
        }
        Mode::LengthPrefixed { header_bits } => {
            let representable = if *header_bits >= usize::BITS {
                usize::MAX
            } else {
                (1usize << header_bits) - 1
            };
            let pixels = grid.pixel_count().min(representable);
            pixels
                .saturating_mul(CHANNELS_PER_PIXEL)
                .saturating_sub(*header_bits as usize)
                / BITS_PER_BYTE
        }
    }
}

/// 清除每个像素 R、G、B 通道的最低有效位，破坏其中可能存在的 LSB 载荷。
///
/// 返回实际被修改的通道数。Alpha 通道保持不变。
pub fn sanitize(grid: &mut PixelGrid) -> usize {
    let mut changed = 0;
    grid.slots_mut().filter(|value| **value & 1 == 1).for_each(|value| {
        *value &= !1;
        changed += 1;
    });
    info!("sanitized {} channels", changed);
    changed
}
