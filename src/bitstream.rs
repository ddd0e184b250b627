//! # 位流编解码模块
//!
//! 字节序列与位序列之间的转换 (每个字节高位在前)，以及定宽长度头部的编解码。

use crate::constants::BITS_PER_BYTE;
use crate::error::{Result, StegoError};
use std::fmt;
use std::str::FromStr;

/// 有序的位序列，显示与解析时为 '0'/'1' 组成的字符串。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitString(Vec<bool>);

impl BitString {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn append(&mut self, other: &BitString) {
        self.0.extend_from_slice(&other.0);
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<bool> for BitString {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for BitString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0
            .iter()
            .try_for_each(|&bit| f.write_str(if bit { "1" } else { "0" }))
    }
}

impl FromStr for BitString {
    type Err = StegoError;

    fn from_str(s: &str) -> Result<Self> {
        s.chars()
            .map(|symbol| match symbol {
                '0' => Ok(false),
                '1' => Ok(true),
                other => Err(StegoError::MalformedInput {
                    reason: format!("unexpected symbol {:?}", other),
                }),
            })
            .collect()
    }
}

/// 将 8 个位 (高位在前) 组装为一个字节。
pub(crate) fn pack_byte(bits: &[bool]) -> u8 {
    bits.iter().fold(0u8, |acc, &bit| (acc << 1) | u8::from(bit))
}

/// 将字节序列展开为位序列，每个字节恰好 8 位，高位在前。
pub fn encode_bytes(payload: &[u8]) -> BitString {
    payload
        .iter()
        .flat_map(|&byte| (0..BITS_PER_BYTE).rev().map(move |shift| (byte >> shift) & 1 == 1))
        .collect()
}

/// `encode_bytes` 的逆运算。
///
/// # Errors
///
/// 位数不是 8 的整数倍时返回 `MalformedInput`。
pub fn decode_bits(bits: &BitString) -> Result<Vec<u8>> {
    if bits.len() % BITS_PER_BYTE != 0 {
        return Err(StegoError::MalformedInput {
            reason: format!("{} bits are not byte-aligned", bits.len()),
        });
    }
    Ok(bits
        .as_slice()
        .chunks_exact(BITS_PER_BYTE)
        .map(pack_byte)
        .collect())
}

/// 以 `width` 位 (高位在前) 编码 `n`。位宽超过 64 时高位补 0。
///
/// # Errors
///
/// `n >= 2^width` 时返回 `ValueOutOfRange`。
pub fn encode_length_header(n: u64, width: u32) -> Result<BitString> {
    if width < u64::BITS && n >> width != 0 {
        return Err(StegoError::ValueOutOfRange { value: n, width });
    }
    Ok((0..width)
        .rev()
        .map(|shift| shift < u64::BITS && (n >> shift) & 1 == 1)
        .collect())
}

/// 解码定宽长度头部。超过 64 位的头部只允许高位全为 0。
///
/// # Errors
///
/// 超出 64 位的高位中有任何一位为 1 时返回 `ValueOutOfRange`。
pub fn decode_length_header(bits: &[bool]) -> Result<u64> {
    let excess = bits.len().saturating_sub(u64::BITS as usize);
    let (high, low) = bits.split_at(excess);
    if high.iter().any(|&bit| bit) {
        return Err(StegoError::ValueOutOfRange {
            value: u64::MAX,
            width: bits.len() as u32,
        });
    }
    Ok(low
        .iter()
        .fold(0u64, |acc, &bit| (acc << 1) | u64::from(bit)))
}
