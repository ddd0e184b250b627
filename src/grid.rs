//! # 像素网格模块
//!
//! `PixelGrid` 是核心算法与图像编解码之间唯一的约定：
//! 一个 `width x height` 的像素矩阵，每个像素至少包含 R、G、B 三个 `u8` 通道。
//!
//! 像素按行优先存储，坐标为 `(x, y)` = (列, 行)。
//! 规范扫描顺序同样是行优先：外层遍历行，内层遍历列，每个像素内依次为 R、G、B。
//! 嵌入与提取都依赖这一顺序，二者必须一致。

use crate::constants::CHANNELS_PER_PIXEL;
use crate::error::{Result, StegoError};
use image::{DynamicImage, RgbImage, RgbaImage};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    width: u32,
    height: u32,
    channels: usize,
    data: Vec<u8>,
}

impl PixelGrid {
    /// 创建一个所有通道均为 0 的网格。
    pub fn new(width: u32, height: u32, channels: usize) -> Result<Self> {
        let len = Self::expected_len(width, height, channels)?;
        Ok(Self {
            width,
            height,
            channels,
            data: vec![0; len],
        })
    }

    /// 由行优先排列的原始通道数据构建网格。
    ///
    /// # Errors
    ///
    /// 通道数少于 3，或 `data` 的长度不等于 `width * height * channels` 时返回 `InvalidGrid`。
    pub fn from_raw(width: u32, height: u32, channels: usize, data: Vec<u8>) -> Result<Self> {
        let len = Self::expected_len(width, height, channels)?;
        if data.len() != len {
            return Err(StegoError::InvalidGrid {
                reason: format!("expected {} channel values, got {}", len, data.len()),
            });
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// 由 RGB 三元组列表 (行优先) 构建三通道网格。
    pub fn from_rgb_pixels(width: u32, height: u32, pixels: &[[u8; 3]]) -> Result<Self> {
        Self::from_raw(width, height, 3, pixels.concat())
    }

    fn expected_len(width: u32, height: u32, channels: usize) -> Result<usize> {
        if channels < CHANNELS_PER_PIXEL {
            return Err(StegoError::InvalidGrid {
                reason: format!("a pixel needs at least 3 channels, got {}", channels),
            });
        }
        (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(channels))
            .ok_or_else(|| StegoError::InvalidGrid {
                reason: format!("{}x{} pixels overflow the address space", width, height),
            })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// 可承载隐写位的通道槽位总数 (每个像素 3 个)。
    pub fn slot_count(&self) -> usize {
        self.pixel_count() * CHANNELS_PER_PIXEL
    }

    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    fn offset(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some((y as usize * self.width as usize + x as usize) * self.channels)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        let start = self.offset(x, y)?;
        self.data.get(start..start + self.channels)
    }

    pub fn pixel_mut(&mut self, x: u32, y: u32) -> Option<&mut [u8]> {
        let start = self.offset(x, y)?;
        let channels = self.channels;
        self.data.get_mut(start..start + channels)
    }

    pub fn channel(&self, x: u32, y: u32, channel: usize) -> Option<u8> {
        self.pixel(x, y)?.get(channel).copied()
    }

    pub fn channel_mut(&mut self, x: u32, y: u32, channel: usize) -> Option<&mut u8> {
        self.pixel_mut(x, y)?.get_mut(channel)
    }

    /// 按规范扫描顺序遍历所有 RGB 通道值。
    pub fn slots(&self) -> impl Iterator<Item = u8> + '_ {
        self.data
            .chunks_exact(self.channels)
            .flat_map(|px| px[..CHANNELS_PER_PIXEL].iter().copied())
    }

    /// 按规范扫描顺序可变地遍历所有 RGB 通道，跳过 alpha 等额外通道。
    pub fn slots_mut(&mut self) -> impl Iterator<Item = &mut u8> + '_ {
        self.data
            .chunks_exact_mut(self.channels)
            .flat_map(|px| px[..CHANNELS_PER_PIXEL].iter_mut())
    }

    /// 转换回 `image` 的图像类型，以便由调用方保存。
    ///
    /// # Errors
    ///
    /// 仅支持 3 通道 (RGB) 与 4 通道 (RGBA) 网格，其余返回 `UnsupportedLayout`。
    pub fn into_dynamic_image(self) -> Result<DynamicImage> {
        let (width, height, channels) = (self.width, self.height, self.channels);
        let image = match channels {
            3 => RgbImage::from_raw(width, height, self.data).map(DynamicImage::ImageRgb8),
            4 => RgbaImage::from_raw(width, height, self.data).map(DynamicImage::ImageRgba8),
            _ => return Err(StegoError::UnsupportedLayout { channels }),
        };
        image.ok_or_else(|| StegoError::InvalidGrid {
            reason: "pixel buffer does not match the image dimensions".to_string(),
        })
    }
}

impl From<&DynamicImage> for PixelGrid {
    /// 带 alpha 的图像转为 4 通道网格，其余统一转为 8 位 RGB。
    fn from(image: &DynamicImage) -> Self {
        if image.color().has_alpha() {
            let rgba = image.to_rgba8();
            let (width, height) = rgba.dimensions();
            Self {
                width,
                height,
                channels: 4,
                data: rgba.into_raw(),
            }
        } else {
            let rgb = image.to_rgb8();
            let (width, height) = rgb.dimensions();
            Self {
                width,
                height,
                channels: 3,
                data: rgb.into_raw(),
            }
        }
    }
}
