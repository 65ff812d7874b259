// 该文件是 Shipai （识牌） 项目的一部分。
// src/frame.rs - RGBA 帧定义
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use image::RgbaImage;
use thiserror::Error;

pub const RGBA_CHANNELS: usize = 4;

#[derive(Error, Debug)]
pub enum InvalidImageError {
  #[error("图像尺寸无效: {0}x{1}")]
  EmptyDimensions(u32, u32),
  #[error("像素缓冲区长度 {0} 不是 {RGBA_CHANNELS} 的整数倍")]
  NotPixelAligned(usize),
  #[error("像素缓冲区长度不匹配: 期望 {expected} ({width}x{height}x{RGBA_CHANNELS}), 实际 {actual}")]
  SizeMismatch {
    width: u32,
    height: u32,
    expected: usize,
    actual: usize,
  },
}

/// RGBA 像素帧
///
/// 每像素固定 4 通道，宽高在构造时校验，之后不可变。
#[derive(Debug, Clone)]
pub struct RgbaFrame {
  width: u32,
  height: u32,
  data: Box<[u8]>,
}

impl RgbaFrame {
  pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self, InvalidImageError> {
    if width == 0 || height == 0 {
      return Err(InvalidImageError::EmptyDimensions(width, height));
    }
    if data.len() % RGBA_CHANNELS != 0 {
      return Err(InvalidImageError::NotPixelAligned(data.len()));
    }
    let expected = (width as usize) * (height as usize) * RGBA_CHANNELS;
    if data.len() != expected {
      return Err(InvalidImageError::SizeMismatch {
        width,
        height,
        expected,
        actual: data.len(),
      });
    }

    Ok(Self {
      width,
      height,
      data: data.into_boxed_slice(),
    })
  }

  pub fn from_image(image: RgbaImage) -> Result<Self, InvalidImageError> {
    let (width, height) = image.dimensions();
    Self::from_raw(width, height, image.into_raw())
  }

  pub fn width(&self) -> u32 {
    self.width
  }

  pub fn height(&self) -> u32 {
    self.height
  }

  pub fn channels(&self) -> usize {
    RGBA_CHANNELS
  }

  pub fn as_bytes(&self) -> &[u8] {
    &self.data
  }

  pub fn as_bytes_mut(&mut self) -> &mut [u8] {
    &mut self.data
  }

  /// 转换为 image crate 的 RGBA 图像（复制像素数据）
  pub fn to_rgba_image(&self) -> RgbaImage {
    RgbaImage::from_raw(self.width, self.height, self.data.to_vec())
      .expect("帧缓冲区与尺寸在构造时已校验")
  }
}
