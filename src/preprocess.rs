// 该文件是 Shipai （识牌） 项目的一部分。
// src/preprocess.rs - 检测前图像归一化
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

use crate::frame::{InvalidImageError, RGBA_CHANNELS, RgbaFrame};

/// 把 RGBA 像素缓冲区原地转为灰度。
///
/// 每个像素的 R/G/B 通道写入三通道的算术平均值，Alpha 通道保持不变。
/// 缓冲区长度必须是 4 的整数倍，否则返回 [`InvalidImageError`]。
pub fn greyscale_in_place(data: &mut [u8]) -> Result<(), InvalidImageError> {
  if data.len() % RGBA_CHANNELS != 0 {
    return Err(InvalidImageError::NotPixelAligned(data.len()));
  }

  for pixel in data.chunks_exact_mut(RGBA_CHANNELS) {
    let avg = ((pixel[0] as u16 + pixel[1] as u16 + pixel[2] as u16) / 3) as u8;
    pixel[0] = avg;
    pixel[1] = avg;
    pixel[2] = avg;
  }

  Ok(())
}

/// 生成检测用的规范帧（灰度化），原帧保持不变
pub fn to_canonical(frame: &RgbaFrame) -> Result<RgbaFrame, InvalidImageError> {
  let mut canonical = frame.clone();
  greyscale_in_place(canonical.as_bytes_mut())?;
  Ok(canonical)
}
