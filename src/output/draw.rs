// 该文件是 Shipai （识牌） 项目的一部分。
// src/output/draw.rs - 画布绘制原语
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

use image::imageops::FilterType;
use image::{Rgba, RgbaImage, imageops};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::model::PlateBox;

/// 轮廓线宽（像素）
const OUTLINE_THICKNESS: i32 = 2;

/// 把候选框裁剪到画布范围内，返回整数坐标；框完全在画布外时返回 None
fn clamp_to_canvas(image: &RgbaImage, bbox: &PlateBox) -> Option<(u32, u32, u32, u32)> {
  let (w, h) = (image.width() as f32, image.height() as f32);

  let x_min = bbox.left.floor().clamp(0.0, w - 1.0) as u32;
  let y_min = bbox.top.floor().clamp(0.0, h - 1.0) as u32;
  let x_max = bbox.right().ceil().clamp(0.0, w) as u32;
  let y_max = bbox.bottom().ceil().clamp(0.0, h) as u32;

  if x_max <= x_min || y_max <= y_min {
    return None;
  }
  Some((x_min, y_min, x_max - x_min, y_max - y_min))
}

/// 在画布上勾勒候选框的轮廓，线宽向内收缩
pub fn draw_outline(image: &mut RgbaImage, bbox: &PlateBox, color: Rgba<u8>) {
  let Some((x, y, w, h)) = clamp_to_canvas(image, bbox) else {
    return;
  };

  for thickness in 0..OUTLINE_THICKNESS {
    let inset = thickness as u32;
    if w <= 2 * inset || h <= 2 * inset {
      break;
    }
    let rect = Rect::at((x + inset) as i32, (y + inset) as i32).of_size(w - 2 * inset, h - 2 * inset);
    draw_hollow_rect_mut(image, rect, color);
  }
}

/// 裁剪候选框覆盖的区域并缩放到目标尺寸（放大视图）。
///
/// 框完全在画布外时返回全黑画布。
pub fn zoom_region(image: &RgbaImage, bbox: &PlateBox, dest_width: u32, dest_height: u32) -> RgbaImage {
  let Some((x, y, w, h)) = clamp_to_canvas(image, bbox) else {
    return RgbaImage::new(dest_width, dest_height);
  };

  let region = imageops::crop_imm(image, x, y, w, h).to_image();
  imageops::resize(&region, dest_width, dest_height, FilterType::Triangle)
}
