// 该文件是 Shipai （识牌） 项目的一部分。
// src/output.rs - 检测结果呈现
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

use std::path::PathBuf;

use image::{Rgba, RgbaImage};
use thiserror::Error;
use tracing::debug;

use crate::diag::{Diagnostics, SignalColor};
use crate::frame::{InvalidImageError, RgbaFrame};
use crate::model::{DetectItem, PlateBox};

pub mod draw;

mod save_image_file;
pub use self::save_image_file::SurfaceWriter;

/// 细节画布（放大视图）的固定尺寸
pub const ZOOM_WIDTH: u32 = 320;
pub const ZOOM_HEIGHT: u32 = 240;

/// 检测框轮廓色
const OUTLINE_COLOR: Rgba<u8> = Rgba([255, 0, 0, 255]);

#[derive(Error, Debug)]
pub enum OutputError {
  #[error("I/O 错误: {0}")]
  Io(#[from] std::io::Error),
  #[error("图像错误: {0}")]
  Image(#[from] image::ImageError),
  #[error("图像无效: {0}")]
  Invalid(#[from] InvalidImageError),
}

/// 单个周期的呈现结果。
///
/// 未检出不是错误，是需要调用方分支处理的降级成功。
#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
  /// 已在主画布上勾勒出的候选框
  Drawn(PlateBox),
  /// 本周期没有任何候选框
  NothingFound,
}

/// 把检测结果投射到两块画布上：主画布画整幅帧与最高分候选框的
/// 轮廓，细节画布画该候选框区域裁剪缩放后的放大视图。
pub struct Renderer {
  primary: RgbaImage,
  zoom: RgbaImage,
  writer: Option<SurfaceWriter>,
}

impl Default for Renderer {
  fn default() -> Self {
    Self::new()
  }
}

impl Renderer {
  pub fn new() -> Self {
    Self {
      primary: RgbaImage::new(1, 1),
      zoom: RgbaImage::new(ZOOM_WIDTH, ZOOM_HEIGHT),
      writer: None,
    }
  }

  /// 周期结束后把两块画布落盘到指定目录
  pub fn with_save_dir(mut self, dir: impl Into<PathBuf>) -> Self {
    self.writer = Some(SurfaceWriter::new(dir));
    self
  }

  pub fn primary(&self) -> &RgbaImage {
    &self.primary
  }

  pub fn zoom(&self) -> &RgbaImage {
    &self.zoom
  }

  /// 把帧投射到主画布（画布尺寸跟随帧尺寸）。
  ///
  /// 初始化阶段用它验证帧可以被绘制。
  pub fn project(&mut self, frame: &RgbaFrame) {
    self.primary = frame.to_rgba_image();
    debug!("主画布更新为 {}x{}", frame.width(), frame.height());
  }

  /// 呈现一个周期的检测结果。
  ///
  /// 取最高分候选框；没有候选框时记录失败并返回
  /// [`RenderOutcome::NothingFound`]，不画任何东西。
  pub fn render(
    &mut self,
    frame: &RgbaFrame,
    items: &[DetectItem],
    diagnostics: &mut Diagnostics,
  ) -> Result<RenderOutcome, OutputError> {
    let Some(first) = items.first() else {
      diagnostics.error("未能检测到车牌");
      return Ok(RenderOutcome::NothingFound);
    };

    diagnostics.set_color(SignalColor::Success);

    self.project(frame);
    draw::draw_outline(&mut self.primary, &first.bbox, OUTLINE_COLOR);
    self.zoom = draw::zoom_region(&self.primary, &first.bbox, ZOOM_WIDTH, ZOOM_HEIGHT);

    if let Some(writer) = &self.writer {
      writer.save(&self.primary, &self.zoom)?;
    }

    Ok(RenderOutcome::Drawn(first.bbox.clone()))
  }
}
