// 该文件是 Shipai （识牌） 项目的一部分。
// src/model.rs - 检测模型接口与描述文件
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

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::frame::RgbaFrame;

mod onnx_plate;
pub use self::onnx_plate::{PlateModel, PlateModelBuilder};

/// 检测能力的抽象：图像进，打分候选框出。
///
/// 推理实现对调用方是不透明的，空结果是合法的"未检出"。
pub trait Model {
  type Error;

  fn infer(&self, frame: &RgbaFrame) -> Result<Vec<DetectItem>, Self::Error>;
}

/// 轴对齐矩形，图像像素坐标
#[derive(Debug, Clone, PartialEq)]
pub struct PlateBox {
  pub left: f32,
  pub top: f32,
  pub width: f32,
  pub height: f32,
}

impl PlateBox {
  pub fn right(&self) -> f32 {
    self.left + self.width
  }

  pub fn bottom(&self) -> f32 {
    self.top + self.height
  }

  pub fn area(&self) -> f32 {
    self.width * self.height
  }

  /// 两框的交并比，无重叠时为 0
  pub fn iou(&self, other: &PlateBox) -> f32 {
    let ix = (self.right().min(other.right()) - self.left.max(other.left)).max(0.0);
    let iy = (self.bottom().min(other.bottom()) - self.top.max(other.top)).max(0.0);
    let intersection = ix * iy;
    let union = self.area() + other.area() - intersection;
    if union <= 0.0 {
      return 0.0;
    }
    intersection / union
  }
}

#[derive(Debug, Clone)]
pub struct DetectItem {
  pub label: String,
  pub score: f32,
  pub bbox: PlateBox,
}

#[derive(Error, Debug)]
pub enum ModelError {
  #[error("模型描述文件不可达: {path}: {source}")]
  DescriptorUnreachable {
    path: PathBuf,
    source: std::io::Error,
  },
  #[error("模型描述文件无效: {path}: {source}")]
  DescriptorInvalid {
    path: PathBuf,
    source: serde_json::Error,
  },
  #[error("模型描述内容非法: {0}")]
  DescriptorMalformed(String),
  #[error("模型工件加载失败: {path}: {source}")]
  ArtifactLoad {
    path: PathBuf,
    source: candle_core::Error,
  },
  #[error("模型计算图缺失")]
  GraphMissing,
  #[error("模型推理失败: {0}")]
  Inference(#[from] candle_core::Error),
  #[error("模型输出缺失: {0}")]
  OutputMissing(String),
  #[error("模型输出形状异常: {0:?}")]
  OutputShape(Vec<usize>),
  #[error("URI 方案不匹配")]
  SchemeMismatch,
}

/// 版本化的模型描述文件（model.json）
#[derive(Debug, Clone, Deserialize)]
pub struct ModelDescriptor {
  pub name: String,
  pub version: String,
  /// ONNX 工件路径，相对于描述文件所在目录
  pub artifact: String,
  pub input_width: u32,
  pub input_height: u32,
  pub labels: Vec<String>,
}

impl ModelDescriptor {
  pub fn load(path: &Path) -> Result<Self, ModelError> {
    info!("读取模型描述文件: {}", path.display());
    let data = std::fs::read(path).map_err(|source| ModelError::DescriptorUnreachable {
      path: path.to_path_buf(),
      source,
    })?;
    let descriptor: ModelDescriptor =
      serde_json::from_slice(&data).map_err(|source| ModelError::DescriptorInvalid {
        path: path.to_path_buf(),
        source,
      })?;
    descriptor.validate()?;
    debug!(
      "模型描述: {} v{}, 输入 {}x{}, {} 个标签",
      descriptor.name,
      descriptor.version,
      descriptor.input_width,
      descriptor.input_height,
      descriptor.labels.len()
    );
    Ok(descriptor)
  }

  fn validate(&self) -> Result<(), ModelError> {
    if self.input_width == 0 || self.input_height == 0 {
      return Err(ModelError::DescriptorMalformed(format!(
        "输入尺寸无效: {}x{}",
        self.input_width, self.input_height
      )));
    }
    if self.labels.is_empty() {
      return Err(ModelError::DescriptorMalformed("标签列表为空".to_string()));
    }
    Ok(())
  }

  /// 工件的绝对路径（相对描述文件目录解析）
  pub fn artifact_path(&self, descriptor_path: &Path) -> PathBuf {
    match descriptor_path.parent() {
      Some(parent) => parent.join(&self.artifact),
      None => PathBuf::from(&self.artifact),
    }
  }

  pub fn label(&self, class_id: usize) -> &str {
    self
      .labels
      .get(class_id)
      .map(String::as_str)
      .unwrap_or("unknown")
  }
}
