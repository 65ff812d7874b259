// 该文件是 Shipai （识牌） 项目的一部分。
// src/model/onnx_plate.rs - ONNX 车牌检测模型
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

use std::collections::HashMap;
use std::path::PathBuf;

use candle_core::{DType, Device, Tensor};
use candle_onnx::onnx::ModelProto;
use candle_onnx::{read_file, simple_eval};
use image::DynamicImage;
use image::imageops::FilterType;
use tracing::{debug, info};
use url::Url;

use crate::frame::RgbaFrame;
use crate::model::{DetectItem, Model, ModelDescriptor, ModelError, PlateBox};
use crate::utils::url_to_path;
use crate::{FromUrl, FromUrlWithScheme};

/// 输出张量的每行布局: x_min, y_min, x_max, y_max, score, class_id
const OUTPUT_ROW_LEN: usize = 6;

pub struct PlateModelBuilder {
  descriptor_path: PathBuf,
}

impl FromUrlWithScheme for PlateModelBuilder {
  const SCHEME: &'static str = "model";
}

impl FromUrl for PlateModelBuilder {
  type Error = ModelError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(ModelError::SchemeMismatch);
    }

    Ok(PlateModelBuilder {
      descriptor_path: url_to_path(url),
    })
  }
}

impl PlateModelBuilder {
  pub fn new(descriptor_path: impl Into<PathBuf>) -> Self {
    Self {
      descriptor_path: descriptor_path.into(),
    }
  }

  /// 加载描述文件与 ONNX 工件，构造可推理的模型。
  ///
  /// 加载在进程内只发生一次，句柄随后被巡视上下文持有并复用。
  pub fn build(self) -> Result<PlateModel, ModelError> {
    let descriptor = ModelDescriptor::load(&self.descriptor_path)?;
    let artifact = descriptor.artifact_path(&self.descriptor_path);

    info!("加载模型工件: {}", artifact.display());
    let proto = read_file(&artifact).map_err(|source| ModelError::ArtifactLoad {
      path: artifact.clone(),
      source,
    })?;

    let graph = proto.graph.as_ref().ok_or(ModelError::GraphMissing)?;
    let input_name = graph
      .input
      .first()
      .map(|i| i.name.clone())
      .ok_or(ModelError::GraphMissing)?;
    let output_name = graph
      .output
      .first()
      .map(|o| o.name.clone())
      .ok_or(ModelError::GraphMissing)?;
    debug!("模型输入: {}, 输出: {}", input_name, output_name);
    info!("模型加载完成: {} {}", descriptor.name, descriptor.version);

    Ok(PlateModel {
      descriptor,
      proto,
      input_name,
      output_name,
      device: Device::Cpu,
    })
  }
}

/// ONNX 车牌检测模型。
///
/// 工件约定：单输入 NCHW f32（0..1），单输出 `[1, n, 6]` 或 `[n, 6]`，
/// 每行 `[x_min, y_min, x_max, y_max, score, class_id]`，坐标为模型
/// 输入像素坐标。
pub struct PlateModel {
  descriptor: ModelDescriptor,
  proto: ModelProto,
  input_name: String,
  output_name: String,
  device: Device,
}

impl PlateModel {
  pub fn descriptor(&self) -> &ModelDescriptor {
    &self.descriptor
  }

  fn prepare_input(&self, frame: &RgbaFrame) -> Result<Tensor, ModelError> {
    let (w, h) = (self.descriptor.input_width, self.descriptor.input_height);
    let image = DynamicImage::ImageRgba8(frame.to_rgba_image())
      .resize_exact(w, h, FilterType::CatmullRom)
      .to_rgb8();
    let data = image.into_raw();

    let tensor = Tensor::from_vec(data, (h as usize, w as usize, 3), &self.device)?
      .permute((2, 0, 1))?
      .to_dtype(DType::F32)?
      .affine(1.0 / 255.0, 0.0)?
      .unsqueeze(0)?;
    Ok(tensor)
  }

  fn decode_output(&self, output: &Tensor, frame: &RgbaFrame) -> Result<Vec<DetectItem>, ModelError> {
    let output = match output.dims() {
      [1, _, OUTPUT_ROW_LEN] => output.squeeze(0)?,
      [_, OUTPUT_ROW_LEN] => output.clone(),
      dims => return Err(ModelError::OutputShape(dims.to_vec())),
    };
    let rows = output.to_vec2::<f32>()?;

    // 模型输入坐标换算回原始帧坐标
    let scale_x = frame.width() as f32 / self.descriptor.input_width as f32;
    let scale_y = frame.height() as f32 / self.descriptor.input_height as f32;
    let frame_w = frame.width() as f32;
    let frame_h = frame.height() as f32;

    let mut items = Vec::with_capacity(rows.len());
    for row in rows {
      let x_min = (row[0] * scale_x).clamp(0.0, frame_w);
      let y_min = (row[1] * scale_y).clamp(0.0, frame_h);
      let x_max = (row[2] * scale_x).clamp(0.0, frame_w);
      let y_max = (row[3] * scale_y).clamp(0.0, frame_h);
      if x_max <= x_min || y_max <= y_min {
        continue;
      }

      let score = row[4];
      let class_id = row[5] as usize;
      items.push(DetectItem {
        label: self.descriptor.label(class_id).to_string(),
        score,
        bbox: PlateBox {
          left: x_min,
          top: y_min,
          width: x_max - x_min,
          height: y_max - y_min,
        },
      });
    }

    debug!("模型产出 {} 个原始候选框", items.len());
    Ok(items)
  }
}

impl Model for PlateModel {
  type Error = ModelError;

  fn infer(&self, frame: &RgbaFrame) -> Result<Vec<DetectItem>, Self::Error> {
    debug!("准备模型输入张量");
    let tensor = self.prepare_input(frame)?;

    debug!("执行模型推理");
    let mut inputs = HashMap::new();
    inputs.insert(self.input_name.clone(), tensor);
    let mut outputs = simple_eval(&self.proto, inputs)?;

    let output = outputs
      .remove(&self.output_name)
      .ok_or_else(|| ModelError::OutputMissing(self.output_name.clone()))?;

    self.decode_output(&output, frame)
  }
}
