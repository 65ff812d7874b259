// 该文件是 Shipai （识牌） 项目的一部分。
// src/detect.rs - 检测策略层
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

use tracing::debug;

use crate::frame::RgbaFrame;
use crate::model::{DetectItem, Model};

/// 检测运行选项
#[derive(Debug, Clone, Copy)]
pub struct DetectOptions {
  /// 最低置信度阈值
  pub score: f32,
  /// 重复框抑制的交并比阈值
  pub iou: f32,
  /// 保留的最大候选数量
  pub topk: usize,
}

impl Default for DetectOptions {
  fn default() -> Self {
    Self {
      score: 0.6,
      iou: 0.5,
      topk: 20,
    }
  }
}

/// 模型之上的策略封装：过滤、去重、截断、排序。
///
/// 空候选列表是合法的"未检出"结果，不是错误。
pub struct Detector<M> {
  model: M,
  options: DetectOptions,
}

impl<M: Model> Detector<M> {
  pub fn new(model: M) -> Self {
    Self {
      model,
      options: DetectOptions::default(),
    }
  }

  pub fn with_options(mut self, options: DetectOptions) -> Self {
    self.options = options;
    self
  }

  pub fn options(&self) -> DetectOptions {
    self.options
  }

  pub fn model(&self) -> &M {
    &self.model
  }

  /// 运行推理并应用策略，返回按置信度降序的候选框
  pub fn detect(&self, frame: &RgbaFrame) -> Result<Vec<DetectItem>, M::Error> {
    let mut items = self.model.infer(frame)?;

    items.retain(|item| item.score >= self.options.score);
    items.sort_by(|a, b| b.score.total_cmp(&a.score));
    let mut items = suppress_overlaps(items, self.options.iou);
    items.truncate(self.options.topk);

    debug!("检测得到 {} 个候选框", items.len());
    Ok(items)
  }
}

/// 贪心抑制重叠框：输入按置信度降序，交并比达到阈值的后续框被丢弃
fn suppress_overlaps(items: Vec<DetectItem>, iou_threshold: f32) -> Vec<DetectItem> {
  let mut kept: Vec<DetectItem> = Vec::with_capacity(items.len());
  for item in items {
    if kept.iter().all(|k| k.bbox.iou(&item.bbox) < iou_threshold) {
      kept.push(item);
    }
  }
  kept
}
