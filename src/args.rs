// 该文件是 Shipai （识牌） 项目的一部分。
// src/args.rs - 项目参数配置
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

use clap::Parser;
use url::Url;

/// Shipai 项目参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 采集源
  /// 支持格式:
  /// - 拍摄命令: capture:///run/pen.jpg 或 capture:///run/pen.jpg?command=libcamera-still
  /// - HTTP 轮询: http://host/api/realtime
  #[arg(long, value_name = "SOURCE", default_value = "capture:///run/pen.jpg")]
  pub source: Url,

  /// 模型描述文件 (model.json)
  #[arg(long, value_name = "MODEL", default_value = "model://models/v2/model.json")]
  pub model: Url,

  /// 标注画布的输出目录（不指定则不落盘）
  #[arg(long, value_name = "DIR")]
  pub output: Option<PathBuf>,

  /// 置信度阈值 (0.0 - 1.0)
  #[arg(long, default_value = "0.6", value_name = "THRESHOLD")]
  pub score: f32,

  /// 重复框抑制的 IOU 阈值 (0.0 - 1.0)
  #[arg(long, default_value = "0.5", value_name = "THRESHOLD")]
  pub iou: f32,

  /// 保留的最大候选数量
  #[arg(long, default_value = "20", value_name = "COUNT")]
  pub topk: usize,

  /// 最大巡视周期数（0 表示无限制）
  #[arg(long, default_value = "0", value_name = "COUNT")]
  pub max_cycles: u64,
}
