// 该文件是 Shipai （识牌） 项目的一部分。
// src/main.rs - 项目主程序
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

mod args;

use std::thread;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use shipai::FromUrl;
use shipai::detect::{DetectOptions, Detector};
use shipai::diag::Diagnostics;
use shipai::input::SourceWrapper;
use shipai::model::PlateModelBuilder;
use shipai::output::Renderer;
use shipai::task::{CancelToken, PlateWatchTask};

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = args::Args::parse();

  info!("采集源: {}", args.source);
  info!("模型描述: {}", args.model);
  info!("置信度阈值: {}", args.score);
  info!("IOU 阈值: {}", args.iou);

  let source = SourceWrapper::from_url(&args.source)?;

  let cancel = CancelToken::new();
  {
    let cancel = cancel.clone();
    ctrlc::set_handler(move || {
      info!("收到中断信号，准备退出...");
      cancel.cancel();
      thread::spawn(|| {
        thread::sleep(Duration::from_secs(30));
        warn!("强制退出程序");
        std::process::exit(1);
      });
    })?;
  }

  let renderer = match &args.output {
    Some(dir) => Renderer::new().with_save_dir(dir),
    None => Renderer::new(),
  };

  let options = DetectOptions {
    score: args.score,
    iou: args.iou,
    topk: args.topk,
  };
  let model_url = args.model.clone();

  let mut diagnostics = Diagnostics::new();
  PlateWatchTask::default()
    .with_cancel_token(cancel)
    .with_max_cycles((args.max_cycles > 0).then_some(args.max_cycles))
    .run_task(
      source,
      move || {
        PlateModelBuilder::from_url(&model_url)?
          .build()
          .map(|model| Detector::new(model).with_options(options))
      },
      renderer,
      &mut diagnostics,
    )?;

  Ok(())
}
