// 该文件是 Shipai （识牌） 项目的一部分。
// src/task.rs - 巡视循环控制
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

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::detect::Detector;
use crate::diag::Diagnostics;
use crate::frame::RgbaFrame;
use crate::input::CaptureSource;
use crate::model::Model;
use crate::output::{RenderOutcome, Renderer};
use crate::preprocess;

/// 单个周期的耗时预算，超过即告警
const DEFAULT_STALL_BUDGET: Duration = Duration::from_secs(30);

/// 协作式取消令牌，在每个挂起点之前检查
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn cancel(&self) {
    self.0.store(true, Ordering::SeqCst);
  }

  pub fn is_cancelled(&self) -> bool {
    self.0.load(Ordering::SeqCst)
  }
}

/// 巡视循环持有的全部可变状态：当前帧、缓存的模型句柄、
/// 画布与诊断信息流
pub struct LoopContext<'a, M> {
  pub frame: RgbaFrame,
  pub detector: Detector<M>,
  pub renderer: Renderer,
  pub diagnostics: &'a mut Diagnostics,
}

/// 持续车牌巡视任务。
///
/// 一次性初始化（取初始帧、投射验证、预载模型）失败即终止，
/// 循环不会开始；进入稳态后每个周期内的失败只记录不中断，
/// 循环自我延续直到取消令牌生效或达到周期上限。
pub struct PlateWatchTask {
  cancel: CancelToken,
  max_cycles: Option<u64>,
  stall_budget: Duration,
}

impl Default for PlateWatchTask {
  fn default() -> Self {
    Self {
      cancel: CancelToken::new(),
      max_cycles: None,
      stall_budget: DEFAULT_STALL_BUDGET,
    }
  }
}

impl PlateWatchTask {
  pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
    self.cancel = cancel;
    self
  }

  pub fn with_max_cycles(mut self, max_cycles: Option<u64>) -> Self {
    self.max_cycles = max_cycles;
    self
  }

  pub fn with_stall_budget(mut self, stall_budget: Duration) -> Self {
    self.stall_budget = stall_budget;
    self
  }

  pub fn run_task<S, M, F, ME>(
    self,
    mut source: S,
    load_model: F,
    mut renderer: Renderer,
    diagnostics: &mut Diagnostics,
  ) -> anyhow::Result<()>
  where
    S: CaptureSource,
    S::Error: std::error::Error + Sync + Send + 'static,
    M: Model,
    M::Error: std::error::Error + Sync + Send + 'static,
    ME: std::error::Error + Sync + Send + 'static,
    F: FnOnce() -> Result<Detector<M>, ME>,
  {
    info!("开始任务...");

    // 一次性初始化：这里的任何失败都是致命的，循环不会开始
    if self.cancelled_at("初始取帧") {
      return Ok(());
    }
    diagnostics.info("正在获取初始图像...");
    let frame = match source.capture() {
      Ok(frame) => frame,
      Err(err) => {
        diagnostics.error(format!("获取初始图像失败，请检查采集源是否正常: {}", err));
        return Err(err.into());
      }
    };
    renderer.project(&frame);

    if self.cancelled_at("模型加载") {
      return Ok(());
    }
    diagnostics.info("正在加载模型...");
    let detector = match load_model() {
      Ok(detector) => detector,
      Err(err) => {
        diagnostics.error(format!(
          "模型加载失败，请检查模型文件是否存在且有效: {}",
          err
        ));
        return Err(err.into());
      }
    };
    diagnostics.info("模型加载完成");

    let mut ctx = LoopContext {
      frame,
      detector,
      renderer,
      diagnostics,
    };

    let mut cycle: u64 = 0;
    loop {
      if self.cancel.is_cancelled() {
        info!("收到取消请求，退出巡视循环");
        break;
      }
      if let Some(max) = self.max_cycles
        && cycle >= max
      {
        info!("达到指定周期数 {}，退出巡视循环", max);
        break;
      }

      cycle += 1;
      let started = Instant::now();
      if let Err(err) = self.run_cycle(&mut source, &mut ctx) {
        // 周期内的失败不终止循环
        ctx.diagnostics.error(format!("巡视周期 {} 失败: {}", cycle, err));
      }
      let elapsed = started.elapsed();
      debug!("周期 {} 耗时 {:.2?}", cycle, elapsed);
      if elapsed > self.stall_budget {
        warn!(
          "周期 {} 耗时 {:.2?}，超过预算 {:.2?}",
          cycle, elapsed, self.stall_budget
        );
      }
    }

    info!("任务完成，退出");
    Ok(())
  }

  fn run_cycle<S, M>(
    &self,
    source: &mut S,
    ctx: &mut LoopContext<'_, M>,
  ) -> anyhow::Result<()>
  where
    S: CaptureSource,
    S::Error: std::error::Error + Sync + Send + 'static,
    M: Model,
    M::Error: std::error::Error + Sync + Send + 'static,
  {
    // 诊断信息只在周期开始时清空这一次
    ctx.diagnostics.reset();
    ctx.diagnostics.info("开始处理...");

    ctx.frame = preprocess::to_canonical(&ctx.frame)?;

    if self.cancelled_at("推理") {
      return Ok(());
    }
    ctx.diagnostics.info("正在运行模型...");
    let items = ctx.detector.detect(&ctx.frame)?;
    ctx.diagnostics.info("检测完成");

    let outcome = ctx.renderer.render(&ctx.frame, &items, ctx.diagnostics)?;
    if let RenderOutcome::Drawn(bbox) = &outcome {
      ctx.diagnostics.info(format!(
        "检测到车牌: ({:.0}, {:.0}) {:.0}x{:.0}",
        bbox.left, bbox.top, bbox.width, bbox.height
      ));
    }
    ctx.diagnostics.info("处理完成!");

    if self.cancelled_at("取帧") {
      return Ok(());
    }
    ctx.diagnostics.info("正在获取新图像...");
    match source.capture() {
      Ok(next) => {
        ctx.frame = next;
        ctx.diagnostics.info("图像更新完成");
      }
      Err(err) => {
        // 取帧失败只影响下一周期的输入，循环继续
        ctx.diagnostics.error(format!("获取新图像失败: {}", err));
      }
    }

    Ok(())
  }

  fn cancelled_at(&self, stage: &str) -> bool {
    if self.cancel.is_cancelled() {
      info!("收到取消请求，跳过{}及后续步骤", stage);
      true
    } else {
      false
    }
  }
}
