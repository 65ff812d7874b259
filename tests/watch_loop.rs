// 该文件是 Shipai （识牌） 项目的一部分。
// tests/watch_loop.rs - 巡视循环集成测试
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

use std::cell::RefCell;
use std::collections::VecDeque;
use std::convert::Infallible;

use shipai::detect::Detector;
use shipai::diag::{Diagnostics, Severity, SignalColor};
use shipai::frame::RgbaFrame;
use shipai::input::CaptureSource;
use shipai::model::{DetectItem, Model, PlateBox};
use shipai::output::Renderer;
use shipai::task::{CancelToken, PlateWatchTask};

/// 按脚本逐帧吐出图像的采集源，耗尽后报错
struct ScriptedSource {
  frames: VecDeque<RgbaFrame>,
}

impl ScriptedSource {
  fn with_blank_frames(count: usize) -> Self {
    let frames = (0..count)
      .map(|_| RgbaFrame::from_raw(100, 100, vec![0u8; 100 * 100 * 4]).unwrap())
      .collect();
    Self { frames }
  }

  fn empty() -> Self {
    Self {
      frames: VecDeque::new(),
    }
  }
}

impl CaptureSource for ScriptedSource {
  type Error = std::io::Error;

  fn capture(&mut self) -> Result<RgbaFrame, Self::Error> {
    self
      .frames
      .pop_front()
      .ok_or_else(|| std::io::Error::other("没有更多帧"))
  }
}

/// 按脚本逐周期返回候选框的模型，耗尽后返回空结果
struct ScriptedModel {
  results: RefCell<VecDeque<Vec<DetectItem>>>,
}

impl ScriptedModel {
  fn new(results: Vec<Vec<DetectItem>>) -> Self {
    Self {
      results: RefCell::new(results.into()),
    }
  }
}

impl Model for ScriptedModel {
  type Error = Infallible;

  fn infer(&self, _frame: &RgbaFrame) -> Result<Vec<DetectItem>, Self::Error> {
    Ok(self.results.borrow_mut().pop_front().unwrap_or_default())
  }
}

fn plate(score: f32, left: f32, top: f32, width: f32, height: f32) -> DetectItem {
  DetectItem {
    label: "plate".to_string(),
    score,
    bbox: PlateBox {
      left,
      top,
      width,
      height,
    },
  }
}

#[test]
fn detection_draws_outline_and_signals_success() {
  let dir = tempfile::tempdir().unwrap();
  let source = ScriptedSource::with_blank_frames(2);
  let model = ScriptedModel::new(vec![vec![plate(0.9, 10.0, 10.0, 20.0, 20.0)]]);
  let mut diagnostics = Diagnostics::new();

  PlateWatchTask::default()
    .with_max_cycles(Some(1))
    .run_task(
      source,
      move || Ok::<_, Infallible>(Detector::new(model)),
      Renderer::new().with_save_dir(dir.path()),
      &mut diagnostics,
    )
    .unwrap();

  assert_eq!(diagnostics.color(), SignalColor::Success);
  assert!(
    diagnostics
      .entries()
      .iter()
      .any(|e| e.message.contains("检测到车牌"))
  );

  // 主画布落盘后在 (10,10) 处有红色轮廓
  let primary = image::open(dir.path().join("primary.png")).unwrap().to_rgba8();
  assert_eq!(primary.get_pixel(10, 10), &image::Rgba([255, 0, 0, 255]));
  assert_eq!(primary.get_pixel(29, 29), &image::Rgba([255, 0, 0, 255]));
  let zoom = image::open(dir.path().join("zoom.png")).unwrap();
  assert_eq!(zoom.width(), 320);
  assert_eq!(zoom.height(), 240);
}

#[test]
fn empty_detection_logs_error_and_signals_failure() {
  let dir = tempfile::tempdir().unwrap();
  let source = ScriptedSource::with_blank_frames(2);
  let model = ScriptedModel::new(vec![vec![]]);
  let mut diagnostics = Diagnostics::new();

  PlateWatchTask::default()
    .with_max_cycles(Some(1))
    .run_task(
      source,
      move || Ok::<_, Infallible>(Detector::new(model)),
      Renderer::new().with_save_dir(dir.path()),
      &mut diagnostics,
    )
    .unwrap();

  assert_eq!(diagnostics.color(), SignalColor::Failure);
  assert!(
    diagnostics
      .entries()
      .iter()
      .any(|e| e.severity == Severity::Error && e.message.contains("未能检测到车牌"))
  );
  // 未检出时不落笔，画布不落盘
  assert!(!dir.path().join("primary.png").exists());
}

#[test]
fn diagnostics_reset_once_per_cycle() {
  let source = ScriptedSource::with_blank_frames(4);
  let model = ScriptedModel::new(vec![]);
  let mut diagnostics = Diagnostics::new();

  PlateWatchTask::default()
    .with_max_cycles(Some(3))
    .run_task(
      source,
      move || Ok::<_, Infallible>(Detector::new(model)),
      Renderer::new(),
      &mut diagnostics,
    )
    .unwrap();

  assert_eq!(diagnostics.resets(), 3);
  // 条目只属于最后一个周期，序号从零重新开始
  assert_eq!(diagnostics.entries()[0].ordinal, 0);
  assert!(diagnostics.entries()[0].message.contains("开始处理"));
}

#[test]
fn cycle_failures_do_not_stop_the_loop() {
  // 第二个周期起取帧失败，循环仍然跑满三个周期
  let source = ScriptedSource::with_blank_frames(2);
  let model = ScriptedModel::new(vec![]);
  let mut diagnostics = Diagnostics::new();

  PlateWatchTask::default()
    .with_max_cycles(Some(3))
    .run_task(
      source,
      move || Ok::<_, Infallible>(Detector::new(model)),
      Renderer::new(),
      &mut diagnostics,
    )
    .unwrap();

  assert_eq!(diagnostics.resets(), 3);
}

#[test]
fn model_load_failure_is_fatal_before_first_cycle() {
  let source = ScriptedSource::with_blank_frames(1);
  let mut diagnostics = Diagnostics::new();

  let result = PlateWatchTask::default().run_task(
    source,
    || Err::<Detector<ScriptedModel>, std::io::Error>(std::io::Error::other("模型不可达")),
    Renderer::new(),
    &mut diagnostics,
  );

  assert!(result.is_err());
  // 循环从未开始
  assert_eq!(diagnostics.resets(), 0);
  let last = diagnostics.entries().last().unwrap();
  assert_eq!(last.severity, Severity::Error);
  assert!(last.message.contains("模型加载失败"));
}

#[test]
fn initial_capture_failure_is_fatal() {
  let mut diagnostics = Diagnostics::new();

  let result = PlateWatchTask::default().run_task(
    ScriptedSource::empty(),
    || {
      Ok::<_, Infallible>(Detector::new(ScriptedModel::new(vec![])))
    },
    Renderer::new(),
    &mut diagnostics,
  );

  assert!(result.is_err());
  assert_eq!(diagnostics.resets(), 0);
}

#[test]
fn cancelled_token_stops_before_first_cycle() {
  let source = ScriptedSource::with_blank_frames(2);
  let model = ScriptedModel::new(vec![]);
  let mut diagnostics = Diagnostics::new();
  let cancel = CancelToken::new();
  cancel.cancel();

  PlateWatchTask::default()
    .with_cancel_token(cancel)
    .run_task(
      source,
      move || Ok::<_, Infallible>(Detector::new(model)),
      Renderer::new(),
      &mut diagnostics,
    )
    .unwrap();

  assert_eq!(diagnostics.resets(), 0);
}
