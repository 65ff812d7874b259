// 该文件是 Shipai （识牌） 项目的一部分。
// tests/capture.rs - 拍摄命令采集源集成测试
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

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::time::{Duration, Instant};

use shipai::input::{CaptureSource, StillCommandError, StillCommandSource};

/// 写一个可执行的拍摄脚本代替真实的拍摄命令
fn write_script(path: &Path, body: &str) {
  std::fs::write(path, format!("#!/bin/sh\n{}\n", body)).unwrap();
  let mut permissions = std::fs::metadata(path).unwrap().permissions();
  permissions.set_mode(0o755);
  std::fs::set_permissions(path, permissions).unwrap();
}

#[test]
fn retries_three_times_with_delay_before_failing() {
  let dir = tempfile::tempdir().unwrap();
  let counter = dir.path().join("attempts");
  let script = dir.path().join("capture.sh");
  write_script(&script, &format!("echo run >> {}\nexit 1", counter.display()));

  let source = StillCommandSource::new(dir.path().join("pen.jpg"))
    .with_command(script.to_string_lossy().into_owned())
    .with_retry_delay(Duration::from_millis(50));

  let started = Instant::now();
  let err = source.run_capture().unwrap_err();
  let elapsed = started.elapsed();

  // 初次尝试 + 3 次重试
  let attempts = std::fs::read_to_string(&counter).unwrap().lines().count();
  assert_eq!(attempts, 4);
  assert!(matches!(
    err,
    StillCommandError::RetriesExhausted { attempts: 4, .. }
  ));
  // 每次重试之间至少等待配置的间隔
  assert!(elapsed >= Duration::from_millis(150));
}

#[test]
fn serves_last_good_file_after_retries_exhausted() {
  let dir = tempfile::tempdir().unwrap();
  let dest = dir.path().join("pen.jpg");
  std::fs::write(&dest, b"last good capture").unwrap();
  let script = dir.path().join("capture.sh");
  write_script(&script, "exit 1");

  let source = StillCommandSource::new(&dest)
    .with_command(script.to_string_lossy().into_owned())
    .with_retry_delay(Duration::from_millis(1));

  let response = source.respond();

  assert!(response.outcome.is_err());
  assert_eq!(response.body.as_deref(), Some(b"last good capture".as_ref()));
}

#[test]
fn serves_nothing_when_no_capture_ever_succeeded() {
  let dir = tempfile::tempdir().unwrap();
  let script = dir.path().join("capture.sh");
  write_script(&script, "exit 1");

  let source = StillCommandSource::new(dir.path().join("pen.jpg"))
    .with_command(script.to_string_lossy().into_owned())
    .with_retry_delay(Duration::from_millis(1));

  let response = source.respond();

  assert!(response.outcome.is_err());
  assert!(response.body.is_none());
}

#[test]
fn successful_command_yields_decoded_frame() {
  let dir = tempfile::tempdir().unwrap();
  let dest = dir.path().join("pen.jpg");

  // 预先生成一张真实图像，脚本把它"拍"到目标路径
  let staged = dir.path().join("staged.png");
  image::RgbaImage::from_pixel(8, 6, image::Rgba([1, 2, 3, 255]))
    .save(&staged)
    .unwrap();
  let script = dir.path().join("capture.sh");
  write_script(
    &script,
    &format!("cp {} {}", staged.display(), dest.display()),
  );

  let mut source = StillCommandSource::new(&dest)
    .with_command(script.to_string_lossy().into_owned());

  let frame = source.capture().unwrap();
  assert_eq!(frame.width(), 8);
  assert_eq!(frame.height(), 6);
}

#[test]
fn hung_command_is_killed_after_deadline() {
  let dir = tempfile::tempdir().unwrap();
  let script = dir.path().join("capture.sh");
  write_script(&script, "sleep 5");

  let source = StillCommandSource::new(dir.path().join("pen.jpg"))
    .with_command(script.to_string_lossy().into_owned())
    .with_retry_limit(0)
    .with_timeout(Duration::from_millis(150));

  let started = Instant::now();
  let err = source.run_capture().unwrap_err();

  assert!(matches!(
    err,
    StillCommandError::RetriesExhausted { attempts: 1, last }
      if matches!(&*last, StillCommandError::Timeout(_))
  ));
  assert!(started.elapsed() < Duration::from_secs(4));
}
