// 该文件是 Shipai （识牌） 项目的一部分。
// src/input/still_command.rs - 外部拍摄命令采集源
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

use std::io::Read;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, error, info};
use url::Url;

use crate::frame::{InvalidImageError, RgbaFrame};
use crate::input::CaptureSource;
use crate::utils::url_to_path;
use crate::{FromUrl, FromUrlWithScheme};

/// 初次失败后的最大重试次数
const STILL_RETRY_LIMIT: u32 = 3;
/// 两次尝试之间的固定等待
const STILL_RETRY_DELAY: Duration = Duration::from_millis(1000);
/// 单次拍摄命令的运行期限，超过即强制终止
const STILL_COMMAND_TIMEOUT: Duration = Duration::from_secs(10);
/// 等待子进程退出时的轮询间隔
const STILL_WAIT_POLL: Duration = Duration::from_millis(25);

const STILL_COMMAND: &str = "raspistill";
const STILL_COMMAND_ARGS: [&str; 11] = [
  "-t", "1", "-ex", "auto", "-awb", "auto", "-fli", "auto", "-ifx", "denoise", "-n",
];

/// 摄像头被占用/不可用时错误信息携带的特征串
const CAMERA_BUSY_SIGNATURE: &str = "failed to acquire camera";

pub(crate) fn is_camera_busy(message: &str) -> bool {
  message.contains(CAMERA_BUSY_SIGNATURE)
}

#[derive(Error, Debug)]
pub enum StillCommandError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("无法启动拍摄命令 {command}: {source}")]
  Spawn {
    command: String,
    source: std::io::Error,
  },
  #[error("拍摄命令失败 ({status}): {stderr}")]
  CommandFailed { status: String, stderr: String },
  #[error("拍摄命令超时 ({0:?}), 已强制终止")]
  Timeout(Duration),
  #[error("连续 {attempts} 次尝试均失败: {last}")]
  RetriesExhausted {
    attempts: u32,
    last: Box<StillCommandError>,
  },
  #[error("I/O 错误: {0}")]
  Io(#[from] std::io::Error),
  #[error("解码拍摄结果失败: {0}")]
  Decode(#[from] image::ImageError),
  #[error("图像无效: {0}")]
  Invalid(#[from] InvalidImageError),
}

/// 拍摄请求的应答：无论拍摄是否成功，尽力返回目标路径上
/// 最近一次成功写出的文件内容
pub struct StillResponse {
  pub outcome: Result<(), StillCommandError>,
  pub body: Option<Vec<u8>>,
}

/// 通过外部静态拍摄命令采集图像。
///
/// 命令把单帧图像写到固定目标路径；失败时按固定间隔重试，
/// 重试耗尽后上报采集错误。
pub struct StillCommandSource {
  command: String,
  dest: PathBuf,
  retry_limit: u32,
  retry_delay: Duration,
  timeout: Duration,
}

impl FromUrlWithScheme for StillCommandSource {
  const SCHEME: &'static str = "capture";
}

impl FromUrl for StillCommandSource {
  type Error = StillCommandError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(StillCommandError::SchemeMismatch);
    }

    let mut source = StillCommandSource::new(url_to_path(url));
    for (key, value) in url.query_pairs() {
      if key == "command" {
        source.command = value.into_owned();
      }
    }
    Ok(source)
  }
}

impl StillCommandSource {
  pub fn new(dest: impl Into<PathBuf>) -> Self {
    Self {
      command: STILL_COMMAND.to_string(),
      dest: dest.into(),
      retry_limit: STILL_RETRY_LIMIT,
      retry_delay: STILL_RETRY_DELAY,
      timeout: STILL_COMMAND_TIMEOUT,
    }
  }

  pub fn with_command(mut self, command: impl Into<String>) -> Self {
    self.command = command.into();
    self
  }

  pub fn with_retry_limit(mut self, retry_limit: u32) -> Self {
    self.retry_limit = retry_limit;
    self
  }

  pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
    self.retry_delay = retry_delay;
    self
  }

  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }

  pub fn dest(&self) -> &std::path::Path {
    &self.dest
  }

  /// 运行一次拍摄命令，带运行期限
  fn run_once(&self) -> Result<(), StillCommandError> {
    debug!("执行拍摄命令: {} -o {}", self.command, self.dest.display());
    let mut child = Command::new(&self.command)
      .args(STILL_COMMAND_ARGS)
      .arg("-o")
      .arg(&self.dest)
      .stdout(Stdio::null())
      .stderr(Stdio::piped())
      .spawn()
      .map_err(|source| StillCommandError::Spawn {
        command: self.command.clone(),
        source,
      })?;

    let started = Instant::now();
    let status = loop {
      if let Some(status) = child.try_wait()? {
        break status;
      }
      if started.elapsed() >= self.timeout {
        child.kill()?;
        child.wait()?;
        return Err(StillCommandError::Timeout(self.timeout));
      }
      std::thread::sleep(STILL_WAIT_POLL);
    };

    if status.success() {
      return Ok(());
    }

    let mut stderr = String::new();
    if let Some(mut pipe) = child.stderr.take() {
      let _ = pipe.read_to_string(&mut stderr);
    }
    Err(StillCommandError::CommandFailed {
      status: status.to_string(),
      stderr: stderr.trim().to_string(),
    })
  }

  /// 拍摄一帧，失败时按固定间隔重试直至重试耗尽
  pub fn run_capture(&self) -> Result<(), StillCommandError> {
    let mut attempt: u32 = 0;
    loop {
      match self.run_once() {
        Ok(()) => {
          info!("拍摄完成");
          return Ok(());
        }
        Err(err) => {
          error!("拍摄失败: {}", err);
          if is_camera_busy(&err.to_string()) {
            error!("无法获取摄像头。请检查摄像头模块是否正确连接并启用，以及是否被其它进程占用。");
          }
          if attempt >= self.retry_limit {
            return Err(StillCommandError::RetriesExhausted {
              attempts: attempt + 1,
              last: Box::new(err),
            });
          }
          attempt += 1;
          info!(
            "{:?} 后重试拍摄 ({}/{})",
            self.retry_delay, attempt, self.retry_limit
          );
          std::thread::sleep(self.retry_delay);
        }
      }
    }
  }

  /// 读取目标路径上最近一次成功写出的图像
  fn load_latest(&self) -> Result<RgbaFrame, StillCommandError> {
    let data = std::fs::read(&self.dest)?;
    let image = image::load_from_memory(&data)?;
    Ok(RgbaFrame::from_image(image.to_rgba8())?)
  }

  /// 拍摄请求的完整应答路径：先拍摄（带重试），随后无论结果
  /// 如何都尽力附上目标文件内容，保证采集边界不会空手挂起
  pub fn respond(&self) -> StillResponse {
    let outcome = self.run_capture();
    if let Err(err) = &outcome {
      error!("拍摄请求失败: {}", err);
    }
    let body = std::fs::read(&self.dest).ok();
    StillResponse { outcome, body }
  }
}

impl CaptureSource for StillCommandSource {
  type Error = StillCommandError;

  fn capture(&mut self) -> Result<RgbaFrame, Self::Error> {
    self.run_capture()?;
    self.load_latest()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn from_url_takes_dest_and_command() {
    let url = Url::parse("capture:///run/pen.jpg?command=libcamera-still").unwrap();
    let source = StillCommandSource::from_url(&url).unwrap();
    assert_eq!(source.dest(), std::path::Path::new("/run/pen.jpg"));
    assert_eq!(source.command, "libcamera-still");
  }

  #[test]
  fn from_url_rejects_other_scheme() {
    let url = Url::parse("still:///run/pen.jpg").unwrap();
    assert!(matches!(
      StillCommandSource::from_url(&url),
      Err(StillCommandError::SchemeMismatch)
    ));
  }

  #[test]
  fn busy_signature_is_detected() {
    assert!(is_camera_busy(
      "mmal: main: failed to acquire camera, aborting"
    ));
    assert!(!is_camera_busy("out of memory"));
  }
}
