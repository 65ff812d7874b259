// 该文件是 Shipai （识牌） 项目的一部分。
// src/input.rs - 图像采集
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

use thiserror::Error;
use url::Url;

use crate::FromUrl;
use crate::frame::RgbaFrame;

mod http_poll;
mod still_command;

pub use self::http_poll::{HttpPollError, HttpPollSource};
pub use self::still_command::{StillCommandError, StillCommandSource, StillResponse};

/// 按需产出图像帧的采集源
pub trait CaptureSource {
  type Error;

  fn capture(&mut self) -> Result<RgbaFrame, Self::Error>;
}

#[derive(Error, Debug)]
pub enum AcquireError {
  #[error("静态拍摄命令错误: {0}")]
  StillCommand(#[from] StillCommandError),
  #[error("HTTP 轮询错误: {0}")]
  HttpPoll(#[from] HttpPollError),
  #[error("URI 方案不匹配")]
  SchemeMismatch,
}

pub enum SourceWrapper {
  StillCommand(StillCommandSource),
  HttpPoll(HttpPollSource),
}

impl FromUrl for SourceWrapper {
  type Error = AcquireError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    use crate::FromUrlWithScheme;

    match url.scheme() {
      StillCommandSource::SCHEME => {
        let source = StillCommandSource::from_url(url)?;
        Ok(SourceWrapper::StillCommand(source))
      }
      "http" | "https" => {
        let source = HttpPollSource::from_url(url)?;
        Ok(SourceWrapper::HttpPoll(source))
      }
      _ => Err(AcquireError::SchemeMismatch),
    }
  }
}

impl CaptureSource for SourceWrapper {
  type Error = AcquireError;

  fn capture(&mut self) -> Result<RgbaFrame, Self::Error> {
    match self {
      SourceWrapper::StillCommand(source) => source.capture().map_err(AcquireError::from),
      SourceWrapper::HttpPoll(source) => source.capture().map_err(AcquireError::from),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn unknown_scheme_is_rejected() {
    let url = Url::parse("ftp://example.com/a.jpg").unwrap();
    assert!(matches!(
      SourceWrapper::from_url(&url),
      Err(AcquireError::SchemeMismatch)
    ));
  }
}
