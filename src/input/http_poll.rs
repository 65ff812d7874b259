// 该文件是 Shipai （识牌） 项目的一部分。
// src/input/http_poll.rs - HTTP 轮询采集源
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
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::FromUrl;
use crate::frame::{InvalidImageError, RgbaFrame};
use crate::input::CaptureSource;

/// 防缓存查询参数名
const POLL_TIME_PARAM: &str = "time";
const POLL_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Error, Debug)]
pub enum HttpPollError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("HTTP 请求失败: {0}")]
  Request(#[from] Box<ureq::Error>),
  #[error("读取响应失败: {0}")]
  Io(#[from] std::io::Error),
  #[error("解码响应图像失败: {0}")]
  Decode(#[from] image::ImageError),
  #[error("图像无效: {0}")]
  Invalid(#[from] InvalidImageError),
}

/// 轮询固定 HTTP 端点获取图像。
///
/// 每次请求追加当前毫秒时间戳作为防缓存参数；该路径不做重试，
/// 单次失败即宣告本周期采集失败。
pub struct HttpPollSource {
  endpoint: Url,
  agent: ureq::Agent,
}

impl FromUrl for HttpPollSource {
  type Error = HttpPollError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != "http" && url.scheme() != "https" {
      return Err(HttpPollError::SchemeMismatch);
    }

    Ok(HttpPollSource {
      endpoint: url.clone(),
      agent: ureq::AgentBuilder::new().timeout(POLL_TIMEOUT).build(),
    })
  }
}

/// 给端点追加防缓存时间戳参数
pub(crate) fn poll_url(endpoint: &Url, epoch_ms: i64) -> Url {
  let mut url = endpoint.clone();
  url
    .query_pairs_mut()
    .append_pair(POLL_TIME_PARAM, &epoch_ms.to_string());
  url
}

impl CaptureSource for HttpPollSource {
  type Error = HttpPollError;

  fn capture(&mut self) -> Result<RgbaFrame, Self::Error> {
    let url = poll_url(&self.endpoint, Utc::now().timestamp_millis());
    info!("拉取新图像: {}", url);

    let response = self
      .agent
      .get(url.as_str())
      .call()
      .map_err(Box::new)?;
    let mut body = Vec::new();
    response.into_reader().read_to_end(&mut body)?;
    debug!("响应 {} 字节", body.len());

    let image = image::load_from_memory(&body)?;
    Ok(RgbaFrame::from_image(image.to_rgba8())?)
  }
}
