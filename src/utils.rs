// 该文件是 Shipai （识牌） 项目的一部分。
// src/utils.rs - 工具函数
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

use url::Url;

/// 从 URL 提取文件路径。
///
/// `scheme:///absolute/path` 形式取绝对路径；`scheme://relative/path`
/// 形式（主机部分被解析器吃掉的相对路径）把主机部分拼接回来。
pub fn url_to_path(url: &Url) -> PathBuf {
  match url.host_str() {
    Some(host) if !host.is_empty() => {
      PathBuf::from(host).join(url.path().trim_start_matches('/'))
    }
    _ => PathBuf::from(url.path()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn absolute_path_url() {
    let url = Url::parse("capture:///run/pen.jpg").unwrap();
    assert_eq!(url_to_path(&url), PathBuf::from("/run/pen.jpg"));
  }

  #[test]
  fn relative_path_url() {
    let url = Url::parse("model://models/v2/model.json").unwrap();
    assert_eq!(url_to_path(&url), PathBuf::from("models/v2/model.json"));
  }
}
