// 该文件是 Shipai （识牌） 项目的一部分。
// src/output/save_image_file.rs - 画布落盘
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

use image::RgbaImage;
use tracing::debug;

use crate::output::OutputError;

const PRIMARY_FILE: &str = "primary.png";
const ZOOM_FILE: &str = "zoom.png";

/// 把两块画布写到固定目录，每个周期覆盖上一周期的文件
pub struct SurfaceWriter {
  dir: PathBuf,
}

impl SurfaceWriter {
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self { dir: dir.into() }
  }

  pub fn save(&self, primary: &RgbaImage, zoom: &RgbaImage) -> Result<(), OutputError> {
    std::fs::create_dir_all(&self.dir)?;

    let primary_path = self.dir.join(PRIMARY_FILE);
    primary.save(&primary_path)?;
    let zoom_path = self.dir.join(ZOOM_FILE);
    zoom.save(&zoom_path)?;

    debug!(
      "画布已写出: {} / {}",
      primary_path.display(),
      zoom_path.display()
    );
    Ok(())
  }
}
