// 该文件是 Shipai （识牌） 项目的一部分。
// src/diag.rs - 运维诊断信息汇集
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

use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
  Info,
  Warn,
  Error,
}

impl std::fmt::Display for Severity {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Severity::Info => write!(f, "INFO"),
      Severity::Warn => write!(f, "WARN"),
      Severity::Error => write!(f, "ERROR"),
    }
  }
}

/// 颜色信号，供外部显示面板反馈周期结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalColor {
  /// 周期进行中（复位后的默认色）
  Idle,
  /// 本周期检测成功
  Success,
  /// 本周期出现错误
  Failure,
}

impl Default for SignalColor {
  fn default() -> Self {
    SignalColor::Idle
  }
}

#[derive(Debug, Clone)]
pub struct LogEntry {
  pub severity: Severity,
  pub message: String,
  /// 周期内的追加序号
  pub ordinal: usize,
}

/// 只追加的诊断信息流。
///
/// 每个巡视周期开始时整体清空一次，周期内只能追加；
/// ERROR 级条目会把颜色信号翻转为失败色，直到下一次复位。
#[derive(Debug, Default)]
pub struct Diagnostics {
  entries: Vec<LogEntry>,
  color: SignalColor,
  resets: u64,
}

impl Diagnostics {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn info(&mut self, message: impl Into<String>) {
    let message = message.into();
    info!("{}", message);
    self.push(Severity::Info, message);
  }

  pub fn warn(&mut self, message: impl Into<String>) {
    let message = message.into();
    warn!("{}", message);
    self.push(Severity::Warn, message);
  }

  pub fn error(&mut self, message: impl Into<String>) {
    let message = message.into();
    error!("{}", message);
    self.push(Severity::Error, message);
    self.color = SignalColor::Failure;
  }

  fn push(&mut self, severity: Severity, message: String) {
    let ordinal = self.entries.len();
    self.entries.push(LogEntry {
      severity,
      message,
      ordinal,
    });
  }

  pub fn set_color(&mut self, color: SignalColor) {
    self.color = color;
  }

  pub fn color(&self) -> SignalColor {
    self.color
  }

  pub fn entries(&self) -> &[LogEntry] {
    &self.entries
  }

  /// 清空条目并把颜色信号复位为默认色
  pub fn reset(&mut self) {
    self.color = SignalColor::Idle;
    self.entries.clear();
    self.resets += 1;
  }

  /// 已执行的复位次数（等于已开始的巡视周期数）
  pub fn resets(&self) -> u64 {
    self.resets
  }
}
