// 该文件是 Qingdian （清点） 项目的一部分。
// src/report.rs - 报告输出
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

use std::{
  fs::File,
  io::{BufWriter, Write},
  path::Path,
};

use thiserror::Error;
use tracing::info;

use crate::counter::UniqueCounts;

mod csv;
mod json;
pub use self::csv::CsvReport;
pub use self::json::{JsonReport, read_json_report};

#[cfg(feature = "visualize")]
mod overlay;
#[cfg(feature = "visualize")]
pub use self::overlay::{HIGHLIGHT_COLOR, Overlay, OverlayError, OverlayOutcome};

#[derive(Error, Debug)]
pub enum ReportError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("JSON 错误: {0}")]
  JsonError(#[from] serde_json::Error),
  #[error("CSV 错误: {0}")]
  CsvError(#[from] ::csv::Error),
}

/// 报告格式：把唯一计数写入任意输出流
pub trait ReportFormat {
  /// 报告的默认文件名
  const FILE_NAME: &'static str;
  /// 日志中使用的格式名称
  const NAME: &'static str;

  fn write_report<W: Write>(&self, counts: &UniqueCounts, writer: W) -> Result<(), ReportError>;

  /// 写入文件，必要时创建上级目录
  ///
  /// 写入失败时已写出的部分内容会保留在磁盘上。
  fn save_report(&self, counts: &UniqueCounts, path: &Path) -> Result<(), ReportError> {
    if let Some(parent) = path.parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)?;
    }

    let mut writer = BufWriter::new(File::create(path)?);
    self.write_report(counts, &mut writer)?;
    writer.flush()?;

    info!("{} 报告已保存到: {}", Self::NAME, path.display());
    Ok(())
  }
}
