// 该文件是 Qingdian （清点） 项目的一部分。
// src/session.rs - 单次清点会话
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

#[cfg(feature = "visualize")]
use std::collections::HashSet;
use std::{
  fmt::Display,
  path::{Path, PathBuf},
  time::Instant,
};

use thiserror::Error;
use tracing::{info, warn};

#[cfg(feature = "visualize")]
use crate::report::{Overlay, OverlayError, OverlayOutcome};
use crate::{
  counter::{self, UniqueCounts},
  detection::Detection,
  detector::Detector,
  metadata::{DatasetMetadata, MetadataError, resolve_room},
  report::{CsvReport, JsonReport, ReportError, ReportFormat},
  room::{RoomDetections, RoomId},
  workspace::{Workspace, WorkspaceError},
};

/// 批量上传时未指定房间使用的标识
pub const DEFAULT_ROOM_ID: &str = "Unknown_Room";

/// 批量模式接受的图像扩展名
pub const ALLOWED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

#[derive(Error, Debug)]
pub enum SessionError {
  #[error("输出目录错误: {0}")]
  WorkspaceError(#[from] WorkspaceError),
  #[error("元数据错误: {0}")]
  MetadataError(#[from] MetadataError),
  #[error("报告写入错误: {0}")]
  ReportError(#[from] ReportError),
  #[cfg(feature = "visualize")]
  #[error("可视化错误: {0}")]
  OverlayError(#[from] OverlayError),
}

/// 一张已处理的图像
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedImage {
  pub file_name: String,
  pub room_id: RoomId,
  pub detections: Vec<Detection>,
  pub visualization: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
  /// 元数据中没有房间标识
  NoRoom,
  /// 不是受支持的图像文件
  UnsupportedFile,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedImage {
  pub file_name: String,
  pub reason: SkipReason,
}

/// 会话结束后的汇总
#[derive(Debug, Clone)]
pub struct SessionSummary {
  pub processed_images: Vec<ProcessedImage>,
  pub skipped_images: Vec<SkippedImage>,
  pub unique_counts: UniqueCounts,
  pub json_report: PathBuf,
  pub csv_report: PathBuf,
}

/// 一次清点会话
///
/// 会话独占自己的输出目录和按房间聚合的检测结果，`finish` 时生成报告后一并释放。
/// 报告只在 `finish` 中写出，中途放弃的会话不会留下报告。
pub struct Session {
  workspace: Workspace,
  rooms: RoomDetections,
  processed: Vec<ProcessedImage>,
  skipped: Vec<SkippedImage>,
  #[cfg(feature = "visualize")]
  overlay: Option<Overlay>,
  /// 本次会话已使用的可视化文件名
  #[cfg(feature = "visualize")]
  overlay_names: HashSet<String>,
  started: Instant,
}

impl Session {
  pub fn new(workspace: Workspace) -> Self {
    Self {
      workspace,
      rooms: RoomDetections::new(),
      processed: Vec::new(),
      skipped: Vec::new(),
      #[cfg(feature = "visualize")]
      overlay: None,
      #[cfg(feature = "visualize")]
      overlay_names: HashSet::new(),
      started: Instant::now(),
    }
  }

  #[cfg(feature = "visualize")]
  pub fn with_overlay(mut self, overlay: Overlay) -> Self {
    self.overlay = Some(overlay);
    self
  }

  pub fn workspace(&self) -> &Workspace {
    &self.workspace
  }

  pub fn room_detections(&self) -> &RoomDetections {
    &self.rooms
  }

  /// 检测一张图像，把结果并入房间，并为该图像生成可视化
  ///
  /// 检测器报错时按没有检测结果处理并记录警告。
  pub fn ingest<D>(
    &mut self,
    room_id: RoomId,
    image_path: &Path,
    detector: &D,
  ) -> Result<&ProcessedImage, SessionError>
  where
    D: Detector,
    D::Error: Display,
  {
    let file_name = file_name_of(image_path);
    info!("处理图像: {} (房间: {})", file_name, room_id);

    let detections = match detector.detect(image_path) {
      Ok(detections) => detections,
      Err(err) => {
        warn!("图像 {} 检测失败，按无检测处理: {}", file_name, err);
        Vec::new()
      }
    };
    info!(
      "检测到的目标: {:?}",
      detections
        .iter()
        .map(Detection::class_name)
        .collect::<Vec<_>>()
    );

    self.rooms.add(room_id.clone(), detections.iter().cloned());
    let visualization = self.visualize(image_path, &file_name, &detections)?;

    self.processed.push(ProcessedImage {
      file_name,
      room_id,
      detections,
      visualization,
    });
    Ok(&self.processed[self.processed.len() - 1])
  }

  /// 按数据集元数据处理图像，元数据中没有房间的图像被跳过
  pub fn ingest_dataset<D>(
    &mut self,
    dataset_dir: &Path,
    metadata: &DatasetMetadata,
    detector: &D,
  ) -> Result<(), SessionError>
  where
    D: Detector,
    D::Error: Display,
  {
    for (image_name, image_metadata) in metadata.iter() {
      match resolve_room(image_metadata) {
        Some(room_id) => {
          self.ingest(room_id, &dataset_dir.join(image_name), detector)?;
        }
        None => self.skip(image_name, SkipReason::NoRoom),
      }
    }
    Ok(())
  }

  /// 把一批图像全部归入同一个房间，非图像文件被跳过
  pub fn ingest_batch<D, P>(
    &mut self,
    room_id: RoomId,
    images: &[P],
    detector: &D,
  ) -> Result<(), SessionError>
  where
    D: Detector,
    D::Error: Display,
    P: AsRef<Path>,
  {
    for image in images {
      let image = image.as_ref();
      if is_allowed_image(image) {
        self.ingest(room_id.clone(), image, detector)?;
      } else {
        self.skip(&file_name_of(image), SkipReason::UnsupportedFile);
      }
    }
    Ok(())
  }

  fn skip(&mut self, file_name: &str, reason: SkipReason) {
    match reason {
      SkipReason::NoRoom => warn!("图像 {} 没有房间标识，跳过", file_name),
      SkipReason::UnsupportedFile => warn!("{} 不是受支持的图像文件，跳过", file_name),
    }
    self.skipped.push(SkippedImage {
      file_name: file_name.to_string(),
      reason,
    });
  }

  /// 同名图像（来自不同目录）的可视化文件名依次加上 `_2`、`_3` 等后缀
  #[cfg(feature = "visualize")]
  fn visualize(
    &mut self,
    image_path: &Path,
    file_name: &str,
    detections: &[Detection],
  ) -> Result<Option<PathBuf>, SessionError> {
    let Some(overlay) = &self.overlay else {
      return Ok(None);
    };

    let output_name = unique_file_name(&mut self.overlay_names, file_name);
    let output_path = self.workspace.visualization_path(&output_name);
    match overlay.render(image_path, detections, &output_path)? {
      OverlayOutcome::Written(path) => Ok(Some(path)),
      OverlayOutcome::Skipped => Ok(None),
    }
  }

  #[cfg(not(feature = "visualize"))]
  fn visualize(
    &mut self,
    _image_path: &Path,
    _file_name: &str,
    _detections: &[Detection],
  ) -> Result<Option<PathBuf>, SessionError> {
    Ok(None)
  }

  /// 去重计数并写出 JSON 与 CSV 报告
  ///
  /// 写入失败时返回错误，已经写出的文件保留。
  pub fn finish(self) -> Result<SessionSummary, SessionError> {
    let unique_counts = counter::reduce(&self.rooms);
    info!(
      "共 {} 个房间，{} 个检测，{} 个唯一目标",
      unique_counts.len(),
      self.rooms.total_detections(),
      unique_counts.total_entries()
    );

    let json_report = self.workspace.json_report_path();
    let csv_report = self.workspace.csv_report_path();
    JsonReport.save_report(&unique_counts, &json_report)?;
    CsvReport.save_report(&unique_counts, &csv_report)?;

    info!("会话完成，耗时: {:.2?}", self.started.elapsed());

    Ok(SessionSummary {
      processed_images: self.processed,
      skipped_images: self.skipped,
      unique_counts,
      json_report,
      csv_report,
    })
  }
}

#[cfg(feature = "visualize")]
fn unique_file_name(used: &mut HashSet<String>, file_name: &str) -> String {
  if used.insert(file_name.to_string()) {
    return file_name.to_string();
  }

  let path = Path::new(file_name);
  let stem = path
    .file_stem()
    .map(|stem| stem.to_string_lossy().into_owned())
    .unwrap_or_else(|| file_name.to_string());
  let extension = path
    .extension()
    .map(|ext| ext.to_string_lossy().into_owned());

  let mut n = 2;
  loop {
    let candidate = match &extension {
      Some(ext) => format!("{}_{}.{}", stem, n, ext),
      None => format!("{}_{}", stem, n),
    };
    if used.insert(candidate.clone()) {
      return candidate;
    }
    n += 1;
  }
}

fn file_name_of(path: &Path) -> String {
  path
    .file_name()
    .map(|name| name.to_string_lossy().into_owned())
    .unwrap_or_else(|| path.display().to_string())
}

pub fn is_allowed_image(path: &Path) -> bool {
  path
    .extension()
    .and_then(|ext| ext.to_str())
    .map(|ext| {
      ALLOWED_EXTENSIONS
        .iter()
        .any(|allowed| ext.eq_ignore_ascii_case(allowed))
    })
    .unwrap_or(false)
}
