// 该文件是 Qingdian （清点） 项目的一部分。
// src/metadata.rs - 数据集元数据与房间识别
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
  io::{BufReader, Read},
  path::{Path, PathBuf},
};

use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::room::RoomId;

pub const METADATA_FILE_NAME: &str = "metadata.json";

#[derive(Error, Debug)]
pub enum MetadataError {
  #[error("没有找到元数据文件: {0}")]
  NotFound(PathBuf),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("元数据解析失败: {0}")]
  ParseError(#[from] serde_json::Error),
}

/// 单张图像的元数据，除 `room_id` 外的字段原样保留
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ImageMetadata {
  #[serde(default)]
  pub room_id: Option<String>,
  #[serde(flatten)]
  pub extra: serde_json::Map<String, serde_json::Value>,
}

/// 从元数据中取出房间标识，缺失或为空时返回 `None`
pub fn resolve_room(metadata: &ImageMetadata) -> Option<RoomId> {
  metadata
    .room_id
    .as_deref()
    .filter(|id| !id.is_empty())
    .map(RoomId::from)
}

/// `metadata.json`：图像文件名 → 元数据，保持文件中的顺序
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct DatasetMetadata {
  images: IndexMap<String, ImageMetadata>,
}

impl DatasetMetadata {
  pub fn from_reader<R: Read>(reader: R) -> Result<Self, MetadataError> {
    Ok(serde_json::from_reader(reader)?)
  }

  /// 读取数据集目录下的 `metadata.json`
  pub fn load(dataset_dir: &Path) -> Result<Self, MetadataError> {
    let path = dataset_dir.join(METADATA_FILE_NAME);
    if !path.is_file() {
      return Err(MetadataError::NotFound(path));
    }

    let metadata = Self::from_reader(BufReader::new(File::open(&path)?))?;
    info!(
      "已加载元数据 {}，共 {} 张图像",
      path.display(),
      metadata.len()
    );
    Ok(metadata)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &ImageMetadata)> {
    self
      .images
      .iter()
      .map(|(name, metadata)| (name.as_str(), metadata))
  }

  pub fn len(&self) -> usize {
    self.images.len()
  }

  pub fn is_empty(&self) -> bool {
    self.images.is_empty()
  }
}
