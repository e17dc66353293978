// 该文件是 Qingdian （清点） 项目的一部分。
// src/detector/manifest.rs - 从检测清单文件中读取检测结果
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
  io::BufReader,
  path::{Path, PathBuf},
};

use indexmap::IndexMap;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, detection::Detection, detector::Detector, url_file_path};

#[derive(Error, Debug)]
pub enum ManifestError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("无法打开检测清单 {0}: {1}")]
  IoError(PathBuf, std::io::Error),
  #[error("检测清单 {0} 解析失败: {1}")]
  ParseError(PathBuf, serde_json::Error),
}

/// 检测清单：`{"<图像路径或文件名>": [<检测>, ...], ...}`
///
/// 清单在构造时一次性读入；清单中没有的图像视为没有检测结果。
/// 查找时先按图像路径原样匹配，再按文件名匹配，
/// 不同目录下的同名图像可以用路径分别给出结果。
#[derive(Debug, Clone, Default)]
pub struct ManifestDetector {
  entries: IndexMap<String, Vec<Detection>>,
}

impl ManifestDetector {
  pub fn from_entries(entries: IndexMap<String, Vec<Detection>>) -> Self {
    Self { entries }
  }

  pub fn open(path: &Path) -> Result<Self, ManifestError> {
    let file = File::open(path).map_err(|e| ManifestError::IoError(path.to_path_buf(), e))?;
    let entries: IndexMap<String, Vec<Detection>> = serde_json::from_reader(BufReader::new(file))
      .map_err(|e| ManifestError::ParseError(path.to_path_buf(), e))?;

    info!(
      "检测清单 {} 已加载，共 {} 张图像",
      path.display(),
      entries.len()
    );
    Ok(Self { entries })
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

impl FromUrlWithScheme for ManifestDetector {
  const SCHEME: &'static str = "manifest";
}

impl FromUrl for ManifestDetector {
  type Error = ManifestError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(ManifestError::SchemeMismatch(format!(
        "期望检测来源 '{}', 实际检测来源 '{}'",
        Self::SCHEME,
        url.scheme()
      )));
    }

    ManifestDetector::open(&url_file_path(url))
  }
}

impl Detector for ManifestDetector {
  type Error = ManifestError;

  fn detect(&self, image_path: &Path) -> Result<Vec<Detection>, Self::Error> {
    let full = image_path.to_string_lossy();
    let key = image_path
      .file_name()
      .map(|name| name.to_string_lossy())
      .unwrap_or_default();

    match self.entries.get(&*full).or_else(|| self.entries.get(&*key)) {
      Some(detections) => Ok(detections.clone()),
      None => {
        debug!("检测清单中没有 {}", key);
        Ok(Vec::new())
      }
    }
  }
}
