// 该文件是 Qingdian （清点） 项目的一部分。
// src/detector/sidecar.rs - 读取与图像同名的检测结果文件
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

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, detection::Detection, detector::Detector};

const DEFAULT_SUFFIX: &str = ".json";

#[derive(Error, Debug)]
pub enum SidecarError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("检测结果文件 {0} 解析失败: {1}")]
  ParseError(PathBuf, serde_json::Error),
}

/// 每张图像旁边放一个检测结果文件，例如 `image1.jpg.json`
///
/// 文件内容为检测数组：`[{"box": [x1, y1, x2, y2], "confidence": 0.9, "class_name": "sofa"}]`
#[derive(Debug, Clone)]
pub struct SidecarDetector {
  suffix: String,
}

impl Default for SidecarDetector {
  fn default() -> Self {
    Self {
      suffix: DEFAULT_SUFFIX.to_string(),
    }
  }
}

impl SidecarDetector {
  pub fn with_suffix(suffix: impl Into<String>) -> Self {
    Self {
      suffix: suffix.into(),
    }
  }

  pub fn sidecar_path(&self, image_path: &Path) -> PathBuf {
    let mut path = image_path.as_os_str().to_owned();
    path.push(&self.suffix);
    PathBuf::from(path)
  }
}

impl FromUrlWithScheme for SidecarDetector {
  const SCHEME: &'static str = "sidecar";
}

impl FromUrl for SidecarDetector {
  type Error = SidecarError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(SidecarError::SchemeMismatch(format!(
        "期望检测来源 '{}', 实际检测来源 '{}'",
        Self::SCHEME,
        url.scheme()
      )));
    }

    let suffix = url
      .query_pairs()
      .find(|(k, _)| k == "suffix")
      .map(|(_, v)| v.into_owned())
      .filter(|v| !v.is_empty())
      .unwrap_or_else(|| DEFAULT_SUFFIX.to_string());

    Ok(SidecarDetector { suffix })
  }
}

impl Detector for SidecarDetector {
  type Error = SidecarError;

  fn detect(&self, image_path: &Path) -> Result<Vec<Detection>, Self::Error> {
    let path = self.sidecar_path(image_path);
    if !path.is_file() {
      warn!(
        "没有找到 {} 的检测结果文件: {}",
        image_path.display(),
        path.display()
      );
      return Ok(Vec::new());
    }

    let data = std::fs::read(&path)?;
    let detections: Vec<Detection> =
      serde_json::from_slice(&data).map_err(|e| SidecarError::ParseError(path.clone(), e))?;
    debug!("从 {} 读取到 {} 个检测", path.display(), detections.len());

    Ok(detections)
  }
}
