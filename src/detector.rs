// 该文件是 Qingdian （清点） 项目的一部分。
// src/detector.rs - 检测器边界与检测结果来源
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

use std::path::Path;

use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, detection::Detection};

mod manifest;
mod sidecar;
pub use self::manifest::{ManifestDetector, ManifestError};
pub use self::sidecar::{SidecarDetector, SidecarError};

/// 检测器：图像路径 → 该图像中的检测结果
pub trait Detector {
  type Error;

  fn detect(&self, image_path: &Path) -> Result<Vec<Detection>, Self::Error>;
}

impl<D: Detector + ?Sized> Detector for &D {
  type Error = D::Error;

  fn detect(&self, image_path: &Path) -> Result<Vec<Detection>, Self::Error> {
    (**self).detect(image_path)
  }
}

#[derive(Error, Debug)]
pub enum DetectorError {
  #[error("旁路文件检测错误: {0}")]
  SidecarError(#[from] SidecarError),
  #[error("清单检测错误: {0}")]
  ManifestError(#[from] ManifestError),
  #[error("不支持的检测来源: {0}")]
  SchemeMismatch(String),
  #[error("无效的参数 {0}: {1}")]
  InvalidQuery(String, String),
}

pub enum DetectorWrapper {
  Sidecar(SidecarDetector),
  Manifest(ManifestDetector),
}

impl FromUrl for DetectorWrapper {
  type Error = DetectorError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      SidecarDetector::SCHEME => Ok(DetectorWrapper::Sidecar(SidecarDetector::from_url(url)?)),
      ManifestDetector::SCHEME => Ok(DetectorWrapper::Manifest(ManifestDetector::from_url(url)?)),
      scheme => Err(DetectorError::SchemeMismatch(scheme.to_string())),
    }
  }
}

impl Detector for DetectorWrapper {
  type Error = DetectorError;

  fn detect(&self, image_path: &Path) -> Result<Vec<Detection>, Self::Error> {
    match self {
      DetectorWrapper::Sidecar(detector) => detector.detect(image_path).map_err(DetectorError::from),
      DetectorWrapper::Manifest(detector) => {
        detector.detect(image_path).map_err(DetectorError::from)
      }
    }
  }
}

/// 由 URL 配置的检测来源
///
/// 支持的形式：
/// - `sidecar://?suffix=.json`：读取与图像同名的检测结果文件
/// - `manifest:///path/to/detections.json`：从一个清单文件中按文件名查找
///
/// 两者都接受 `min_confidence=<f32>`，丢弃低于阈值的检测。
/// 图像文件不存在时返回空结果并记录警告。
pub struct DetectorSource {
  inner: DetectorWrapper,
  min_confidence: Option<f32>,
}

impl DetectorSource {
  pub fn new(inner: DetectorWrapper) -> Self {
    Self {
      inner,
      min_confidence: None,
    }
  }

  pub fn with_min_confidence(mut self, min_confidence: Option<f32>) -> Self {
    self.min_confidence = min_confidence;
    self
  }
}

impl FromUrl for DetectorSource {
  type Error = DetectorError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    let mut min_confidence = None;
    for (k, v) in url.query_pairs() {
      if k == "min_confidence" {
        let value = v
          .parse::<f32>()
          .ok()
          .filter(|value| (0.0..=1.0).contains(value))
          .ok_or_else(|| DetectorError::InvalidQuery(k.to_string(), v.to_string()))?;
        min_confidence = Some(value);
      }
    }

    let inner = DetectorWrapper::from_url(url)?;
    Ok(DetectorSource::new(inner).with_min_confidence(min_confidence))
  }
}

impl Detector for DetectorSource {
  type Error = DetectorError;

  fn detect(&self, image_path: &Path) -> Result<Vec<Detection>, Self::Error> {
    if !image_path.is_file() {
      warn!("图像文件不存在: {}", image_path.display());
      return Ok(Vec::new());
    }

    let mut detections = self.inner.detect(image_path)?;
    if let Some(threshold) = self.min_confidence {
      let before = detections.len();
      detections.retain(|d| d.confidence() >= threshold);
      debug!(
        "置信度阈值 {:.2} 过滤掉 {} 个检测",
        threshold,
        before - detections.len()
      );
    }

    Ok(detections)
  }
}
