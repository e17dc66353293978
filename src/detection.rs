// 该文件是 Qingdian （清点） 项目的一部分。
// src/detection.rs - 检测结果定义
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

use serde::{Deserialize, Serialize};

/// 像素坐标边界框，序列化为 `[x1, y1, x2, y2]`
///
/// 构造时会整理角点顺序，始终满足 `x1 <= x2` 且 `y1 <= y2`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i32; 4]", into = "[i32; 4]")]
pub struct BoundingBox {
  x1: i32,
  y1: i32,
  x2: i32,
  y2: i32,
}

impl BoundingBox {
  pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
    Self {
      x1: x1.min(x2),
      y1: y1.min(y2),
      x2: x1.max(x2),
      y2: y1.max(y2),
    }
  }

  pub fn x1(&self) -> i32 {
    self.x1
  }

  pub fn y1(&self) -> i32 {
    self.y1
  }

  pub fn x2(&self) -> i32 {
    self.x2
  }

  pub fn y2(&self) -> i32 {
    self.y2
  }

  pub fn width(&self) -> u32 {
    self.x2.abs_diff(self.x1)
  }

  pub fn height(&self) -> u32 {
    self.y2.abs_diff(self.y1)
  }
}

impl From<[i32; 4]> for BoundingBox {
  fn from([x1, y1, x2, y2]: [i32; 4]) -> Self {
    BoundingBox::new(x1, y1, x2, y2)
  }
}

impl From<BoundingBox> for [i32; 4] {
  fn from(bbox: BoundingBox) -> Self {
    [bbox.x1, bbox.y1, bbox.x2, bbox.y2]
  }
}

/// 单张图像中的一个检测目标
///
/// 由外部检测器产生，产生后不再修改。序列化格式与检测器输出一致：
/// `{"box": [x1, y1, x2, y2], "confidence": 0.91, "class_name": "tv"}`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "DetectionRecord")]
pub struct Detection {
  #[serde(rename = "box")]
  bbox: BoundingBox,
  confidence: f32,
  class_name: String,
}

#[derive(Deserialize)]
struct DetectionRecord {
  #[serde(rename = "box")]
  bbox: BoundingBox,
  confidence: f32,
  class_name: String,
}

impl From<DetectionRecord> for Detection {
  fn from(record: DetectionRecord) -> Self {
    Detection::new(record.class_name, record.bbox, record.confidence)
  }
}

impl Detection {
  /// 置信度被限制在 `[0, 1]` 区间内，NaN 视为 0
  pub fn new(class_name: impl Into<String>, bbox: BoundingBox, confidence: f32) -> Self {
    let confidence = if confidence.is_nan() {
      0.0
    } else {
      confidence.clamp(0.0, 1.0)
    };

    Self {
      bbox,
      confidence,
      class_name: class_name.into(),
    }
  }

  pub fn class_name(&self) -> &str {
    &self.class_name
  }

  pub fn bbox(&self) -> &BoundingBox {
    &self.bbox
  }

  pub fn confidence(&self) -> f32 {
    self.confidence
  }

  /// 可视化标签文本：`"<类别> <置信度两位小数>"`
  pub fn label(&self) -> String {
    format!("{} {:.2}", self.class_name, self.confidence)
  }
}
