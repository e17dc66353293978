// 该文件是 Qingdian （清点） 项目的一部分。
// src/report/overlay.rs - 检测结果可视化叠加
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

use ab_glyph::{FontArc, PxScale};
use image::error::{ImageFormatHint, UnsupportedError, UnsupportedErrorKind};
use image::{ImageError, ImageFormat, ImageReader, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::detection::Detection;

/// 边界框与标签背景颜色（绿色）
pub const HIGHLIGHT_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

// 文本渲染常量
const LABEL_FONT_SIZE: f32 = 16.0;
const LABEL_TEXT_COLOR: Rgb<u8> = Rgb([0, 0, 0]);
const LABEL_PADDING: u32 = 2;
const BOX_THICKNESS: u32 = 2;

static FONT_DATA: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");

#[derive(Error, Debug)]
pub enum OverlayError {
  #[error("字体加载错误: {0}")]
  FontError(#[from] ab_glyph::InvalidFont),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("图像保存错误: {0}")]
  ImageError(#[from] image::ImageError),
}

/// 单张图像的可视化结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayOutcome {
  /// 已写出标注后的图像
  Written(PathBuf),
  /// 源图像无法读取，或其格式无法写出，已跳过
  Skipped,
}

/// 可视化工具
pub struct Overlay {
  font: FontArc,
  font_scale: PxScale,
}

impl Overlay {
  pub fn new() -> Result<Self, OverlayError> {
    let font = FontArc::try_from_slice(FONT_DATA)?;

    Ok(Self {
      font,
      font_scale: PxScale::from(LABEL_FONT_SIZE),
    })
  }

  /// 读取图像，绘制该图像自己的检测结果，并写入输出路径
  ///
  /// 输出使用源图像的格式，与输出路径的扩展名无关。
  /// 源图像读取失败或该格式无法编码时只记录警告并返回 [`OverlayOutcome::Skipped`]；
  /// 其它写出失败作为错误返回。
  pub fn render(
    &self,
    image_path: &Path,
    detections: &[Detection],
    output_path: &Path,
  ) -> Result<OverlayOutcome, OverlayError> {
    let (mut image, format) = match load_rgb_image(image_path) {
      Ok(loaded) => loaded,
      Err(err) => {
        warn!("无法读取图像 {}，跳过可视化: {}", image_path.display(), err);
        return Ok(OverlayOutcome::Skipped);
      }
    };

    self.draw_detections(&mut image, detections);

    if let Some(parent) = output_path.parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)?;
    }
    match image.save_with_format(output_path, format) {
      Ok(()) => {}
      Err(ImageError::Unsupported(err)) => {
        warn!(
          "无法以 {:?} 格式写出 {}，跳过可视化: {}",
          format,
          output_path.display(),
          err
        );
        if let Err(err) = std::fs::remove_file(output_path)
          && err.kind() != std::io::ErrorKind::NotFound
        {
          debug!("无法删除未完成的输出 {}: {}", output_path.display(), err);
        }
        return Ok(OverlayOutcome::Skipped);
      }
      Err(err) => return Err(err.into()),
    }

    info!("检测结果图像已保存到: {}", output_path.display());
    Ok(OverlayOutcome::Written(output_path.to_path_buf()))
  }

  /// 在图像上绘制检测结果
  pub fn draw_detections(&self, image: &mut RgbImage, detections: &[Detection]) {
    for detection in detections {
      self.draw_bbox_with_label(image, detection);
    }
  }

  fn draw_bbox_with_label(&self, image: &mut RgbImage, detection: &Detection) {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 {
      return;
    }

    let bbox = detection.bbox();
    let max_x = w as i32 - 1;
    let max_y = h as i32 - 1;
    let x_min = bbox.x1().clamp(0, max_x);
    let y_min = bbox.y1().clamp(0, max_y);
    let x_max = bbox.x2().clamp(0, max_x);
    let y_max = bbox.y2().clamp(0, max_y);

    // 框完全在图像外时 clamp 后会退化，仍然画出贴边的细框
    let box_w = x_max.abs_diff(x_min) + 1;
    let box_h = y_max.abs_diff(y_min) + 1;
    for t in 0..BOX_THICKNESS {
      if box_w <= 2 * t || box_h <= 2 * t {
        break;
      }
      let rect =
        Rect::at(x_min + t as i32, y_min + t as i32).of_size(box_w - 2 * t, box_h - 2 * t);
      draw_hollow_rect_mut(image, rect, HIGHLIGHT_COLOR);
    }

    let label = detection.label();
    let (text_w, text_h) = text_size(self.font_scale, &self.font, &label);
    let label_w = (text_w + 2 * LABEL_PADDING).min(w - x_min as u32);
    let label_h = text_h + 2 * LABEL_PADDING;

    // 标签放在框的上方，空间不够时放进框内
    let label_y = if y_min >= label_h as i32 {
      y_min - label_h as i32
    } else {
      y_min
    };

    debug!("绘制标签 '{}' 于 ({}, {})", label, x_min, label_y);
    let rect = Rect::at(x_min, label_y).of_size(label_w, label_h);
    draw_filled_rect_mut(image, rect, HIGHLIGHT_COLOR);
    draw_text_mut(
      image,
      LABEL_TEXT_COLOR,
      x_min + LABEL_PADDING as i32,
      label_y + LABEL_PADDING as i32,
      self.font_scale,
      &self.font,
      &label,
    );
  }
}

/// 按文件内容识别格式，不依赖扩展名
fn load_rgb_image(path: &Path) -> Result<(RgbImage, ImageFormat), ImageError> {
  let reader = ImageReader::open(path)?.with_guessed_format()?;
  let format = reader.format().ok_or_else(|| {
    ImageError::Unsupported(UnsupportedError::from_format_and_kind(
      ImageFormatHint::Unknown,
      UnsupportedErrorKind::Format(ImageFormatHint::Unknown),
    ))
  })?;
  let image = reader.decode()?.to_rgb8();
  Ok((image, format))
}
