// 该文件是 Qingdian （清点） 项目的一部分。
// src/bin/blank_images.rs - 生成示例数据集用的空白图像
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

use anyhow::{Context, Result};
use clap::Parser;
use image::{Rgb, RgbImage};
use tracing::info;

/// 生成纯白的占位图像 image1.jpg ... imageN.jpg
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 输出目录
  #[arg(long, default_value = "sample_dataset", value_name = "DIR")]
  pub output: PathBuf,
  /// 图像数量
  #[arg(long, default_value = "4", value_name = "COUNT")]
  pub count: u32,
  /// 图像宽度
  #[arg(long, default_value = "640", value_name = "PIXELS")]
  pub width: u32,
  /// 图像高度
  #[arg(long, default_value = "480", value_name = "PIXELS")]
  pub height: u32,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();
  std::fs::create_dir_all(&args.output)
    .with_context(|| format!("无法创建目录 {}", args.output.display()))?;

  let image = RgbImage::from_pixel(args.width, args.height, Rgb([255, 255, 255]));
  for i in 1..=args.count {
    let path = args.output.join(format!("image{}.jpg", i));
    image
      .save(&path)
      .with_context(|| format!("无法保存图像 {}", path.display()))?;
    info!("已生成空白图像: {}", path.display());
  }

  Ok(())
}
