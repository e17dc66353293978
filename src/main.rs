// 该文件是 Qingdian （清点） 项目的一部分。
// src/main.rs - 项目主程序
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

mod args;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use qingdian::{
  FromUrl,
  detector::DetectorSource,
  metadata::DatasetMetadata,
  room::RoomId,
  session::{Session, SessionSummary},
  workspace::Workspace,
};

use args::{Args, Command, SessionArgs};

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .init();

  let args = Args::parse();

  let summary = match args.command {
    Command::Dataset { dataset, session } => {
      info!("数据集目录: {}", dataset.display());
      // 元数据缺失时直接中止，不触碰输出目录
      let metadata = DatasetMetadata::load(&dataset)
        .with_context(|| format!("无法加载数据集 {}", dataset.display()))?;
      let detector = open_detector(&session)?;
      let mut session = open_session(&session)?;
      session.ingest_dataset(&dataset, &metadata, &detector)?;
      session.finish()?
    }
    Command::Batch {
      room_id,
      images,
      session,
    } => {
      info!("房间: {}，图像数: {}", room_id, images.len());
      let detector = open_detector(&session)?;
      let mut session = open_session(&session)?;
      session.ingest_batch(RoomId::from(room_id), &images, &detector)?;
      session.finish()?
    }
  };

  print_summary(&summary);
  Ok(())
}

fn open_detector(args: &SessionArgs) -> Result<DetectorSource> {
  info!("检测结果来源: {}", args.detector);
  DetectorSource::from_url(&args.detector)
    .with_context(|| format!("无法打开检测结果来源 {}", args.detector))
}

fn open_session(args: &SessionArgs) -> Result<Session> {
  info!("输出目录: {}", args.output.display());
  let workspace = Workspace::acquire(&args.output)
    .with_context(|| format!("无法使用输出目录 {}", args.output.display()))?;
  let session = Session::new(workspace);

  #[cfg(feature = "visualize")]
  let session = if args.no_visualize {
    session
  } else {
    session.with_overlay(qingdian::report::Overlay::new()?)
  };

  #[cfg(not(feature = "visualize"))]
  if !args.no_visualize {
    tracing::warn!("未启用 visualize 特性，不生成可视化图像");
  }

  Ok(session)
}

fn print_summary(summary: &SessionSummary) {
  println!();
  println!("房间清点结果");
  println!("==================");
  for (room_id, inventory) in summary.unique_counts.iter() {
    if inventory.is_empty() {
      println!("{}: (无)", room_id);
    } else {
      println!(
        "{}: {}",
        room_id,
        inventory.classes().collect::<Vec<_>>().join(", ")
      );
    }
  }
  println!();
  println!("处理图像数: {}", summary.processed_images.len());
  println!("跳过图像数: {}", summary.skipped_images.len());
  println!(
    "可视化图像数: {}",
    summary
      .processed_images
      .iter()
      .filter(|image| image.visualization.is_some())
      .count()
  );
  println!("JSON 报告: {}", summary.json_report.display());
  println!("CSV 报告: {}", summary.csv_report.display());
}
