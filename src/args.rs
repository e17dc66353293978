// 该文件是 Qingdian （清点） 项目的一部分。
// src/args.rs - 项目参数配置
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

use clap::{Parser, Subcommand};
use url::Url;

use qingdian::session::DEFAULT_ROOM_ID;

/// Qingdian 房间物品清点
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  #[command(subcommand)]
  pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
  /// 按数据集目录中的 metadata.json 为每张图像确定房间
  Dataset {
    /// 数据集目录（包含图像与 metadata.json）
    #[arg(long, default_value = "sample_dataset", value_name = "DIR")]
    dataset: PathBuf,

    #[command(flatten)]
    session: SessionArgs,
  },
  /// 把给定的所有图像归入同一个房间
  Batch {
    /// 房间标识
    #[arg(long, default_value = DEFAULT_ROOM_ID, value_name = "ROOM")]
    room_id: String,

    /// 图像文件（png, jpg, jpeg, gif）
    #[arg(required = true, value_name = "IMAGE")]
    images: Vec<PathBuf>,

    #[command(flatten)]
    session: SessionArgs,
  },
}

#[derive(clap::Args, Debug)]
pub struct SessionArgs {
  /// 输出目录（报告与可视化图像），开始时会清空上一次的输出
  #[arg(long, env = "QINGDIAN_OUTPUT", default_value = "output", value_name = "DIR")]
  pub output: PathBuf,

  /// 检测结果来源
  /// 支持格式:
  /// - sidecar://?suffix=.json   读取与图像同名的检测结果文件
  /// - manifest:///path/to/detections.json   从清单文件中按文件名查找
  /// 两者都可以附加 min_confidence=0.5
  #[arg(
    long,
    env = "QINGDIAN_DETECTOR",
    default_value = "sidecar://",
    value_name = "URL"
  )]
  pub detector: Url,

  /// 不生成可视化图像
  #[arg(long)]
  pub no_visualize: bool,
}
