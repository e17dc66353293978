// 该文件是 Qingdian （清点） 项目的一部分。
// src/room.rs - 房间标识与按房间聚合检测结果
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

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::detection::Detection;

/// 房间标识，由外部提供，不做内容校验
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
  pub fn new(id: impl Into<String>) -> Self {
    RoomId(id.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for RoomId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for RoomId {
  fn from(id: &str) -> Self {
    RoomId(id.to_string())
  }
}

impl From<String> for RoomId {
  fn from(id: String) -> Self {
    RoomId(id)
  }
}

impl AsRef<str> for RoomId {
  fn as_ref(&self) -> &str {
    &self.0
  }
}

/// 按房间累积的检测结果
///
/// 房间按首次加入的顺序排列，每个房间内的检测按到达顺序排列。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoomDetections {
  rooms: IndexMap<RoomId, Vec<Detection>>,
}

impl RoomDetections {
  pub fn new() -> Self {
    Self::default()
  }

  /// 将一批检测追加到房间末尾，新房间会先建立空序列
  pub fn add<I>(&mut self, room_id: RoomId, detections: I)
  where
    I: IntoIterator<Item = Detection>,
  {
    self.rooms.entry(room_id).or_default().extend(detections);
  }

  /// 登记一个房间（即使暂时没有检测结果）
  pub fn ensure_room(&mut self, room_id: RoomId) {
    self.rooms.entry(room_id).or_default();
  }

  pub fn detections(&self, room_id: &RoomId) -> Option<&[Detection]> {
    self.rooms.get(room_id).map(Vec::as_slice)
  }

  pub fn rooms(&self) -> impl Iterator<Item = &RoomId> {
    self.rooms.keys()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&RoomId, &[Detection])> {
    self
      .rooms
      .iter()
      .map(|(room_id, detections)| (room_id, detections.as_slice()))
  }

  pub fn len(&self) -> usize {
    self.rooms.len()
  }

  pub fn is_empty(&self) -> bool {
    self.rooms.is_empty()
  }

  pub fn total_detections(&self) -> usize {
    self.rooms.values().map(Vec::len).sum()
  }
}
