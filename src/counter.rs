// 该文件是 Qingdian （清点） 项目的一部分。
// src/counter.rs - 房间内同类目标去重计数
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

//! 房间内的“唯一计数”只表示某类目标是否出现过：同一房间中同一类别
//! 无论检测到多少次、框和置信度是否不同，计数都是 1。
//! 区分同类的多个实例（例如两张沙发）不在本模块范围内。

use indexmap::{IndexMap, IndexSet};
use serde::{
  Deserialize, Deserializer, Serialize, Serializer,
  de::{self, MapAccess, Visitor},
  ser::SerializeMap,
};

use crate::room::{RoomDetections, RoomId};

/// 出现即计为 1
pub const PRESENT: u32 = 1;

/// 单个房间的目标类别清单，按首次出现的顺序排列
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomInventory {
  classes: IndexSet<String>,
}

impl RoomInventory {
  pub fn new() -> Self {
    Self::default()
  }

  /// 记录一个类别，返回该类别是否首次出现
  pub fn insert(&mut self, class_name: impl Into<String>) -> bool {
    self.classes.insert(class_name.into())
  }

  pub fn contains(&self, class_name: &str) -> bool {
    self.classes.contains(class_name)
  }

  pub fn count(&self, class_name: &str) -> Option<u32> {
    self.contains(class_name).then_some(PRESENT)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
    self.classes.iter().map(|name| (name.as_str(), PRESENT))
  }

  pub fn classes(&self) -> impl Iterator<Item = &str> {
    self.classes.iter().map(String::as_str)
  }

  pub fn len(&self) -> usize {
    self.classes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.classes.is_empty()
  }
}

impl<S: Into<String>> FromIterator<S> for RoomInventory {
  fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
    let mut inventory = RoomInventory::new();
    for class_name in iter {
      inventory.insert(class_name);
    }
    inventory
  }
}

impl Serialize for RoomInventory {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(self.classes.len()))?;
    for class_name in &self.classes {
      map.serialize_entry(class_name, &PRESENT)?;
    }
    map.end()
  }
}

struct RoomInventoryVisitor;

impl<'de> Visitor<'de> for RoomInventoryVisitor {
  type Value = RoomInventory;

  fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    write!(f, "a map from class name to {}", PRESENT)
  }

  fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
    let mut inventory = RoomInventory::new();
    while let Some((class_name, count)) = access.next_entry::<String, u32>()? {
      if count != PRESENT {
        return Err(de::Error::custom(format!(
          "类别 '{}' 的计数为 {}，唯一计数只能为 {}",
          class_name, count, PRESENT
        )));
      }
      inventory.insert(class_name);
    }
    Ok(inventory)
  }
}

impl<'de> Deserialize<'de> for RoomInventory {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    deserializer.deserialize_map(RoomInventoryVisitor)
  }
}

/// 每个房间的唯一目标计数
///
/// 房间顺序与聚合时首次出现的顺序一致。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UniqueCounts {
  rooms: IndexMap<RoomId, RoomInventory>,
}

impl UniqueCounts {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert(&mut self, room_id: RoomId, inventory: RoomInventory) -> Option<RoomInventory> {
    self.rooms.insert(room_id, inventory)
  }

  pub fn room(&self, room_id: &RoomId) -> Option<&RoomInventory> {
    self.rooms.get(room_id)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&RoomId, &RoomInventory)> {
    self.rooms.iter()
  }

  pub fn len(&self) -> usize {
    self.rooms.len()
  }

  pub fn is_empty(&self) -> bool {
    self.rooms.is_empty()
  }

  /// 所有 (房间, 类别) 组合的数量，即表格报告的数据行数
  pub fn total_entries(&self) -> usize {
    self.rooms.values().map(RoomInventory::len).sum()
  }
}

impl FromIterator<(RoomId, RoomInventory)> for UniqueCounts {
  fn from_iter<T: IntoIterator<Item = (RoomId, RoomInventory)>>(iter: T) -> Self {
    UniqueCounts {
      rooms: iter.into_iter().collect(),
    }
  }
}

/// 将每个房间的检测结果归约为类别出现表
///
/// 只看 `class_name`，忽略边界框与置信度；没有检测的房间得到空表。
pub fn reduce(room_detections: &RoomDetections) -> UniqueCounts {
  room_detections
    .iter()
    .map(|(room_id, detections)| {
      let inventory: RoomInventory = detections.iter().map(|d| d.class_name()).collect();
      (room_id.clone(), inventory)
    })
    .collect()
}
