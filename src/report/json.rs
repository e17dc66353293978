// 该文件是 Qingdian （清点） 项目的一部分。
// src/report/json.rs - JSON 报告
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
  io::{BufReader, Read, Write},
  path::Path,
};

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::{
  counter::UniqueCounts,
  report::{ReportError, ReportFormat},
};

const JSON_INDENT: &[u8] = b"    ";

/// `{"<房间>": {"<类别>": 1, ...}, ...}`，四空格缩进
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonReport;

impl JsonReport {
  pub fn read_report<R: Read>(&self, reader: R) -> Result<UniqueCounts, ReportError> {
    Ok(serde_json::from_reader(reader)?)
  }
}

impl ReportFormat for JsonReport {
  const FILE_NAME: &'static str = "room_wise_report.json";
  const NAME: &'static str = "JSON";

  fn write_report<W: Write>(&self, counts: &UniqueCounts, writer: W) -> Result<(), ReportError> {
    let formatter = PrettyFormatter::with_indent(JSON_INDENT);
    let mut serializer = Serializer::with_formatter(writer, formatter);
    counts.serialize(&mut serializer)?;
    Ok(())
  }
}

/// 读取 JSON 报告文件
pub fn read_json_report(path: &Path) -> Result<UniqueCounts, ReportError> {
  let reader = BufReader::new(File::open(path)?);
  JsonReport.read_report(reader)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{counter::RoomInventory, room::RoomId};

  fn sample_counts() -> UniqueCounts {
    [
      ("Room A", vec!["Sofa", "Chair", "TV"]),
      ("Room B", vec!["TV"]),
      ("Storage", vec![]),
    ]
    .into_iter()
    .map(|(room, classes)| (RoomId::from(room), classes.into_iter().collect::<RoomInventory>()))
    .collect()
  }

  #[test]
  fn writes_nested_object_with_four_space_indent() {
    let mut buffer = Vec::new();
    JsonReport.write_report(&sample_counts(), &mut buffer).unwrap();
    let text = String::from_utf8(buffer).unwrap();

    let expected = r#"{
    "Room A": {
        "Sofa": 1,
        "Chair": 1,
        "TV": 1
    },
    "Room B": {
        "TV": 1
    },
    "Storage": {}
}"#;
    assert_eq!(text, expected);
  }

  #[test]
  fn parsing_report_restores_counts() {
    let counts = sample_counts();
    let mut buffer = Vec::new();
    JsonReport.write_report(&counts, &mut buffer).unwrap();

    let parsed = JsonReport.read_report(buffer.as_slice()).unwrap();
    assert_eq!(parsed, counts);
    assert_eq!(
      parsed.iter().collect::<Vec<_>>(),
      counts.iter().collect::<Vec<_>>()
    );
  }

  #[test]
  fn empty_counts_is_empty_object() {
    let mut buffer = Vec::new();
    JsonReport
      .write_report(&UniqueCounts::new(), &mut buffer)
      .unwrap();
    assert_eq!(buffer, b"{}");
  }
}
