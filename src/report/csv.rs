// 该文件是 Qingdian （清点） 项目的一部分。
// src/report/csv.rs - CSV 表格报告
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

use std::io::Write;

use ::csv::{Terminator, WriterBuilder};

use crate::{
  counter::UniqueCounts,
  report::{ReportError, ReportFormat},
};

pub const CSV_HEADER: [&str; 3] = ["Room ID", "Object", "Count"];

/// 每个 (房间, 类别) 一行，行尾为 CRLF
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvReport;

impl ReportFormat for CsvReport {
  const FILE_NAME: &'static str = "room_wise_report.csv";
  const NAME: &'static str = "CSV";

  fn write_report<W: Write>(&self, counts: &UniqueCounts, writer: W) -> Result<(), ReportError> {
    let mut writer = WriterBuilder::new()
      .terminator(Terminator::CRLF)
      .from_writer(writer);

    writer.write_record(CSV_HEADER)?;
    for (room_id, inventory) in counts.iter() {
      for (class_name, count) in inventory.iter() {
        writer.write_record([room_id.as_str(), class_name, &count.to_string()])?;
      }
    }
    writer.flush()?;

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{counter::RoomInventory, room::RoomId};

  fn counts(rooms: &[(&str, Vec<&str>)]) -> UniqueCounts {
    rooms
      .iter()
      .map(|(room, classes)| {
        (
          RoomId::from(*room),
          classes.iter().copied().collect::<RoomInventory>(),
        )
      })
      .collect()
  }

  fn render(counts: &UniqueCounts) -> String {
    let mut buffer = Vec::new();
    CsvReport.write_report(counts, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
  }

  #[test]
  fn rows_follow_room_then_class_order() {
    let text = render(&counts(&[
      ("Room A", vec!["Sofa", "Chair", "TV"]),
      ("Room B", vec!["TV"]),
    ]));

    assert_eq!(
      text,
      "Room ID,Object,Count\r\n\
       Room A,Sofa,1\r\n\
       Room A,Chair,1\r\n\
       Room A,TV,1\r\n\
       Room B,TV,1\r\n"
    );
  }

  #[test]
  fn row_count_is_sum_of_distinct_classes() {
    let counts = counts(&[
      ("Kitchen", vec!["oven", "sink", "cup"]),
      ("Empty", vec![]),
      ("Bedroom", vec!["bed"]),
    ]);
    let text = render(&counts);

    let mut reader = ::csv::Reader::from_reader(text.as_bytes());
    let headers = reader.headers().unwrap().clone();
    assert_eq!(headers.iter().collect::<Vec<_>>(), CSV_HEADER);
    let rows = reader.records().count();
    assert_eq!(rows, counts.total_entries());
    assert_eq!(rows, 4);
  }

  #[test]
  fn fields_with_separators_are_quoted() {
    let text = render(&counts(&[("Living room, east", vec!["tv"])]));
    assert!(text.contains("\"Living room, east\",tv,1\r\n"));
  }
}
