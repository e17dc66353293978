// 该文件是 Qingdian （清点） 项目的一部分。
// tests/cli.rs - 命令行端到端测试
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

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(path: &Path, contents: &str) {
  fs::write(path, contents).unwrap();
}

/// 三张图像，两个房间，第三张没有房间标识
fn sample_dataset() -> TempDir {
  let dir = TempDir::new().unwrap();
  let root = dir.path();

  write(
    &root.join("metadata.json"),
    r#"{
      "image1.jpg": {"room_id": "Room A", "image_name": "living_room_1.jpg"},
      "image2.jpg": {"room_id": "Room B"},
      "image3.jpg": {"image_name": "bedroom_1.jpg"},
      "image4.jpg": {"room_id": "Room A"}
    }"#,
  );
  for name in ["image1.jpg", "image2.jpg", "image3.jpg", "image4.jpg"] {
    write(&root.join(name), "placeholder");
  }
  write(
    &root.join("image1.jpg.json"),
    r#"[
      {"box": [10, 10, 200, 150], "confidence": 0.9, "class_name": "Sofa"},
      {"box": [220, 10, 400, 150], "confidence": 0.8, "class_name": "Sofa"},
      {"box": [50, 200, 120, 300], "confidence": 0.95, "class_name": "Chair"}
    ]"#,
  );
  write(
    &root.join("image2.jpg.json"),
    r#"[{"box": [0, 0, 64, 48], "confidence": 0.91, "class_name": "TV"}]"#,
  );
  write(
    &root.join("image3.jpg.json"),
    r#"[{"box": [0, 0, 64, 48], "confidence": 0.99, "class_name": "Bed"}]"#,
  );
  write(
    &root.join("image4.jpg.json"),
    r#"[
      {"box": [5, 5, 50, 50], "confidence": 0.85, "class_name": "Chair"},
      {"box": [60, 5, 90, 50], "confidence": 0.75, "class_name": "TV"},
      {"box": [95, 5, 120, 50], "confidence": 0.72, "class_name": "TV"}
    ]"#,
  );

  dir
}

#[test]
fn dataset_run_writes_room_reports() {
  let dataset = sample_dataset();
  let output = TempDir::new().unwrap();

  Command::cargo_bin("qingdian")
    .unwrap()
    .args(["dataset", "--dataset"])
    .arg(dataset.path())
    .arg("--output")
    .arg(output.path())
    .args(["--detector", "sidecar://"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Room A: Sofa, Chair, TV"))
    .stdout(predicate::str::contains("Room B: TV"))
    .stdout(predicate::str::contains("跳过图像数: 1"));

  let json = fs::read_to_string(output.path().join("room_wise_report.json")).unwrap();
  let value: serde_json::Value = serde_json::from_str(&json).unwrap();
  assert_eq!(
    value,
    serde_json::json!({
      "Room A": {"Sofa": 1, "Chair": 1, "TV": 1},
      "Room B": {"TV": 1}
    })
  );

  let csv = fs::read_to_string(output.path().join("room_wise_report.csv")).unwrap();
  assert_eq!(
    csv,
    "Room ID,Object,Count\r\nRoom A,Sofa,1\r\nRoom A,Chair,1\r\nRoom A,TV,1\r\nRoom B,TV,1\r\n"
  );
  assert!(!output.path().join(".qingdian.lock").exists());
}

#[test]
fn missing_metadata_aborts_without_reports() {
  let dataset = TempDir::new().unwrap();
  let output = TempDir::new().unwrap();
  write(&output.path().join("room_wise_report.json"), "{\"old\": {}}");

  Command::cargo_bin("qingdian")
    .unwrap()
    .args(["dataset", "--dataset"])
    .arg(dataset.path())
    .arg("--output")
    .arg(output.path())
    .assert()
    .failure()
    .stderr(predicate::str::contains("metadata.json"));

  // 中止的会话不触碰上一次的输出
  let json = fs::read_to_string(output.path().join("room_wise_report.json")).unwrap();
  assert_eq!(json, "{\"old\": {}}");
  assert!(!output.path().join("room_wise_report.csv").exists());
}

#[test]
fn batch_run_uses_single_room_and_manifest() {
  let input = TempDir::new().unwrap();
  let output = TempDir::new().unwrap();
  for name in ["a.jpg", "b.png", "readme.txt"] {
    write(&input.path().join(name), "placeholder");
  }
  let manifest = input.path().join("detections.json");
  write(
    &manifest,
    r#"{
      "a.jpg": [
        {"box": [1, 1, 10, 10], "confidence": 0.99, "class_name": "Bed"},
        {"box": [12, 1, 30, 10], "confidence": 0.80, "class_name": "Chair"}
      ],
      "b.png": [
        {"box": [1, 1, 10, 10], "confidence": 0.70, "class_name": "Bed"},
        {"box": [1, 1, 10, 10], "confidence": 0.20, "class_name": "Cat"}
      ]
    }"#,
  );

  Command::cargo_bin("qingdian")
    .unwrap()
    .args(["batch", "--room-id", "Room C", "--no-visualize"])
    .arg("--output")
    .arg(output.path())
    .arg("--detector")
    .arg(format!("manifest://{}?min_confidence=0.5", manifest.display()))
    .arg(input.path().join("a.jpg"))
    .arg(input.path().join("b.png"))
    .arg(input.path().join("readme.txt"))
    .assert()
    .success()
    .stdout(predicate::str::contains("Room C: Bed, Chair"))
    .stdout(predicate::str::contains("处理图像数: 2"));

  let json = fs::read_to_string(output.path().join("room_wise_report.json")).unwrap();
  let value: serde_json::Value = serde_json::from_str(&json).unwrap();
  assert_eq!(value, serde_json::json!({"Room C": {"Bed": 1, "Chair": 1}}));
  assert_eq!(
    fs::read_dir(output.path().join("visualizations"))
      .unwrap()
      .count(),
    0
  );
}

#[test]
fn batch_without_room_id_uses_default_room() {
  let input = TempDir::new().unwrap();
  let output = TempDir::new().unwrap();
  write(&input.path().join("a.jpg"), "placeholder");

  Command::cargo_bin("qingdian")
    .unwrap()
    .arg("batch")
    .arg("--output")
    .arg(output.path())
    .arg(input.path().join("a.jpg"))
    .assert()
    .success()
    .stdout(predicate::str::contains("Unknown_Room: (无)"));
}

#[test]
fn output_and_detector_come_from_environment() {
  let input = TempDir::new().unwrap();
  let output = TempDir::new().unwrap();
  write(&input.path().join("a.jpg"), "placeholder");
  let manifest = input.path().join("detections.json");
  write(
    &manifest,
    r#"{"a.jpg": [{"box": [1, 1, 10, 10], "confidence": 0.9, "class_name": "Lamp"}]}"#,
  );

  Command::cargo_bin("qingdian")
    .unwrap()
    .env("QINGDIAN_OUTPUT", output.path())
    .env("QINGDIAN_DETECTOR", format!("manifest://{}", manifest.display()))
    .args(["batch", "--room-id", "Study", "--no-visualize"])
    .arg(input.path().join("a.jpg"))
    .assert()
    .success()
    .stdout(predicate::str::contains("Study: Lamp"));

  let csv = fs::read_to_string(output.path().join("room_wise_report.csv")).unwrap();
  assert_eq!(csv, "Room ID,Object,Count\r\nStudy,Lamp,1\r\n");
}

#[test]
fn unknown_detector_scheme_is_rejected() {
  let input = TempDir::new().unwrap();
  let output = TempDir::new().unwrap();
  write(&input.path().join("a.jpg"), "placeholder");

  Command::cargo_bin("qingdian")
    .unwrap()
    .args(["batch", "--detector", "yolo26:///model.rknn"])
    .arg("--output")
    .arg(output.path())
    .arg(input.path().join("a.jpg"))
    .assert()
    .failure()
    .stderr(predicate::str::contains("不支持的检测来源"));
}

#[test]
fn batch_requires_images() {
  Command::cargo_bin("qingdian")
    .unwrap()
    .arg("batch")
    .assert()
    .failure()
    .stderr(predicate::str::contains("required"));
}

#[cfg(feature = "visualize")]
#[test]
fn dataset_run_writes_visualizations() {
  let dataset = sample_dataset();
  image::RgbImage::from_pixel(640, 480, image::Rgb([255, 255, 255]))
    .save_with_format(dataset.path().join("image1.jpg"), image::ImageFormat::Jpeg)
    .unwrap();
  let output = TempDir::new().unwrap();

  Command::cargo_bin("qingdian")
    .unwrap()
    .args(["dataset", "--dataset"])
    .arg(dataset.path())
    .arg("--output")
    .arg(output.path())
    .assert()
    .success()
    .stdout(predicate::str::contains("可视化图像数: 1"));

  let visualizations = output.path().join("visualizations");
  let written = image::open(visualizations.join("detected_image1.jpg")).unwrap();
  assert_eq!((written.width(), written.height()), (640, 480));
  // 占位文件无法解码，只跳过可视化
  assert!(!visualizations.join("detected_image2.jpg").exists());
}
