// 该文件是 Qingdian （清点） 项目的一部分。
// src/workspace.rs - 单次会话独占的输出目录
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
  fs::{self, File, OpenOptions},
  io::{ErrorKind, Write},
  path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::report::{CsvReport, JsonReport, ReportFormat};

pub const LOCK_FILE_NAME: &str = ".qingdian.lock";
pub const VISUALIZATION_DIR: &str = "visualizations";
pub const VISUALIZATION_PREFIX: &str = "detected_";

#[derive(Error, Debug)]
pub enum WorkspaceError {
  #[error("输出目录正被另一个会话使用；确认没有会话在运行后可删除锁文件 {0}")]
  Locked(PathBuf),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
}

/// 会话独占的输出目录
///
/// 获取时建立目录、加锁并清空上一次会话的输出；释放（drop）时只删除锁文件，
/// 报告和可视化图像保留。
///
/// 锁文件记录持有者的进程号。持有进程已不存在（例如被强制结束）时，锁视为失效并被接管。
/// 清理只涉及本程序写出的文件：两个报告和 `visualizations/detected_*`。
#[derive(Debug)]
pub struct Workspace {
  root: PathBuf,
  lock_path: PathBuf,
}

impl Workspace {
  pub fn acquire(root: impl Into<PathBuf>) -> Result<Self, WorkspaceError> {
    let root = root.into();
    let visualization_dir = root.join(VISUALIZATION_DIR);
    fs::create_dir_all(&visualization_dir)?;

    let lock_path = root.join(LOCK_FILE_NAME);
    let mut lock = match create_lock(&lock_path) {
      Ok(lock) => lock,
      Err(err) if err.kind() == ErrorKind::AlreadyExists => {
        reclaim_stale_lock(&lock_path)?;
        match create_lock(&lock_path) {
          Ok(lock) => lock,
          Err(err) if err.kind() == ErrorKind::AlreadyExists => {
            return Err(WorkspaceError::Locked(lock_path));
          }
          Err(err) => return Err(err.into()),
        }
      }
      Err(err) => return Err(err.into()),
    };
    let workspace = Workspace { root, lock_path };
    writeln!(lock, "{}", std::process::id())?;

    let removed = clear_outputs(&workspace.root, &visualization_dir)?;
    info!(
      "输出目录 {} 已就绪，清理了 {} 个旧文件",
      workspace.root.display(),
      removed
    );

    Ok(workspace)
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  pub fn visualization_dir(&self) -> PathBuf {
    self.root.join(VISUALIZATION_DIR)
  }

  /// `visualizations/detected_<图像文件名>`
  pub fn visualization_path(&self, image_file_name: &str) -> PathBuf {
    self
      .visualization_dir()
      .join(format!("{}{}", VISUALIZATION_PREFIX, image_file_name))
  }

  pub fn json_report_path(&self) -> PathBuf {
    self.root.join(JsonReport::FILE_NAME)
  }

  pub fn csv_report_path(&self) -> PathBuf {
    self.root.join(CsvReport::FILE_NAME)
  }
}

impl Drop for Workspace {
  fn drop(&mut self) {
    match fs::remove_file(&self.lock_path) {
      Ok(()) => debug!("已释放输出目录 {}", self.root.display()),
      Err(err) => warn!("无法删除锁文件 {}: {}", self.lock_path.display(), err),
    }
  }
}

fn create_lock(lock_path: &Path) -> Result<File, std::io::Error> {
  OpenOptions::new()
    .write(true)
    .create_new(true)
    .open(lock_path)
}

/// 持有进程已退出时删除锁文件；否则返回 [`WorkspaceError::Locked`]
///
/// 无法读出进程号的锁文件按仍被持有处理。
fn reclaim_stale_lock(lock_path: &Path) -> Result<(), WorkspaceError> {
  let holder = match fs::read_to_string(lock_path) {
    Ok(contents) => contents.trim().parse::<u32>().ok(),
    // 持有者刚好释放
    Err(err) if err.kind() == ErrorKind::NotFound => return Ok(()),
    Err(err) => return Err(err.into()),
  };

  match holder {
    Some(pid) if !process_alive(pid) => {
      warn!(
        "锁文件 {} 的持有进程 {} 已不存在，接管输出目录",
        lock_path.display(),
        pid
      );
      match fs::remove_file(lock_path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
      }
    }
    _ => Err(WorkspaceError::Locked(lock_path.to_path_buf())),
  }
}

#[cfg(target_os = "linux")]
fn process_alive(pid: u32) -> bool {
  Path::new("/proc").join(pid.to_string()).exists()
}

// 无法确认时按存活处理，由用户手动删除锁文件
#[cfg(not(target_os = "linux"))]
fn process_alive(_pid: u32) -> bool {
  true
}

/// 删除上一次会话写出的报告与可视化图像，返回删除的数量
///
/// 目录中的其它文件保持不动。
fn clear_outputs(root: &Path, visualization_dir: &Path) -> Result<usize, std::io::Error> {
  let mut removed = 0;
  for name in [JsonReport::FILE_NAME, CsvReport::FILE_NAME] {
    let path = root.join(name);
    if path.is_file() {
      fs::remove_file(&path)?;
      removed += 1;
    }
  }

  for entry in fs::read_dir(visualization_dir)? {
    let entry = entry?;
    if !entry.file_type()?.is_file() {
      continue;
    }
    if !entry
      .file_name()
      .to_string_lossy()
      .starts_with(VISUALIZATION_PREFIX)
    {
      continue;
    }
    fs::remove_file(entry.path())?;
    removed += 1;
  }
  Ok(removed)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn acquire_clears_previous_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("output");
    fs::create_dir_all(root.join(VISUALIZATION_DIR)).unwrap();
    fs::write(root.join("room_wise_report.json"), "{}").unwrap();
    fs::write(root.join(VISUALIZATION_DIR).join("detected_a.jpg"), "x").unwrap();
    fs::write(root.join("room_wise_report.csv"), "Room ID,Object,Count\r\n").unwrap();
    fs::create_dir_all(root.join("keep_me")).unwrap();

    let workspace = Workspace::acquire(&root).unwrap();
    assert!(!root.join("room_wise_report.json").exists());
    assert!(!root.join("room_wise_report.csv").exists());
    assert!(!root.join(VISUALIZATION_DIR).join("detected_a.jpg").exists());
    assert!(root.join("keep_me").is_dir());
    assert!(root.join(LOCK_FILE_NAME).exists());

    drop(workspace);
    assert!(!root.join(LOCK_FILE_NAME).exists());
  }

  #[test]
  fn unrelated_files_survive_acquire() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::write(root.join("metadata.json"), "{}").unwrap();
    fs::write(root.join("image1.jpg"), "x").unwrap();
    fs::create_dir_all(root.join(VISUALIZATION_DIR)).unwrap();
    fs::write(root.join(VISUALIZATION_DIR).join("notes.txt"), "x").unwrap();

    let _workspace = Workspace::acquire(root).unwrap();
    assert!(root.join("metadata.json").is_file());
    assert!(root.join("image1.jpg").is_file());
    assert!(root.join(VISUALIZATION_DIR).join("notes.txt").is_file());
  }

  #[test]
  fn second_session_cannot_take_the_same_directory() {
    let dir = tempfile::tempdir().unwrap();
    let first = Workspace::acquire(dir.path()).unwrap();
    match Workspace::acquire(dir.path()) {
      Err(WorkspaceError::Locked(lock_path)) => {
        assert_eq!(lock_path, dir.path().join(LOCK_FILE_NAME));
      }
      other => panic!("expected Locked, got {:?}", other),
    }

    drop(first);
    assert!(Workspace::acquire(dir.path()).is_ok());
  }

  #[cfg(target_os = "linux")]
  #[test]
  fn lock_left_by_dead_process_is_reclaimed() {
    let dir = tempfile::tempdir().unwrap();
    // 超出 pid_max，不可能存在的进程
    fs::write(dir.path().join(LOCK_FILE_NAME), "4294967295\n").unwrap();

    let workspace = Workspace::acquire(dir.path()).unwrap();
    let holder = fs::read_to_string(dir.path().join(LOCK_FILE_NAME)).unwrap();
    assert_eq!(holder.trim(), std::process::id().to_string());
    drop(workspace);
  }

  #[test]
  fn lock_without_pid_is_kept() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(LOCK_FILE_NAME), "").unwrap();

    let err = Workspace::acquire(dir.path()).unwrap_err();
    assert!(matches!(err, WorkspaceError::Locked(_)));
    assert!(err.to_string().contains(LOCK_FILE_NAME));
    assert!(dir.path().join(LOCK_FILE_NAME).exists());
  }

  #[test]
  fn paths_follow_output_layout() {
    let dir = tempfile::tempdir().unwrap();
    let workspace = Workspace::acquire(dir.path()).unwrap();

    assert_eq!(
      workspace.visualization_path("image1.jpg"),
      dir.path().join("visualizations").join("detected_image1.jpg")
    );
    assert_eq!(
      workspace.json_report_path(),
      dir.path().join("room_wise_report.json")
    );
    assert_eq!(
      workspace.csv_report_path(),
      dir.path().join("room_wise_report.csv")
    );
  }
}
