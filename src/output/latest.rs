// 该文件是 HandMirror （镜中手） 项目的一部分。
// src/output/latest.rs - 最近一次检测结果
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

use std::path::Path;

use tracing::info;

use crate::model::{DetectionResult, LandmarkSet};

/// 保存最近一次检测结果的关键点，供导出使用
///
/// 由处理循环写入、导出操作读取，二者在同一线程上运行。
#[derive(Debug, Clone, Default)]
pub struct LatestResult {
  frame_index: Option<usize>,
  hands: Option<Vec<LandmarkSet>>,
}

impl LatestResult {
  pub fn store(&mut self, frame_index: usize, result: &DetectionResult) {
    self.frame_index = Some(frame_index);
    self.hands = result.multi_hand_landmarks.clone();
  }

  pub fn frame_index(&self) -> Option<usize> {
    self.frame_index
  }

  pub fn hands(&self) -> Option<&[LandmarkSet]> {
    self.hands.as_deref()
  }

  /// 关键点数组的 JSON，没有检测到手时为 `null`
  pub fn export_json(&self) -> Result<String, serde_json::Error> {
    serde_json::to_string(&self.hands)
  }

  pub fn export_to(&self, path: &Path) -> Result<(), std::io::Error> {
    let json = self.export_json().map_err(std::io::Error::other)?;
    if let Some(parent) = path.parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, &json)?;
    info!(
      "导出第 {:?} 帧关键点到 {}: {}",
      self.frame_index,
      path.display(),
      json
    );
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::Landmark;

  #[test]
  fn empty_holder_exports_null() {
    let latest = LatestResult::default();
    assert_eq!(latest.export_json().unwrap(), "null");
    assert_eq!(latest.frame_index(), None);
  }

  #[test]
  fn keeps_only_the_most_recent_landmarks() {
    let mut latest = LatestResult::default();
    let first = DetectionResult {
      multi_hand_landmarks: Some(vec![vec![Landmark::new(0.1, 0.2)]]),
      ..Default::default()
    };
    latest.store(0, &first);
    latest.store(1, &DetectionResult::default());
    assert_eq!(latest.frame_index(), Some(1));
    assert!(latest.hands().is_none());

    latest.store(2, &first);
    assert_eq!(latest.export_json().unwrap(), r#"[[{"x":0.1,"y":0.2}]]"#);
  }

  #[test]
  fn export_writes_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("latest.json");
    let mut latest = LatestResult::default();
    latest.store(
      3,
      &DetectionResult {
        multi_hand_landmarks: Some(vec![vec![Landmark::new(0.5, 0.25)]]),
        ..Default::default()
      },
    );
    latest.export_to(&path).unwrap();
    let written = std::fs::read_to_string(&path).unwrap();
    assert_eq!(written, r#"[[{"x":0.5,"y":0.25}]]"#);
  }
}
