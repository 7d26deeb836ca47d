// 该文件是 HandMirror （镜中手） 项目的一部分。
// src/model/replay.rs - 回放已记录的检测结果
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

use std::cell::Cell;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme, decode_url_path,
  frame::VideoFrame,
  model::{DetectionResult, Handedness, HandsOptions, LandmarkSet, Model, OptionsError},
};

#[derive(Error, Debug)]
pub enum ReplayError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("第 {line} 行解析失败: {source}")]
  ParseError {
    line: usize,
    source: serde_json::Error,
  },
  #[error("检测参数错误: {0}")]
  OptionsError(#[from] OptionsError),
}

/// 记录文件中的一行，对应一帧
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedFrame {
  #[serde(default)]
  pub multi_hand_landmarks: Option<Vec<LandmarkSet>>,
  #[serde(default)]
  pub multi_handedness: Option<Vec<Handedness>>,
}

/// 以 JSON Lines 文件代替实时推理的检测器
///
/// 第 `i` 帧取第 `i` 行记录（空行即没有手），超出记录范围的帧视为没有手。
pub struct ReplayDetector {
  records: Vec<RecordedFrame>,
  options: HandsOptions,
  tracked: Cell<usize>,
}

impl FromUrlWithScheme for ReplayDetector {
  const SCHEME: &'static str = "landmarks";
}

impl FromUrl for ReplayDetector {
  type Error = ReplayError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(ReplayError::SchemeMismatch);
    }

    let options = HandsOptions::from_query(url)?;
    let path = decode_url_path(url);
    let content = std::fs::read_to_string(&path)?;
    let records = parse_records(&content)?;
    info!("载入 {} 帧检测记录: {}", records.len(), path);

    Self::new(records, options)
  }
}

fn parse_records(content: &str) -> Result<Vec<RecordedFrame>, ReplayError> {
  content
    .lines()
    .enumerate()
    .map(|(i, line)| {
      if line.trim().is_empty() {
        // 空行表示这一帧没有检测到手
        return Ok(RecordedFrame::default());
      }
      serde_json::from_str(line).map_err(|source| ReplayError::ParseError {
        line: i + 1,
        source,
      })
    })
    .collect()
}

impl ReplayDetector {
  pub fn new(records: Vec<RecordedFrame>, options: HandsOptions) -> Result<Self, ReplayError> {
    let options = options.validate()?;
    debug!(
      "模型复杂度 {} 对回放无影响",
      u8::from(options.model_complexity)
    );
    Ok(Self {
      records,
      options,
      tracked: Cell::new(0),
    })
  }

  pub fn options(&self) -> &HandsOptions {
    &self.options
  }

  pub fn with_options(mut self, options: HandsOptions) -> Result<Self, ReplayError> {
    self.options = options.validate()?;
    Ok(self)
  }

  pub fn len(&self) -> usize {
    self.records.len()
  }

  pub fn is_empty(&self) -> bool {
    self.records.is_empty()
  }

  // 上一帧已跟踪的位置使用跟踪阈值，其余位置使用检测阈值
  fn select_hands(&self, record: &RecordedFrame) -> (Vec<LandmarkSet>, Vec<Handedness>) {
    let previous = self.tracked.get();
    let landmarks = record.multi_hand_landmarks.as_deref().unwrap_or(&[]);
    let handedness = record.multi_handedness.as_deref().unwrap_or(&[]);

    let mut hands = Vec::new();
    let mut labels = Vec::new();
    for (slot, set) in landmarks.iter().enumerate() {
      if hands.len() >= self.options.max_num_hands {
        debug!("超过 max_num_hands={}，忽略其余手", self.options.max_num_hands);
        break;
      }
      let label = handedness.get(slot);
      let threshold = if slot < previous {
        self.options.min_tracking_confidence
      } else {
        self.options.min_detection_confidence
      };
      if let Some(score) = label.and_then(|h| h.score)
        && score < threshold
      {
        debug!("第 {} 只手置信度 {:.2} 低于阈值 {:.2}", slot, score, threshold);
        continue;
      }
      hands.push(set.clone());
      if let Some(label) = label {
        labels.push(label.clone());
      }
    }

    self.tracked.set(hands.len());
    (hands, labels)
  }
}

impl Model for ReplayDetector {
  type Input = VideoFrame;
  type Output = DetectionResult;
  type Error = ReplayError;

  fn infer(&self, input: &VideoFrame) -> Result<DetectionResult, ReplayError> {
    let (hands, labels) = match self.records.get(input.index) {
      Some(record) => self.select_hands(record),
      None => {
        self.tracked.set(0);
        (Vec::new(), Vec::new())
      }
    };

    Ok(DetectionResult {
      image: Some(input.image.clone()),
      multi_hand_landmarks: (!hands.is_empty()).then_some(hands),
      multi_handedness: (!labels.is_empty()).then_some(labels),
    })
  }
}
