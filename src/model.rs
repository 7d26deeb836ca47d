// 该文件是 HandMirror （镜中手） 项目的一部分。
// src/model.rs - 手部关键点检测模型与检测结果
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

use image::RgbImage;
use serde::{Deserialize, Serialize};

pub trait Model {
  type Input;
  type Output;
  type Error;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

/// 归一化关键点，`x`、`y` 相对于帧宽高，取值 [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
  pub x: f32,
  pub y: f32,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub z: Option<f32>,
}

impl Landmark {
  pub fn new(x: f32, y: f32) -> Self {
    Self { x, y, z: None }
  }

  /// 换算到给定宽高的像素坐标
  pub fn to_pixel(&self, width: f32, height: f32) -> (f32, f32) {
    (self.x * width, self.y * height)
  }
}

/// 一只手的关键点，按拓扑序号排列
pub type LandmarkSet = Vec<Landmark>;

/// 左右手分类
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Handedness {
  #[serde(default)]
  pub index: usize,
  #[serde(default)]
  pub score: Option<f32>,
  #[serde(default)]
  pub label: String,
}

/// 一帧的检测结果
#[derive(Debug, Clone, Default)]
pub struct DetectionResult {
  /// 被检测的原始帧
  pub image: Option<RgbImage>,
  pub multi_hand_landmarks: Option<Vec<LandmarkSet>>,
  pub multi_handedness: Option<Vec<Handedness>>,
}

impl DetectionResult {
  pub fn hands(&self) -> &[LandmarkSet] {
    self.multi_hand_landmarks.as_deref().unwrap_or(&[])
  }

  pub fn is_empty(&self) -> bool {
    self.hands().is_empty()
  }
}

mod options;
mod replay;
mod topology;

pub use self::options::{HandsOptions, ModelComplexity, OptionsError};
pub use self::replay::{RecordedFrame, ReplayDetector, ReplayError};
pub use self::topology::{HAND_CONNECTIONS, HandJoint, LANDMARK_COUNT};
