// 该文件是 HandMirror （镜中手） 项目的一部分。
// src/model/topology.rs - 手部关键点拓扑
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

//! 检测器输出的 21 点手部拓扑。
//!
//! 序号与连接关系由外部检测器的输出格式决定，这里只做命名，不做修改。

/// 每只手的关键点数量
pub const LANDMARK_COUNT: usize = 21;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum HandJoint {
  Wrist = 0,
  ThumbCmc = 1,
  ThumbMcp = 2,
  ThumbIp = 3,
  ThumbTip = 4,
  IndexFingerMcp = 5,
  IndexFingerPip = 6,
  IndexFingerDip = 7,
  IndexFingerTip = 8,
  MiddleFingerMcp = 9,
  MiddleFingerPip = 10,
  MiddleFingerDip = 11,
  MiddleFingerTip = 12,
  RingFingerMcp = 13,
  RingFingerPip = 14,
  RingFingerDip = 15,
  RingFingerTip = 16,
  PinkyMcp = 17,
  PinkyPip = 18,
  PinkyDip = 19,
  PinkyTip = 20,
}

impl HandJoint {
  pub const fn index(self) -> usize {
    self as usize
  }
}

use HandJoint::*;

/// 骨架连线（与检测器自带的 HAND_CONNECTIONS 一致）
pub const HAND_CONNECTIONS: [(HandJoint, HandJoint); 21] = [
  (Wrist, ThumbCmc),
  (ThumbCmc, ThumbMcp),
  (ThumbMcp, ThumbIp),
  (ThumbIp, ThumbTip),
  (Wrist, IndexFingerMcp),
  (IndexFingerMcp, IndexFingerPip),
  (IndexFingerPip, IndexFingerDip),
  (IndexFingerDip, IndexFingerTip),
  (IndexFingerMcp, MiddleFingerMcp),
  (MiddleFingerMcp, MiddleFingerPip),
  (MiddleFingerPip, MiddleFingerDip),
  (MiddleFingerDip, MiddleFingerTip),
  (MiddleFingerMcp, RingFingerMcp),
  (RingFingerMcp, RingFingerPip),
  (RingFingerPip, RingFingerDip),
  (RingFingerDip, RingFingerTip),
  (RingFingerMcp, PinkyMcp),
  (Wrist, PinkyMcp),
  (PinkyMcp, PinkyPip),
  (PinkyPip, PinkyDip),
  (PinkyDip, PinkyTip),
];
