// 该文件是 HandMirror （镜中手） 项目的一部分。
// src/frame.rs - 视频帧定义
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

/// 按采集顺序编号的一帧图像
#[derive(Debug, Clone)]
pub struct VideoFrame {
  /// 帧序号，从 0 开始
  pub index: usize,
  /// 相对第一帧的时间戳（毫秒）
  pub timestamp_ms: u64,
  pub image: RgbImage,
}

impl VideoFrame {
  pub fn new(index: usize, timestamp_ms: u64, image: RgbImage) -> Self {
    Self {
      index,
      timestamp_ms,
      image,
    }
  }

  pub fn width(&self) -> u32 {
    self.image.width()
  }

  pub fn height(&self) -> u32 {
    self.image.height()
  }

  /// 根据帧率推算时间戳
  pub fn timestamp_for(index: usize, fps: f64) -> u64 {
    if fps <= 0.0 {
      return 0;
    }
    ((index as f64) * 1000.0 / fps).round() as u64
  }
}
