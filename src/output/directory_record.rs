// 该文件是 HandMirror （镜中手） 项目的一部分。
// src/output/directory_record.rs - 目录记录输出
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
  cell::RefCell,
  path::{Path, PathBuf},
};

use chrono::{DateTime, Datelike, Utc};
use thiserror::Error;
use tracing::debug;

use crate::{
  FromUrl, FromUrlWithScheme, decode_url_path,
  frame::VideoFrame,
  model::{DetectionResult, RecordedFrame},
  output::{
    Render,
    canvas::{CanvasError, RasterCanvas},
    draw::{DrawStyle, FrameRenderer, RenderError},
    surface_size,
  },
};

#[derive(Error, Debug)]
pub enum DirectoryRecordOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("图像错误: {0}")]
  ImageError(#[from] image::ImageError),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("JSON 错误: {0}")]
  JsonError(#[from] serde_json::Error),
  #[error("画布错误: {0}")]
  CanvasError(#[from] CanvasError),
  #[error("渲染错误: {0}")]
  RenderError(#[from] RenderError),
}

/// 把关键点写成可被回放检测器读取的一行记录
pub struct Record;

impl Record {
  pub fn record(result: &DetectionResult, path: &Path) -> Result<(), DirectoryRecordOutputError> {
    let record = RecordedFrame {
      multi_hand_landmarks: result.multi_hand_landmarks.clone(),
      multi_handedness: result.multi_handedness.clone(),
    };
    std::fs::write(path.with_extension("json"), serde_json::to_string(&record)?)?;
    Ok(())
  }
}

/// 按日期分目录保存渲染结果
///
/// 查询参数：`record` 同时保存关键点记录，`always` 没有检测到手时也保存。
pub struct DirectoryRecordOutput {
  directory: PathBuf,
  renderer: FrameRenderer,
  canvas: RefCell<RasterCanvas>,
  record: bool,
  always: bool,
}

impl FromUrlWithScheme for DirectoryRecordOutput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn from_url(uri: &url::Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(DirectoryRecordOutputError::SchemeMismatch);
    }

    let record = uri.query_pairs().any(|(k, _)| k == "record");
    let always = uri.query_pairs().any(|(k, _)| k == "always");
    let (width, height) = surface_size(uri);

    Ok(DirectoryRecordOutput {
      directory: PathBuf::from(decode_url_path(uri)),
      renderer: FrameRenderer::new(DrawStyle::default().with_query(uri, width, height)),
      canvas: RefCell::new(RasterCanvas::new(width, height)?),
      record,
      always,
    })
  }
}

impl DirectoryRecordOutput {
  fn frame_path(
    &self,
    now: DateTime<Utc>,
    frame: &VideoFrame,
  ) -> Result<PathBuf, DirectoryRecordOutputError> {
    let directory = self
      .directory
      .join(now.year().to_string())
      .join(format!("{:02}", now.month()))
      .join(format!("{:02}", now.day()));
    std::fs::create_dir_all(&directory)?;

    Ok(directory.join(format!(
      "{}-{:06}.png",
      now.format("%H-%M-%S"),
      frame.index
    )))
  }
}

impl Render<VideoFrame, DetectionResult> for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn render_result(&self, frame: &VideoFrame, result: &DetectionResult) -> Result<(), Self::Error> {
    if !self.always && result.is_empty() {
      debug!("第 {} 帧没有检测到手，跳过保存", frame.index);
      return Ok(());
    }

    let image = {
      let mut canvas = self.canvas.borrow_mut();
      self.renderer.render(&mut *canvas, result)?;
      canvas.to_rgb_image()
    };

    let path = self.frame_path(Utc::now(), frame)?;
    image.save(&path)?;
    if self.record {
      Record::record(result, &path)?;
    }
    debug!("保存第 {} 帧到 {}", frame.index, path.display());
    Ok(())
  }
}
