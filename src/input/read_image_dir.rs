// 该文件是 HandMirror （镜中手） 项目的一部分。
// src/input/read_image_dir.rs - 图像序列目录输入
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

use std::{collections::HashMap, path::PathBuf};

use image::ImageReader;
use thiserror::Error;
use tracing::{error, info};
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, decode_url_path, frame::VideoFrame, input::is_image_path};

const DEFAULT_FPS: f64 = 30.0;

#[derive(Error, Debug)]
pub enum DirectoryInputError {
  #[error("URI schema mismatch")]
  SchemaMismatch,
  #[error("I/O error: {0}")]
  IoError(#[from] std::io::Error),
  #[error("No image found in {0}")]
  Empty(String),
}

/// 目录中的图像按文件名排序，视为按采集顺序排列的帧
///
/// 帧序号等于文件在排序中的位置，解码失败的文件被跳过但不改变后续序号。
pub struct DirectoryInput {
  files: Vec<PathBuf>,
  position: usize,
  fps: f64,
}

impl FromUrlWithScheme for DirectoryInput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for DirectoryInput {
  type Error = DirectoryInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(DirectoryInputError::SchemaMismatch);
    }

    let query_pairs: HashMap<_, _> = url.query_pairs().collect();
    let fps: f64 = query_pairs
      .get("fps")
      .and_then(|v| v.parse().ok())
      .filter(|v: &f64| *v > 0.0)
      .unwrap_or(DEFAULT_FPS);

    let directory = decode_url_path(url);
    let mut files = std::fs::read_dir(&directory)?
      .filter_map(|entry| entry.ok().map(|e| e.path()))
      .filter(|path| path.is_file() && is_image_path(path))
      .collect::<Vec<_>>();
    files.sort();

    if files.is_empty() {
      return Err(DirectoryInputError::Empty(directory));
    }
    info!("目录 {} 中共有 {} 帧图像", directory, files.len());

    Ok(DirectoryInput {
      files,
      position: 0,
      fps,
    })
  }
}

impl DirectoryInput {
  pub fn len(&self) -> usize {
    self.files.len()
  }

  pub fn is_empty(&self) -> bool {
    self.files.is_empty()
  }
}

impl Iterator for DirectoryInput {
  type Item = VideoFrame;

  fn next(&mut self) -> Option<Self::Item> {
    while let Some(path) = self.files.get(self.position) {
      let index = self.position;
      self.position += 1;

      let decoded = ImageReader::open(path)
        .map_err(image::ImageError::IoError)
        .and_then(|reader| reader.decode());
      match decoded {
        Ok(image) => {
          let timestamp_ms = VideoFrame::timestamp_for(index, self.fps);
          return Some(VideoFrame::new(index, timestamp_ms, image.to_rgb8()));
        }
        Err(e) => error!("无法读取图像 {}: {}", path.display(), e),
      }
    }
    None
  }
}
