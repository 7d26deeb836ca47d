// 该文件是 HandMirror （镜中手） 项目的一部分。
// src/output/save_image_file.rs - 保存图像文件
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

use std::{cell::RefCell, path::Path};

use thiserror::Error;
use tracing::info;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme, decode_url_path,
  frame::VideoFrame,
  model::DetectionResult,
  output::{
    Render,
    canvas::{CanvasError, RasterCanvas},
    draw::{DrawStyle, FrameRenderer, RenderError},
    surface_size,
  },
};

/// 渲染每一帧并覆盖写入同一个图像文件
pub struct SaveImageFileOutput {
  path: String,
  renderer: FrameRenderer,
  canvas: RefCell<RasterCanvas>,
}

#[derive(Error, Debug)]
pub enum SaveImageFileError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("图像错误: {0}")]
  ImageError(#[from] image::ImageError),
  #[error("画布错误: {0}")]
  CanvasError(#[from] CanvasError),
  #[error("渲染错误: {0}")]
  RenderError(#[from] RenderError),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

impl FromUrlWithScheme for SaveImageFileOutput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for SaveImageFileOutput {
  type Error = SaveImageFileError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(SaveImageFileError::SchemeMismatch(format!(
        "期望保存方式 '{}', 实际保存方式 '{}'",
        Self::SCHEME,
        uri.scheme()
      )));
    }

    let (width, height) = surface_size(uri);
    Ok(SaveImageFileOutput {
      path: decode_url_path(uri),
      renderer: FrameRenderer::new(DrawStyle::default().with_query(uri, width, height)),
      canvas: RefCell::new(RasterCanvas::new(width, height)?),
    })
  }
}

impl SaveImageFileOutput {
  pub fn path(&self) -> &str {
    &self.path
  }

  fn save_image(&self, image: image::RgbImage) -> Result<(), SaveImageFileError> {
    if let Some(parent) = Path::new(&self.path).parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)?;
    }

    image.save(&self.path)?;
    info!("保存图像到文件: {}", self.path);

    Ok(())
  }
}

impl Render<VideoFrame, DetectionResult> for SaveImageFileOutput {
  type Error = SaveImageFileError;

  fn render_result(
    &self,
    _frame: &VideoFrame,
    result: &DetectionResult,
  ) -> Result<(), Self::Error> {
    let image = {
      let mut canvas = self.canvas.borrow_mut();
      self.renderer.render(&mut *canvas, result)?;
      canvas.to_rgb_image()
    };
    self.save_image(image)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::{Rgb, RgbImage};

  #[test]
  fn renders_mirrored_frame_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out").join("frame.png");
    let url = Url::parse(&format!("image://{}?width=4&height=2", path.display())).unwrap();
    let output = SaveImageFileOutput::from_url(&url).unwrap();

    let mut image = RgbImage::from_pixel(4, 2, Rgb([0, 0, 0]));
    image.put_pixel(0, 0, Rgb([200, 10, 10]));
    let frame = VideoFrame::new(0, 0, image.clone());
    let result = DetectionResult {
      image: Some(image),
      ..Default::default()
    };
    output.render_result(&frame, &result).unwrap();

    let saved = image::open(&path).unwrap().to_rgb8();
    assert_eq!(saved.dimensions(), (4, 2));
    assert_eq!(*saved.get_pixel(3, 0), Rgb([200, 10, 10]));
    assert_eq!(*saved.get_pixel(0, 0), Rgb([0, 0, 0]));
  }

  #[test]
  fn zero_sized_surface_is_rejected() {
    let url = Url::parse("image:///tmp/out.png?width=0").unwrap();
    assert!(matches!(
      SaveImageFileOutput::from_url(&url),
      Err(SaveImageFileError::CanvasError(CanvasError::InvalidSize { .. }))
    ));
  }

  #[test]
  fn huge_surface_is_rejected_before_allocation() {
    let url = Url::parse("image:///tmp/out.png?width=100000&height=100000").unwrap();
    assert!(matches!(
      SaveImageFileOutput::from_url(&url),
      Err(SaveImageFileError::CanvasError(CanvasError::InvalidSize {
        width: 100000,
        height: 100000
      }))
    ));
  }
}
