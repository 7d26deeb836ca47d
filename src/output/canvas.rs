// 该文件是 HandMirror （镜中手） 项目的一部分。
// src/output/canvas.rs - 二维绘制表面
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

//! # 绘制表面
//!
//! [`DrawingSurface`] 描述渲染器所需的最小画布能力：变换状态的保存与恢复、
//! 缩放与平移、清除、贴图、描线、实心点和圆环描边。
//!
//! ## 坐标约定
//!
//! 所有绘制调用使用“用户坐标”，经过当前变换后得到“设备坐标”（像素）。
//! 变换的组合方式与 HTML Canvas 相同，后调用的变换先作用于点：
//!
//! ```text
//! scale(-1, 1); translate(-width, 0);
//! 用户坐标 x  ->  设备坐标 width - x
//! ```
//!
//! 像素 `(px, py)` 以其中心 `(px + 0.5, py + 0.5)` 参与覆盖判断，
//! 因此镜像后的贴图逐像素精确对应，不会出现半像素偏移。
//!
//! ## 实现
//!
//! [`RasterCanvas`] 是基于 RGBA 缓冲区的实现：
//!
//! - 粗线绘制为四边形并加圆头；
//! - 圆环描边填充半径 `[r - w/2, r + w/2]` 之间的像素；
//! - 线宽与半径随变换按 `sqrt(|sx * sy|)` 缩放。

use std::{borrow::Cow, ops::Range};

use image::{
  Rgb, RgbImage, Rgba, RgbaImage,
  imageops::{self, FilterType},
};
use imageproc::{
  drawing::{draw_filled_circle_mut, draw_line_segment_mut, draw_polygon_mut},
  point::Point,
};
use thiserror::Error;

pub type Color = Rgba<u8>;

/// 透明黑，清除后的像素值
pub const TRANSPARENT: Color = Rgba([0, 0, 0, 0]);

/// 画布单边的最大像素数
pub const MAX_SURFACE_SIDE: u32 = 8192;

// 设备坐标的绝对值上限，保证取整后的整数运算不会溢出
const MAX_DEVICE_COORD: f32 = 32_768.0;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CanvasError {
  #[error("画布尺寸无效: {width}x{height}")]
  InvalidSize { width: u32, height: u32 },
  #[error("restore 调用次数多于 save")]
  UnbalancedRestore,
  #[error("源图像为空")]
  EmptyImage,
  #[error("绘制参数不是有限数")]
  NonFinite,
  #[error("变换不可逆")]
  DegenerateTransform,
  #[error("线宽或半径过大: {size}（上限 {limit}）")]
  OversizedStroke { size: f32, limit: f32 },
  #[error("设备坐标超出范围")]
  OutOfRange,
  #[error("绘制表面不可用: {0}")]
  Unavailable(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
  pub color: Color,
  pub line_width: f32,
}

/// 轴对齐仿射变换：`x' = sx * x + tx`，`y' = sy * y + ty`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
  pub sx: f32,
  pub sy: f32,
  pub tx: f32,
  pub ty: f32,
}

impl Default for Transform {
  fn default() -> Self {
    Self::IDENTITY
  }
}

impl Transform {
  pub const IDENTITY: Transform = Transform {
    sx: 1.0,
    sy: 1.0,
    tx: 0.0,
    ty: 0.0,
  };

  pub fn is_identity(&self) -> bool {
    *self == Self::IDENTITY
  }

  pub fn scaled(self, x: f32, y: f32) -> Self {
    Self {
      sx: self.sx * x,
      sy: self.sy * y,
      ..self
    }
  }

  pub fn translated(self, x: f32, y: f32) -> Self {
    Self {
      tx: self.tx + self.sx * x,
      ty: self.ty + self.sy * y,
      ..self
    }
  }

  pub fn apply(&self, p: Point<f32>) -> Point<f32> {
    Point::new(self.sx * p.x + self.tx, self.sy * p.y + self.ty)
  }

  pub fn invert(&self, p: Point<f32>) -> Option<Point<f32>> {
    if self.sx == 0.0 || self.sy == 0.0 {
      return None;
    }
    Some(Point::new((p.x - self.tx) / self.sx, (p.y - self.ty) / self.sy))
  }

  /// 长度（线宽、半径）的缩放系数
  pub fn length_scale(&self) -> f32 {
    (self.sx * self.sy).abs().sqrt()
  }
}

pub trait DrawingSurface {
  fn width(&self) -> u32;
  fn height(&self) -> u32;
  fn transform(&self) -> Transform;

  fn save(&mut self) -> Result<(), CanvasError>;
  fn restore(&mut self) -> Result<(), CanvasError>;
  fn scale(&mut self, x: f32, y: f32) -> Result<(), CanvasError>;
  fn translate(&mut self, x: f32, y: f32) -> Result<(), CanvasError>;

  fn clear_rect(&mut self, x: f32, y: f32, w: f32, h: f32) -> Result<(), CanvasError>;
  /// 将图像拉伸绘制到矩形 `(x, y, w, h)`
  fn draw_image(
    &mut self,
    image: &RgbImage,
    x: f32,
    y: f32,
    w: f32,
    h: f32,
  ) -> Result<(), CanvasError>;
  fn stroke_line(
    &mut self,
    from: Point<f32>,
    to: Point<f32>,
    style: &StrokeStyle,
  ) -> Result<(), CanvasError>;
  fn fill_circle(&mut self, center: Point<f32>, radius: f32, color: Color)
  -> Result<(), CanvasError>;
  fn stroke_circle(
    &mut self,
    center: Point<f32>,
    radius: f32,
    style: &StrokeStyle,
  ) -> Result<(), CanvasError>;
}

fn ensure_finite(values: &[f32]) -> Result<(), CanvasError> {
  if values.iter().all(|v| v.is_finite()) {
    Ok(())
  } else {
    Err(CanvasError::NonFinite)
  }
}

/// 画布对角线长度，线宽和半径不能超过它
pub fn diagonal(width: u32, height: u32) -> f32 {
  let (w, h) = (width as f32, height as f32);
  (w * w + h * h).sqrt()
}

// 中心落在 [a, b) 内的像素序号
fn pixel_span(a: f32, b: f32, limit: u32) -> Range<u32> {
  let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
  let start = (lo - 0.5).ceil().clamp(0.0, limit as f32) as u32;
  let end = (hi - 0.5).ceil().clamp(0.0, limit as f32) as u32;
  start..end
}

pub struct RasterCanvas {
  pixels: RgbaImage,
  transform: Transform,
  stack: Vec<Transform>,
}

impl RasterCanvas {
  pub fn new(width: u32, height: u32) -> Result<Self, CanvasError> {
    if width == 0 || height == 0 || width > MAX_SURFACE_SIDE || height > MAX_SURFACE_SIDE {
      return Err(CanvasError::InvalidSize { width, height });
    }
    Ok(Self {
      pixels: RgbaImage::from_pixel(width, height, TRANSPARENT),
      transform: Transform::IDENTITY,
      stack: Vec::new(),
    })
  }

  pub fn image(&self) -> &RgbaImage {
    &self.pixels
  }

  pub fn into_image(self) -> RgbaImage {
    self.pixels
  }

  pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
    if x < self.pixels.width() && y < self.pixels.height() {
      Some(*self.pixels.get_pixel(x, y))
    } else {
      None
    }
  }

  /// 丢弃 alpha 通道，得到可直接编码的 RGB 图像
  pub fn to_rgb_image(&self) -> RgbImage {
    RgbImage::from_fn(self.pixels.width(), self.pixels.height(), |x, y| {
      let Rgba([r, g, b, _]) = *self.pixels.get_pixel(x, y);
      Rgb([r, g, b])
    })
  }

  fn check_size(&self, size: f32) -> Result<(), CanvasError> {
    let limit = diagonal(self.pixels.width(), self.pixels.height());
    if size > limit {
      return Err(CanvasError::OversizedStroke { size, limit });
    }
    Ok(())
  }

  fn check_points(points: &[Point<f32>]) -> Result<(), CanvasError> {
    if points
      .iter()
      .all(|p| p.x.abs() <= MAX_DEVICE_COORD && p.y.abs() <= MAX_DEVICE_COORD)
    {
      Ok(())
    } else {
      Err(CanvasError::OutOfRange)
    }
  }

  fn device_rect(&self, x: f32, y: f32, w: f32, h: f32) -> (Range<u32>, Range<u32>) {
    let a = self.transform.apply(Point::new(x, y));
    let b = self.transform.apply(Point::new(x + w, y + h));
    (
      pixel_span(a.x, b.x, self.pixels.width()),
      pixel_span(a.y, b.y, self.pixels.height()),
    )
  }
}

impl DrawingSurface for RasterCanvas {
  fn width(&self) -> u32 {
    self.pixels.width()
  }

  fn height(&self) -> u32 {
    self.pixels.height()
  }

  fn transform(&self) -> Transform {
    self.transform
  }

  fn save(&mut self) -> Result<(), CanvasError> {
    self.stack.push(self.transform);
    Ok(())
  }

  fn restore(&mut self) -> Result<(), CanvasError> {
    self.transform = self.stack.pop().ok_or(CanvasError::UnbalancedRestore)?;
    Ok(())
  }

  fn scale(&mut self, x: f32, y: f32) -> Result<(), CanvasError> {
    ensure_finite(&[x, y])?;
    self.transform = self.transform.scaled(x, y);
    Ok(())
  }

  fn translate(&mut self, x: f32, y: f32) -> Result<(), CanvasError> {
    ensure_finite(&[x, y])?;
    self.transform = self.transform.translated(x, y);
    Ok(())
  }

  fn clear_rect(&mut self, x: f32, y: f32, w: f32, h: f32) -> Result<(), CanvasError> {
    ensure_finite(&[x, y, w, h])?;
    let (xs, ys) = self.device_rect(x, y, w, h);
    for py in ys {
      for px in xs.clone() {
        self.pixels.put_pixel(px, py, TRANSPARENT);
      }
    }
    Ok(())
  }

  fn draw_image(
    &mut self,
    image: &RgbImage,
    x: f32,
    y: f32,
    w: f32,
    h: f32,
  ) -> Result<(), CanvasError> {
    ensure_finite(&[x, y, w, h])?;
    if image.width() == 0 || image.height() == 0 {
      return Err(CanvasError::EmptyImage);
    }
    let (tw, th) = (w.round(), h.round());
    if tw < 1.0 || th < 1.0 {
      return Ok(());
    }
    let (tw, th) = (tw as u32, th as u32);

    let source: Cow<'_, RgbImage> = if image.dimensions() == (tw, th) {
      Cow::Borrowed(image)
    } else {
      Cow::Owned(imageops::resize(image, tw, th, FilterType::Triangle))
    };

    let (xs, ys) = self.device_rect(x, y, w, h);
    for py in ys {
      for px in xs.clone() {
        let user = self
          .transform
          .invert(Point::new(px as f32 + 0.5, py as f32 + 0.5))
          .ok_or(CanvasError::DegenerateTransform)?;
        let u = ((user.x - x) / w * tw as f32).floor().clamp(0.0, (tw - 1) as f32) as u32;
        let v = ((user.y - y) / h * th as f32).floor().clamp(0.0, (th - 1) as f32) as u32;
        let Rgb([r, g, b]) = *source.get_pixel(u, v);
        self.pixels.put_pixel(px, py, Rgba([r, g, b, 255]));
      }
    }
    Ok(())
  }

  fn stroke_line(
    &mut self,
    from: Point<f32>,
    to: Point<f32>,
    style: &StrokeStyle,
  ) -> Result<(), CanvasError> {
    ensure_finite(&[from.x, from.y, to.x, to.y, style.line_width])?;
    let a = self.transform.apply(from);
    let b = self.transform.apply(to);
    let half = style.line_width * self.transform.length_scale() / 2.0;
    if half <= 0.0 {
      return Ok(());
    }
    self.check_size(half)?;
    Self::check_points(&[a, b])?;

    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let length = (dx * dx + dy * dy).sqrt();
    if half < 1.0 {
      draw_line_segment_mut(&mut self.pixels, (a.x, a.y), (b.x, b.y), style.color);
      return Ok(());
    }

    let cap = half.round() as i32;
    if length > f32::EPSILON {
      let (nx, ny) = (-dy / length * half, dx / length * half);
      let quad = [
        Point::new((a.x + nx).round() as i32, (a.y + ny).round() as i32),
        Point::new((b.x + nx).round() as i32, (b.y + ny).round() as i32),
        Point::new((b.x - nx).round() as i32, (b.y - ny).round() as i32),
        Point::new((a.x - nx).round() as i32, (a.y - ny).round() as i32),
      ];
      if quad[0] != quad[3] {
        draw_polygon_mut(&mut self.pixels, &quad, style.color);
      } else {
        draw_line_segment_mut(&mut self.pixels, (a.x, a.y), (b.x, b.y), style.color);
      }
      draw_filled_circle_mut(
        &mut self.pixels,
        (b.x.round() as i32, b.y.round() as i32),
        cap,
        style.color,
      );
    }
    draw_filled_circle_mut(
      &mut self.pixels,
      (a.x.round() as i32, a.y.round() as i32),
      cap,
      style.color,
    );
    Ok(())
  }

  fn fill_circle(
    &mut self,
    center: Point<f32>,
    radius: f32,
    color: Color,
  ) -> Result<(), CanvasError> {
    ensure_finite(&[center.x, center.y, radius])?;
    let c = self.transform.apply(center);
    let r = radius * self.transform.length_scale();
    if r <= 0.0 {
      return Ok(());
    }
    self.check_size(r)?;
    Self::check_points(&[c])?;
    draw_filled_circle_mut(
      &mut self.pixels,
      (c.x.round() as i32, c.y.round() as i32),
      r.round().max(1.0) as i32,
      color,
    );
    Ok(())
  }

  fn stroke_circle(
    &mut self,
    center: Point<f32>,
    radius: f32,
    style: &StrokeStyle,
  ) -> Result<(), CanvasError> {
    ensure_finite(&[center.x, center.y, radius, style.line_width])?;
    let scale = self.transform.length_scale();
    let c = self.transform.apply(center);
    let r = radius.abs() * scale;
    let half = style.line_width * scale / 2.0;
    if half <= 0.0 {
      return Ok(());
    }
    self.check_size(half)?;
    let inner = (r - half).max(0.0);
    let outer = r + half;

    let xs = pixel_span(c.x - outer, c.x + outer + 1.0, self.pixels.width());
    let ys = pixel_span(c.y - outer, c.y + outer + 1.0, self.pixels.height());
    for py in ys {
      for px in xs.clone() {
        let (dx, dy) = (px as f32 + 0.5 - c.x, py as f32 + 0.5 - c.y);
        let distance = (dx * dx + dy * dy).sqrt();
        if distance >= inner && distance <= outer {
          self.pixels.put_pixel(px, py, style.color);
        }
      }
    }
    Ok(())
  }
}
