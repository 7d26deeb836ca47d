// 该文件是 HandMirror （镜中手） 项目的一部分。
// src/output/draw.rs - 手部关键点可视化
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

use std::collections::HashMap;

use image::Rgba;
use imageproc::point::Point;
use thiserror::Error;
use tracing::warn;
use url::Url;

use crate::{
  model::{DetectionResult, HAND_CONNECTIONS, HandJoint, LandmarkSet},
  output::canvas::{CanvasError, Color, DrawingSurface, StrokeStyle, diagonal},
};

// 绘制常量
const CONNECTOR_COLOR: [u8; 4] = [0x00, 0xFF, 0x00, 0xFF]; // 绿色
const CONNECTOR_WIDTH: f32 = 5.0;
const LANDMARK_COLOR: [u8; 4] = [0xFF, 0x00, 0x00, 0xFF]; // 红色
const LANDMARK_RADIUS: f32 = 5.0;
const BRIDGE_COLOR: [u8; 4] = [0x00, 0x82, 0xCF, 0xFF]; // 蓝色
const BRIDGE_WIDTH: f32 = 5.0;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
  #[error("检测结果缺少帧图像")]
  MissingImage,
  #[error("绘制表面错误: {0}")]
  CanvasError(#[from] CanvasError),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawStyle {
  pub connector: StrokeStyle,
  pub landmark_color: Color,
  pub landmark_radius: f32,
  pub bridge: StrokeStyle,
}

impl Default for DrawStyle {
  fn default() -> Self {
    Self {
      connector: StrokeStyle {
        color: Rgba(CONNECTOR_COLOR),
        line_width: CONNECTOR_WIDTH,
      },
      landmark_color: Rgba(LANDMARK_COLOR),
      landmark_radius: LANDMARK_RADIUS,
      bridge: StrokeStyle {
        color: Rgba(BRIDGE_COLOR),
        line_width: BRIDGE_WIDTH,
      },
    }
  }
}

/// 解析 `RRGGBB` 或 `#RRGGBB` 形式的颜色
pub fn parse_hex_color(text: &str) -> Option<Color> {
  let hex = text.strip_prefix('#').unwrap_or(text);
  if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
    return None;
  }
  let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
  Some(Rgba([channel(0)?, channel(2)?, channel(4)?, 0xFF]))
}

impl DrawStyle {
  /// 用 URL 查询参数覆盖默认样式，无法解析的值保持默认
  ///
  /// 线宽与半径不超过 `width x height` 画布的对角线。
  pub fn with_query(mut self, url: &Url, width: u32, height: u32) -> Self {
    let query_pairs: HashMap<_, _> = url.query_pairs().collect();

    let color = |key: &str| {
      query_pairs.get(key).and_then(|v| {
        let parsed = parse_hex_color(v);
        if parsed.is_none() {
          warn!("无法解析颜色参数 {}={}", key, v);
        }
        parsed
      })
    };
    let limit = diagonal(width, height);
    let number = |key: &str| {
      let value = query_pairs
        .get(key)
        .and_then(|v| v.parse::<f32>().ok())
        .filter(|v| v.is_finite() && *v >= 0.0)?;
      if value > limit {
        warn!("参数 {}={} 超过画布对角线，截断为 {:.1}", key, value, limit);
        return Some(limit);
      }
      Some(value)
    };

    if let Some(c) = color("connector_color") {
      self.connector.color = c;
    }
    if let Some(w) = number("connector_width") {
      self.connector.line_width = w;
    }
    if let Some(c) = color("landmark_color") {
      self.landmark_color = c;
    }
    if let Some(r) = number("landmark_radius") {
      self.landmark_radius = r;
    }
    if let Some(c) = color("bridge_color") {
      self.bridge.color = c;
    }
    if let Some(w) = number("bridge_width") {
      self.bridge.line_width = w;
    }
    self
  }
}

/// 两只手食指指尖之间的圆
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BridgeCircle {
  pub center: Point<f32>,
  pub radius: f32,
}

/// 恰好两只手且都包含食指指尖时，计算像素坐标下的圆；否则返回 `None`
pub fn bridge_circle(hands: &[LandmarkSet], width: f32, height: f32) -> Option<BridgeCircle> {
  let [first, second] = hands else {
    return None;
  };
  let tip = HandJoint::IndexFingerTip.index();
  let (x1, y1) = first.get(tip)?.to_pixel(width, height);
  let (x2, y2) = second.get(tip)?.to_pixel(width, height);

  let (dx, dy) = (x1 - x2, y1 - y2);
  Some(BridgeCircle {
    center: Point::new((x1 + x2) / 2.0, (y1 + y2) / 2.0),
    radius: (dx * dx + dy * dy).sqrt() / 2.0,
  })
}

/// 单帧渲染器，不保留任何帧间状态
#[derive(Debug, Clone, Default)]
pub struct FrameRenderer {
  style: DrawStyle,
}

impl FrameRenderer {
  pub fn new(style: DrawStyle) -> Self {
    Self { style }
  }

  pub fn style(&self) -> &DrawStyle {
    &self.style
  }

  /// 清屏、镜像贴帧、绘制骨架与指尖圆
  ///
  /// 镜像变换只在本次调用内有效，无论绘制是否出错都会恢复。
  pub fn render<S: DrawingSurface + ?Sized>(
    &self,
    surface: &mut S,
    result: &DetectionResult,
  ) -> Result<(), RenderError> {
    surface.save()?;
    let drawn = self.render_mirrored(surface, result);
    let restored = surface.restore();
    drawn?;
    restored?;
    Ok(())
  }

  fn render_mirrored<S: DrawingSurface + ?Sized>(
    &self,
    surface: &mut S,
    result: &DetectionResult,
  ) -> Result<(), RenderError> {
    let (width, height) = (surface.width() as f32, surface.height() as f32);

    surface.clear_rect(0.0, 0.0, width, height)?;
    let image = result.image.as_ref().ok_or(RenderError::MissingImage)?;

    surface.scale(-1.0, 1.0)?;
    surface.translate(-width, 0.0)?;
    surface.draw_image(image, 0.0, 0.0, width, height)?;

    let hands = result.hands();
    if hands.is_empty() {
      return Ok(());
    }
    for landmarks in hands {
      self.draw_connectors(surface, landmarks)?;
      self.draw_landmarks(surface, landmarks)?;
    }
    self.draw_bridge_circle(surface, hands)?;
    Ok(())
  }

  fn draw_connectors<S: DrawingSurface + ?Sized>(
    &self,
    surface: &mut S,
    landmarks: &LandmarkSet,
  ) -> Result<(), CanvasError> {
    let (width, height) = (surface.width() as f32, surface.height() as f32);
    for (start, end) in HAND_CONNECTIONS {
      let (Some(a), Some(b)) = (landmarks.get(start.index()), landmarks.get(end.index())) else {
        continue;
      };
      let (x1, y1) = a.to_pixel(width, height);
      let (x2, y2) = b.to_pixel(width, height);
      surface.stroke_line(Point::new(x1, y1), Point::new(x2, y2), &self.style.connector)?;
    }
    Ok(())
  }

  fn draw_landmarks<S: DrawingSurface + ?Sized>(
    &self,
    surface: &mut S,
    landmarks: &LandmarkSet,
  ) -> Result<(), CanvasError> {
    let (width, height) = (surface.width() as f32, surface.height() as f32);
    for landmark in landmarks {
      let (x, y) = landmark.to_pixel(width, height);
      surface.fill_circle(
        Point::new(x, y),
        self.style.landmark_radius,
        self.style.landmark_color,
      )?;
    }
    Ok(())
  }

  /// 在当前坐标系下描绘两只手食指指尖之间的圆，条件不满足时什么也不做
  pub fn draw_bridge_circle<S: DrawingSurface + ?Sized>(
    &self,
    surface: &mut S,
    hands: &[LandmarkSet],
  ) -> Result<(), CanvasError> {
    let (width, height) = (surface.width() as f32, surface.height() as f32);
    if let Some(circle) = bridge_circle(hands, width, height) {
      surface.stroke_circle(circle.center, circle.radius, &self.style.bridge)?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::{LANDMARK_COUNT, Landmark};
  use crate::output::canvas::{RasterCanvas, TRANSPARENT, Transform};
  use image::{Rgb, RgbImage};

  /// 记录调用序列的绘制表面
  #[derive(Default)]
  struct RecordingSurface {
    calls: Vec<Call>,
    transform: Transform,
    stack: Vec<Transform>,
    fail_on_stroke: bool,
  }

  #[derive(Debug, Clone, PartialEq)]
  enum Call {
    Save,
    Restore,
    Scale(f32, f32),
    Translate(f32, f32),
    Clear,
    Image(f32, f32),
    Line,
    Point,
    Circle(f32, f32, f32),
  }

  impl RecordingSurface {
    fn count(&self, call: fn(&Call) -> bool) -> usize {
      self.calls.iter().filter(|c| call(c)).count()
    }
  }

  impl DrawingSurface for RecordingSurface {
    fn width(&self) -> u32 {
      1280
    }
    fn height(&self) -> u32 {
      720
    }
    fn transform(&self) -> Transform {
      self.transform
    }
    fn save(&mut self) -> Result<(), CanvasError> {
      self.stack.push(self.transform);
      self.calls.push(Call::Save);
      Ok(())
    }
    fn restore(&mut self) -> Result<(), CanvasError> {
      self.transform = self.stack.pop().ok_or(CanvasError::UnbalancedRestore)?;
      self.calls.push(Call::Restore);
      Ok(())
    }
    fn scale(&mut self, x: f32, y: f32) -> Result<(), CanvasError> {
      self.transform = self.transform.scaled(x, y);
      self.calls.push(Call::Scale(x, y));
      Ok(())
    }
    fn translate(&mut self, x: f32, y: f32) -> Result<(), CanvasError> {
      self.transform = self.transform.translated(x, y);
      self.calls.push(Call::Translate(x, y));
      Ok(())
    }
    fn clear_rect(&mut self, _: f32, _: f32, _: f32, _: f32) -> Result<(), CanvasError> {
      self.calls.push(Call::Clear);
      Ok(())
    }
    fn draw_image(
      &mut self,
      _: &RgbImage,
      _: f32,
      _: f32,
      w: f32,
      h: f32,
    ) -> Result<(), CanvasError> {
      self.calls.push(Call::Image(w, h));
      Ok(())
    }
    fn stroke_line(
      &mut self,
      _: Point<f32>,
      _: Point<f32>,
      _: &StrokeStyle,
    ) -> Result<(), CanvasError> {
      if self.fail_on_stroke {
        return Err(CanvasError::Unavailable("context lost".to_string()));
      }
      self.calls.push(Call::Line);
      Ok(())
    }
    fn fill_circle(&mut self, _: Point<f32>, _: f32, _: Color) -> Result<(), CanvasError> {
      self.calls.push(Call::Point);
      Ok(())
    }
    fn stroke_circle(
      &mut self,
      center: Point<f32>,
      radius: f32,
      _: &StrokeStyle,
    ) -> Result<(), CanvasError> {
      self.calls.push(Call::Circle(center.x, center.y, radius));
      Ok(())
    }
  }

  fn hand_with_tip(x: f32, y: f32) -> LandmarkSet {
    let mut hand = vec![Landmark::new(0.5, 0.5); LANDMARK_COUNT];
    hand[HandJoint::IndexFingerTip.index()] = Landmark::new(x, y);
    hand
  }

  fn result_with(hands: Option<Vec<LandmarkSet>>) -> DetectionResult {
    DetectionResult {
      image: Some(RgbImage::new(16, 9)),
      multi_hand_landmarks: hands,
      multi_handedness: None,
    }
  }

  #[test]
  fn bridge_circle_spans_both_fingertips() {
    let hands = vec![hand_with_tip(0.3, 0.5), hand_with_tip(0.7, 0.5)];
    let circle = bridge_circle(&hands, 1280.0, 720.0).unwrap();
    assert!((circle.center.x - 640.0).abs() < 1e-3);
    assert!((circle.center.y - 360.0).abs() < 1e-3);
    assert!((circle.radius - 256.0).abs() < 1e-3);
  }

  #[test]
  fn bridge_circle_needs_exactly_two_hands() {
    let hand = hand_with_tip(0.3, 0.5);
    assert!(bridge_circle(&[], 1280.0, 720.0).is_none());
    assert!(bridge_circle(&[hand.clone()], 1280.0, 720.0).is_none());
    assert!(bridge_circle(&[hand.clone(), hand.clone(), hand], 1280.0, 720.0).is_none());
  }

  #[test]
  fn bridge_circle_needs_index_fingertip() {
    let short = vec![Landmark::new(0.1, 0.1); 8];
    assert!(bridge_circle(&[hand_with_tip(0.3, 0.5), short], 1280.0, 720.0).is_none());
  }

  #[test]
  fn no_hands_draws_only_the_frame() {
    for hands in [None, Some(vec![])] {
      let mut surface = RecordingSurface::default();
      FrameRenderer::default()
        .render(&mut surface, &result_with(hands))
        .unwrap();
      assert_eq!(
        surface.calls,
        vec![
          Call::Save,
          Call::Clear,
          Call::Scale(-1.0, 1.0),
          Call::Translate(-1280.0, 0.0),
          Call::Image(1280.0, 720.0),
          Call::Restore,
        ]
      );
    }
  }

  #[test]
  fn draws_skeleton_points_and_circle_for_two_hands() {
    let mut surface = RecordingSurface::default();
    let hands = vec![hand_with_tip(0.3, 0.5), hand_with_tip(0.7, 0.5)];
    FrameRenderer::default()
      .render(&mut surface, &result_with(Some(hands)))
      .unwrap();

    assert_eq!(
      surface.count(|c| *c == Call::Line),
      2 * HAND_CONNECTIONS.len()
    );
    assert_eq!(surface.count(|c| *c == Call::Point), 2 * LANDMARK_COUNT);
    let circles: Vec<_> = surface
      .calls
      .iter()
      .filter(|c| matches!(c, Call::Circle(..)))
      .collect();
    assert_eq!(circles.len(), 1);
    if let Call::Circle(x, y, r) = circles[0] {
      assert!((x - 640.0).abs() < 1e-3);
      assert!((y - 360.0).abs() < 1e-3);
      assert!((r - 256.0).abs() < 1e-3);
    }
    assert_eq!(surface.calls.last(), Some(&Call::Restore));
    assert!(surface.transform.is_identity());
  }

  #[test]
  fn circle_is_skipped_for_one_or_three_hands() {
    for count in [1, 3] {
      let mut surface = RecordingSurface::default();
      let hands = vec![hand_with_tip(0.3, 0.5); count];
      FrameRenderer::default()
        .render(&mut surface, &result_with(Some(hands)))
        .unwrap();
      assert_eq!(surface.count(|c| matches!(c, Call::Circle(..))), 0);
      assert_eq!(surface.count(|c| *c == Call::Point), count * LANDMARK_COUNT);
    }
  }

  #[test]
  fn short_landmark_sets_skip_missing_connections() {
    let mut surface = RecordingSurface::default();
    let hand = vec![Landmark::new(0.5, 0.5); 5];
    FrameRenderer::default()
      .render(&mut surface, &result_with(Some(vec![hand])))
      .unwrap();
    // 0-1、1-2、2-3、3-4 以及 0-5 中只有前四条可画
    assert_eq!(surface.count(|c| *c == Call::Line), 4);
    assert_eq!(surface.count(|c| *c == Call::Point), 5);
  }

  #[test]
  fn missing_image_fails_after_clear_and_restores() {
    let mut surface = RecordingSurface::default();
    let result = DetectionResult {
      image: None,
      multi_hand_landmarks: Some(vec![hand_with_tip(0.3, 0.5)]),
      multi_handedness: None,
    };
    assert_eq!(
      FrameRenderer::default().render(&mut surface, &result),
      Err(RenderError::MissingImage)
    );
    assert_eq!(
      surface.calls,
      vec![Call::Save, Call::Clear, Call::Restore]
    );
  }

  #[test]
  fn surface_failure_propagates_and_restores() {
    let mut surface = RecordingSurface {
      fail_on_stroke: true,
      ..Default::default()
    };
    let err = FrameRenderer::default()
      .render(&mut surface, &result_with(Some(vec![hand_with_tip(0.3, 0.5)])))
      .unwrap_err();
    assert!(matches!(
      err,
      RenderError::CanvasError(CanvasError::Unavailable(_))
    ));
    assert_eq!(surface.count(|c| *c == Call::Point), 0);
    assert_eq!(surface.calls.last(), Some(&Call::Restore));
    assert!(surface.transform.is_identity());
  }

  #[test]
  fn landmarks_appear_mirrored_in_pixels() {
    let mut canvas = RasterCanvas::new(200, 100).unwrap();
    let style = DrawStyle::default();
    let hand = vec![Landmark::new(0.25, 0.5)];
    let result = DetectionResult {
      image: Some(RgbImage::from_pixel(200, 100, Rgb([0, 0, 0]))),
      multi_hand_landmarks: Some(vec![hand]),
      multi_handedness: None,
    };
    FrameRenderer::new(style).render(&mut canvas, &result).unwrap();

    // 归一化 (0.25, 0.5) 出现在 ((1 - 0.25) * 200, 0.5 * 100)
    assert_eq!(canvas.pixel(150, 50), Some(style.landmark_color));
    assert_eq!(canvas.pixel(50, 50), Some(Rgba([0, 0, 0, 255])));
    assert!(canvas.transform().is_identity());
  }

  #[test]
  fn rendering_twice_is_pixel_identical() {
    let mut source = RgbImage::new(64, 36);
    for (x, y, p) in source.enumerate_pixels_mut() {
      *p = Rgb([(x * 4) as u8, (y * 7) as u8, 90]);
    }
    let result = DetectionResult {
      image: Some(source),
      multi_hand_landmarks: Some(vec![hand_with_tip(0.3, 0.4), hand_with_tip(0.6, 0.7)]),
      multi_handedness: None,
    };
    let renderer = FrameRenderer::default();

    let mut canvas = RasterCanvas::new(128, 72).unwrap();
    renderer.render(&mut canvas, &result).unwrap();
    let first = canvas.image().clone();
    renderer.render(&mut canvas, &result).unwrap();
    assert_eq!(&first, canvas.image());
  }

  #[test]
  fn missing_image_leaves_cleared_surface() {
    let mut canvas = RasterCanvas::new(8, 8).unwrap();
    renderer_fill(&mut canvas);
    let err = FrameRenderer::default()
      .render(&mut canvas, &DetectionResult::default())
      .unwrap_err();
    assert_eq!(err, RenderError::MissingImage);
    assert!(canvas.image().pixels().all(|p| *p == TRANSPARENT));
  }

  fn renderer_fill(canvas: &mut RasterCanvas) {
    canvas
      .draw_image(&RgbImage::from_pixel(1, 1, Rgb([5, 5, 5])), 0.0, 0.0, 8.0, 8.0)
      .unwrap();
  }

  #[test]
  fn style_reads_hex_colors_from_query() {
    let url = Url::parse("image:///out.png?connector_color=%2300FFAA&bridge_width=3&landmark_color=zz")
      .unwrap();
    let style = DrawStyle::default().with_query(&url, 1280, 720);
    assert_eq!(style.connector.color, Rgba([0x00, 0xFF, 0xAA, 0xFF]));
    assert_eq!(style.bridge.line_width, 3.0);
    assert_eq!(style.landmark_color, DrawStyle::default().landmark_color);
    assert_eq!(parse_hex_color("0082cf"), Some(Rgba([0x00, 0x82, 0xCF, 0xFF])));
    assert_eq!(parse_hex_color("#12345"), None);
    assert_eq!(parse_hex_color("+F+F+F"), None);
    assert_eq!(parse_hex_color("#-1-1-1"), None);
  }

  #[test]
  fn huge_style_sizes_are_capped_to_surface() {
    let url = Url::parse("image:///out.png?landmark_radius=3e9&connector_width=3e9&bridge_width=3e9")
      .unwrap();
    let style = DrawStyle::default().with_query(&url, 64, 36);
    let limit = diagonal(64, 36);
    assert_eq!(style.landmark_radius, limit);
    assert_eq!(style.connector.line_width, limit);
    assert_eq!(style.bridge.line_width, limit);

    let result = DetectionResult {
      image: Some(RgbImage::new(64, 36)),
      multi_hand_landmarks: Some(vec![hand_with_tip(0.3, 0.4), hand_with_tip(0.6, 0.7)]),
      multi_handedness: None,
    };
    let mut canvas = RasterCanvas::new(64, 36).unwrap();
    FrameRenderer::new(style).render(&mut canvas, &result).unwrap();
    assert!(canvas.transform().is_identity());
  }

  #[test]
  fn oversized_style_fails_without_panicking() {
    let style = DrawStyle {
      landmark_radius: 3e9,
      ..Default::default()
    };
    let result = DetectionResult {
      image: Some(RgbImage::new(64, 36)),
      multi_hand_landmarks: Some(vec![vec![Landmark::new(0.5, 0.5)]]),
      multi_handedness: None,
    };
    let mut canvas = RasterCanvas::new(64, 36).unwrap();
    let err = FrameRenderer::new(style)
      .render(&mut canvas, &result)
      .unwrap_err();
    assert!(matches!(
      err,
      RenderError::CanvasError(CanvasError::OversizedStroke { .. })
    ));
    assert!(canvas.transform().is_identity());
  }
}
