// 该文件是 HandMirror （镜中手） 项目的一部分。
// src/model/options.rs - 检测器参数
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

use thiserror::Error;
use url::Url;

#[derive(Error, Debug, PartialEq)]
pub enum OptionsError {
  #[error("max_num_hands 必须为正整数")]
  InvalidMaxNumHands,
  #[error("不支持的 model_complexity: {0}")]
  InvalidModelComplexity(u8),
  #[error("{name} 超出 [0, 1] 范围: {value}")]
  ConfidenceOutOfRange { name: &'static str, value: f32 },
  #[error("无法解析参数 {name}: {value}")]
  ParseError { name: &'static str, value: String },
}

/// 模型复杂度，越高越准确，延迟也越高
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelComplexity {
  Lite,
  #[default]
  Full,
}

impl TryFrom<u8> for ModelComplexity {
  type Error = OptionsError;

  fn try_from(value: u8) -> Result<Self, Self::Error> {
    match value {
      0 => Ok(ModelComplexity::Lite),
      1 => Ok(ModelComplexity::Full),
      other => Err(OptionsError::InvalidModelComplexity(other)),
    }
  }
}

impl From<ModelComplexity> for u8 {
  fn from(value: ModelComplexity) -> Self {
    match value {
      ModelComplexity::Lite => 0,
      ModelComplexity::Full => 1,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandsOptions {
  pub max_num_hands: usize,
  pub model_complexity: ModelComplexity,
  pub min_detection_confidence: f32,
  pub min_tracking_confidence: f32,
}

impl Default for HandsOptions {
  fn default() -> Self {
    Self {
      max_num_hands: 2,
      model_complexity: ModelComplexity::Full,
      min_detection_confidence: 0.5,
      min_tracking_confidence: 0.5,
    }
  }
}

impl HandsOptions {
  pub fn validate(self) -> Result<Self, OptionsError> {
    if self.max_num_hands == 0 {
      return Err(OptionsError::InvalidMaxNumHands);
    }
    check_confidence("min_detection_confidence", self.min_detection_confidence)?;
    check_confidence("min_tracking_confidence", self.min_tracking_confidence)?;
    Ok(self)
  }

  /// 从 URL 查询参数读取，缺省项使用默认值
  pub fn from_query(url: &Url) -> Result<Self, OptionsError> {
    let query_pairs: HashMap<_, _> = url.query_pairs().collect();
    let mut options = HandsOptions::default();

    if let Some(v) = query_pairs.get("max_num_hands") {
      options.max_num_hands = parse("max_num_hands", v)?;
    }
    if let Some(v) = query_pairs.get("model_complexity") {
      options.model_complexity = ModelComplexity::try_from(parse::<u8>("model_complexity", v)?)?;
    }
    if let Some(v) = query_pairs.get("min_detection_confidence") {
      options.min_detection_confidence = parse("min_detection_confidence", v)?;
    }
    if let Some(v) = query_pairs.get("min_tracking_confidence") {
      options.min_tracking_confidence = parse("min_tracking_confidence", v)?;
    }

    options.validate()
  }
}

fn check_confidence(name: &'static str, value: f32) -> Result<(), OptionsError> {
  if !(0.0..=1.0).contains(&value) {
    return Err(OptionsError::ConfidenceOutOfRange { name, value });
  }
  Ok(())
}

fn parse<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, OptionsError> {
  value.parse().map_err(|_| OptionsError::ParseError {
    name,
    value: value.to_string(),
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_are_valid() {
    let options = HandsOptions::default().validate().unwrap();
    assert_eq!(options.max_num_hands, 2);
    assert_eq!(u8::from(options.model_complexity), 1);
  }

  #[test]
  fn query_overrides_defaults() {
    let url = Url::parse(
      "landmarks:///tmp/hands.jsonl?max_num_hands=1&model_complexity=0&min_detection_confidence=0.7",
    )
    .unwrap();
    let options = HandsOptions::from_query(&url).unwrap();
    assert_eq!(options.max_num_hands, 1);
    assert_eq!(options.model_complexity, ModelComplexity::Lite);
    assert_eq!(options.min_detection_confidence, 0.7);
    assert_eq!(options.min_tracking_confidence, 0.5);
  }

  #[test]
  fn rejects_invalid_values() {
    let url = Url::parse("landmarks:///a.jsonl?max_num_hands=0").unwrap();
    assert_eq!(
      HandsOptions::from_query(&url),
      Err(OptionsError::InvalidMaxNumHands)
    );

    let url = Url::parse("landmarks:///a.jsonl?model_complexity=2").unwrap();
    assert_eq!(
      HandsOptions::from_query(&url),
      Err(OptionsError::InvalidModelComplexity(2))
    );

    let url = Url::parse("landmarks:///a.jsonl?min_tracking_confidence=1.5").unwrap();
    assert!(matches!(
      HandsOptions::from_query(&url),
      Err(OptionsError::ConfidenceOutOfRange { .. })
    ));

    let url = Url::parse("landmarks:///a.jsonl?max_num_hands=two").unwrap();
    assert!(matches!(
      HandsOptions::from_query(&url),
      Err(OptionsError::ParseError { .. })
    ));
  }
}
