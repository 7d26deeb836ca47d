// 该文件是 HandMirror （镜中手） 项目的一部分。
// src/bin/simple_continueshot.rs - 连续帧渲染
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

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use url::Url;

use hand_mirror::{
  FromUrl,
  input::InputWrapper,
  model::{ModelComplexity, ReplayDetector},
  output::OutputWrapper,
  task::{ContinuousTask, Task},
};
use tracing::info;

/// HandMirror 连续渲染参数
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 检测记录（landmarks:///path/to/hands.jsonl）
  #[arg(long, value_name = "LANDMARKS")]
  pub landmarks: Url,
  /// 输入来源（folder:///path/to/frames?fps=30 或 image:///path/to/frame.png）
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 输出路径（folder:///path/to/record?record 或 image:///path/to/out.png）
  #[arg(long, value_name = "OUTPUT")]
  pub output: Url,

  /// 最多处理的帧数
  #[arg(long, value_name = "FRAME_NUMBER")]
  pub frame_number: Option<usize>,
  /// 结束时导出最近一帧关键点的 JSON 文件
  #[arg(long, value_name = "FILE")]
  pub export: Option<PathBuf>,

  /// 最多跟踪的手数，覆盖记录 URL 中的设置
  #[arg(long, value_name = "COUNT")]
  pub max_num_hands: Option<usize>,
  /// 模型复杂度（0 或 1）
  #[arg(long, value_name = "LEVEL")]
  pub model_complexity: Option<u8>,
  /// 检测置信度阈值 (0.0 - 1.0)
  #[arg(long, value_name = "THRESHOLD")]
  pub min_detection_confidence: Option<f32>,
  /// 跟踪置信度阈值 (0.0 - 1.0)
  #[arg(long, value_name = "THRESHOLD")]
  pub min_tracking_confidence: Option<f32>,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("检测记录: {}", args.landmarks);
  info!("输入来源: {}", args.input);
  info!("输出路径: {}", args.output);

  let input = InputWrapper::from_url(&args.input)?;
  let model = ReplayDetector::from_url(&args.landmarks)?;

  let mut options = *model.options();
  if let Some(n) = args.max_num_hands {
    options.max_num_hands = n;
  }
  if let Some(level) = args.model_complexity {
    options.model_complexity = ModelComplexity::try_from(level)?;
  }
  if let Some(v) = args.min_detection_confidence {
    options.min_detection_confidence = v;
  }
  if let Some(v) = args.min_tracking_confidence {
    options.min_tracking_confidence = v;
  }
  let model = model.with_options(options)?;
  info!("检测参数: {:?}", model.options());

  let output = OutputWrapper::from_url(&args.output)?;

  ContinuousTask::default()
    .with_frame_number(args.frame_number)
    .with_export(args.export)
    .run_task(input, model, output)?;

  Ok(())
}
