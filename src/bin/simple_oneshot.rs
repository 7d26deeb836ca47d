// 该文件是 HandMirror （镜中手） 项目的一部分。
// src/bin/simple_oneshot.rs - 单帧渲染
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
  model::ReplayDetector,
  output::OutputWrapper,
  task::{OneShotTask, Task},
};
use tracing::info;

/// HandMirror 单帧渲染参数
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 检测记录（landmarks:///path/to/hands.jsonl?max_num_hands=2）
  #[arg(long, value_name = "LANDMARKS")]
  pub landmarks: Url,
  /// 输入来源（image:///path/to/frame.png）
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 输出路径（image:///path/to/out.png?width=1280&height=720）
  #[arg(long, value_name = "OUTPUT")]
  pub output: Url,
  /// 渲染后导出本帧关键点的 JSON 文件
  #[arg(long, value_name = "FILE")]
  pub export: Option<PathBuf>,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("检测记录: {}", args.landmarks);
  info!("输入来源: {}", args.input);
  info!("输出路径: {}", args.output);

  let input = InputWrapper::from_url(&args.input)?;
  let model = ReplayDetector::from_url(&args.landmarks)?;
  let output = OutputWrapper::from_url(&args.output)?;

  OneShotTask::default()
    .with_export(args.export)
    .run_task(input, model, output)?;

  Ok(())
}
