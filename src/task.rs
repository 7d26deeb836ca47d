// 该文件是 HandMirror （镜中手） 项目的一部分。
// src/task.rs - 处理任务
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

use std::{path::PathBuf, thread, time::Duration};
use tracing::{info, warn};

use crate::{
  frame::VideoFrame,
  model::{DetectionResult, Model},
  output::{LatestResult, Render},
};

pub trait Task<I, M, O>: Sized {
  type Error;
  fn run_task(self, input: I, model: M, output: O) -> Result<(), Self::Error>;
}

#[derive(Default, Debug)]
pub struct OneShotTask {
  export: Option<PathBuf>,
}

impl OneShotTask {
  /// 渲染后把本帧检测到的关键点导出到文件
  pub fn with_export(mut self, export: Option<PathBuf>) -> Self {
    self.export = export;
    self
  }
}

impl<
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = VideoFrame>,
  M: Model<Input = VideoFrame, Output = DetectionResult, Error = ME>,
  O: Render<VideoFrame, DetectionResult, Error = RE>,
> Task<I, M, O> for OneShotTask
{
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, model: M, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    let frame = input.next().ok_or_else(|| anyhow::anyhow!("没有输入帧"))?;
    info!("输入帧获取成功，开始检测...");
    let now = std::time::Instant::now();
    let result = model.infer(&frame)?;
    let elapsed = now.elapsed();
    info!("检测完成，共 {} 只手，耗时: {:.2?}", result.hands().len(), elapsed);
    let mut latest = LatestResult::default();
    latest.store(frame.index, &result);
    output.render_result(&frame, &result)?;
    info!("渲染完成，耗时: {:.2?}", now.elapsed());

    if let Some(path) = &self.export {
      latest.export_to(path)?;
    }
    Ok(())
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskSummary {
  pub frames: usize,
  pub frames_with_hands: usize,
  pub render_failures: usize,
}

#[derive(Default, Debug)]
pub struct ContinuousTask {
  frame_number: Option<usize>,
  export: Option<PathBuf>,
}

impl ContinuousTask {
  pub fn with_frame_number(mut self, frame_number: Option<usize>) -> Self {
    self.frame_number = frame_number;
    self
  }

  /// 结束时把最近一次检测到的关键点导出到文件
  pub fn with_export(mut self, export: Option<PathBuf>) -> Self {
    self.export = export;
    self
  }

  /// 逐帧检测并渲染，直到输入耗尽、达到帧数或 `stop` 返回真
  ///
  /// 渲染失败只记录日志并继续处理下一帧，检测失败终止任务。
  pub fn process<ME, RE, I, M, O>(
    &self,
    input: I,
    model: &M,
    output: &O,
    latest: &mut LatestResult,
    stop: impl Fn() -> bool,
  ) -> anyhow::Result<TaskSummary>
  where
    ME: std::error::Error + Sync + Send + 'static,
    RE: std::error::Error + Sync + Send + 'static,
    I: Iterator<Item = VideoFrame>,
    M: Model<Input = VideoFrame, Output = DetectionResult, Error = ME>,
    O: Render<VideoFrame, DetectionResult, Error = RE>,
  {
    let mut summary = TaskSummary::default();
    let mut now = std::time::Instant::now();
    for frame in input {
      info!("处理第 {} 帧图像", frame.index);
      let result = model.infer(&frame)?;
      latest.store(frame.index, &result);
      let elapsed_a = now.elapsed();

      summary.frames += 1;
      if !result.is_empty() {
        summary.frames_with_hands += 1;
      }
      if let Err(e) = output.render_result(&frame, &result) {
        warn!("第 {} 帧渲染失败: {}", frame.index, e);
        summary.render_failures += 1;
      }
      let elapsed_b = now.elapsed();
      now = std::time::Instant::now();
      info!("检测完成，耗时: {:.2?} / {:.2?}", elapsed_a, elapsed_b);

      if self.frame_number.map(|n| summary.frames >= n).unwrap_or(false) {
        info!("达到指定帧数 {}, 退出任务循环", summary.frames);
        break;
      }
      if stop() {
        warn!("中断信号接收，退出任务循环");
        break;
      }
    }
    Ok(summary)
  }
}

impl<
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = VideoFrame>,
  M: Model<Input = VideoFrame, Output = DetectionResult, Error = ME>,
  O: Render<VideoFrame, DetectionResult, Error = RE>,
> Task<I, M, O> for ContinuousTask
{
  type Error = anyhow::Error;

  fn run_task(self, input: I, model: M, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    let (tx, rx) = std::sync::mpsc::channel();

    let handler = ctrlc::set_handler(move || {
      info!("收到中断信号，准备退出...");
      let _ = tx.send(());
      thread::spawn(|| {
        thread::sleep(Duration::from_secs(30));
        warn!("强制退出程序");
        std::process::exit(1);
      });
    });
    if let Err(e) = handler {
      warn!("无法设置 Ctrl-C 处理函数: {}", e);
    }

    let mut latest = LatestResult::default();
    let summary = self.process(input, &model, &output, &mut latest, || rx.try_recv().is_ok())?;
    info!(
      "任务完成: 共 {} 帧，{} 帧检测到手，{} 帧渲染失败",
      summary.frames, summary.frames_with_hands, summary.render_failures
    );

    if let Some(path) = &self.export {
      latest.export_to(path)?;
    }
    Ok(())
  }
}
