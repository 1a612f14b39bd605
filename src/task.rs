// 该文件是 Lazarillo 项目的一部分。
// src/task.rs - 检测任务
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Lazarillo Contributors

use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::{
  input::ImageFileInput,
  model::{DetectResult, SessionLoader},
  output::Render,
  pipeline::Pipeline,
};

pub trait Task<L: SessionLoader, O>: Sized {
  type Error;
  fn run_task(self, input: ImageFileInput, pipeline: &Pipeline<L>, output: O) -> Result<(), Self::Error>;
}

/// 一张照片，一次检测
pub struct OneShotTask;

impl<L, RE, O> Task<L, O> for OneShotTask
where
  L: SessionLoader,
  RE: std::error::Error + Sync + Send + 'static,
  O: Render<ImageFileInput, DetectResult, Error = RE>,
{
  type Error = anyhow::Error;

  fn run_task(self, input: ImageFileInput, pipeline: &Pipeline<L>, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    let now = Instant::now();
    let result = pipeline.detect(input.path(), None, None)?;
    info!("检测完成，耗时: {:.2?}", now.elapsed());
    output.render_result(&input, &result)?;
    Ok(())
  }
}

/// 对同一张照片重复检测，统计平均耗时
pub struct RepeatShotTask {
  repeat_times: usize,
  warmup: usize,
}

impl Default for RepeatShotTask {
  fn default() -> Self {
    Self {
      repeat_times: 100,
      warmup: 2,
    }
  }
}

impl RepeatShotTask {
  pub fn with_repeat_times(mut self, repeat_times: usize) -> Self {
    self.repeat_times = repeat_times;
    self
  }

  pub fn with_warmup(mut self, warmup: usize) -> Self {
    self.warmup = warmup;
    self
  }
}

/// 跳过前 `warmup` 次后的平均耗时；样本不足时返回 `None`
pub fn mean_after_warmup(times: &[Duration], warmup: usize) -> Option<Duration> {
  let measured = times.get(warmup..).filter(|rest| !rest.is_empty())?;
  Some(measured.iter().sum::<Duration>() / measured.len() as u32)
}

impl<L, RE, O> Task<L, O> for RepeatShotTask
where
  L: SessionLoader,
  RE: std::error::Error + Sync + Send + 'static,
  O: Render<ImageFileInput, DetectResult, Error = RE>,
{
  type Error = anyhow::Error;

  fn run_task(self, input: ImageFileInput, pipeline: &Pipeline<L>, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    let image = input.decode()?;
    pipeline.preload()?;

    let mut times = Vec::with_capacity(self.repeat_times);
    let mut last = None;
    for i in 0..self.repeat_times {
      let now = Instant::now();
      let result = pipeline.detect_image(&image, None, None)?;
      let elapsed = now.elapsed();
      info!("({})检测完成，耗时: {:.2?}", i, elapsed);
      times.push(elapsed);
      last = Some(result);
    }

    if let Some(result) = last {
      output.render_result(&input, &result)?;
    }

    match mean_after_warmup(&times, self.warmup) {
      Some(mean) => warn!("平均检测时间: {:.2?} ({} 次)", mean, times.len() - self.warmup),
      None => warn!("样本不足，无法统计平均检测时间"),
    }

    Ok(())
  }
}
