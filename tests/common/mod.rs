// 该文件是 Lazarillo 项目的一部分。
// tests/common/mod.rs - 集成测试公共工具
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

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use lazarillo::{
  NetworkSession, PipelineConfig, RawOutput, SessionLoader, frame::CanvasTensor,
};

pub const NUM_CLASSES: usize = 80;
pub const NUM_ANCHORS: usize = 16;
pub const LOW_LOGIT: f32 = -10.0;

#[derive(Debug, thiserror::Error)]
#[error("scripted failure: {0}")]
pub struct ScriptedError(pub &'static str);

/// 一个锚点：`(cx, cy, w, h, class, logit)`
pub type Anchor = (f32, f32, f32, f32, usize, f32);

/// 按锚点列表生成 `(1, 4+C, N)` 原始输出，未指定的锚点全部为低分
pub fn raw_output(anchors: &[Anchor]) -> RawOutput {
  assert!(anchors.len() <= NUM_ANCHORS);
  let n = NUM_ANCHORS;
  let channels = 4 + NUM_CLASSES;
  let mut data = vec![LOW_LOGIT; channels * n];
  for i in 0..n {
    // 低分锚点也给出合法的框
    data[i] = 10.0;
    data[n + i] = 10.0;
    data[2 * n + i] = 4.0;
    data[3 * n + i] = 4.0;
  }
  for (i, &(cx, cy, w, h, class, logit)) in anchors.iter().enumerate() {
    data[i] = cx;
    data[n + i] = cy;
    data[2 * n + i] = w;
    data[3 * n + i] = h;
    data[(4 + class) * n + i] = logit;
  }
  RawOutput::new(vec![1, channels, n], data)
}

pub struct ScriptedSession {
  output: RawOutput,
  delay: Duration,
  runs: Arc<AtomicUsize>,
}

impl NetworkSession for ScriptedSession {
  type Error = ScriptedError;

  fn run(&mut self, input: &CanvasTensor) -> Result<RawOutput, Self::Error> {
    assert_eq!(input.shape(), [1, 3, 640, 640]);
    std::thread::sleep(self.delay);
    self.runs.fetch_add(1, Ordering::SeqCst);
    Ok(self.output.clone())
  }
}

/// 总是返回同一份输出的加载器，统计加载次数和推理次数
#[derive(Clone)]
pub struct ScriptedLoader {
  pub output: RawOutput,
  pub load_delay: Duration,
  pub run_delay: Duration,
  pub loads: Arc<AtomicUsize>,
  pub runs: Arc<AtomicUsize>,
  pub missing: bool,
}

impl ScriptedLoader {
  pub fn new(output: RawOutput) -> Self {
    Self {
      output,
      load_delay: Duration::ZERO,
      run_delay: Duration::ZERO,
      loads: Arc::new(AtomicUsize::new(0)),
      runs: Arc::new(AtomicUsize::new(0)),
      missing: false,
    }
  }

  pub fn loads(&self) -> usize {
    self.loads.load(Ordering::SeqCst)
  }

  pub fn runs(&self) -> usize {
    self.runs.load(Ordering::SeqCst)
  }
}

impl SessionLoader for ScriptedLoader {
  type Session = ScriptedSession;
  type Error = ScriptedError;

  fn load(&self) -> Result<Self::Session, Self::Error> {
    std::thread::sleep(self.load_delay);
    if self.missing {
      return Err(ScriptedError("model file not found"));
    }
    self.loads.fetch_add(1, Ordering::SeqCst);
    Ok(ScriptedSession {
      output: self.output.clone(),
      delay: self.run_delay,
      runs: Arc::clone(&self.runs),
    })
  }
}

pub fn config() -> PipelineConfig {
  PipelineConfig::default().with_num_anchors(Some(NUM_ANCHORS))
}

/// 写一张纯色 JPEG 到 `dir`
pub fn write_jpeg(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
  let path = dir.join(name);
  image::RgbImage::from_pixel(width, height, image::Rgb([120, 80, 40]))
    .save(&path)
    .unwrap();
  path
}
