// 该文件是 Lazarillo 项目的一部分。
// src/config.rs - 流水线参数配置
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

use std::time::Duration;

use crate::{error::DetectError, model::OutputLayout};

pub const DEFAULT_CANVAS_SIZE: u32 = 640;
pub const DEFAULT_NUM_CLASSES: usize = 80;
pub const DEFAULT_NUM_ANCHORS: usize = 8400;
pub const DEFAULT_SCORE_THRESHOLD: f32 = 0.55;
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.50;
pub const DEFAULT_INFERENCE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
  /// 画布边长 S
  pub canvas_size: u32,
  /// 类别数 C
  pub num_classes: usize,
  /// 锚点数 N，`None` 时不校验
  pub num_anchors: Option<usize>,
  pub score_threshold: f32,
  pub iou_threshold: f32,
  /// 单次前向推理的等待上限，`None` 表示不限
  pub inference_timeout: Option<Duration>,
  /// 解码后先按 "contain" 方式缩小到画布尺寸以内
  pub prescale: bool,
  /// 首次加载模型后用空白画布试跑一次并校验输出形状
  pub check_on_load: bool,
}

impl Default for PipelineConfig {
  fn default() -> Self {
    Self {
      canvas_size: DEFAULT_CANVAS_SIZE,
      num_classes: DEFAULT_NUM_CLASSES,
      num_anchors: Some(DEFAULT_NUM_ANCHORS),
      score_threshold: DEFAULT_SCORE_THRESHOLD,
      iou_threshold: DEFAULT_IOU_THRESHOLD,
      inference_timeout: Some(DEFAULT_INFERENCE_TIMEOUT),
      prescale: false,
      check_on_load: true,
    }
  }
}

impl PipelineConfig {
  pub fn with_canvas_size(mut self, canvas_size: u32) -> Self {
    self.canvas_size = canvas_size;
    self
  }

  pub fn with_num_classes(mut self, num_classes: usize) -> Self {
    self.num_classes = num_classes;
    self
  }

  pub fn with_num_anchors(mut self, num_anchors: Option<usize>) -> Self {
    self.num_anchors = num_anchors;
    self
  }

  pub fn with_score_threshold(mut self, threshold: f32) -> Self {
    self.score_threshold = threshold;
    self
  }

  pub fn with_iou_threshold(mut self, threshold: f32) -> Self {
    self.iou_threshold = threshold;
    self
  }

  pub fn with_inference_timeout(mut self, timeout: Option<Duration>) -> Self {
    self.inference_timeout = timeout;
    self
  }

  pub fn with_prescale(mut self, prescale: bool) -> Self {
    self.prescale = prescale;
    self
  }

  pub fn with_check_on_load(mut self, check: bool) -> Self {
    self.check_on_load = check;
    self
  }

  pub fn layout(&self) -> OutputLayout {
    OutputLayout {
      num_classes: self.num_classes,
      num_anchors: self.num_anchors,
    }
  }

  pub fn validate(&self) -> Result<(), DetectError> {
    if self.canvas_size == 0 {
      return Err(DetectError::InvalidConfig("画布尺寸必须大于 0".to_string()));
    }
    if self.num_classes == 0 {
      return Err(DetectError::InvalidConfig("类别数必须大于 0".to_string()));
    }
    if self.num_anchors == Some(0) {
      return Err(DetectError::InvalidConfig("锚点数必须大于 0".to_string()));
    }
    check_threshold("置信度阈值", self.score_threshold)?;
    check_threshold("NMS 阈值", self.iou_threshold)?;
    if self.inference_timeout == Some(Duration::ZERO) {
      return Err(DetectError::InvalidConfig("推理超时必须大于 0".to_string()));
    }
    Ok(())
  }
}

pub(crate) fn check_threshold(name: &str, value: f32) -> Result<(), DetectError> {
  if (0.0..=1.0).contains(&value) {
    Ok(())
  } else {
    Err(DetectError::InvalidConfig(format!(
      "{} 必须在 [0, 1] 范围内, 实际为 {}",
      name, value
    )))
  }
}
