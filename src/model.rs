// 该文件是 Lazarillo 项目的一部分。
// src/model.rs - 模型
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

use crate::{frame::CanvasTensor, letterbox::Letterbox, zone::Zone};

/// 已加载的检测网络。一次前向推理：画布张量进，原始输出出。
pub trait NetworkSession: Send {
  type Error: std::error::Error + Send + Sync + 'static;

  fn run(&mut self, input: &CanvasTensor) -> Result<RawOutput, Self::Error>;
}

/// 负责创建 [`NetworkSession`]，例如从模型文件加载
pub trait SessionLoader: Send + Sync {
  type Session: NetworkSession + 'static;
  type Error: std::error::Error + Send + Sync + 'static;

  fn load(&self) -> Result<Self::Session, Self::Error>;
}

/// 网络的原始输出，形状通常为 `(1, 4+C, N)`
#[derive(Debug, Clone)]
pub struct RawOutput {
  shape: Vec<usize>,
  data: Box<[f32]>,
}

impl RawOutput {
  pub fn new(shape: Vec<usize>, data: impl Into<Box<[f32]>>) -> Self {
    Self {
      shape,
      data: data.into(),
    }
  }

  pub fn shape(&self) -> &[usize] {
    &self.shape
  }

  pub fn data(&self) -> &[f32] {
    &self.data
  }
}

/// 解码阶段产生的候选框，坐标为画布坐标系
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
  pub bbox: [f32; 4], // [x1, y1, x2, y2]
  pub score: f32,
  pub class_index: usize,
}

impl Candidate {
  pub fn center_x(&self) -> f32 {
    (self.bbox[0] + self.bbox[2]) / 2.0
  }

  pub fn area(&self) -> f32 {
    (self.bbox[2] - self.bbox[0]) * (self.bbox[3] - self.bbox[1])
  }
}

/// 流水线的最终输出：候选框 + 类别名称 + 水平区域
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
  pub bbox: [f32; 4], // [x1, y1, x2, y2]，画布坐标
  pub score: f32,
  pub class_index: usize,
  pub label: String,
  pub zone: Zone,
}

#[derive(Debug, Clone)]
pub struct DetectResult {
  /// 按分数降序排列
  pub detections: Box<[Detection]>,
  pub letterbox: Letterbox,
}

impl DetectResult {
  pub fn is_empty(&self) -> bool {
    self.detections.is_empty()
  }

  pub fn len(&self) -> usize {
    self.detections.len()
  }

  /// 检测框在源图像上的像素坐标
  pub fn source_boxes(&self) -> impl Iterator<Item = [f32; 4]> + '_ {
    self
      .detections
      .iter()
      .map(|det| self.letterbox.to_source(det.bbox))
  }
}

pub mod yolov8;
pub use self::yolov8::{OutputLayout, decode};

#[cfg(feature = "onnx")]
mod onnx;
#[cfg(feature = "onnx")]
pub use self::onnx::{OnnxError, OnnxSession, OnnxSessionBuilder};
