// 该文件是 Lazarillo 项目的一部分。
// src/error.rs - 检测流水线错误定义
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

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// 一次 `detect()` 调用可能出现的失败。所有错误都会中止本次调用，不做内部重试。
#[derive(Error, Debug)]
pub enum DetectError {
  #[error("图像解码失败: {path}: {source}")]
  DecodeFailure {
    path: PathBuf,
    #[source]
    source: image::ImageError,
  },
  #[error("图像尺寸无效: {width}x{height}")]
  EmptyImage { width: u32, height: u32 },
  #[error("模型不可用: {0}")]
  ModelUnavailable(#[source] BoxError),
  #[error("推理失败: {0}")]
  InferenceFailure(#[source] BoxError),
  #[error("推理超时: 超过 {0:?}")]
  InferenceTimeout(Duration),
  #[error("模型输出形状不匹配: 期望 {expected}, 实际 {actual}")]
  ShapeMismatch { expected: String, actual: String },
  #[error("配置无效: {0}")]
  InvalidConfig(String),
}

impl DetectError {
  pub fn shape(expected: impl Into<String>, actual: impl Into<String>) -> Self {
    DetectError::ShapeMismatch {
      expected: expected.into(),
      actual: actual.into(),
    }
  }

  /// 错误类别的简短名称，供展示层选择提示语
  pub fn kind(&self) -> &'static str {
    match self {
      DetectError::DecodeFailure { .. } | DetectError::EmptyImage { .. } => "decode_failure",
      DetectError::ModelUnavailable(_) => "model_unavailable",
      DetectError::InferenceFailure(_) => "inference_failure",
      DetectError::InferenceTimeout(_) => "inference_timeout",
      DetectError::ShapeMismatch { .. } => "shape_mismatch",
      DetectError::InvalidConfig(_) => "invalid_config",
    }
  }
}
