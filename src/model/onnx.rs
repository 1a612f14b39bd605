// 该文件是 Lazarillo 项目的一部分。
// src/model/onnx.rs - ONNX Runtime 推理后端
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

use std::path::{Path, PathBuf};

use ort::{
  session::{Session, builder::GraphOptimizationLevel},
  value::Tensor,
};
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::CanvasTensor,
  model::{NetworkSession, RawOutput, SessionLoader},
  url_file_path,
};

#[derive(Error, Debug)]
pub enum OnnxError {
  #[error("模型加载错误: {0}")]
  ModelLoadError(std::io::Error),
  #[error("模型文件为空: {0}")]
  EmptyModel(PathBuf),
  #[error("模型没有输出")]
  NoOutput,
  #[error("ONNX Runtime 错误: {0}")]
  OrtError(#[from] ort::Error),
  #[error("输出维度无效: {0:?}")]
  InvalidDims(Vec<i64>),
  #[error("模型路径错误: {0}")]
  ModelPathError(String),
}

impl From<std::io::Error> for OnnxError {
  fn from(err: std::io::Error) -> Self {
    OnnxError::ModelLoadError(err)
  }
}

/// 以 `onnx:///path/to/model.onnx` 指定模型，`?threads=N` 设置算子内线程数
pub struct OnnxSessionBuilder {
  model_path: PathBuf,
  intra_threads: Option<usize>,
}

impl FromUrlWithScheme for OnnxSessionBuilder {
  const SCHEME: &'static str = "onnx";
}

impl FromUrl for OnnxSessionBuilder {
  type Error = OnnxError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(OnnxError::ModelPathError(format!(
        "模型路径必须使用 {} 方案",
        Self::SCHEME
      )));
    }

    let mut builder = OnnxSessionBuilder::new(url_file_path(url));
    for (k, v) in url.query_pairs() {
      if k == "threads" {
        let threads = v
          .parse()
          .map_err(|_| OnnxError::ModelPathError(format!("threads={}", v)))?;
        builder = builder.intra_threads(threads);
      }
    }
    Ok(builder)
  }
}

impl OnnxSessionBuilder {
  pub fn new(model_path: impl Into<PathBuf>) -> Self {
    Self {
      model_path: model_path.into(),
      intra_threads: None,
    }
  }

  pub fn intra_threads(mut self, threads: usize) -> Self {
    self.intra_threads = Some(threads);
    self
  }

  /// 换用另一个模型文件，其余设置保持不变
  pub fn with_model_path(mut self, model_path: impl Into<PathBuf>) -> Self {
    self.model_path = model_path.into();
    self
  }

  pub fn model_path(&self) -> &Path {
    &self.model_path
  }
}

impl SessionLoader for OnnxSessionBuilder {
  type Session = OnnxSession;
  type Error = OnnxError;

  fn load(&self) -> Result<Self::Session, Self::Error> {
    info!("加载模型文件: {}", self.model_path.display());
    let size = std::fs::metadata(&self.model_path)?.len();
    if size == 0 {
      return Err(OnnxError::EmptyModel(self.model_path.clone()));
    }
    debug!("模型文件大小: {:.2} MB", size as f64 / (1024.0 * 1024.0));

    let mut builder = Session::builder()?.with_optimization_level(GraphOptimizationLevel::Level3)?;
    if let Some(threads) = self.intra_threads {
      builder = builder.with_intra_threads(threads)?;
    }
    let session = builder.commit_from_file(&self.model_path)?;

    let output_name = session
      .outputs
      .first()
      .map(|output| output.name.clone())
      .ok_or(OnnxError::NoOutput)?;
    debug!("模型输出: {}", output_name);

    Ok(OnnxSession {
      session,
      output_name,
    })
  }
}

pub struct OnnxSession {
  session: Session,
  output_name: String,
}

impl NetworkSession for OnnxSession {
  type Error = OnnxError;

  fn run(&mut self, input: &CanvasTensor) -> Result<RawOutput, Self::Error> {
    let tensor = Tensor::from_array((input.shape(), input.as_planar().to_vec()))?;
    let outputs = self.session.run(ort::inputs![tensor])?;
    let (shape, data) = outputs[self.output_name.as_str()].try_extract_tensor::<f32>()?;

    let dims: Vec<i64> = shape.iter().copied().collect();
    if dims.iter().any(|&d| d < 0) {
      return Err(OnnxError::InvalidDims(dims));
    }

    Ok(RawOutput::new(
      dims.iter().map(|&d| d as usize).collect(),
      data.to_vec(),
    ))
  }
}
