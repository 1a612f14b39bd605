// 该文件是 Lazarillo 项目的一部分。
// src/output/json_record.rs - 以 JSON 记录检测结果
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
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Datelike, Local};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, info};

use crate::{
  FromUrl, FromUrlWithScheme, url_file_path,
  input::ImageFileInput,
  model::DetectResult,
  narration::{DEFAULT_TOP, summarize},
  output::Render,
};

#[derive(Error, Debug)]
pub enum JsonRecordOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("JSON 错误: {0}")]
  JsonError(#[from] serde_json::Error),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
}

/// 检测结果的 JSON 表示
pub fn record_json(photo: &ImageFileInput, result: &DetectResult, at: DateTime<Local>) -> Value {
  let detections: Vec<Value> = result
    .detections
    .iter()
    .map(|det| {
      json!({
        "label": det.label,
        "class_index": det.class_index,
        "score": det.score,
        "zone": det.zone.code(),
        "bbox": det.bbox,
        "source_bbox": result.letterbox.to_source(det.bbox),
      })
    })
    .collect();

  json!({
    "photo": photo.path().display().to_string(),
    "captured_at": at.to_rfc3339(),
    "canvas_size": result.letterbox.canvas_size,
    "source": {
      "width": result.letterbox.source_width,
      "height": result.letterbox.source_height,
    },
    "detections": detections,
    "narration": summarize(&result.detections, DEFAULT_TOP).spoken,
  })
}

/// 按日期分目录保存每次检测的 JSON：`<dir>/YYYY/MM/DD/HH-MM-SS-XXXX.json`
///
/// `folder:///path?always` 同时记录没有检测结果的照片。
pub struct JsonRecordOutput {
  directory: PathBuf,
  record_counter: Mutex<u16>,
  always: bool,
}

impl FromUrlWithScheme for JsonRecordOutput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for JsonRecordOutput {
  type Error = JsonRecordOutputError;

  fn from_url(uri: &url::Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(JsonRecordOutputError::SchemeMismatch);
    }

    let always = uri.query_pairs().any(|(k, _)| k == "always");

    Ok(JsonRecordOutput {
      directory: url_file_path(uri),
      record_counter: Mutex::new(0),
      always,
    })
  }
}

impl JsonRecordOutput {
  fn record_id(&self) -> u16 {
    let mut counter = self
      .record_counter
      .lock()
      .unwrap_or_else(PoisonError::into_inner);
    *counter = counter.wrapping_add(1);
    *counter
  }

  fn record_path(&self, now: &DateTime<Local>) -> Result<PathBuf, JsonRecordOutputError> {
    let directory = self
      .directory
      .join(now.year().to_string())
      .join(format!("{:02}", now.month()))
      .join(format!("{:02}", now.day()));
    std::fs::create_dir_all(&directory)?;

    Ok(directory.join(format!(
      "{}-{:04X}.json",
      now.format("%H-%M-%S"),
      self.record_id()
    )))
  }
}

impl Render<ImageFileInput, DetectResult> for JsonRecordOutput {
  type Error = JsonRecordOutputError;

  fn render_result(&self, frame: &ImageFileInput, result: &DetectResult) -> Result<(), Self::Error> {
    if !self.always && result.is_empty() {
      debug!("没有检测结果，跳过记录");
      return Ok(());
    }

    let now = Local::now();
    let path = self.record_path(&now)?;
    let record = record_json(frame, result, now);
    std::fs::write(&path, serde_json::to_vec_pretty(&record)?)?;
    info!("保存检测记录: {}", path.display());
    Ok(())
  }
}
