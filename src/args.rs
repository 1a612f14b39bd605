// 该文件是 Lazarillo 项目的一部分。
// src/args.rs - 命令行参数配置
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
use std::time::Duration;

use clap::Args;
use url::Url;

use crate::{
  config::{
    DEFAULT_CANVAS_SIZE, DEFAULT_IOU_THRESHOLD, DEFAULT_NUM_ANCHORS, DEFAULT_NUM_CLASSES,
    DEFAULT_SCORE_THRESHOLD, PipelineConfig,
  },
  provision::{ProvisionError, ensure_local_model},
};

/// 各个可执行程序共用的流水线参数
#[derive(Args, Debug, Clone)]
pub struct PipelineArgs {
  /// 模型路径，例如 onnx:///data/models/yolov8n.onnx
  #[arg(long, value_name = "MODEL")]
  pub model: Url,

  /// 模型首次使用前复制到此目录，之后直接使用缓存副本
  #[arg(long, value_name = "DIR")]
  pub model_cache_dir: Option<PathBuf>,

  /// 置信度阈值 (0.0 - 1.0)
  #[arg(long, default_value_t = DEFAULT_SCORE_THRESHOLD, value_name = "THRESHOLD")]
  pub confidence: f32,

  /// NMS IOU 阈值 (0.0 - 1.0)
  #[arg(long, default_value_t = DEFAULT_IOU_THRESHOLD, value_name = "THRESHOLD")]
  pub nms_threshold: f32,

  /// 模型输入边长
  #[arg(long, default_value_t = DEFAULT_CANVAS_SIZE, value_name = "PIXELS")]
  pub canvas_size: u32,

  /// 模型类别数
  #[arg(long, default_value_t = DEFAULT_NUM_CLASSES, value_name = "COUNT")]
  pub classes: usize,

  /// 模型锚点数（0 表示不校验）
  #[arg(long, default_value_t = DEFAULT_NUM_ANCHORS, value_name = "COUNT")]
  pub anchors: usize,

  /// 单次推理超时秒数（0 表示不限）
  #[arg(long, default_value_t = 30, value_name = "SECONDS")]
  pub timeout: u64,

  /// 解码后先缩小到模型输入尺寸以内
  #[arg(long)]
  pub prescale: bool,
}

impl PipelineArgs {
  /// 设置了 `--model-cache-dir` 时，把模型复制到缓存目录并返回副本路径；否则原样返回
  pub fn provision_model(&self, bundled: &Path) -> Result<PathBuf, ProvisionError> {
    match &self.model_cache_dir {
      Some(cache_dir) => ensure_local_model(bundled, cache_dir),
      None => Ok(bundled.to_path_buf()),
    }
  }

  pub fn to_config(&self) -> PipelineConfig {
    PipelineConfig::default()
      .with_score_threshold(self.confidence)
      .with_iou_threshold(self.nms_threshold)
      .with_canvas_size(self.canvas_size)
      .with_num_classes(self.classes)
      .with_num_anchors((self.anchors > 0).then_some(self.anchors))
      .with_inference_timeout((self.timeout > 0).then(|| Duration::from_secs(self.timeout)))
      .with_prescale(self.prescale)
  }
}
