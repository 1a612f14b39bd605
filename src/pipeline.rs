// 该文件是 Lazarillo 项目的一部分。
// src/pipeline.rs - 检测流水线
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

use std::path::Path;
use std::time::Instant;

use image::RgbaImage;
use tracing::{debug, info};

use crate::{
  config::{PipelineConfig, check_threshold},
  error::DetectError,
  input::{contain_downscale, decode_photo},
  letterbox::letterbox,
  model::{DetectResult, SessionLoader, decode},
  nms::nms,
  session::InferenceInvoker,
  zone::annotate,
};

/// 照片 -> 检测结果
///
/// 解码、letterbox、推理、解码输出、NMS、分区依次执行。除会话外不保存任何状态。
///
/// 每个实例各自加载并持有一份模型会话。进程内只应创建一个实例，放在 `Arc` 中
/// 供所有线程共享；多个实例意味着多份会话，彼此之间不会串行化推理。
pub struct Pipeline<L: SessionLoader> {
  config: PipelineConfig,
  invoker: InferenceInvoker<L>,
}

impl<L: SessionLoader> Pipeline<L> {
  pub fn new(loader: L, config: PipelineConfig) -> Result<Self, DetectError> {
    config.validate()?;

    let mut invoker = InferenceInvoker::new(loader).with_timeout(config.inference_timeout);
    if config.check_on_load {
      let layout = config.layout();
      invoker = invoker.with_load_check(
        config.canvas_size,
        Box::new(move |output| layout.check(output).map(|_| ())),
      );
    }

    Ok(Self { config, invoker })
  }

  pub fn config(&self) -> &PipelineConfig {
    &self.config
  }

  pub fn invoker(&self) -> &InferenceInvoker<L> {
    &self.invoker
  }

  /// 提前加载模型；重复调用无副作用
  pub fn preload(&self) -> Result<(), DetectError> {
    self.invoker.ensure_session().map(|_| ())
  }

  /// 对一张照片执行完整检测。阈值为 `None` 时使用配置中的默认值。
  pub fn detect(
    &self,
    photo: &Path,
    score_threshold: Option<f32>,
    iou_threshold: Option<f32>,
  ) -> Result<DetectResult, DetectError> {
    info!("处理照片: {}", photo.display());
    let mut image = decode_photo(photo)?;
    if self.config.prescale {
      image = contain_downscale(image, self.config.canvas_size);
    }
    self.detect_image(&image, score_threshold, iou_threshold)
  }

  /// 对已解码的图像执行检测
  pub fn detect_image(
    &self,
    image: &RgbaImage,
    score_threshold: Option<f32>,
    iou_threshold: Option<f32>,
  ) -> Result<DetectResult, DetectError> {
    let score_threshold = score_threshold.unwrap_or(self.config.score_threshold);
    let iou_threshold = iou_threshold.unwrap_or(self.config.iou_threshold);
    check_threshold("置信度阈值", score_threshold)?;
    check_threshold("NMS 阈值", iou_threshold)?;

    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
      return Err(DetectError::EmptyImage { width, height });
    }

    let now = Instant::now();
    let (canvas, geometry) = letterbox(image, self.config.canvas_size);
    let preprocess = now.elapsed();

    let now = Instant::now();
    let output = self.invoker.run(canvas)?;
    let inference = now.elapsed();

    let now = Instant::now();
    let candidates = decode(&output, &self.config.layout(), score_threshold)?;
    let candidate_count = candidates.len();
    let detections: Box<[_]> = nms(candidates, iou_threshold)
      .into_iter()
      .map(|candidate| annotate(candidate, self.config.canvas_size))
      .collect();
    let postprocess = now.elapsed();

    debug!(
      "预处理 {:.2?}, 推理 {:.2?}, 后处理 {:.2?}",
      preprocess, inference, postprocess
    );
    info!(
      "检测到 {} 个物体 (NMS 前 {} 个候选框)",
      detections.len(),
      candidate_count
    );

    Ok(DetectResult {
      detections,
      letterbox: geometry,
    })
  }
}
