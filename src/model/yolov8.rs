// 该文件是 Lazarillo 项目的一部分。
// src/model/yolov8.rs - YOLOv8 输出解码
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

use tracing::{debug, error};

use crate::{
  error::DetectError,
  model::{Candidate, RawOutput},
};

const BOX_PARAMS: usize = 4;

/// 期望的输出布局 `(1, 4+C, N)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputLayout {
  pub num_classes: usize,
  /// `None` 表示接受任意锚点数
  pub num_anchors: Option<usize>,
}

impl OutputLayout {
  pub fn channels(&self) -> usize {
    BOX_PARAMS + self.num_classes
  }

  fn describe(&self) -> String {
    match self.num_anchors {
      Some(n) => format!("[1, {}, {}]", self.channels(), n),
      None => format!("[1, {}, N]", self.channels()),
    }
  }

  /// 校验原始输出的形状，返回锚点数
  pub fn check(&self, output: &RawOutput) -> Result<usize, DetectError> {
    let shape = output.shape();
    let actual = format!("{:?}", shape);

    if shape.len() != 3 || shape[0] != 1 || shape[1] != self.channels() {
      error!("模型输出形状不匹配: 期望 {}, 实际 {}", self.describe(), actual);
      return Err(DetectError::shape(self.describe(), actual));
    }

    let anchors = shape[2];
    if self.num_anchors.is_some_and(|n| n != anchors) {
      error!("模型锚点数不匹配: 期望 {}, 实际 {}", self.describe(), actual);
      return Err(DetectError::shape(self.describe(), actual));
    }

    let expected_len = self.channels() * anchors;
    if output.data().len() != expected_len {
      error!(
        "模型输出长度不匹配: 期望 {}, 实际 {}",
        expected_len,
        output.data().len()
      );
      return Err(DetectError::shape(
        format!("{} 个元素", expected_len),
        format!("{} 个元素", output.data().len()),
      ));
    }

    Ok(anchors)
  }
}

pub fn sigmoid(x: f32) -> f32 {
  1.0 / (1.0 + (-x).exp())
}

/// 逐锚点解码：取 sigmoid 后分数最高的类别，低于阈值的锚点丢弃
pub fn decode(
  output: &RawOutput,
  layout: &OutputLayout,
  score_threshold: f32,
) -> Result<Vec<Candidate>, DetectError> {
  if layout.num_classes == 0 {
    return Err(DetectError::InvalidConfig("类别数必须大于 0".to_string()));
  }
  let anchors = layout.check(output)?;
  let data = output.data();
  let channel = |c: usize| &data[c * anchors..(c + 1) * anchors];
  let (cxs, cys, ws, hs) = (channel(0), channel(1), channel(2), channel(3));

  let mut items = Vec::new();
  let mut degenerate = 0usize;

  for i in 0..anchors {
    let (score, class_index) = {
      let mut best_score = sigmoid(channel(BOX_PARAMS)[i]);
      let mut best_class = 0usize;
      for c in 1..layout.num_classes {
        let s = sigmoid(channel(BOX_PARAMS + c)[i]);
        if s > best_score {
          best_score = s;
          best_class = c;
        }
      }
      (best_score, best_class)
    };

    // NaN 分数同样被丢弃
    if !(score >= score_threshold) {
      continue;
    }

    let (cx, cy, w, h) = (cxs[i], cys[i], ws[i], hs[i]);
    let bbox = [cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0];
    if !bbox.iter().all(|v| v.is_finite()) || !(bbox[0] < bbox[2] && bbox[1] < bbox[3]) {
      degenerate += 1;
      continue;
    }

    items.push(Candidate {
      bbox,
      score,
      class_index,
    });
  }

  if degenerate > 0 {
    debug!("丢弃 {} 个退化的候选框", degenerate);
  }
  debug!("解码得到 {} 个候选框 (共 {} 个锚点)", items.len(), anchors);

  Ok(items)
}
