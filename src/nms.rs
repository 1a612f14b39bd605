// 该文件是 Lazarillo 项目的一部分。
// src/nms.rs - 非极大值抑制
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

use tracing::debug;

use crate::model::Candidate;

/// 计算两个边界框 `[x1, y1, x2, y2]` 的 IoU，并集面积为 0 时返回 0
pub fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
  let x1 = a[0].max(b[0]);
  let y1 = a[1].max(b[1]);
  let x2 = a[2].min(b[2]);
  let y2 = a[3].min(b[3]);

  let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
  let area_a = (a[2] - a[0]) * (a[3] - a[1]);
  let area_b = (b[2] - b[0]) * (b[3] - b[1]);
  let union = area_a + area_b - intersection;

  if union > 0.0 {
    intersection / union
  } else {
    0.0
  }
}

/// 贪心 NMS，不区分类别
///
/// 按分数稳定降序排序（同分保持解码顺序），候选框与所有已保留框的 IoU
/// 都严格小于阈值时才保留。输出按分数降序。
pub fn nms(mut candidates: Vec<Candidate>, iou_threshold: f32) -> Vec<Candidate> {
  let total = candidates.len();
  candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

  let mut keep: Vec<Candidate> = Vec::with_capacity(candidates.len());
  for candidate in candidates {
    if keep
      .iter()
      .all(|kept| iou(&kept.bbox, &candidate.bbox) < iou_threshold)
    {
      keep.push(candidate);
    }
  }

  debug!("NMS: {} -> {} 个候选框", total, keep.len());
  keep
}
