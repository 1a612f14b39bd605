// 该文件是 Lazarillo 项目的一部分。
// src/narration.rs - 播报文本
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

use crate::{model::Detection, zone::Zone};

pub const DEFAULT_TOP: usize = 5;

/// 一次检测的文字摘要：屏幕显示的逐行列表和供语音合成的一句话
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Narration {
  pub headline: String,
  pub lines: Vec<String>,
  pub spoken: String,
}

fn zone_phrase(zone: Zone) -> &'static str {
  match zone {
    Zone::Left => "on the left",
    Zone::Center => "ahead",
    Zone::Right => "on the right",
  }
}

/// 取分数最高的 `top` 个检测生成摘要。每个区域只播报该区域内排名最靠前的物体。
pub fn summarize(detections: &[Detection], top: usize) -> Narration {
  if detections.is_empty() {
    return Narration {
      headline: "No detections above threshold".to_string(),
      lines: Vec::new(),
      spoken: "No detections".to_string(),
    };
  }

  let top = &detections[..detections.len().min(top)];
  let lines = top
    .iter()
    .enumerate()
    .map(|(i, det)| {
      format!(
        "#{} {} ({}) score={:.2}",
        i + 1,
        det.label,
        det.zone,
        det.score
      )
    })
    .collect();

  let spoken = [Zone::Left, Zone::Center, Zone::Right]
    .into_iter()
    .filter_map(|zone| {
      top
        .iter()
        .find(|det| det.zone == zone)
        .map(|det| format!("{} {}.", det.label, zone_phrase(zone)))
    })
    .collect::<Vec<_>>()
    .join(" ");

  Narration {
    headline: format!("{} detection(s)", detections.len()),
    lines,
    spoken: if spoken.is_empty() {
      "Objects detected.".to_string()
    } else {
      spoken
    },
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn det(label: &str, zone: Zone, score: f32) -> Detection {
    Detection {
      bbox: [0.0, 0.0, 1.0, 1.0],
      score,
      class_index: 0,
      label: label.to_string(),
      zone,
    }
  }

  #[test]
  fn empty_result_has_its_own_message() {
    let narration = summarize(&[], DEFAULT_TOP);
    assert_eq!(narration.spoken, "No detections");
    assert!(narration.lines.is_empty());
  }

  #[test]
  fn speaks_first_detection_per_zone_in_left_center_right_order() {
    let dets = [
      det("dog", Zone::Right, 0.9),
      det("person", Zone::Left, 0.8),
      det("cat", Zone::Right, 0.7),
      det("chair", Zone::Center, 0.6),
    ];
    let narration = summarize(&dets, DEFAULT_TOP);
    assert_eq!(
      narration.spoken,
      "person on the left. chair ahead. dog on the right."
    );
    assert_eq!(narration.headline, "4 detection(s)");
    assert_eq!(narration.lines[0], "#1 dog (R) score=0.90");
  }

  #[test]
  fn only_top_detections_are_listed() {
    let dets: Vec<_> = (0..8)
      .map(|i| det("cup", Zone::Center, 0.9 - i as f32 * 0.05))
      .collect();
    let narration = summarize(&dets, 3);
    assert_eq!(narration.lines.len(), 3);
    assert_eq!(narration.headline, "8 detection(s)");
    assert_eq!(narration.spoken, "cup ahead.");
  }
}
