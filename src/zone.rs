// 该文件是 Lazarillo 项目的一部分。
// src/zone.rs - 水平区域划分
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

use std::fmt;

use crate::{
  labels,
  model::{Candidate, Detection},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Zone {
  Left,
  Center,
  Right,
}

impl Zone {
  /// 按框中心的横坐标分区：`cx < S/3` 为左，`cx > 2S/3` 为右，边界本身归中
  pub fn classify(center_x: f32, canvas_size: u32) -> Self {
    let s = canvas_size as f32;
    if center_x < s / 3.0 {
      Zone::Left
    } else if center_x > 2.0 * s / 3.0 {
      Zone::Right
    } else {
      Zone::Center
    }
  }

  pub fn code(&self) -> &'static str {
    match self {
      Zone::Left => "L",
      Zone::Center => "C",
      Zone::Right => "R",
    }
  }
}

impl fmt::Display for Zone {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.code())
  }
}

/// 为保留下来的候选框附加类别名称和区域
pub fn annotate(candidate: Candidate, canvas_size: u32) -> Detection {
  Detection {
    bbox: candidate.bbox,
    score: candidate.score,
    class_index: candidate.class_index,
    label: labels::class_name(candidate.class_index).into_owned(),
    zone: Zone::classify(candidate.center_x(), canvas_size),
  }
}
