// 该文件是 Lazarillo 项目的一部分。
// src/frame.rs - 画布张量定义
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

pub const RGB_CHANNELS: usize = 3;

/// 网络输入画布：`S×S`、三通道、按通道分平面（先 R 后 G 再 B），每个平面行优先，
/// 数值范围 `[0, 1]`。
#[derive(Debug, Clone)]
pub struct CanvasTensor {
  size: u32,
  data: Box<[f32]>,
}

impl CanvasTensor {
  /// 全零画布（即完全由填充构成）
  pub fn blank(size: u32) -> Self {
    let len = RGB_CHANNELS * (size as usize) * (size as usize);
    Self {
      size,
      data: vec![0.0f32; len].into_boxed_slice(),
    }
  }

  pub fn size(&self) -> u32 {
    self.size
  }

  pub fn channels(&self) -> usize {
    RGB_CHANNELS
  }

  /// 单个通道平面的元素个数
  pub fn plane_len(&self) -> usize {
    (self.size as usize) * (self.size as usize)
  }

  /// 张量形状 `[1, 3, S, S]`
  pub fn shape(&self) -> [usize; 4] {
    [1, RGB_CHANNELS, self.size as usize, self.size as usize]
  }

  pub fn plane(&self, channel: usize) -> &[f32] {
    let len = self.plane_len();
    &self.data[channel * len..(channel + 1) * len]
  }

  pub fn get(&self, channel: usize, x: u32, y: u32) -> f32 {
    self.data[self.index(channel, x, y)]
  }

  pub fn set(&mut self, channel: usize, x: u32, y: u32, value: f32) {
    let index = self.index(channel, x, y);
    self.data[index] = value;
  }

  pub fn as_planar(&self) -> &[f32] {
    &self.data
  }

  pub fn into_planar(self) -> Box<[f32]> {
    self.data
  }

  fn index(&self, channel: usize, x: u32, y: u32) -> usize {
    let size = self.size as usize;
    channel * size * size + (y as usize) * size + (x as usize)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn blank_canvas_is_channel_major() {
    let mut canvas = CanvasTensor::blank(4);
    assert_eq!(canvas.as_planar().len(), 3 * 16);
    assert_eq!(canvas.shape(), [1, 3, 4, 4]);

    canvas.set(1, 2, 3, 0.5);
    assert_eq!(canvas.as_planar()[16 + 3 * 4 + 2], 0.5);
    assert_eq!(canvas.plane(1)[3 * 4 + 2], 0.5);
    assert!(canvas.plane(0).iter().all(|&v| v == 0.0));
  }
}
