// 该文件是 Lazarillo 项目的一部分。
// src/letterbox.rs - 保持宽高比的缩放与填充
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

use image::RgbaImage;
use tracing::debug;

use crate::frame::CanvasTensor;

/// 源图像到 `S×S` 画布的缩放几何
///
/// 缩放系数 `r = min(S/W, S/H)`，缩放后尺寸四舍五入，居中偏移向下取整。
/// 推理前的重采样和推理后的坐标反算都使用同一份几何，保证取整规则一致。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
  pub canvas_size: u32,
  pub source_width: u32,
  pub source_height: u32,
  pub scale: f64,
  pub scaled_width: u32,
  pub scaled_height: u32,
  pub pad_x: u32,
  pub pad_y: u32,
}

impl Letterbox {
  /// 计算几何。调用方需保证宽高均大于零。
  pub fn new(source_width: u32, source_height: u32, canvas_size: u32) -> Self {
    debug_assert!(source_width > 0 && source_height > 0);
    let s = canvas_size as f64;
    let scale = (s / source_width as f64).min(s / source_height as f64);
    let scaled_width = ((source_width as f64 * scale).round() as u32).min(canvas_size);
    let scaled_height = ((source_height as f64 * scale).round() as u32).min(canvas_size);
    let pad_x = (canvas_size - scaled_width) / 2;
    let pad_y = (canvas_size - scaled_height) / 2;

    Self {
      canvas_size,
      source_width,
      source_height,
      scale,
      scaled_width,
      scaled_height,
      pad_x,
      pad_y,
    }
  }

  /// 缩放区域内的画布像素对应的源像素（最近邻，越界截断）
  pub fn source_pixel(&self, x: u32, y: u32) -> (u32, u32) {
    let sx = ((x as f64 / self.scale).round() as u32).min(self.source_width - 1);
    let sy = ((y as f64 / self.scale).round() as u32).min(self.source_height - 1);
    (sx, sy)
  }

  /// 将画布坐标系下的框 `[x1, y1, x2, y2]` 映射回源图像像素坐标，并截断到图像范围内
  pub fn to_source(&self, bbox: [f32; 4]) -> [f32; 4] {
    let r = self.scale;
    let (px, py) = (self.pad_x as f64, self.pad_y as f64);
    let (w, h) = (self.source_width as f64, self.source_height as f64);
    let map = |v: f32, pad: f64, limit: f64| (((v as f64) - pad) / r).clamp(0.0, limit) as f32;
    [
      map(bbox[0], px, w),
      map(bbox[1], py, h),
      map(bbox[2], px, w),
      map(bbox[3], py, h),
    ]
  }

  /// 最近邻重采样到新的画布张量，填充区域保持为零
  pub fn resample(&self, image: &RgbaImage) -> CanvasTensor {
    debug_assert_eq!(image.dimensions(), (self.source_width, self.source_height));
    let mut canvas = CanvasTensor::blank(self.canvas_size);
    let raw = image.as_raw();
    let src_width = self.source_width as usize;

    for y in 0..self.scaled_height {
      for x in 0..self.scaled_width {
        let (sx, sy) = self.source_pixel(x, y);
        let si = ((sy as usize) * src_width + sx as usize) * 4;
        let (ox, oy) = (x + self.pad_x, y + self.pad_y);
        for c in 0..canvas.channels() {
          canvas.set(c, ox, oy, raw[si + c] as f32 / 255.0);
        }
      }
    }

    canvas
  }
}

/// 对图像做 letterbox 重采样，同时返回所用的几何
pub fn letterbox(image: &RgbaImage, canvas_size: u32) -> (CanvasTensor, Letterbox) {
  let geometry = Letterbox::new(image.width(), image.height(), canvas_size);
  debug!(
    "letterbox: {}x{} -> {}x{}, 缩放 {:.4}, 偏移 ({}, {})",
    geometry.source_width,
    geometry.source_height,
    geometry.scaled_width,
    geometry.scaled_height,
    geometry.scale,
    geometry.pad_x,
    geometry.pad_y
  );
  (geometry.resample(image), geometry)
}

/// 画布坐标到任意尺寸显示区域的映射，居中方式与 [`Letterbox`] 一致
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayTransform {
  pub scale: f32,
  pub offset_x: f32,
  pub offset_y: f32,
}

impl DisplayTransform {
  pub fn fit(display_width: f32, display_height: f32, canvas_size: u32) -> Self {
    let s = canvas_size as f32;
    let scale = (display_width / s).min(display_height / s);
    Self {
      scale,
      offset_x: ((display_width - s * scale) / 2.0).floor(),
      offset_y: ((display_height - s * scale) / 2.0).floor(),
    }
  }

  /// 返回显示坐标下的 `[left, top, width, height]`
  pub fn apply(&self, bbox: [f32; 4]) -> [f32; 4] {
    [
      bbox[0] * self.scale + self.offset_x,
      bbox[1] * self.scale + self.offset_y,
      (bbox[2] - bbox[0]) * self.scale,
      (bbox[3] - bbox[1]) * self.scale,
    ]
  }
}
