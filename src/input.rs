// 该文件是 Lazarillo 项目的一部分。
// src/input.rs - 照片输入
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

use image::{RgbaImage, imageops::FilterType};
use tracing::debug;

mod read_image_file;
pub use self::read_image_file::{ImageFileInput, ImageFileInputError, decode_photo};

/// 按 "contain" 方式缩小图像，使其长边不超过 `max_side`；已经足够小的图像原样返回
///
/// 只改变尺寸不改变宽高比，之后的 letterbox 计算依然成立。
pub fn contain_downscale(image: RgbaImage, max_side: u32) -> RgbaImage {
  let (width, height) = image.dimensions();
  if width <= max_side && height <= max_side {
    return image;
  }

  let scale = (max_side as f64 / width as f64).min(max_side as f64 / height as f64);
  let new_width = ((width as f64 * scale).round() as u32).clamp(1, max_side);
  let new_height = ((height as f64 * scale).round() as u32).clamp(1, max_side);
  debug!(
    "预缩放: {}x{} -> {}x{}",
    width, height, new_width, new_height
  );

  image::imageops::resize(&image, new_width, new_height, FilterType::Triangle)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn large_images_shrink_with_aspect_ratio() {
    let image = RgbaImage::new(1920, 1080);
    let small = contain_downscale(image, 640);
    assert_eq!(small.dimensions(), (640, 360));
  }

  #[test]
  fn small_images_are_untouched() {
    let image = RgbaImage::new(320, 200);
    let same = contain_downscale(image, 640);
    assert_eq!(same.dimensions(), (320, 200));
  }
}
