// 该文件是 Lazarillo 项目的一部分。
// src/input/read_image_file.rs - 图像文件输入
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

use image::{ImageReader, RgbaImage};
use thiserror::Error;
use tracing::{debug, error};
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, error::DetectError, url_file_path};

/// 读取并解码照片（JPEG/PNG）为 RGBA
pub fn decode_photo(path: &Path) -> Result<RgbaImage, DetectError> {
  let decode = || -> Result<RgbaImage, image::ImageError> {
    Ok(ImageReader::open(path)?.with_guessed_format()?.decode()?.to_rgba8())
  };

  let image = decode().map_err(|source| {
    error!("无法解码图片文件 {}: {}", path.display(), source);
    DetectError::DecodeFailure {
      path: path.to_path_buf(),
      source,
    }
  })?;

  let (width, height) = image.dimensions();
  if width == 0 || height == 0 {
    return Err(DetectError::EmptyImage { width, height });
  }

  debug!("解码图片 {}: {}x{}", path.display(), width, height);
  Ok(image)
}

#[derive(Error, Debug)]
pub enum ImageFileInputError {
  #[error("URI 方案不匹配: 期望 '{expected}', 实际 '{actual}'")]
  SchemeMismatch { expected: String, actual: String },
}

/// 以 `image:///path/to/photo.jpg` 指定的照片
///
/// 只记录路径，解码留给流水线，保证解码错误以 [`DetectError`] 的形式报告。
#[derive(Debug, Clone)]
pub struct ImageFileInput {
  path: PathBuf,
}

impl FromUrlWithScheme for ImageFileInput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for ImageFileInput {
  type Error = ImageFileInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(ImageFileInputError::SchemeMismatch {
        expected: Self::SCHEME.to_string(),
        actual: url.scheme().to_string(),
      });
    }

    Ok(ImageFileInput {
      path: url_file_path(url),
    })
  }
}

impl ImageFileInput {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  pub fn decode(&self) -> Result<RgbaImage, DetectError> {
    decode_photo(&self.path)
  }
}
