// 该文件是 Lazarillo 项目的一部分。
// src/provision.rs - 模型文件本地缓存
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

use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum ProvisionError {
  #[error("模型文件名无效: {0}")]
  InvalidName(PathBuf),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("模型复制失败: {0}")]
  EmptyCopy(PathBuf),
}

fn is_usable(path: &Path) -> bool {
  std::fs::metadata(path)
    .map(|meta| meta.is_file() && meta.len() > 0)
    .unwrap_or(false)
}

/// 确保 `cache_dir` 中存在随应用分发的模型副本，返回副本路径
///
/// 副本已存在且非空时直接返回；否则创建目录、复制并校验副本非空。
pub fn ensure_local_model(bundled: &Path, cache_dir: &Path) -> Result<PathBuf, ProvisionError> {
  let name = bundled
    .file_name()
    .ok_or_else(|| ProvisionError::InvalidName(bundled.to_path_buf()))?;
  let dest = cache_dir.join(name);

  if is_usable(&dest) {
    debug!("使用已缓存的模型: {}", dest.display());
    return Ok(dest);
  }

  std::fs::create_dir_all(cache_dir)?;
  let bytes = std::fs::copy(bundled, &dest)?;
  info!(
    "复制模型 {} -> {} ({:.2} MB)",
    bundled.display(),
    dest.display(),
    bytes as f64 / (1024.0 * 1024.0)
  );

  if !is_usable(&dest) {
    return Err(ProvisionError::EmptyCopy(dest));
  }
  Ok(dest)
}
