// 该文件是 Lazarillo 项目的一部分。
// src/output/console.rs - 控制台播报输出
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

use thiserror::Error;
use tracing::info;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  input::ImageFileInput,
  model::DetectResult,
  narration::{DEFAULT_TOP, summarize},
  output::Render,
};

#[derive(Error, Debug)]
pub enum ConsoleOutputError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("参数无效: {0}")]
  InvalidQuery(String),
}

/// 打印播报摘要，`console:?top=3` 控制列出的条数
pub struct ConsoleOutput {
  top: usize,
}

impl Default for ConsoleOutput {
  fn default() -> Self {
    Self { top: DEFAULT_TOP }
  }
}

impl FromUrlWithScheme for ConsoleOutput {
  const SCHEME: &'static str = "console";
}

impl FromUrl for ConsoleOutput {
  type Error = ConsoleOutputError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(ConsoleOutputError::SchemeMismatch(format!(
        "期望输出方式 '{}', 实际输出方式 '{}'",
        Self::SCHEME,
        uri.scheme()
      )));
    }

    let mut output = ConsoleOutput::default();
    for (k, v) in uri.query_pairs() {
      if k == "top" {
        output.top = v
          .parse()
          .map_err(|_| ConsoleOutputError::InvalidQuery(format!("top={}", v)))?;
      }
    }
    Ok(output)
  }
}

impl Render<ImageFileInput, DetectResult> for ConsoleOutput {
  type Error = ConsoleOutputError;

  fn render_result(&self, frame: &ImageFileInput, result: &DetectResult) -> Result<(), Self::Error> {
    let narration = summarize(&result.detections, self.top);
    info!("{}: {}", frame.path().display(), narration.headline);

    println!("{}", narration.headline);
    for line in &narration.lines {
      println!("  {}", line);
    }
    println!("> {}", narration.spoken);
    Ok(())
  }
}
