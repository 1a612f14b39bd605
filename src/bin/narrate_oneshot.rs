// 该文件是 Lazarillo 项目的一部分。
// src/bin/narrate_oneshot.rs - 单张照片检测与播报
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

use anyhow::Result;
use clap::Parser;
use url::Url;

use lazarillo::{
  FromUrl, Pipeline,
  args::PipelineArgs,
  input::ImageFileInput,
  model::OnnxSessionBuilder,
  output::OutputWrapper,
  task::{OneShotTask, Task},
};
use tracing::info;

/// Lazarillo 单张照片检测
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  #[command(flatten)]
  pub pipeline: PipelineArgs,
  /// 照片路径，例如 image:///sdcard/DCIM/photo.jpg
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 输出方式：console: 或 folder:///path/to/records
  #[arg(long, value_name = "OUTPUT", default_value = "console:")]
  pub output: Url,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("模型文件路径: {}", args.pipeline.model);
  info!("输入来源: {}", args.input);
  info!("输出路径: {}", args.output);

  let loader = OnnxSessionBuilder::from_url(&args.pipeline.model)?;
  let local = args.pipeline.provision_model(loader.model_path())?;
  let loader = loader.with_model_path(local);

  let input = ImageFileInput::from_url(&args.input)?;
  let pipeline = Pipeline::new(loader, args.pipeline.to_config())?;
  let output = OutputWrapper::from_url(&args.output)?;

  OneShotTask.run_task(input, &pipeline, output)?;

  Ok(())
}
