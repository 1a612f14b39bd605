// 该文件是 Lazarillo 项目的一部分。
// tests/concurrency.rs - 并发检测测试
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

mod common;

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

use common::*;
use lazarillo::{DetectError, Pipeline};

#[test]
fn concurrent_first_detections_load_the_model_once() {
  let dir = tempfile::tempdir().unwrap();
  let photo = write_jpeg(dir.path(), "scene.jpg", 320, 240);
  let mut loader = ScriptedLoader::new(raw_output(&[(320.0, 320.0, 50.0, 50.0, 0, 4.0)]));
  loader.load_delay = Duration::from_millis(100);
  let pipeline = Arc::new(Pipeline::new(loader.clone(), config()).unwrap());

  let barrier = Arc::new(Barrier::new(2));
  let handles: Vec<_> = (0..2)
    .map(|_| {
      let pipeline = Arc::clone(&pipeline);
      let barrier = Arc::clone(&barrier);
      let photo = photo.clone();
      thread::spawn(move || {
        barrier.wait();
        pipeline.detect(&photo, None, None)
      })
    })
    .collect();

  for handle in handles {
    let result = handle.join().unwrap().unwrap();
    assert_eq!(result.len(), 1);
  }
  assert_eq!(loader.loads(), 1);
  assert_eq!(pipeline.invoker().load_count(), 1);
  // 一次加载校验 + 两次检测
  assert_eq!(loader.runs(), 3);
}

#[test]
fn hung_forward_pass_times_out() {
  let dir = tempfile::tempdir().unwrap();
  let photo = write_jpeg(dir.path(), "scene.jpg", 64, 64);
  let mut loader = ScriptedLoader::new(raw_output(&[]));
  loader.run_delay = Duration::from_millis(400);
  let pipeline = Pipeline::new(
    loader,
    config()
      .with_check_on_load(false)
      .with_inference_timeout(Some(Duration::from_millis(50))),
  )
  .unwrap();

  let err = pipeline.detect(&photo, None, None).unwrap_err();
  assert!(matches!(err, DetectError::InferenceTimeout(_)));
}

#[test]
fn hung_model_during_load_check_times_out_promptly() {
  let dir = tempfile::tempdir().unwrap();
  let photo = write_jpeg(dir.path(), "scene.jpg", 64, 64);
  let mut loader = ScriptedLoader::new(raw_output(&[]));
  loader.run_delay = Duration::from_millis(800);
  let pipeline = Pipeline::new(
    loader,
    config().with_inference_timeout(Some(Duration::from_millis(50))),
  )
  .unwrap();

  let now = Instant::now();
  let err = pipeline.detect(&photo, None, None).unwrap_err();
  assert!(matches!(err, DetectError::InferenceTimeout(_)));
  assert!(now.elapsed() < Duration::from_millis(500));
  assert!(!pipeline.invoker().is_loaded());
}
