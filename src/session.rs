// 该文件是 Lazarillo 项目的一部分。
// src/session.rs - 推理会话管理
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

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::{
  error::DetectError,
  frame::CanvasTensor,
  model::{NetworkSession, RawOutput, SessionLoader},
};

/// 加载后对试跑输出进行校验
pub type LoadCheck = Box<dyn Fn(&RawOutput) -> Result<(), DetectError> + Send + Sync>;

type SharedSession<S> = Arc<Mutex<S>>;

/// 推理调用器
///
/// 会话在第一次使用（或显式预加载）时加载，此后一直复用。并发的首次调用者
/// 在同一把锁上等待，只会触发一次加载；加载失败不会被缓存，下次调用重新尝试。
/// 前向推理独占会话，后到的调用者排队等待。
///
/// 推理（包括加载后的试跑）总在独立线程中执行。设置超时后，调用者最多等待
/// `timeout`（包括排队时间）。已经开始的推理不会被取消，会话在它结束前保持占用；
/// 还在排队的推理在调用者超时后直接丢弃。推理中发生 panic 时返回
/// [`DetectError::InferenceFailure`]，下次调用重新加载会话。
pub struct InferenceInvoker<L: SessionLoader> {
  loader: L,
  session: Mutex<Option<SharedSession<L::Session>>>,
  timeout: Option<Duration>,
  load_check: Option<(u32, LoadCheck)>,
  loads: AtomicUsize,
}

impl<L: SessionLoader> InferenceInvoker<L> {
  pub fn new(loader: L) -> Self {
    Self {
      loader,
      session: Mutex::new(None),
      timeout: None,
      load_check: None,
      loads: AtomicUsize::new(0),
    }
  }

  pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
    self.timeout = timeout;
    self
  }

  /// 首次加载后用 `canvas_size` 的空白画布试跑一次，并用 `check` 校验输出
  pub fn with_load_check(mut self, canvas_size: u32, check: LoadCheck) -> Self {
    self.load_check = Some((canvas_size, check));
    self
  }

  pub fn is_loaded(&self) -> bool {
    self
      .session
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .as_ref()
      .is_some_and(|session| !session.is_poisoned())
  }

  /// 成功加载会话的次数
  pub fn load_count(&self) -> usize {
    self.loads.load(Ordering::SeqCst)
  }

  pub fn ensure_session(&self) -> Result<SharedSession<L::Session>, DetectError> {
    // 加载过程中发生 panic 时槽位仍为 None，可以直接继续使用
    let mut slot = self.session.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(session) = slot.as_ref() {
      if !session.is_poisoned() {
        return Ok(Arc::clone(session));
      }
      warn!("会话在上一次推理中崩溃，重新加载");
      *slot = None;
    }

    info!("加载模型会话");
    let now = Instant::now();
    let session = self.loader.load().map_err(|e| {
      error!("模型加载失败: {}", e);
      DetectError::ModelUnavailable(Box::new(e))
    })?;
    self.loads.fetch_add(1, Ordering::SeqCst);
    info!("模型加载完成，耗时: {:.2?}", now.elapsed());

    let shared = Arc::new(Mutex::new(session));
    if let Some((canvas_size, check)) = &self.load_check {
      debug!("空白画布试跑，校验输出形状");
      let output = dispatch(
        Arc::clone(&shared),
        CanvasTensor::blank(*canvas_size),
        self.timeout,
      )?;
      check(&output)?;
    }

    *slot = Some(Arc::clone(&shared));
    Ok(shared)
  }

  /// 执行一次前向推理
  pub fn run(&self, input: CanvasTensor) -> Result<RawOutput, DetectError> {
    let session = self.ensure_session()?;
    dispatch(session, input, self.timeout)
  }
}

/// 在推理线程中执行一次前向推理，最多等待 `timeout`
fn dispatch<S: NetworkSession + 'static>(
  session: SharedSession<S>,
  input: CanvasTensor,
  timeout: Option<Duration>,
) -> Result<RawOutput, DetectError> {
  let abandoned = Arc::new(AtomicBool::new(false));
  let (tx, rx) = mpsc::channel();
  let worker_abandoned = Arc::clone(&abandoned);
  thread::Builder::new()
    .name("lazarillo-infer".to_string())
    .spawn(move || {
      if let Some(result) = forward(&session, &input, &worker_abandoned) {
        let _ = tx.send(result);
      }
    })
    .map_err(|e| DetectError::InferenceFailure(Box::new(e)))?;

  let received = match timeout {
    Some(timeout) => rx.recv_timeout(timeout),
    None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
  };

  match received {
    Ok(result) => result,
    Err(RecvTimeoutError::Timeout) => {
      abandoned.store(true, Ordering::SeqCst);
      let timeout = timeout.unwrap_or_default();
      warn!("推理超过 {:?} 未完成", timeout);
      Err(DetectError::InferenceTimeout(timeout))
    }
    Err(RecvTimeoutError::Disconnected) => {
      error!("推理线程异常退出");
      Err(DetectError::InferenceFailure("推理线程异常退出".into()))
    }
  }
}

/// 取得会话后执行推理；调用者已经放弃时返回 `None`，不再运行
fn forward<S: NetworkSession>(
  session: &Mutex<S>,
  input: &CanvasTensor,
  abandoned: &AtomicBool,
) -> Option<Result<RawOutput, DetectError>> {
  let Ok(mut session) = session.lock() else {
    return Some(Err(DetectError::InferenceFailure(
      "会话在上一次推理中崩溃".into(),
    )));
  };
  if abandoned.load(Ordering::SeqCst) {
    debug!("调用者已超时，跳过排队中的推理");
    return None;
  }

  let now = Instant::now();
  let output = session.run(input).map_err(|e| {
    error!("前向推理失败: {}", e);
    DetectError::InferenceFailure(Box::new(e))
  });
  if let Ok(output) = &output {
    debug!(
      "前向推理完成，耗时: {:.2?}, 输出形状: {:?}",
      now.elapsed(),
      output.shape()
    );
  }
  Some(output)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[derive(Debug, thiserror::Error)]
  #[error("测试错误: {0}")]
  struct TestError(&'static str);

  #[derive(Debug)]
  struct EchoSession {
    busy: Arc<AtomicBool>,
    delay: Duration,
    fail: bool,
    runs: Arc<AtomicUsize>,
    panics: Arc<AtomicUsize>,
  }

  impl NetworkSession for EchoSession {
    type Error = TestError;

    fn run(&mut self, input: &CanvasTensor) -> Result<RawOutput, Self::Error> {
      assert!(!self.busy.swap(true, Ordering::SeqCst), "并发推理");
      self.runs.fetch_add(1, Ordering::SeqCst);
      if self.panics.load(Ordering::SeqCst) > 0 {
        self.panics.fetch_sub(1, Ordering::SeqCst);
        panic!("模型崩溃");
      }
      thread::sleep(self.delay);
      self.busy.store(false, Ordering::SeqCst);
      if self.fail {
        return Err(TestError("forward"));
      }
      Ok(RawOutput::new(vec![1, 1, 1], vec![input.size() as f32]))
    }
  }

  struct EchoLoader {
    delay: Duration,
    fail_run: bool,
    fail_loads: AtomicUsize,
    runs: Arc<AtomicUsize>,
    panics: Arc<AtomicUsize>,
  }

  impl EchoLoader {
    fn new(delay: Duration) -> Self {
      Self {
        delay,
        fail_run: false,
        fail_loads: AtomicUsize::new(0),
        runs: Arc::new(AtomicUsize::new(0)),
        panics: Arc::new(AtomicUsize::new(0)),
      }
    }
  }

  impl SessionLoader for EchoLoader {
    type Session = EchoSession;
    type Error = TestError;

    fn load(&self) -> Result<Self::Session, Self::Error> {
      if self.fail_loads.load(Ordering::SeqCst) > 0 {
        self.fail_loads.fetch_sub(1, Ordering::SeqCst);
        return Err(TestError("missing model"));
      }
      Ok(EchoSession {
        busy: Arc::new(AtomicBool::new(false)),
        delay: self.delay,
        fail: self.fail_run,
        runs: Arc::clone(&self.runs),
        panics: Arc::clone(&self.panics),
      })
    }
  }

  #[test]
  fn session_is_loaded_once_and_reused() {
    let invoker = InferenceInvoker::new(EchoLoader::new(Duration::ZERO));
    assert!(!invoker.is_loaded());
    let a = invoker.ensure_session().unwrap();
    let b = invoker.ensure_session().unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(invoker.load_count(), 1);

    let output = invoker.run(CanvasTensor::blank(8)).unwrap();
    assert_eq!(output.data(), &[8.0]);
    assert_eq!(invoker.load_count(), 1);
  }

  #[test]
  fn failed_load_is_reported_and_retried() {
    let loader = EchoLoader::new(Duration::ZERO);
    loader.fail_loads.store(1, Ordering::SeqCst);
    let invoker = InferenceInvoker::new(loader);

    let err = invoker.run(CanvasTensor::blank(4)).unwrap_err();
    assert!(matches!(err, DetectError::ModelUnavailable(_)));
    assert!(!invoker.is_loaded());

    assert!(invoker.run(CanvasTensor::blank(4)).is_ok());
    assert_eq!(invoker.load_count(), 1);
  }

  #[test]
  fn forward_failure_is_an_inference_failure() {
    let mut loader = EchoLoader::new(Duration::ZERO);
    loader.fail_run = true;
    let invoker = InferenceInvoker::new(loader).with_timeout(Some(Duration::from_secs(5)));
    let err = invoker.run(CanvasTensor::blank(4)).unwrap_err();
    assert!(matches!(err, DetectError::InferenceFailure(_)));
  }

  #[test]
  fn slow_pass_times_out() {
    let invoker = InferenceInvoker::new(EchoLoader::new(Duration::from_millis(500)))
      .with_timeout(Some(Duration::from_millis(20)));
    invoker.ensure_session().unwrap();
    let err = invoker.run(CanvasTensor::blank(4)).unwrap_err();
    assert!(matches!(err, DetectError::InferenceTimeout(_)));
  }

  #[test]
  fn concurrent_runs_are_serialized() {
    let invoker = Arc::new(
      InferenceInvoker::new(EchoLoader::new(Duration::from_millis(20)))
        .with_timeout(Some(Duration::from_secs(10))),
    );
    let handles: Vec<_> = (0..4)
      .map(|_| {
        let invoker = Arc::clone(&invoker);
        thread::spawn(move || invoker.run(CanvasTensor::blank(2)))
      })
      .collect();
    for handle in handles {
      assert!(handle.join().unwrap().is_ok());
    }
    assert_eq!(invoker.load_count(), 1);
  }

  #[test]
  fn load_check_rejects_unexpected_output() {
    let invoker = InferenceInvoker::new(EchoLoader::new(Duration::ZERO)).with_load_check(
      4,
      Box::new(|output| {
        if output.shape() == [1, 84, 8400] {
          Ok(())
        } else {
          Err(DetectError::shape("[1, 84, 8400]", format!("{:?}", output.shape())))
        }
      }),
    );
    let err = invoker.ensure_session().unwrap_err();
    assert!(matches!(err, DetectError::ShapeMismatch { .. }));
    assert!(!invoker.is_loaded());
  }

  #[test]
  fn slow_load_check_is_bounded_by_the_timeout() {
    let invoker = InferenceInvoker::new(EchoLoader::new(Duration::from_millis(800)))
      .with_timeout(Some(Duration::from_millis(50)))
      .with_load_check(4, Box::new(|_| Ok(())));

    let now = Instant::now();
    let err = invoker.ensure_session().unwrap_err();
    assert!(matches!(err, DetectError::InferenceTimeout(_)));
    assert!(now.elapsed() < Duration::from_millis(500));
    assert!(!invoker.is_loaded());
  }

  #[test]
  fn queued_passes_are_dropped_after_their_caller_times_out() {
    let loader = EchoLoader::new(Duration::from_millis(300));
    let runs = Arc::clone(&loader.runs);
    let invoker = InferenceInvoker::new(loader).with_timeout(Some(Duration::from_millis(50)));
    invoker.ensure_session().unwrap();

    for _ in 0..4 {
      let err = invoker.run(CanvasTensor::blank(2)).unwrap_err();
      assert!(matches!(err, DetectError::InferenceTimeout(_)));
    }
    // 等第一次推理结束，排队的三次都应被丢弃
    thread::sleep(Duration::from_millis(600));
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert!(invoker.is_loaded());
  }

  #[test]
  fn panicking_session_is_a_failure_and_gets_reloaded() {
    for timeout in [None, Some(Duration::from_secs(5))] {
      let loader = EchoLoader::new(Duration::ZERO);
      loader.panics.store(1, Ordering::SeqCst);
      let invoker = InferenceInvoker::new(loader).with_timeout(timeout);

      let err = invoker.run(CanvasTensor::blank(3)).unwrap_err();
      assert!(matches!(err, DetectError::InferenceFailure(_)));
      assert!(!invoker.is_loaded());

      let output = invoker.run(CanvasTensor::blank(3)).unwrap();
      assert_eq!(output.data(), &[3.0]);
      assert_eq!(invoker.load_count(), 2);
    }
  }
}
