//! Stage Runner - bounded, isolated execution of one analysis step
//!
//! Every step runs under the per-stage timeout with panics captured, so a
//! stage can only ever settle as `Success` or a typed `Failure`. Nothing a
//! step does escapes past this point.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures::FutureExt;
use tracing::{debug, warn};

use crate::types::{StageFailure, StageName, StageResult, StageTiming};

/// A stage outcome plus when it ran.
#[derive(Debug, Clone)]
pub struct Settled<T> {
    pub result: StageResult<T>,
    pub timing: StageTiming,
}

#[derive(Debug, Clone, Copy)]
pub struct StageRunner {
    timeout: Duration,
}

impl StageRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Drive `step` to a settled result.
    ///
    /// - `Ok(v)` → `Success(v)`
    /// - `Err(e)` → `Failure` with the error chain as reason
    /// - deadline exceeded → `Failure("timeout")`
    /// - panic → `Failure` with the panic message
    pub async fn run<T, F>(&self, stage: StageName, step: F) -> Settled<T>
    where
        F: Future<Output = anyhow::Result<T>>,
    {
        let started_at = Utc::now();
        let result = self.settle(stage.as_str(), step).await;
        Settled {
            result,
            timing: StageTiming {
                stage,
                started_at,
                settled_at: Utc::now(),
            },
        }
    }

    /// Same isolation for a step that has no result slot (e.g. narrative).
    pub async fn settle<T, F>(&self, label: &str, step: F) -> StageResult<T>
    where
        F: Future<Output = anyhow::Result<T>>,
    {
        let start = Instant::now();
        debug!(stage = label, "Stage started");

        let outcome =
            tokio::time::timeout(self.timeout, AssertUnwindSafe(step).catch_unwind()).await;

        let result = match outcome {
            Ok(Ok(Ok(value))) => StageResult::Success(value),
            Ok(Ok(Err(e))) => StageResult::Failure(StageFailure::error(format!("{e:#}"))),
            Ok(Err(panic)) => {
                StageResult::Failure(StageFailure::panicked(panic_message(panic.as_ref())))
            }
            Err(_) => StageResult::Failure(StageFailure::timeout()),
        };

        let elapsed_ms = start.elapsed().as_millis() as u64;
        match &result {
            StageResult::Success(_) => debug!(stage = label, elapsed_ms, "Stage succeeded"),
            StageResult::Failure(f) => {
                warn!(stage = label, elapsed_ms, kind = ?f.kind, reason = %f.reason, "Stage failed")
            }
        }
        result
    }
}

/// Best-effort text of a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FailureKind;

    fn runner(ms: u64) -> StageRunner {
        StageRunner::new(Duration::from_millis(ms))
    }

    #[tokio::test]
    async fn success_is_wrapped() {
        let settled = runner(1_000).run(StageName::Quality, async { Ok(7_u32) }).await;
        assert_eq!(settled.result.success(), Some(&7));
        assert_eq!(settled.timing.stage, StageName::Quality);
        assert!(settled.timing.settled_at >= settled.timing.started_at);
    }

    #[tokio::test]
    async fn error_becomes_failure_with_context() {
        let settled: Settled<u32> = runner(1_000)
            .run(StageName::Content, async {
                Err(anyhow::anyhow!("model unavailable").context("content scoring"))
            })
            .await;
        let failure = settled.result.failure().unwrap();
        assert_eq!(failure.kind, FailureKind::Error);
        assert!(failure.reason.contains("content scoring"));
        assert!(failure.reason.contains("model unavailable"));
    }

    #[tokio::test]
    async fn slow_step_times_out() {
        let settled: Settled<u32> = runner(50)
            .run(StageName::Transcription, async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(1)
            })
            .await;
        let failure = settled.result.failure().unwrap();
        assert_eq!(failure.kind, FailureKind::Timeout);
        assert_eq!(failure.reason, "timeout");
    }

    fn buggy_scorer() -> anyhow::Result<u32> {
        panic!("scorer bug")
    }

    #[tokio::test]
    async fn panic_is_captured() {
        let settled = runner(1_000)
            .run(StageName::Behavioral, async { buggy_scorer() })
            .await;
        let failure = settled.result.failure().unwrap();
        assert_eq!(failure.kind, FailureKind::Panicked);
        assert!(failure.reason.contains("scorer bug"));
    }
}
