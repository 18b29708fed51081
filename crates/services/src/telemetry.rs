//! Debounced playback telemetry.
//!
//! A video player fires position updates several times per second. The
//! emitter coalesces them: each tick replaces the pending one and re-arms a
//! single timer, so at most one network call leaves per quiet window and it
//! carries the last observed values. The emitter is an explicit
//! `{Idle, Pending}` state machine with `flush` and `cancel` so tests do
//! not have to race a hidden timer.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use campus_core::model::{CourseId, VideoId};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Quiet period before a pending tick is flushed.
pub const QUIET_PERIOD: Duration = Duration::from_millis(2000);

/// One coalesced playback update.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryTick {
    pub course_id: CourseId,
    pub video_id: VideoId,
    pub percent: f64,
    pub completed: bool,
    pub total_videos: usize,
}

/// Destination for flushed ticks. Implementations own their failure
/// handling; a flush must never propagate an error back into playback.
#[async_trait]
pub trait TelemetrySink: Send + Sync {
    async fn send(&self, tick: TelemetryTick);
}

enum EmitterState {
    Idle,
    Pending {
        tick: TelemetryTick,
        timer: JoinHandle<()>,
    },
}

struct Inner {
    sink: Arc<dyn TelemetrySink>,
    quiet_period: Duration,
    state: Mutex<EmitterState>,
}

impl Inner {
    /// Takes the pending tick, if any, and sends it.
    async fn fire(&self) {
        let tick = {
            let mut state = self.state.lock().await;
            match std::mem::replace(&mut *state, EmitterState::Idle) {
                EmitterState::Idle => None,
                EmitterState::Pending { tick, .. } => Some(tick),
            }
        };
        if let Some(tick) = tick {
            self.sink.send(tick).await;
        }
    }
}

/// Debouncing emitter for one playback session.
#[derive(Clone)]
pub struct TelemetryEmitter {
    inner: Arc<Inner>,
}

impl TelemetryEmitter {
    #[must_use]
    pub fn new(sink: Arc<dyn TelemetrySink>) -> Self {
        Self::with_quiet_period(sink, QUIET_PERIOD)
    }

    #[must_use]
    pub fn with_quiet_period(sink: Arc<dyn TelemetrySink>, quiet_period: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                sink,
                quiet_period,
                state: Mutex::new(EmitterState::Idle),
            }),
        }
    }

    /// Records a playback tick, replacing any pending one and re-arming
    /// the quiet-period timer.
    pub async fn record_tick(&self, tick: TelemetryTick) {
        let mut state = self.inner.state.lock().await;
        if let EmitterState::Pending { timer, .. } =
            std::mem::replace(&mut *state, EmitterState::Idle)
        {
            timer.abort();
        }

        let inner = Arc::clone(&self.inner);
        let quiet = self.inner.quiet_period;
        let timer = tokio::spawn(async move {
            tokio::time::sleep(quiet).await;
            inner.fire().await;
        });

        *state = EmitterState::Pending { tick, timer };
    }

    /// Sends the pending tick immediately, if any, and disarms the timer.
    pub async fn flush(&self) {
        let tick = {
            let mut state = self.inner.state.lock().await;
            match std::mem::replace(&mut *state, EmitterState::Idle) {
                EmitterState::Idle => None,
                EmitterState::Pending { tick, timer } => {
                    timer.abort();
                    Some(tick)
                }
            }
        };
        if let Some(tick) = tick {
            self.inner.sink.send(tick).await;
        }
    }

    /// Discards the pending tick, if any, without sending.
    pub async fn cancel(&self) {
        let mut state = self.inner.state.lock().await;
        if let EmitterState::Pending { timer, .. } =
            std::mem::replace(&mut *state, EmitterState::Idle)
        {
            timer.abort();
        }
    }

    /// True if a tick is waiting on the quiet period.
    pub async fn is_pending(&self) -> bool {
        matches!(*self.inner.state.lock().await, EmitterState::Pending { .. })
    }
}
