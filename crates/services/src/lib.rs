#![forbid(unsafe_code)]

pub mod api;
pub mod app_services;
pub mod error;
pub mod progress_store;
pub mod quiz_service;
pub mod signals;
pub mod sync_service;
pub mod telemetry;
pub mod unlock_gate;

pub use campus_core::Clock;

pub use api::{ApiConfig, ProgressApi, ProgressRemote};
pub use app_services::AppServices;
pub use error::{ApiError, AppServicesError, QuizServiceError};
pub use progress_store::LocalProgressStore;
pub use quiz_service::QuizService;
pub use signals::{SignalHub, SignalKind, StateSignal};
pub use sync_service::{ProgressSyncService, RemotePushSink};
pub use telemetry::{TelemetryEmitter, TelemetrySink, TelemetryTick};
pub use unlock_gate::UnlockGate;
