use std::sync::Arc;

use campus_core::Clock;
use campus_core::grader::Grader;
use storage::repository::Storage;

use crate::api::{ProgressApi, ProgressRemote};
use crate::error::AppServicesError;
use crate::progress_store::LocalProgressStore;
use crate::quiz_service::QuizService;
use crate::signals::SignalHub;
use crate::sync_service::{ProgressSyncService, RemotePushSink};
use crate::telemetry::TelemetryEmitter;
use crate::unlock_gate::UnlockGate;

/// Assembles the app-facing services around one storage backend, one
/// remote client, and one signal hub.
#[derive(Clone)]
pub struct AppServices {
    hub: SignalHub,
    sync: ProgressSyncService,
    telemetry: TelemetryEmitter,
    unlock: UnlockGate,
    quiz: Arc<QuizService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        api: ProgressApi,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::assemble(storage, Arc::new(api), clock))
    }

    /// Build services on in-memory storage, for tests and prototyping.
    #[must_use]
    pub fn in_memory(remote: Arc<dyn ProgressRemote>, clock: Clock) -> Self {
        Self::assemble(Storage::in_memory(), remote, clock)
    }

    fn assemble(storage: Storage, remote: Arc<dyn ProgressRemote>, clock: Clock) -> Self {
        let hub = SignalHub::new();
        let local = LocalProgressStore::new(Arc::clone(&storage.progress), hub.clone(), clock);
        let sync = ProgressSyncService::new(local.clone(), Arc::clone(&remote), clock);
        let telemetry = TelemetryEmitter::new(Arc::new(RemotePushSink::new(sync.clone())));
        let unlock = UnlockGate::new(local, Arc::clone(&storage.quiz), hub.clone());
        let quiz = Arc::new(QuizService::new(
            Grader::default(),
            storage.quiz,
            remote,
            hub.clone(),
            clock,
        ));

        Self {
            hub,
            sync,
            telemetry,
            unlock,
            quiz,
        }
    }

    #[must_use]
    pub fn hub(&self) -> &SignalHub {
        &self.hub
    }

    #[must_use]
    pub fn sync(&self) -> &ProgressSyncService {
        &self.sync
    }

    #[must_use]
    pub fn telemetry(&self) -> &TelemetryEmitter {
        &self.telemetry
    }

    #[must_use]
    pub fn unlock(&self) -> &UnlockGate {
        &self.unlock
    }

    #[must_use]
    pub fn quiz(&self) -> Arc<QuizService> {
        Arc::clone(&self.quiz)
    }
}
