use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use uuid::Uuid;

use crate::core::{config::Settings, redis::RedisHandle};
use crate::services::classification::Classifier;
use crate::services::debounce::Debouncer;
use crate::services::drafts::DraftStore;

#[derive(Clone)]
pub(crate) struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    settings: Settings,
    db: PgPool,
    redis: RedisHandle,
    classifier: Arc<dyn Classifier>,
    drafts: DraftStore,
    debouncer: Debouncer<Uuid>,
}

impl AppState {
    pub(crate) fn new(
        settings: Settings,
        db: PgPool,
        redis: RedisHandle,
        classifier: Arc<dyn Classifier>,
    ) -> Self {
        let drafts = DraftStore::new(settings.drafts().max_per_user);
        let debouncer =
            Debouncer::new(Duration::from_millis(settings.classification().debounce_ms));
        Self { inner: Arc::new(InnerState { settings, db, redis, classifier, drafts, debouncer }) }
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub(crate) fn db(&self) -> &PgPool {
        &self.inner.db
    }

    pub(crate) fn redis(&self) -> &RedisHandle {
        &self.inner.redis
    }

    pub(crate) fn classifier(&self) -> &Arc<dyn Classifier> {
        &self.inner.classifier
    }

    pub(crate) fn drafts(&self) -> &DraftStore {
        &self.inner.drafts
    }

    pub(crate) fn debouncer(&self) -> &Debouncer<Uuid> {
        &self.inner.debouncer
    }
}
