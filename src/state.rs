use std::sync::Arc;

use crate::clients::QuestionServiceClient;
use crate::config::Config;
use crate::store::SessionStore;
use axum::extract::FromRef;

/// Shared handle to the draft and timer stores.
pub type SharedStore = Arc<dyn SessionStore>;

#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub questions: QuestionServiceClient,
    pub config: Config,
}

impl FromRef<AppState> for SharedStore {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

impl FromRef<AppState> for QuestionServiceClient {
    fn from_ref(state: &AppState) -> Self {
        state.questions.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
