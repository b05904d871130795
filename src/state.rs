use std::sync::Arc;

use crate::{
    config::Config,
    session::{SESSION_TTL, SessionStore},
    store::{PostgrestStore, RecordStore},
};

pub struct State {
    pub config: Config,
    pub store: Arc<dyn RecordStore>,
    pub sessions: SessionStore,
}

impl State {
    pub fn new() -> Arc<Self> {
        let config = Config::load();
        let store = Arc::new(PostgrestStore::new(&config.store_url, &config.store_key));

        Arc::new(Self {
            config,
            store,
            sessions: SessionStore::new(SESSION_TTL),
        })
    }
}
