use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::groups::Groups;
use crate::invites::{CodeSource, InviteCodes, RandomCodes};
use crate::leaderboard::Leaderboard;
use crate::predictions::Predictions;
use crate::scores::Scoring;
use crate::store::{PgStore, Store};
use crate::tournaments::Tournaments;
use crate::users::Users;

/// Every service, sharing one store handle.
pub struct AppState<S> {
    pub store: Arc<S>,
    pub users: Users<S>,
    pub tournaments: Tournaments<S>,
    pub groups: Groups<S>,
    pub invites: InviteCodes<S>,
    pub predictions: Predictions<S>,
    pub scoring: Scoring<S>,
    pub leaderboard: Leaderboard<S>,
}

impl<S: Store> AppState<S> {
    pub fn new(store: Arc<S>, config: &Config) -> AppState<S> {
        AppState::with_codes(store, config, Arc::new(RandomCodes))
    }

    pub fn with_codes(store: Arc<S>, config: &Config, codes: Arc<dyn CodeSource>) -> AppState<S> {
        AppState {
            users: Users::new(store.clone()),
            tournaments: Tournaments::new(store.clone(), config.scoring),
            groups: Groups::new(store.clone(), codes.clone(), config.group_capacity),
            invites: InviteCodes::new(store.clone(), codes),
            predictions: Predictions::new(store.clone()),
            scoring: Scoring::new(store.clone(), config.scoring),
            leaderboard: Leaderboard::new(store.clone(), config.leaderboard),
            store,
        }
    }
}

impl AppState<PgStore> {
    pub fn connect(config: &Config) -> Result<AppState<PgStore>> {
        let store = PgStore::connect(config)?;
        Ok(AppState::new(Arc::new(store), config))
    }
}
