// src/api/mod.rs

pub mod agencies;
pub mod auth;
pub mod contacts;
pub mod dashboard;
pub mod health;
pub mod profile;

use axum::http::HeaderMap;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Deserializer};
use std::sync::Arc;

use crate::config::Config;
use crate::db::{DirectoryStore, UsageStore};
use crate::error::Result;
use crate::models::{CurrentUser, PageQuery};
use crate::utils::{quota_day, resolve_page_query};
use auth::SessionVerifier;

#[derive(Clone)]
pub struct AppState {
    pub directory: Arc<dyn DirectoryStore>,
    pub usage: Arc<dyn UsageStore>,
    pub sessions: Arc<SessionVerifier>,
    pub config: Config,
}

/// `?page=&page_size=` on the listing endpoints.
///
/// Values that are not integers are treated as absent and fall back to the
/// defaults, so a malformed link still lands on a page.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default, deserialize_with = "lenient_number")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub page_size: Option<i64>,
}

fn lenient_number<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| value.trim().parse().ok()))
}

impl ListQuery {
    pub fn resolve(&self, config: &Config) -> Result<PageQuery> {
        resolve_page_query(self.page, self.page_size, config.max_page_size)
    }
}

pub fn require_user(headers: &HeaderMap, state: &AppState) -> Result<CurrentUser> {
    state.sessions.authenticate(headers)
}

/// Today's quota bucket in the configured reference clock.
pub fn today(state: &AppState) -> NaiveDate {
    quota_day(Utc::now(), state.config.quota_clock_offset())
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::api::auth::issue_test_token;
    use crate::config::test_config;
    use crate::db::memory::MemoryStore;
    use axum::http::{header::AUTHORIZATION, HeaderValue};

    pub fn state_with(store: Arc<MemoryStore>) -> AppState {
        let config = test_config();
        AppState {
            directory: store.clone(),
            usage: store,
            sessions: Arc::new(SessionVerifier::from_config(&config).unwrap()),
            config,
        }
    }

    pub fn auth_headers(state: &AppState, user_id: &str) -> HeaderMap {
        let token = issue_test_token(&state.config, user_id, 3600);
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        headers
    }
}
