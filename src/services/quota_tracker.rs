use chrono::NaiveDate;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;

use crate::{
    constants::DAILY_CONTACT_LIMIT,
    db::UsageStore,
    error::{AppError, Result},
    models::{EntityKind, Page},
};

// The usage counter is part of reading contacts; its faults surface the same way.
fn usage_failure(err: AppError) -> AppError {
    tracing::error!("Error accessing contact usage: {}", err);
    AppError::Retrieval(EntityKind::Contacts)
}

/// Quota state reported to the client alongside each contacts response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuotaStatus {
    pub allowed: bool,
    pub count: i32,
    pub limit: i32,
    pub remaining: i32,
}

impl QuotaStatus {
    fn new(allowed: bool, count: i32, limit: i32) -> Self {
        Self {
            allowed,
            count,
            limit,
            remaining: (limit - count).max(0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaDecision {
    Admitted(QuotaStatus),
    Exceeded(QuotaStatus),
}

impl QuotaDecision {
    pub fn status(&self) -> QuotaStatus {
        match self {
            QuotaDecision::Admitted(status) | QuotaDecision::Exceeded(status) => *status,
        }
    }
}

#[derive(Debug)]
pub enum QuotaOutcome<T> {
    Admitted { value: T, status: QuotaStatus },
    Exceeded { status: QuotaStatus },
}

/// Daily contact-view counter for one user.
///
/// Admission is checked before the fetch without reserving anything. After the
/// fetch the counter grows by the number of records actually returned, in one
/// conditional update that only applies while the stored count is still below
/// the limit. A batch that starts under the limit is recorded in full even if
/// it ends above it.
pub struct QuotaTracker {
    store: Arc<dyn UsageStore>,
    limit: i32,
}

impl QuotaTracker {
    pub fn new(store: Arc<dyn UsageStore>) -> Self {
        Self {
            store,
            limit: DAILY_CONTACT_LIMIT,
        }
    }

    pub fn limit(&self) -> i32 {
        self.limit
    }

    /// Current state without creating a record.
    pub async fn peek(&self, user_id: &str, day: NaiveDate) -> Result<QuotaStatus> {
        let count = self
            .store
            .find_usage(user_id, day)
            .await
            .map_err(usage_failure)?
            .map(|usage| usage.count)
            .unwrap_or(0);
        Ok(QuotaStatus::new(count < self.limit, count, self.limit))
    }

    /// Lookup-or-create, then admit while the count is below the limit.
    pub async fn check(&self, user_id: &str, day: NaiveDate) -> Result<QuotaDecision> {
        let usage = self
            .store
            .get_or_create_usage(user_id, day)
            .await
            .map_err(usage_failure)?;

        if usage.count >= self.limit {
            tracing::info!(
                "Daily contact limit reached for {} on {} ({}/{})",
                user_id,
                day,
                usage.count,
                self.limit
            );
            return Ok(QuotaDecision::Exceeded(QuotaStatus::new(
                false,
                usage.count,
                self.limit,
            )));
        }

        Ok(QuotaDecision::Admitted(QuotaStatus::new(
            true,
            usage.count,
            self.limit,
        )))
    }

    /// Records `batch` viewed records if the counter is still below the limit.
    pub async fn consume(
        &self,
        user_id: &str,
        day: NaiveDate,
        batch: usize,
    ) -> Result<QuotaDecision> {
        let by = i32::try_from(batch)
            .map_err(|_| AppError::Internal(format!("batch of {} records is too large", batch)))?;

        match self
            .store
            .increment_usage_below(user_id, day, by, self.limit)
            .await
            .map_err(usage_failure)?
        {
            Some(count) => Ok(QuotaDecision::Admitted(QuotaStatus::new(
                true, count, self.limit,
            ))),
            None => {
                let count = self
                    .store
                    .find_usage(user_id, day)
                    .await
                    .map_err(usage_failure)?
                    .map(|usage| usage.count)
                    .unwrap_or(0);
                Ok(QuotaDecision::Exceeded(QuotaStatus::new(
                    false, count, self.limit,
                )))
            }
        }
    }

    /// Admission check, fetch, then commit of the actual batch size.
    ///
    /// The fetch runs only when admitted. A failed fetch records nothing. If a
    /// concurrent request reached the limit while this one was fetching, the
    /// page is dropped and the outcome is `Exceeded`.
    pub async fn check_and_consume<T, F, Fut>(
        &self,
        user_id: &str,
        day: NaiveDate,
        requested: i64,
        fetch: F,
    ) -> Result<QuotaOutcome<Page<T>>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Page<T>>>,
    {
        if let QuotaDecision::Exceeded(status) = self.check(user_id, day).await? {
            return Ok(QuotaOutcome::Exceeded { status });
        }

        let page = fetch().await?;
        tracing::debug!(
            "Recording {} of {} requested contacts for {} on {}",
            page.items.len(),
            requested,
            user_id,
            day
        );

        match self.consume(user_id, day, page.items.len()).await? {
            QuotaDecision::Admitted(status) => Ok(QuotaOutcome::Admitted {
                value: page,
                status,
            }),
            QuotaDecision::Exceeded(status) => {
                tracing::warn!(
                    "Concurrent request exhausted quota for {} on {}; withholding {} contacts",
                    user_id,
                    day,
                    page.items.len()
                );
                Ok(QuotaOutcome::Exceeded { status })
            }
        }
    }
}
