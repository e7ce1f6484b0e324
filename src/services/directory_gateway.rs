use std::sync::Arc;

use crate::{
    db::DirectoryStore,
    error::{AppError, Result},
    models::{Agency, ContactWithAgency, EntityKind, Page, PageQuery},
    utils::total_pages,
};

// Storage faults are logged here and reported without their cause.
fn retrieval_failure(kind: EntityKind, err: AppError) -> AppError {
    tracing::error!("Error fetching {}: {}", kind, err);
    AppError::Retrieval(kind)
}

fn assemble<T>(query: PageQuery, items: Vec<T>, total: i64) -> Page<T> {
    Page {
        items,
        total,
        total_pages: total_pages(total, query.page_size),
        page: query.page,
        page_size: query.page_size,
    }
}

/// Offset/limit listings over the seeded directory tables.
///
/// Out-of-range pages are not an error here: the window past the end is simply
/// empty, and the caller decides whether to reject it.
pub struct DirectoryGateway {
    store: Arc<dyn DirectoryStore>,
}

impl DirectoryGateway {
    pub fn new(store: Arc<dyn DirectoryStore>) -> Self {
        Self { store }
    }

    /// Agencies ordered by name.
    pub async fn list_agencies(&self, query: PageQuery) -> Result<Page<Agency>> {
        let (items, total) = self
            .store
            .agencies_window(query.window())
            .await
            .map_err(|e| retrieval_failure(EntityKind::Agencies, e))?;

        tracing::debug!(
            "Fetched {} agencies (page {}, total {})",
            items.len(),
            query.page,
            total
        );
        Ok(assemble(query, items, total))
    }

    /// Contacts ordered by last name, each with its agency name when the reference resolves.
    pub async fn list_contacts(&self, query: PageQuery) -> Result<Page<ContactWithAgency>> {
        let (items, total) = self
            .store
            .contacts_window(query.window())
            .await
            .map_err(|e| retrieval_failure(EntityKind::Contacts, e))?;

        tracing::debug!(
            "Fetched {} contacts (page {}, total {})",
            items.len(),
            query.page,
            total
        );
        Ok(assemble(query, items, total))
    }

    pub async fn total(&self, kind: EntityKind) -> Result<i64> {
        self.store
            .count(kind)
            .await
            .map_err(|e| retrieval_failure(kind, e))
    }
}
