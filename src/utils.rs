// Page parameter helpers shared by the listing endpoints

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

use crate::{
    constants::{DEFAULT_PAGE, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE},
    error::{AppError, Result},
    models::{Page, PageQuery},
};

/// Basic guard for list page sizes to avoid expensive queries.
pub fn ensure_page_size(page_size: i64, configured_max: u32) -> Result<()> {
    let max = configured_max.min(MAX_PAGE_SIZE).max(1) as i64;

    if page_size < 1 || page_size > max {
        return Err(AppError::BadRequest(format!(
            "page_size must be between 1 and {}",
            max
        )));
    }

    Ok(())
}

/// Resolves optional query parameters into a page request, rejecting pages below 1
/// and pages whose offset does not fit in an `i64`.
pub fn resolve_page_query(
    page: Option<i64>,
    page_size: Option<i64>,
    configured_max: u32,
) -> Result<PageQuery> {
    let page = page.unwrap_or(DEFAULT_PAGE);
    let page_size = page_size.unwrap_or(DEFAULT_PAGE_SIZE);
    ensure_page_size(page_size, configured_max)?;

    if page < 1 || (page - 1).checked_mul(page_size).is_none() {
        return Err(AppError::InvalidPage {
            page,
            total_pages: 0,
        });
    }

    Ok(PageQuery { page, page_size })
}

/// Presentation-side range check: a page past the last one is invalid unless the set is empty.
pub fn ensure_page_in_range<T>(result: &Page<T>) -> Result<()> {
    if result.is_out_of_range() {
        return Err(AppError::InvalidPage {
            page: result.page,
            total_pages: result.total_pages,
        });
    }
    Ok(())
}

pub fn total_pages(total: i64, page_size: i64) -> i64 {
    if total <= 0 || page_size <= 0 {
        return 0;
    }
    (total + page_size - 1) / page_size
}

/// Calendar day of `now` in the quota reference clock.
pub fn quota_day(now: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    now.with_timezone(&offset).date_naive()
}
