use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering as AtomicOrdering};
use tokio::sync::Mutex;

use super::{DirectoryStore, UsageStore};
use crate::{error::Result, models::*};

#[derive(Default)]
struct Tables {
    agencies: Vec<Agency>,
    contacts: Vec<Contact>,
    usage: HashMap<(String, NaiveDate), UsageRecord>,
}

/// In-memory stand-in for the Postgres store.
///
/// All tables sit behind one lock, so a window read and its count observe the
/// same state, and the conditional increment is atomic like the SQL `UPDATE`.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    pub fail_reads: AtomicBool,
    pub fail_usage: AtomicBool,
    window_reads: AtomicU64,
}

impl MemoryStore {
    pub fn with_directory(agencies: Vec<Agency>, contacts: Vec<Contact>) -> Self {
        Self {
            tables: Mutex::new(Tables {
                agencies,
                contacts,
                usage: HashMap::new(),
            }),
            ..Self::default()
        }
    }

    pub async fn set_usage(&self, user_id: &str, day: NaiveDate, count: i32) {
        let now = Utc::now();
        self.tables.lock().await.usage.insert(
            (user_id.to_string(), day),
            UsageRecord {
                user_id: user_id.to_string(),
                day,
                count,
                created_at: now,
                updated_at: now,
            },
        );
    }

    pub fn window_reads(&self) -> u64 {
        self.window_reads.load(AtomicOrdering::SeqCst)
    }

    fn check_reads(&self) -> Result<()> {
        if self.fail_reads.load(AtomicOrdering::SeqCst) {
            return Err(sqlx::Error::PoolTimedOut.into());
        }
        Ok(())
    }

    fn check_usage(&self) -> Result<()> {
        if self.fail_usage.load(AtomicOrdering::SeqCst) {
            return Err(sqlx::Error::PoolTimedOut.into());
        }
        Ok(())
    }
}

pub fn agency(id: &str, name: &str) -> Agency {
    Agency {
        id: id.to_string(),
        name: name.to_string(),
        state: Some("Ohio".to_string()),
        state_code: Some("OH".to_string()),
        agency_type: None,
        population: None,
        website: None,
        total_schools: None,
        total_students: None,
        mailing_address: None,
        grade_span: None,
        locale: None,
        csa_cbsa: None,
        domain_name: None,
        physical_address: None,
        phone: None,
        status: None,
        student_teacher_ratio: None,
        supervisory_union: None,
        county: None,
        created_at: None,
        updated_at: None,
    }
}

pub fn contact(id: &str, last_name: Option<&str>, agency_id: Option<&str>) -> Contact {
    Contact {
        id: id.to_string(),
        first_name: Some("Pat".to_string()),
        last_name: last_name.map(str::to_string),
        email: Some(format!("{}@example.org", id)),
        phone: None,
        title: None,
        email_type: None,
        contact_form_url: None,
        created_at: None,
        updated_at: None,
        agency_id: agency_id.map(str::to_string),
        firm_id: None,
        department: None,
    }
}

// Mirrors `ORDER BY last_name ASC NULLS LAST, id ASC`.
fn contact_order(a: &Contact, b: &Contact) -> Ordering {
    match (&a.last_name, &b.last_name) {
        (Some(x), Some(y)) => x.cmp(y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.id.cmp(&b.id))
}

fn slice<T: Clone>(items: &[T], window: PageWindow) -> Vec<T> {
    items
        .iter()
        .skip(window.offset.max(0) as usize)
        .take(window.limit.max(0) as usize)
        .cloned()
        .collect()
}

#[async_trait]
impl DirectoryStore for MemoryStore {
    async fn ping(&self) -> Result<()> {
        self.check_reads()
    }

    async fn agencies_window(&self, window: PageWindow) -> Result<(Vec<Agency>, i64)> {
        self.check_reads()?;
        self.window_reads.fetch_add(1, AtomicOrdering::SeqCst);
        let tables = self.tables.lock().await;
        let mut sorted = tables.agencies.clone();
        sorted.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok((slice(&sorted, window), tables.agencies.len() as i64))
    }

    async fn contacts_window(&self, window: PageWindow) -> Result<(Vec<ContactWithAgency>, i64)> {
        self.check_reads()?;
        self.window_reads.fetch_add(1, AtomicOrdering::SeqCst);
        let tables = self.tables.lock().await;
        let mut sorted = tables.contacts.clone();
        sorted.sort_by(contact_order);
        let items = slice(&sorted, window)
            .into_iter()
            .map(|contact| {
                let agency_name = contact.agency_id.as_ref().and_then(|id| {
                    tables
                        .agencies
                        .iter()
                        .find(|agency| &agency.id == id)
                        .map(|agency| agency.name.clone())
                });
                ContactWithAgency::from(ContactRow {
                    contact,
                    agency_name,
                })
            })
            .collect();
        Ok((items, tables.contacts.len() as i64))
    }

    async fn count(&self, kind: EntityKind) -> Result<i64> {
        self.check_reads()?;
        let tables = self.tables.lock().await;
        Ok(match kind {
            EntityKind::Agencies => tables.agencies.len() as i64,
            EntityKind::Contacts => tables.contacts.len() as i64,
        })
    }
}

#[async_trait]
impl UsageStore for MemoryStore {
    async fn find_usage(&self, user_id: &str, day: NaiveDate) -> Result<Option<UsageRecord>> {
        self.check_usage()?;
        let tables = self.tables.lock().await;
        Ok(tables.usage.get(&(user_id.to_string(), day)).cloned())
    }

    async fn get_or_create_usage(&self, user_id: &str, day: NaiveDate) -> Result<UsageRecord> {
        self.check_usage()?;
        let mut tables = self.tables.lock().await;
        let now = Utc::now();
        let record = tables
            .usage
            .entry((user_id.to_string(), day))
            .or_insert_with(|| UsageRecord {
                user_id: user_id.to_string(),
                day,
                count: 0,
                created_at: now,
                updated_at: now,
            });
        Ok(record.clone())
    }

    async fn increment_usage_below(
        &self,
        user_id: &str,
        day: NaiveDate,
        by: i32,
        limit: i32,
    ) -> Result<Option<i32>> {
        self.check_usage()?;
        let mut tables = self.tables.lock().await;
        match tables.usage.get_mut(&(user_id.to_string(), day)) {
            Some(record) if record.count < limit => {
                record.count += by;
                record.updated_at = Utc::now();
                Ok(Some(record.count))
            }
            _ => Ok(None),
        }
    }
}
