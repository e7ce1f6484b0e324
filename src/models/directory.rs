use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

// ==================== ENTITY KINDS ====================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Agencies,
    Contacts,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Agencies => f.write_str("agencies"),
            EntityKind::Contacts => f.write_str("contacts"),
        }
    }
}

// ==================== AGENCY ====================
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Agency {
    pub id: String,
    pub name: String,
    pub state: Option<String>,
    pub state_code: Option<String>,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub agency_type: Option<String>,
    pub population: Option<String>,
    pub website: Option<String>,
    pub total_schools: Option<String>,
    pub total_students: Option<String>,
    pub mailing_address: Option<String>,
    pub grade_span: Option<String>,
    pub locale: Option<String>,
    pub csa_cbsa: Option<String>,
    pub domain_name: Option<String>,
    pub physical_address: Option<String>,
    pub phone: Option<String>,
    pub status: Option<String>,
    pub student_teacher_ratio: Option<String>,
    pub supervisory_union: Option<String>,
    pub county: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

// ==================== CONTACT ====================
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Contact {
    pub id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub title: Option<String>,
    pub email_type: Option<String>,
    pub contact_form_url: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub agency_id: Option<String>,
    pub firm_id: Option<String>,
    pub department: Option<String>,
}

/// Related agency attached to a contact for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgencySummary {
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContactWithAgency {
    #[serde(flatten)]
    pub contact: Contact,
    pub agency: Option<AgencySummary>,
}

/// Row shape of the contacts/agencies LEFT JOIN.
#[derive(Debug, Clone, FromRow)]
pub struct ContactRow {
    #[sqlx(flatten)]
    pub contact: Contact,
    pub agency_name: Option<String>,
}

impl From<ContactRow> for ContactWithAgency {
    fn from(row: ContactRow) -> Self {
        Self {
            contact: row.contact,
            agency: row.agency_name.map(|name| AgencySummary { name }),
        }
    }
}

// ==================== USAGE ====================
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UsageRecord {
    pub user_id: String,
    pub day: NaiveDate,
    pub count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ==================== IDENTITY ====================
/// Session user resolved from the identity provider's token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentUser {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
}

// ==================== API ====================
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageQuery {
    pub page: i64,
    pub page_size: i64,
}

impl PageQuery {
    /// Offset/limit slice for this page. `page` must already be >= 1.
    pub fn window(&self) -> PageWindow {
        PageWindow {
            offset: (self.page - 1).saturating_mul(self.page_size),
            limit: self.page_size,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub offset: i64,
    pub limit: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub total_pages: i64,
    pub page: i64,
    pub page_size: i64,
}

impl<T> Page<T> {
    pub fn is_out_of_range(&self) -> bool {
        self.page < 1 || (self.total_pages > 0 && self.page > self.total_pages)
    }
}
