// src/models/mod.rs
pub mod directory;

pub use directory::{
    Agency,
    AgencySummary,
    ApiResponse,
    Contact,
    ContactRow,
    ContactWithAgency,
    CurrentUser,
    EntityKind,
    Page,
    PageQuery,
    PageWindow,
    UsageRecord,
};
