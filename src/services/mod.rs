// All service modules
pub mod directory_gateway;
pub mod quota_tracker;

// Re-export for convenience
pub use directory_gateway::DirectoryGateway;
pub use quota_tracker::{QuotaOutcome, QuotaStatus, QuotaTracker};
