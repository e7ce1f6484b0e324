/// Application constants

// API version
pub const API_VERSION: &str = "v1";

// Contact view quota
pub const DAILY_CONTACT_LIMIT: i32 = 50;

// Pagination
pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

// Identity
pub const SESSION_COOKIE_NAME: &str = "__session";
pub const DEFAULT_SIGN_IN_URL: &str = "/sign-in";

// Reference clock bounds for quota day bucketing (exclusive, in minutes)
pub const MAX_UTC_OFFSET_MINUTES: i32 = 24 * 60;
