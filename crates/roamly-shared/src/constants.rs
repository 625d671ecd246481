/// Application name
pub const APP_NAME: &str = "Roamly";

/// Default base URL of the content API
pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8000";

/// Quiet interval after the last keystroke before a user lookup is issued
pub const SEARCH_DEBOUNCE_MS: u64 = 300;

/// Queries shorter than this (in characters) never reach the server
pub const MIN_QUERY_CHARS: usize = 2;

/// Maximum number of matches requested per lookup
pub const SEARCH_RESULT_LIMIT: usize = 5;

/// HTTP connect timeout in seconds
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Route the guard redirects unauthenticated visitors to
pub const LOGIN_PATH: &str = "/user/login";
