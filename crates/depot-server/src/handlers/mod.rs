pub mod activities;
pub mod auth;
pub mod items;

/// Parse an optional numeric query value the lenient way: anything that is not
/// an integer counts as absent and falls back to the default.
pub(crate) fn lenient_int(raw: Option<&str>) -> Option<i64> {
  raw.and_then(|s| s.trim().parse().ok())
}

/// Treat an empty query value as absent.
pub(crate) fn non_empty(raw: &Option<String>) -> Option<&str> {
  raw.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
