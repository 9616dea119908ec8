//! Offset pagination shared by the activity queries.

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// A clamped, 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
  page:  u32,
  limit: u32,
}

impl PageRequest {
  /// Clamp raw caller input: a page below 1 becomes 1, a limit outside
  /// `1..=MAX_PAGE_SIZE` becomes [`DEFAULT_PAGE_SIZE`].
  pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
    let page = page
      .filter(|p| *p >= 1)
      .and_then(|p| u32::try_from(p).ok())
      .unwrap_or(1);
    let limit = limit
      .filter(|l| (1..=i64::from(MAX_PAGE_SIZE)).contains(l))
      .and_then(|l| u32::try_from(l).ok())
      .unwrap_or(DEFAULT_PAGE_SIZE);
    Self { page, limit }
  }

  pub fn page(self) -> u32 { self.page }

  pub fn limit(self) -> u32 { self.limit }

  /// Number of rows to skip.
  pub fn offset(self) -> u64 { u64::from(self.page - 1) * u64::from(self.limit) }
}

impl Default for PageRequest {
  fn default() -> Self { Self::new(None, None) }
}

/// One page of results plus the total number of matching rows.
#[derive(Debug, Clone)]
pub struct Page<T> {
  pub items:   Vec<T>,
  pub total:   u64,
  pub request: PageRequest,
}

impl<T> Page<T> {
  pub fn total_pages(&self) -> u64 { self.total.div_ceil(u64::from(self.request.limit)) }

  pub fn has_next(&self) -> bool { u64::from(self.request.page) < self.total_pages() }

  pub fn has_prev(&self) -> bool { self.request.page > 1 }
}
