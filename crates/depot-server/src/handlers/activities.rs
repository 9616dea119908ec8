//! Handlers for the audit trail.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/activities` | `?page&limit&type&item_id&user_id&from&to` |
//! | `GET`  | `/activities/recent` | `?limit`, default 10 |
//! | `GET`  | `/items/{id}/activities` | `?page&limit`; works for deleted items |

use axum::{
  extract::{
    Path, Query, State,
    rejection::{PathRejection, QueryRejection},
  },
  http::StatusCode,
  response::Response,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use depot_core::{
  Error,
  activity::{ActivityAction, ActivityFilter},
  page::PageRequest,
  store::InventoryStore,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::{lenient_int, non_empty};
use crate::{AppState, auth::Authenticated, envelope, error::ApiError};

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  pub page:    Option<String>,
  pub limit:   Option<String>,
  #[serde(rename = "type")]
  pub action:  Option<String>,
  pub item_id: Option<String>,
  pub user_id: Option<String>,
  pub from:    Option<String>,
  pub to:      Option<String>,
}

impl ListParams {
  fn page_request(&self) -> PageRequest {
    PageRequest::new(
      lenient_int(self.page.as_deref()),
      lenient_int(self.limit.as_deref()),
    )
  }

  fn filter(&self) -> Result<ActivityFilter, Error> {
    Ok(ActivityFilter {
      action:       non_empty(&self.action).map(ActivityAction::parse).transpose()?,
      item_id:      non_empty(&self.item_id).map(|s| parse_id("item_id", s)).transpose()?,
      user_id:      non_empty(&self.user_id).map(|s| parse_id("user_id", s)).transpose()?,
      created_from: non_empty(&self.from).map(|s| parse_bound(s, NaiveTime::MIN)).transpose()?,
      created_to:   non_empty(&self.to)
        .map(|s| parse_bound(s, end_of_day()))
        .transpose()?,
    })
  }
}

fn parse_id(field: &str, raw: &str) -> Result<Uuid, Error> {
  Uuid::parse_str(raw).map_err(|_| Error::invalid(format!("{field} must be a UUID")))
}

fn end_of_day() -> NaiveTime {
  NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999).unwrap_or(NaiveTime::MIN)
}

/// Accept an RFC 3339 timestamp, or a bare `YYYY-MM-DD` date pinned to
/// `time_of_day` (UTC).
fn parse_bound(raw: &str, time_of_day: NaiveTime) -> Result<DateTime<Utc>, Error> {
  if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
    return Ok(at.with_timezone(&Utc));
  }
  NaiveDate::parse_from_str(raw, "%Y-%m-%d")
    .map(|date| date.and_time(time_of_day).and_utc())
    .map_err(|_| Error::invalid(format!("{raw:?} is not a date or RFC 3339 timestamp")))
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /activities`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Authenticated(_): Authenticated,
  params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Response, ApiError>
where
  S: InventoryStore + 'static,
{
  let Query(params) = params?;
  let filter = params.filter()?;
  let page = state.activities.list(&filter, params.page_request()).await?;
  Ok(envelope::paginated("Activities retrieved successfully", page))
}

// ─── By item ──────────────────────────────────────────────────────────────────

/// `GET /items/{id}/activities`
pub async fn by_item<S>(
  State(state): State<AppState<S>>,
  Authenticated(_): Authenticated,
  id: Result<Path<Uuid>, PathRejection>,
  params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Response, ApiError>
where
  S: InventoryStore + 'static,
{
  let Path(id) = id?;
  let Query(params) = params?;
  let page = state
    .activities
    .list_by_item(id, params.page_request())
    .await?;
  Ok(envelope::paginated("Item activities retrieved successfully", page))
}

// ─── Recent ───────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct RecentParams {
  pub limit: Option<String>,
}

/// `GET /activities/recent`
pub async fn recent<S>(
  State(state): State<AppState<S>>,
  Authenticated(_): Authenticated,
  params: Result<Query<RecentParams>, QueryRejection>,
) -> Result<Response, ApiError>
where
  S: InventoryStore + 'static,
{
  let Query(params) = params?;
  let activities = state
    .activities
    .recent(lenient_int(params.limit.as_deref()))
    .await?;
  Ok(envelope::success(
    StatusCode::OK,
    "Recent activities retrieved successfully",
    json!({ "count": activities.len(), "activities": activities }),
  ))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn params(query: serde_json::Value) -> ListParams { serde_json::from_value(query).unwrap() }

  #[test]
  fn empty_params_mean_no_filter() {
    let p = params(json!({ "type": "", "item_id": "" }));
    let filter = p.filter().unwrap();
    assert!(filter.action.is_none());
    assert!(filter.item_id.is_none());
    assert_eq!(p.page_request(), PageRequest::default());
  }

  #[test]
  fn unknown_action_is_invalid() {
    let p = params(json!({ "type": "STOCK_TELEPORT" }));
    assert!(matches!(p.filter(), Err(Error::InvalidArgument(_))));
  }

  #[test]
  fn malformed_uuid_is_invalid() {
    let p = params(json!({ "user_id": "42" }));
    assert!(matches!(p.filter(), Err(Error::InvalidArgument(_))));
  }

  #[test]
  fn bare_dates_cover_whole_days() {
    let p = params(json!({ "from": "2024-03-01", "to": "2024-03-02" }));
    let filter = p.filter().unwrap();
    assert_eq!(filter.created_from.unwrap().to_rfc3339(), "2024-03-01T00:00:00+00:00");
    let to = filter.created_to.unwrap();
    assert_eq!(to.date_naive(), NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
    assert_eq!(to.time(), end_of_day());
  }

  #[test]
  fn garbage_paging_falls_back() {
    let p = params(json!({ "page": "zero", "limit": "500" }));
    let req = p.page_request();
    assert_eq!((req.page(), req.limit()), (1, 20));
  }
}
