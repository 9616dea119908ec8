//! The JSON envelope every response is wrapped in:
//! `{status, code, message, data?, meta?, error?}`.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use depot_core::{ErrorKind, page::Page};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
  pub status:  &'static str,
  pub code:    u16,
  pub message: &'static str,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub data:    Option<T>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub meta:    Option<PaginationMeta>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error:   Option<ErrorBody>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
  pub kind:   ErrorKind,
  pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaginationMeta {
  pub page:        u32,
  pub limit:       u32,
  pub total_items: u64,
  pub total_pages: u64,
  pub has_next:    bool,
  pub has_prev:    bool,
}

impl<T> From<&Page<T>> for PaginationMeta {
  fn from(page: &Page<T>) -> Self {
    Self {
      page:        page.request.page(),
      limit:       page.request.limit(),
      total_items: page.total,
      total_pages: page.total_pages(),
      has_next:    page.has_next(),
      has_prev:    page.has_prev(),
    }
  }
}

pub fn success<T: Serialize>(code: StatusCode, message: &'static str, data: T) -> Response {
  let body = Envelope {
    status:  "success",
    code:    code.as_u16(),
    message,
    data:    Some(data),
    meta:    None,
    error:   None,
  };
  (code, Json(body)).into_response()
}

/// A page of rows as `data` with its pagination `meta`.
pub fn paginated<T: Serialize>(message: &'static str, page: Page<T>) -> Response {
  let meta = PaginationMeta::from(&page);
  let body = Envelope {
    status:  "success",
    code:    StatusCode::OK.as_u16(),
    message,
    data:    Some(page.items),
    meta:    Some(meta),
    error:   None,
  };
  (StatusCode::OK, Json(body)).into_response()
}

pub fn failure(
  code: StatusCode,
  message: &'static str,
  kind: ErrorKind,
  detail: String,
) -> Response {
  let body = Envelope::<()> {
    status:  "error",
    code:    code.as_u16(),
    message,
    data:    None,
    meta:    None,
    error:   Some(ErrorBody { kind, detail }),
  };
  (code, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
  use depot_core::page::PageRequest;

  use super::*;

  #[test]
  fn meta_for_45_rows() {
    let page = Page {
      items:   vec![(); 20],
      total:   45,
      request: PageRequest::new(Some(1), Some(20)),
    };
    assert_eq!(PaginationMeta::from(&page), PaginationMeta {
      page:        1,
      limit:       20,
      total_items: 45,
      total_pages: 3,
      has_next:    true,
      has_prev:    false,
    });
  }

  #[test]
  fn failure_omits_data_and_meta() {
    let body = Envelope::<()> {
      status:  "error",
      code:    404,
      message: "Resource not found",
      data:    None,
      meta:    None,
      error:   Some(ErrorBody { kind: ErrorKind::NotFound, detail: "gone".into() }),
    };
    let json = serde_json::to_value(&body).unwrap();
    assert_eq!(
      json,
      serde_json::json!({
        "status": "error",
        "code": 404,
        "message": "Resource not found",
        "error": { "kind": "not_found", "detail": "gone" },
      })
    );
  }
}
