//! Page size clamping, offset/cursor resolution and page metadata.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};

use super::error::{ListError, ListResult};

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 100;

const CURSOR_VERSION: u8 = 1;

/// Offset (page number) or cursor based pagination.
///
/// When `cursor` is present it takes precedence over `page`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PaginationRequest {
    /// Page number, starting at 1
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub cursor: Option<String>,
}

impl PaginationRequest {
    pub fn page(page: i64, limit: i64) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
            cursor: None,
        }
    }

    pub fn after(cursor: impl Into<String>, limit: i64) -> Self {
        Self {
            page: None,
            limit: Some(limit),
            cursor: Some(cursor.into()),
        }
    }
}

/// Default and maximum page sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_limit: usize,
    pub max_limit: usize,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_PAGE_SIZE,
            max_limit: MAX_PAGE_SIZE,
        }
    }
}

impl PageLimits {
    /// Effective page size: the default when absent or non-positive,
    /// otherwise the request clamped to `[1, max_limit]`.
    pub fn clamp(&self, requested: Option<i64>) -> usize {
        let max = self.max_limit.max(1);
        match requested {
            Some(limit) if limit > 0 => usize::try_from(limit).unwrap_or(max).min(max),
            _ => self.default_limit.clamp(1, max),
        }
    }

    #[must_use]
    pub fn with_max(mut self, max_limit: usize) -> Self {
        self.max_limit = max_limit;
        self
    }
}

/// Page metadata returned alongside the items.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PaginationResponse {
    pub total_items: usize,
    /// Current page number (1-based)
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub has_next: bool,
    pub has_prev: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev_cursor: Option<String>,
}

/// A resolved window over the candidate set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PageWindow {
    pub offset: usize,
    pub limit: usize,
}

impl PageWindow {
    pub(crate) fn resolve(
        request: Option<&PaginationRequest>,
        limits: PageLimits,
    ) -> ListResult<Self> {
        let Some(request) = request else {
            return Ok(Self {
                offset: 0,
                limit: limits.clamp(None),
            });
        };
        let limit = limits.clamp(request.limit);

        if let Some(token) = request.cursor.as_deref() {
            let offset = decode_cursor(token)?;
            return Ok(Self { offset, limit });
        }

        let page = request.page.unwrap_or(1).max(1);
        let offset = usize::try_from(page - 1)
            .ok()
            .and_then(|p| p.checked_mul(limit))
            .ok_or_else(|| ListError::InvalidPagination {
                field: "page",
                value: page.to_string(),
            })?;
        Ok(Self { offset, limit })
    }

    /// Builds page metadata for a set of `total` candidates of which
    /// `returned` fall inside this window.
    pub(crate) fn describe(&self, total: usize, returned: usize) -> PaginationResponse {
        let has_next = self.offset + returned < total;
        // An empty result has no previous page to step back to.
        let has_prev = self.offset > 0 && total > 0;
        PaginationResponse {
            total_items: total,
            page: self.offset / self.limit + 1,
            page_size: self.limit,
            total_pages: total.div_ceil(self.limit),
            has_next,
            has_prev,
            next_cursor: has_next.then(|| encode_cursor(self.offset + returned)),
            prev_cursor: has_prev.then(|| encode_cursor(self.offset.saturating_sub(self.limit))),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct CursorToken {
    v: u8,
    o: i64,
}

/// Encodes an offset as an opaque continuation token.
pub fn encode_cursor(offset: usize) -> String {
    let token = CursorToken {
        v: CURSOR_VERSION,
        o: i64::try_from(offset).unwrap_or(i64::MAX),
    };
    // Serializing two integers cannot fail.
    let json = serde_json::to_vec(&token).unwrap_or_default();
    URL_SAFE_NO_PAD.encode(json)
}

/// Decodes a token produced by [`encode_cursor`] back into an offset.
///
/// # Errors
/// `InvalidCursor` for malformed tokens, `InvalidPagination` for a
/// negative offset.
pub fn decode_cursor(token: &str) -> ListResult<usize> {
    let invalid = |reason: String| ListError::InvalidCursor {
        token: token.to_string(),
        reason,
    };
    let bytes = URL_SAFE_NO_PAD
        .decode(token)
        .map_err(|e| invalid(e.to_string()))?;
    let decoded: CursorToken =
        serde_json::from_slice(&bytes).map_err(|e| invalid(e.to_string()))?;
    if decoded.v != CURSOR_VERSION {
        return Err(invalid(format!("unsupported cursor version {}", decoded.v)));
    }
    usize::try_from(decoded.o).map_err(|_| ListError::InvalidPagination {
        field: "cursor.offset",
        value: decoded.o.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_defaults_and_bounds() {
        let limits = PageLimits::default();
        assert_eq!(limits.clamp(None), 20);
        assert_eq!(limits.clamp(Some(0)), 20);
        assert_eq!(limits.clamp(Some(-5)), 20);
        assert_eq!(limits.clamp(Some(1)), 1);
        assert_eq!(limits.clamp(Some(50)), 50);
        assert_eq!(limits.clamp(Some(5000)), 100);
    }

    #[test]
    fn test_default_never_exceeds_max() {
        let limits = PageLimits::default().with_max(10);
        assert_eq!(limits.clamp(None), 10);
    }

    #[test]
    fn test_page_below_one_resolves_to_first_page() {
        let window =
            PageWindow::resolve(Some(&PaginationRequest::page(0, 10)), PageLimits::default())
                .unwrap();
        assert_eq!(window, PageWindow { offset: 0, limit: 10 });
    }

    #[test]
    fn test_overflowing_page_is_rejected() {
        let err = PageWindow::resolve(
            Some(&PaginationRequest::page(i64::MAX, 100)),
            PageLimits::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ListError::InvalidPagination { field: "page", .. }));
    }

    #[test]
    fn test_cursor_round_trip() {
        assert_eq!(decode_cursor(&encode_cursor(40)).unwrap(), 40);
    }

    #[test]
    fn test_malformed_cursor() {
        let err = decode_cursor("not a cursor!").unwrap_err();
        assert!(matches!(err, ListError::InvalidCursor { .. }));

        let wrong_version = URL_SAFE_NO_PAD.encode(br#"{"v":9,"o":0}"#);
        assert!(matches!(
            decode_cursor(&wrong_version).unwrap_err(),
            ListError::InvalidCursor { .. }
        ));
    }

    #[test]
    fn test_negative_cursor_offset() {
        let token = URL_SAFE_NO_PAD.encode(br#"{"v":1,"o":-3}"#);
        let err = decode_cursor(&token).unwrap_err();
        assert!(matches!(
            err,
            ListError::InvalidPagination {
                field: "cursor.offset",
                ..
            }
        ));
    }

    #[test]
    fn test_describe_last_page() {
        let window = PageWindow {
            offset: 20,
            limit: 10,
        };
        let meta = window.describe(25, 5);
        assert_eq!(meta.page, 3);
        assert_eq!(meta.total_pages, 3);
        assert!(!meta.has_next);
        assert!(meta.has_prev);
        assert!(meta.next_cursor.is_none());
        assert_eq!(decode_cursor(meta.prev_cursor.as_deref().unwrap()).unwrap(), 10);
    }
}
