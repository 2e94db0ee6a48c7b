use anyhow::Result;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_LIMIT: usize = 100;
pub const MAX_PAGE_LIMIT: usize = 1000;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ApiStatus {
    Ok,
    Error,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ErrorEnvelope {
    pub code: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
    pub hint: Option<String>,
}

impl ErrorEnvelope {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached: Option<bool>,
}

/// Envelope returned by every read operation, over HTTP or from the CLI.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: ApiStatus,
    pub data: serde_json::Value,
    pub error: Option<ErrorEnvelope>,
    #[serde(default)]
    pub meta: ResponseMeta,
}

impl ApiResponse {
    pub fn ok<T: Serialize>(data: &T) -> Result<Self> {
        Ok(Self {
            status: ApiStatus::Ok,
            data: serde_json::to_value(data)?,
            error: None,
            meta: ResponseMeta::default(),
        })
    }

    pub fn error(error: ErrorEnvelope) -> Self {
        Self {
            status: ApiStatus::Error,
            data: serde_json::Value::Null,
            error: Some(error),
            meta: ResponseMeta::default(),
        }
    }

    pub fn with_meta(mut self, meta: ResponseMeta) -> Self {
        self.meta = meta;
        self
    }

    pub fn is_ok(&self) -> bool {
        self.status == ApiStatus::Ok
    }
}

/// Offset pagination as accepted on list endpoints.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl PageRequest {
    pub fn limit(&self) -> usize {
        self.limit
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .clamp(1, MAX_PAGE_LIMIT)
    }

    pub fn offset(&self) -> usize {
        self.offset.unwrap_or(0)
    }

    /// Cut one page out of an already ordered result set.
    pub fn paginate<T>(&self, items: Vec<T>) -> Page<T> {
        let total = items.len();
        let limit = self.limit();
        let offset = self.offset();
        let items = items.into_iter().skip(offset).take(limit).collect();
        Page {
            items,
            total,
            limit,
            offset,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

pub fn serialize_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(Into::into)
}

pub fn serialize_json_pretty<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn page_request_clamps_limit_and_defaults_offset() {
        let req = PageRequest {
            limit: Some(50_000),
            offset: None,
        };
        assert_eq!(req.limit(), MAX_PAGE_LIMIT);
        assert_eq!(req.offset(), 0);

        let req = PageRequest {
            limit: Some(0),
            offset: Some(3),
        };
        assert_eq!(req.limit(), 1);
        assert_eq!(req.offset(), 3);
    }

    #[test]
    fn paginate_reports_total_and_slices_window() {
        let req = PageRequest {
            limit: Some(2),
            offset: Some(1),
        };
        let page = req.paginate(vec!["a", "b", "c", "d"]);
        assert_eq!(page.items, vec!["b", "c"]);
        assert_eq!(page.total, 4);
        assert_eq!(page.limit, 2);
        assert_eq!(page.offset, 1);

        let past_end = PageRequest {
            limit: None,
            offset: Some(10),
        }
        .paginate(vec![1, 2]);
        assert!(past_end.items.is_empty());
        assert_eq!(past_end.total, 2);
    }

    #[test]
    fn error_response_serializes_null_data() {
        let response = ApiResponse::error(
            ErrorEnvelope::new("not_found", "No entity with code 9999999999")
                .with_hint("Check the 10-digit PSGC code"),
        );
        let json: serde_json::Value =
            serde_json::from_str(&serialize_json(&response).unwrap()).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["data"], serde_json::Value::Null);
        assert_eq!(json["error"]["code"], "not_found");
        assert!(!response.is_ok());
    }
}
