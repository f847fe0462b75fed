//! JSON shapes shared by the server and the client.

use kanban_core::KanbanError;
use serde::{Deserialize, Serialize};

/// Body of every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ErrorBody {
    pub fn message(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: None,
            field: None,
            reason: None,
        }
    }
}

impl From<&KanbanError> for ErrorBody {
    fn from(err: &KanbanError) -> Self {
        let (field, reason) = match err {
            KanbanError::Validation { field, reason } => {
                (Some((*field).to_string()), Some(reason.clone()))
            }
            _ => (None, None),
        };
        Self {
            error: err.to_string(),
            code: Some(err.code().code().to_string()),
            field,
            reason,
        }
    }
}

/// Body of `POST /tickets/:id/comments`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentBody {
    #[serde(default)]
    pub text: String,
}

/// Field names the service reports in validation errors.
const KNOWN_FIELDS: &[&str] = &[
    "title",
    "description",
    "assignee",
    "text",
    "from",
    "fromIndex",
    "status",
    "priority",
    "body",
    "page",
    "limit",
    "id",
];

/// Rebuild a validation error received over the wire.
#[must_use]
pub fn validation_from(body: &ErrorBody) -> KanbanError {
    let field = body
        .field
        .as_deref()
        .and_then(|name| KNOWN_FIELDS.iter().find(|known| **known == name).copied())
        .unwrap_or("request");
    let reason = body.reason.clone().unwrap_or_else(|| body.error.clone());
    KanbanError::validation(field, reason)
}
