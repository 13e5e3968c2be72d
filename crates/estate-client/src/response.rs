//! Response envelopes the backend uses

use estate_types::{EstateError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// List endpoints return either a bare array or a page object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListResponse<T> {
    Items(Vec<T>),
    #[serde(rename_all = "camelCase")]
    Page {
        items: Vec<T>,
        #[serde(default)]
        total_count: Option<u64>,
    },
}

impl<T> ListResponse<T> {
    pub fn items(&self) -> &[T] {
        match self {
            ListResponse::Items(items) | ListResponse::Page { items, .. } => items,
        }
    }

    pub fn into_items(self) -> Vec<T> {
        match self {
            ListResponse::Items(items) | ListResponse::Page { items, .. } => items,
        }
    }

    /// Server-side total, falling back to the number of items returned
    pub fn total_count(&self) -> u64 {
        match self {
            ListResponse::Page {
                total_count: Some(total),
                ..
            } => *total,
            _ => self.items().len() as u64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl DeleteResponse {
    /// Empty bodies count as success; `success: false` is a rejected mutation
    pub fn check(value: Value, what: &str) -> Result<()> {
        if value.is_null() {
            return Ok(());
        }
        let response: DeleteResponse = serde_json::from_value(value)?;
        if response.success {
            Ok(())
        } else {
            Err(EstateError::Mutation(
                response
                    .message
                    .unwrap_or_else(|| format!("delete of {} was rejected", what)),
            ))
        }
    }
}
