//! badge_count tool implementation.
//!
//! Derives the attention badge from a snapshot of messages, orders,
//! requests and the signed-in identity.

use outpost_client::badge::{Sources, attention_counters};
use outpost_core::Error;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Parameters for the badge_count tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BadgeCountParams {
    /// `{ messages, orders, requests, identity }`; missing collections are empty.
    pub sources: serde_json::Value,
}

/// Output from the badge_count tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BadgeCountOutput {
    pub unread_messages: u32,
    pub pending_orders: u32,
    pub pending_requests: u32,
    pub total: u32,
}

/// Implementation of the badge_count tool.
pub fn count_impl(params: BadgeCountParams) -> Result<CallToolResult, McpError> {
    let sources: Sources = serde_json::from_value(params.sources)
        .map_err(|e| Error::InvalidInput(format!("malformed badge sources: {e}")))?;
    let counters = attention_counters(&sources);

    json_result(&BadgeCountOutput {
        unread_messages: counters.unread_messages,
        pending_orders: counters.pending_orders,
        pending_requests: counters.pending_requests,
        total: counters.total(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing;
    use serde_json::json;

    fn count(sources: serde_json::Value) -> BadgeCountOutput {
        testing::output(&count_impl(BadgeCountParams { sources }).unwrap())
    }

    #[test]
    fn test_staff_sees_store_wide_items() {
        let output = count(json!({
            "identity": { "uid": "s1", "role": "staff" },
            "messages": [
                { "senderId": "c1", "senderRole": "customer", "read": false },
                { "senderId": "a1", "senderRole": "admin", "read": false },
                { "senderId": "c2", "senderRole": "customer", "read": true }
            ],
            "orders": [{ "id": "o1", "status": "pending" }, { "id": "o2", "status": "shipped" }],
            "requests": [{ "id": "r1", "status": "pending" }]
        }));

        assert_eq!(output.unread_messages, 1);
        assert_eq!(output.pending_orders, 1);
        assert_eq!(output.pending_requests, 1);
        assert_eq!(output.total, 3);
    }

    #[test]
    fn test_customer_counts_only_own_messages() {
        let output = count(json!({
            "identity": { "uid": "c1", "role": "customer" },
            "messages": [
                { "senderId": "s1", "senderRole": "staff", "recipientId": "c1", "read": false },
                { "senderId": "s1", "senderRole": "staff", "recipientId": "c2", "read": false }
            ],
            "orders": [{ "id": "o1", "status": "pending" }]
        }));

        assert_eq!(output.total, 1);
        assert_eq!(output.pending_orders, 0);
    }

    #[test]
    fn test_signed_out_is_zero() {
        assert_eq!(count(json!({})).total, 0);
    }

    #[test]
    fn test_malformed_sources() {
        let err = count_impl(BadgeCountParams { sources: json!({ "orders": 3 }) }).unwrap_err();
        assert_eq!(err.code.0, -32602);
    }
}
