//! Outstanding-attention badge.
//!
//! The count is a pure function of the latest snapshot of messages, orders,
//! requests and the signed-in identity. [`BadgeAggregator`] re-derives it on
//! every snapshot and projects changes onto its sinks.

pub mod overlay;
pub mod sink;

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::identity::{Identity, Role};

pub use overlay::{IconOverlay, badge_label, render_overlay};
pub use sink::{BadgeApi, BadgeError, BadgeSink, PlatformBadge};

pub const PENDING: &str = "pending";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub sender_id: String,
    pub sender_role: Role,
    #[serde(default)]
    pub recipient_id: Option<String>,
    #[serde(default)]
    pub read: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRequest {
    pub id: String,
    pub status: String,
}

/// Latest view of every collection the badge depends on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sources {
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub orders: Vec<Order>,
    #[serde(default)]
    pub requests: Vec<ProductRequest>,
    #[serde(default)]
    pub identity: Option<Identity>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AttentionCounters {
    pub unread_messages: u32,
    pub pending_orders: u32,
    pub pending_requests: u32,
}

impl AttentionCounters {
    pub fn total(&self) -> u32 {
        self.unread_messages
            .saturating_add(self.pending_orders)
            .saturating_add(self.pending_requests)
    }
}

fn count<T>(items: &[T], predicate: impl Fn(&T) -> bool) -> u32 {
    u32::try_from(items.iter().filter(|item| predicate(item)).count()).unwrap_or(u32::MAX)
}

pub fn attention_counters(sources: &Sources) -> AttentionCounters {
    let Some(identity) = sources.identity.as_ref() else {
        return AttentionCounters::default();
    };

    if identity.role.is_privileged() {
        AttentionCounters {
            unread_messages: count(&sources.messages, |m| !m.read && !m.sender_role.is_privileged()),
            pending_orders: count(&sources.orders, |o| o.status == PENDING),
            pending_requests: count(&sources.requests, |r| r.status == PENDING),
        }
    } else {
        AttentionCounters {
            unread_messages: count(&sources.messages, |m| {
                !m.read && m.sender_role.is_privileged() && m.recipient_id.as_deref() == Some(identity.uid.as_str())
            }),
            ..AttentionCounters::default()
        }
    }
}

pub fn attention_count(sources: &Sources) -> u32 {
    attention_counters(sources).total()
}

pub struct BadgeAggregator {
    sinks: Vec<Arc<dyn BadgeSink>>,
    last: Mutex<Option<u32>>,
}

impl BadgeAggregator {
    pub fn new(sinks: Vec<Arc<dyn BadgeSink>>) -> Self {
        Self { sinks, last: Mutex::new(None) }
    }

    /// Re-derive the count and project it when it differs from the last one.
    ///
    /// The first recompute always projects, so a zero clears any stale badge.
    pub async fn recompute(&self, sources: &Sources) -> u32 {
        let total = attention_count(sources);
        let changed = match self.last.lock() {
            Ok(mut last) => last.replace(total) != Some(total),
            Err(_) => true,
        };
        if !changed {
            return total;
        }

        tracing::debug!(count = total, "badge count changed");
        for sink in &self.sinks {
            match sink.project(total).await {
                Ok(()) => {}
                Err(e @ BadgeError::IconUnavailable(_)) => {
                    tracing::debug!(sink = sink.name(), error = %e, "badge sink skipped")
                }
                Err(e) => tracing::warn!(sink = sink.name(), error = %e, "badge projection failed"),
            }
        }
        total
    }

    /// Recompute on every new snapshot until the sender is dropped.
    pub async fn run(&self, mut sources: watch::Receiver<Sources>) {
        loop {
            let snapshot = sources.borrow_and_update().clone();
            self.recompute(&snapshot).await;
            if sources.changed().await.is_err() {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    fn message(sender: &str, role: Role, recipient: Option<&str>, read: bool) -> Message {
        Message {
            sender_id: sender.into(),
            sender_role: role,
            recipient_id: recipient.map(str::to_string),
            read,
        }
    }

    fn order(status: &str) -> Order {
        Order { id: format!("o-{status}"), status: status.into() }
    }

    fn store_snapshot(identity: Option<Identity>) -> Sources {
        Sources {
            messages: vec![
                message("c1", Role::Customer, None, false),
                message("c2", Role::Customer, None, true),
                message("s1", Role::Staff, Some("c1"), false),
                message("s1", Role::Staff, Some("c2"), false),
                message("a1", Role::Admin, Some("c1"), true),
            ],
            orders: vec![order("pending"), order("shipped"), order("pending")],
            requests: vec![ProductRequest { id: "r1".into(), status: "pending".into() }],
            identity,
        }
    }

    #[test]
    fn test_privileged_counts_store_wide_items() {
        let counters = attention_counters(&store_snapshot(Some(Identity::new("s1", Role::Staff))));
        assert_eq!(counters, AttentionCounters { unread_messages: 1, pending_orders: 2, pending_requests: 1 });
        assert_eq!(counters.total(), 4);
    }

    #[test]
    fn test_customer_counts_own_unread_from_staff() {
        assert_eq!(attention_count(&store_snapshot(Some(Identity::new("c1", Role::Customer)))), 1);
    }

    #[test]
    fn test_signed_out_is_zero() {
        assert_eq!(attention_count(&store_snapshot(None)), 0);
    }

    #[test]
    fn test_recount_is_stable() {
        let snapshot = store_snapshot(Some(Identity::new("a1", Role::Admin)));
        assert_eq!(attention_count(&snapshot), attention_count(&snapshot));
    }

    #[derive(Default)]
    struct FakeSink {
        projected: Mutex<Vec<u32>>,
    }

    #[async_trait]
    impl BadgeSink for FakeSink {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn project(&self, count: u32) -> Result<(), BadgeError> {
            self.projected.lock().unwrap().push(count);
            Ok(())
        }
    }

    struct MissingIcon;

    #[async_trait]
    impl BadgeSink for MissingIcon {
        fn name(&self) -> &'static str {
            "missing-icon"
        }

        async fn project(&self, _: u32) -> Result<(), BadgeError> {
            Err(BadgeError::IconUnavailable("icon.png".into()))
        }
    }

    #[tokio::test]
    async fn test_projects_only_on_change() {
        let sink = Arc::new(FakeSink::default());
        let aggregator = BadgeAggregator::new(vec![sink.clone() as Arc<dyn BadgeSink>]);
        let staff = store_snapshot(Some(Identity::new("s1", Role::Staff)));

        assert_eq!(aggregator.recompute(&staff).await, 4);
        assert_eq!(aggregator.recompute(&staff).await, 4);
        assert_eq!(aggregator.recompute(&store_snapshot(None)).await, 0);

        assert_eq!(sink.projected.lock().unwrap().as_slice(), [4, 0]);
    }

    #[tokio::test]
    async fn test_zero_is_projected_first_time() {
        let sink = Arc::new(FakeSink::default());
        let aggregator = BadgeAggregator::new(vec![Arc::new(MissingIcon) as Arc<dyn BadgeSink>, sink.clone()]);
        let quiet = Sources { identity: Some(Identity::new("s1", Role::Staff)), ..Sources::default() };

        assert_eq!(aggregator.recompute(&quiet).await, 0);
        assert_eq!(sink.projected.lock().unwrap().as_slice(), [0]);
    }

    #[tokio::test]
    async fn test_run_follows_latest_snapshot() {
        let sink = Arc::new(FakeSink::default());
        let aggregator = Arc::new(BadgeAggregator::new(vec![sink.clone() as Arc<dyn BadgeSink>]));
        let (tx, rx) = watch::channel(Sources::default());

        let worker = tokio::spawn({
            let aggregator = aggregator.clone();
            async move { aggregator.run(rx).await }
        });

        tx.send(store_snapshot(Some(Identity::new("c1", Role::Customer)))).unwrap();
        drop(tx);
        worker.await.unwrap();

        assert_eq!(sink.projected.lock().unwrap().last(), Some(&1));
    }
}
