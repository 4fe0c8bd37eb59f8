//! Keyword heuristics for notification redaction and sound selection.
//!
//! Everything here is pure so the rules can be tested and swapped without
//! touching dispatch.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Body shown instead of chat content.
pub const MESSAGE_PLACEHOLDER: &str = "You have a new message";

static INVOICE_TITLE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\binvoice\b").unwrap());
static TICKET_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*#\s*[A-Za-z0-9][A-Za-z0-9-]*").unwrap());
static TRAILING_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+\d+\s*$").unwrap());
static CHAT_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(message|messages|chat|reply|replied)\b").unwrap());
static MESSAGE_CONTENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"[0-9$€£¥%@#&*!?.,:;'"()]"#).unwrap());
static NEW_ORDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(new order|order placed|order received|purchase|checkout)\b").unwrap());
static STATUS_UPDATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(status|shipped|delivered|dispatched|updated?|cancell?ed|approved|rejected)\b").unwrap()
});
static ORDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\borders?\b").unwrap());

/// Symbolic sound cue resolved to audio by the external sound player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SoundEvent {
    NewOrder,
    NewMessage,
    StatusUpdate,
    GeneralPush,
}

impl SoundEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            SoundEvent::NewOrder => "newOrder",
            SoundEvent::NewMessage => "newMessage",
            SoundEvent::StatusUpdate => "statusUpdate",
            SoundEvent::GeneralPush => "generalPush",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub sound: SoundEvent,
    pub is_chat: bool,
    /// The body looks like real message content and must not be shown.
    pub should_redact: bool,
}

pub fn classify(title: &str, body: &str, link: Option<&str>) -> Classification {
    let is_chat = link.is_some_and(|l| l.contains("/chat")) || CHAT_TITLE.is_match(title);
    let should_redact = is_chat && MESSAGE_CONTENT.is_match(body);

    let text = format!("{title} {body}");
    let sound = if is_chat {
        SoundEvent::NewMessage
    } else if NEW_ORDER.is_match(&text) {
        SoundEvent::NewOrder
    } else if STATUS_UPDATE.is_match(&text) {
        SoundEvent::StatusUpdate
    } else if ORDER.is_match(&text) {
        SoundEvent::NewOrder
    } else {
        SoundEvent::GeneralPush
    };

    Classification { sound, is_chat, should_redact }
}

/// Remove ticket identifiers from invoice-style titles.
///
/// `"Invoice #A1234 Update"` becomes `"Invoice Update"`; other titles are
/// returned untouched.
pub fn strip_ticket_id(title: &str) -> Cow<'_, str> {
    if !INVOICE_TITLE.is_match(title) {
        return Cow::Borrowed(title);
    }
    let without_tokens = TICKET_TOKEN.replace_all(title, "");
    let without_number = TRAILING_NUMBER.replace(&without_tokens, "");
    let collapsed = without_number.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed == title { Cow::Borrowed(title) } else { Cow::Owned(collapsed) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_ticket_from_invoice_title() {
        assert_eq!(strip_ticket_id("Invoice #A1234 Update"), "Invoice Update");
        assert_eq!(strip_ticket_id("Invoice 20431"), "Invoice");
        assert_eq!(strip_ticket_id("New invoice # 77-B"), "New invoice");
    }

    #[test]
    fn test_strip_leaves_other_titles() {
        assert_eq!(strip_ticket_id("Ticket #A1234 closed"), "Ticket #A1234 closed");
        assert!(matches!(strip_ticket_id("Invoice ready"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_chat_link_with_content_is_redacted() {
        let c = classify("Support", "Your total is $42.50", Some("/customer/chat"));
        assert!(c.is_chat);
        assert!(c.should_redact);
        assert_eq!(c.sound, SoundEvent::NewMessage);
    }

    #[test]
    fn test_chat_title_without_link() {
        let c = classify("New message from Ana", "hello there", None);
        assert!(c.is_chat);
        assert!(!c.should_redact);
    }

    #[test]
    fn test_non_chat_never_redacted() {
        let c = classify("Order shipped", "Tracking 1Z999, arriving Monday.", Some("/orders/9"));
        assert!(!c.is_chat);
        assert!(!c.should_redact);
        assert_eq!(c.sound, SoundEvent::StatusUpdate);
    }

    #[test]
    fn test_sound_selection() {
        assert_eq!(classify("New order received", "", None).sound, SoundEvent::NewOrder);
        assert_eq!(classify("Order #12", "", None).sound, SoundEvent::NewOrder);
        assert_eq!(classify("Invoice #A1 Update", "", None).sound, SoundEvent::StatusUpdate);
        assert_eq!(classify("Weekend sale", "20% off", None).sound, SoundEvent::GeneralPush);
    }

    #[test]
    fn test_placeholder_does_not_trip_heuristic() {
        assert!(!classify("Chat", MESSAGE_PLACEHOLDER, None).should_redact);
    }

    #[test]
    fn test_sound_event_names() {
        assert_eq!(SoundEvent::NewOrder.as_str(), "newOrder");
        assert_eq!(serde_json::to_string(&SoundEvent::GeneralPush).unwrap(), "\"generalPush\"");
    }
}
