//! Foreground notification router.
//!
//! Active while a page has focus. Envelopes become in-app toasts after
//! redaction, and a sound cue is dispatched once the toast is up.

use std::sync::Arc;

use serde::Serialize;

use super::classify::{MESSAGE_PLACEHOLDER, SoundEvent, classify, strip_ticket_id};
use super::{NotifyError, PushMessage};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToastAction {
    pub label: String,
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub title: String,
    pub body: String,
    pub action: Option<ToastAction>,
    pub sound: SoundEvent,
    pub redacted: bool,
}

pub trait ToastSurface: Send + Sync {
    fn show(&self, toast: &Toast) -> Result<(), NotifyError>;
}

/// External player resolving a symbolic event to audio. Fire and forget.
pub trait SoundPlayer: Send + Sync {
    fn play(&self, event: SoundEvent);
}

pub struct ForegroundRouter {
    default_title: String,
    chat_link: String,
    toasts: Arc<dyn ToastSurface>,
    sounds: Arc<dyn SoundPlayer>,
}

impl ForegroundRouter {
    pub fn new(
        default_title: impl Into<String>, chat_link: impl Into<String>, toasts: Arc<dyn ToastSurface>,
        sounds: Arc<dyn SoundPlayer>,
    ) -> Self {
        Self { default_title: default_title.into(), chat_link: chat_link.into(), toasts, sounds }
    }

    /// Apply redaction and action routing to an envelope.
    pub fn compose(&self, message: &PushMessage) -> Toast {
        let raw_title = message.title().unwrap_or(self.default_title.as_str());
        let raw_body = message.body().unwrap_or_default();
        let link = message.link();
        let class = classify(raw_title, raw_body, link);

        let body = if class.should_redact { MESSAGE_PLACEHOLDER } else { raw_body };
        let action = match link {
            Some(link) => Some(link.to_string()),
            None if class.is_chat => Some(self.chat_link.clone()),
            None => None,
        }
        .map(|link| ToastAction { label: "View".to_string(), link });

        Toast {
            title: strip_ticket_id(raw_title).into_owned(),
            body: body.to_string(),
            action,
            sound: class.sound,
            redacted: class.should_redact,
        }
    }

    /// Display the toast, then dispatch the sound cue.
    ///
    /// A display failure is logged; the sound still plays so the user notices
    /// the event.
    pub fn on_message(&self, message: &PushMessage) -> Toast {
        let toast = self.compose(message);
        if let Err(e) = self.toasts.show(&toast) {
            tracing::warn!(error = %e, "failed to show toast");
        }
        tracing::debug!(sound = toast.sound.as_str(), redacted = toast.redacted, "foreground notification");
        self.sounds.play(toast.sound);
        toast
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
        broken: bool,
    }

    impl ToastSurface for Recorder {
        fn show(&self, toast: &Toast) -> Result<(), NotifyError> {
            if self.broken {
                return Err(NotifyError::Display("no container".into()));
            }
            self.events.lock().unwrap().push(format!("toast:{}", toast.title));
            Ok(())
        }
    }

    impl SoundPlayer for Recorder {
        fn play(&self, event: SoundEvent) {
            self.events.lock().unwrap().push(format!("sound:{}", event.as_str()));
        }
    }

    fn router(recorder: Arc<Recorder>) -> ForegroundRouter {
        ForegroundRouter::new("New notification", "/chat", recorder.clone(), recorder)
    }

    fn envelope(json: &str) -> PushMessage {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_invoice_title_is_stripped() {
        let toast = router(Arc::default())
            .compose(&envelope(r#"{"notification": {"title": "Invoice #A1234 Update", "body": "..."}}"#));
        assert_eq!(toast.title, "Invoice Update");
        assert!(!toast.redacted);
    }

    #[test]
    fn test_chat_content_is_replaced() {
        let toast = router(Arc::default())
            .compose(&envelope(r#"{"data": {"link": "/customer/chat", "body": "Your total is $42.50"}}"#));
        assert_eq!(toast.body, MESSAGE_PLACEHOLDER);
        assert!(toast.redacted);
        assert_eq!(toast.action, Some(ToastAction { label: "View".into(), link: "/customer/chat".into() }));
        assert_eq!(toast.sound, SoundEvent::NewMessage);
    }

    #[test]
    fn test_chat_without_link_gets_default_action() {
        let toast = router(Arc::default()).compose(&envelope(r#"{"notification": {"title": "New message"}}"#));
        assert_eq!(toast.action.map(|a| a.link), Some("/chat".to_string()));
    }

    #[test]
    fn test_plain_notification_has_no_action() {
        let toast = router(Arc::default())
            .compose(&envelope(r#"{"notification": {"title": "Weekend sale", "body": "Save 20%!"}}"#));
        assert_eq!(toast.action, None);
        assert_eq!(toast.body, "Save 20%!");
        assert_eq!(toast.sound, SoundEvent::GeneralPush);
    }

    #[test]
    fn test_sound_follows_display() {
        let recorder = Arc::new(Recorder::default());
        router(recorder.clone()).on_message(&envelope(r#"{"notification": {"title": "New order received"}}"#));
        assert_eq!(
            recorder.events.lock().unwrap().as_slice(),
            ["toast:New order received".to_string(), "sound:newOrder".to_string()]
        );
    }

    #[test]
    fn test_display_failure_still_plays_sound() {
        let recorder = Arc::new(Recorder { broken: true, ..Default::default() });
        let toast = router(recorder.clone()).on_message(&envelope("{}"));
        assert_eq!(toast.title, "New notification");
        assert_eq!(recorder.events.lock().unwrap().as_slice(), ["sound:generalPush".to_string()]);
    }
}
