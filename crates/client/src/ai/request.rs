//! Chat messages and their conversion to the upstream `contents` shape.

use outpost_core::Error;
use serde::{Deserialize, Serialize};

/// A chat message in the generic role model used by callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: ChatContent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    /// Image given as a `data:` URL.
    Image { url: String },
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: ChatContent) -> Self {
        Self { role: role.into(), content }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new("user", ChatContent::Text(text.into()))
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new("assistant", ChatContent::Text(text.into()))
    }
}

/// Upstream request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerateRequest {
    pub contents: Vec<Content>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Content {
    pub role: &'static str,
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

impl GenerateRequest {
    /// `assistant` maps to the upstream `model` role; every other role is sent
    /// as `user`.
    pub fn from_messages(messages: &[ChatMessage]) -> Result<Self, Error> {
        if messages.is_empty() {
            return Err(Error::InvalidInput("at least one message is required".into()));
        }

        let contents = messages
            .iter()
            .map(|message| -> Result<Content, Error> {
                let role = if message.role == "assistant" { "model" } else { "user" };
                let parts = match &message.content {
                    ChatContent::Text(text) => vec![Part::Text { text: text.clone() }],
                    ChatContent::Parts(parts) => parts.iter().map(convert_part).collect::<Result<_, _>>()?,
                };
                Ok(Content { role, parts })
            })
            .collect::<Result<Vec<_>, Error>>()?;

        Ok(Self { contents })
    }
}

fn convert_part(part: &ContentPart) -> Result<Part, Error> {
    match part {
        ContentPart::Text { text } => Ok(Part::Text { text: text.clone() }),
        ContentPart::Image { url } => {
            let inline_data = parse_data_url(url)?;
            Ok(Part::Inline { inline_data })
        }
    }
}

/// Split `data:<mime>;base64,<payload>` into MIME type and payload.
pub fn parse_data_url(url: &str) -> Result<InlineData, Error> {
    let invalid = || Error::InvalidInput("image must be a base64 data URL".into());

    let rest = url.strip_prefix("data:").ok_or_else(invalid)?;
    let (meta, data) = rest.split_once(',').ok_or_else(invalid)?;
    let mime_type = meta.strip_suffix(";base64").ok_or_else(invalid)?;
    if mime_type.is_empty() || data.is_empty() {
        return Err(invalid());
    }

    Ok(InlineData { mime_type: mime_type.to_string(), data: data.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_role_mapping() {
        let messages = [
            ChatMessage::new("system", ChatContent::Text("be brief".into())),
            ChatMessage::user("hi"),
            ChatMessage::assistant("hello"),
        ];
        let request = GenerateRequest::from_messages(&messages).unwrap();
        let roles: Vec<_> = request.contents.iter().map(|c| c.role).collect();
        assert_eq!(roles, ["user", "user", "model"]);
    }

    #[test]
    fn test_mixed_content_wire_shape() {
        let message: ChatMessage = serde_json::from_value(json!({
            "role": "user",
            "content": [
                {"type": "text", "text": "what is this?"},
                {"type": "image", "url": "data:image/jpeg;base64,/9j/4AAQ"}
            ]
        }))
        .unwrap();

        let request = GenerateRequest::from_messages(&[message]).unwrap();
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"contents": [{"role": "user", "parts": [
                {"text": "what is this?"},
                {"inlineData": {"mimeType": "image/jpeg", "data": "/9j/4AAQ"}}
            ]}]})
        );
    }

    #[test]
    fn test_rejects_non_data_image() {
        let message = ChatMessage::new(
            "user",
            ChatContent::Parts(vec![ContentPart::Image { url: "https://shop.test/a.png".into() }]),
        );
        assert!(matches!(GenerateRequest::from_messages(&[message]), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_rejects_empty_conversation() {
        assert!(GenerateRequest::from_messages(&[]).is_err());
    }

    #[test]
    fn test_parse_data_url() {
        let inline = parse_data_url("data:image/png;base64,iVBORw0KGgo=").unwrap();
        assert_eq!(inline.mime_type, "image/png");
        assert_eq!(inline.data, "iVBORw0KGgo=");
        assert!(parse_data_url("data:image/png,raw").is_err());
        assert!(parse_data_url("data:;base64,AAAA").is_err());
    }
}
