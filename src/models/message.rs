use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::RelayError;

/// One wire frame, shared by every client variant: a tagged type plus a
/// string payload. Authors send `DATA`/`SELECTION` (and legacy `CURSOR`),
/// the server sends `URL` once at creation and relays the rest to viewers.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Message {
    #[serde(rename = "type")]
    pub kind: MessageType,
    pub content: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageType {
    Data,
    Url,
    Resend,
    Selection,
    /// Legacy point-cursor frame (`"<line> <col>"`, 1-based) still emitted
    /// by one older editor plugin; relayed verbatim, never cached.
    Cursor,
}

impl Message {
    pub fn data(content: impl Into<String>) -> Self {
        Self {
            kind: MessageType::Data,
            content: content.into(),
        }
    }

    pub fn url(content: impl Into<String>) -> Self {
        Self {
            kind: MessageType::Url,
            content: content.into(),
        }
    }

    /// A `SELECTION` frame; `None` serializes as the empty string, which
    /// viewers render as "clear the marker".
    pub fn selection(selection: Option<Selection>) -> Self {
        Self {
            kind: MessageType::Selection,
            content: selection.map(|s| s.to_string()).unwrap_or_default(),
        }
    }

    pub fn decode(frame: &str) -> Result<Self, RelayError> {
        serde_json::from_str(frame).map_err(|e| RelayError::MalformedMessage(e.to_string()))
    }

    pub fn encode(&self) -> String {
        // A (unit enum, String) pair cannot fail to serialize.
        serde_json::to_string(self).expect("message serialization cannot fail")
    }
}

/// A selection span in the author's buffer: character offset plus length
/// into the most recent `DATA` text. A zero-length span is a point cursor
/// and is distinct from "no selection" (the empty wire string).
///
/// Offsets are taken on trust from the author; the relay never validates
/// them against the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub start: usize,
    pub length: usize,
}

impl Selection {
    /// Parse `SELECTION` frame content: `"<start> <length>"` decimal, or
    /// the empty string for no selection.
    pub fn parse(content: &str) -> Result<Option<Self>, RelayError> {
        if content.is_empty() {
            return Ok(None);
        }
        let (start, length) = content
            .split_once(' ')
            .ok_or_else(|| RelayError::MalformedMessage(format!("bad selection: {content:?}")))?;
        let start = start
            .parse()
            .map_err(|_| RelayError::MalformedMessage(format!("bad selection start: {start:?}")))?;
        let length = length
            .parse()
            .map_err(|_| RelayError::MalformedMessage(format!("bad selection length: {length:?}")))?;
        Ok(Some(Self { start, length }))
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.start, self.length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_types_serialize_uppercase() {
        let frame = Message::data("hello").encode();
        assert!(frame.contains(r#""type":"DATA""#), "{frame}");
        let frame = Message::url("ws://example/join/abc").encode();
        assert!(frame.contains(r#""type":"URL""#), "{frame}");
        let frame = Message {
            kind: MessageType::Resend,
            content: String::new(),
        }
        .encode();
        assert!(frame.contains(r#""type":"RESEND""#), "{frame}");
    }

    #[test]
    fn decodes_client_frames() {
        let msg = Message::decode(r#"{"type":"SELECTION","content":"0 5"}"#).unwrap();
        assert_eq!(msg.kind, MessageType::Selection);
        assert_eq!(msg.content, "0 5");

        let msg = Message::decode(r#"{"type":"DATA","content":""}"#).unwrap();
        assert_eq!(msg.kind, MessageType::Data);

        let msg = Message::decode(r#"{"type":"CURSOR","content":"3 7"}"#).unwrap();
        assert_eq!(msg.kind, MessageType::Cursor);
    }

    #[test]
    fn rejects_malformed_frames() {
        assert!(Message::decode("not json").is_err());
        assert!(Message::decode(r#"{"type":"DATA"}"#).is_err());
        assert!(Message::decode(r#"{"type":"NOPE","content":""}"#).is_err());
        assert!(Message::decode(r#"{"content":"orphan"}"#).is_err());
    }

    #[test]
    fn selection_parses_and_formats() {
        assert_eq!(Selection::parse("").unwrap(), None);
        assert_eq!(
            Selection::parse("5 0").unwrap(),
            Some(Selection { start: 5, length: 0 })
        );
        assert_eq!(
            Selection::parse("0 5").unwrap(),
            Some(Selection { start: 0, length: 5 })
        );
        assert_eq!(Selection { start: 12, length: 3 }.to_string(), "12 3");
    }

    #[test]
    fn selection_rejects_garbage() {
        assert!(Selection::parse("abc").is_err());
        assert!(Selection::parse("1").is_err());
        assert!(Selection::parse("1 2 3").is_err());
        assert!(Selection::parse("-1 2").is_err());
        assert!(Selection::parse(" ").is_err());
    }

    #[test]
    fn zero_width_selection_is_not_cleared_selection() {
        let cleared = Message::selection(None);
        let caret = Message::selection(Some(Selection { start: 5, length: 0 }));
        assert_eq!(cleared.content, "");
        assert_eq!(caret.content, "5 0");
        assert_ne!(cleared, caret);
    }
}
