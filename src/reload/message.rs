//! Hot reload message protocol.
//!
//! Server → client:
//!
//! - `connected`: handshake done, carries the server version
//! - `reload`: artifacts for these bundle keys changed
//! - `error` / `clear_error`: show or hide the build error overlay
//!
//! Client → server:
//!
//! - `redirect`: the page moved from `previous` keys to `keys`
//! - `keys`: the keys the page currently holds

use serde::{Deserialize, Serialize};

use super::RedirectEvent;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum HotReloadMessage {
    Connected {
        version: String,
    },

    Reload {
        keys: Vec<String>,
    },

    Error {
        /// Source file path
        path: String,
        error: String,
    },

    #[serde(rename = "clear_error")]
    ClearError,
}

impl HotReloadMessage {
    pub fn connected() -> Self {
        Self::Connected {
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn reload(keys: Vec<String>) -> Self {
        Self::Reload { keys }
    }

    pub fn error(path: impl Into<String>, error: impl Into<String>) -> Self {
        Self::Error {
            path: path.into(),
            error: error.into(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"reload","keys":[]}"#.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    Redirect {
        keys: Vec<String>,
        #[serde(default)]
        previous: Vec<String>,
    },

    Keys {
        keys: Vec<String>,
    },
}

impl ClientMessage {
    pub fn from_json(s: &str) -> Option<Self> {
        serde_json::from_str(s).ok()
    }

    /// Keys the client holds after this message.
    pub fn keys(&self) -> &[String] {
        match self {
            Self::Redirect { keys, .. } | Self::Keys { keys } => keys,
        }
    }

    pub fn into_redirect(self) -> Option<RedirectEvent> {
        match self {
            Self::Redirect { keys, previous } => Some(RedirectEvent::new(keys, previous)),
            Self::Keys { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_messages() {
        let json = HotReloadMessage::reload(vec!["home_1".into()]).to_json();
        assert_eq!(json, r#"{"type":"reload","keys":["home_1"]}"#);

        let json = HotReloadMessage::error("pages/Home.jsx", "boom").to_json();
        assert!(json.contains(r#""type":"error""#));
        assert!(json.contains(r#""path":"pages/Home.jsx""#));

        assert_eq!(HotReloadMessage::ClearError.to_json(), r#"{"type":"clear_error"}"#);
        assert!(HotReloadMessage::connected().to_json().contains("connected"));
    }

    #[test]
    fn test_client_redirect() {
        let msg = ClientMessage::from_json(
            r#"{"type":"redirect","keys":["a_1","b_2"],"previous":["a_1"]}"#,
        )
        .unwrap();
        assert_eq!(msg.keys(), ["a_1", "b_2"]);
        let event = msg.into_redirect().unwrap();
        assert_eq!(event.changes(), ["b_2"]);
    }

    #[test]
    fn test_client_keys_and_garbage() {
        let msg = ClientMessage::from_json(r#"{"type":"keys","keys":["a_1"]}"#).unwrap();
        assert!(msg.clone().into_redirect().is_none());
        assert_eq!(msg.keys(), ["a_1"]);

        assert!(ClientMessage::from_json("not json").is_none());
        assert!(ClientMessage::from_json(r#"{"type":"patch"}"#).is_none());
        // `previous` defaults to empty.
        let msg = ClientMessage::from_json(r#"{"type":"redirect","keys":["x"]}"#).unwrap();
        assert_eq!(msg.into_redirect().unwrap().changes(), ["x"]);
    }
}
