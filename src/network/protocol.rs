//! JSON control frames exchanged before a session is handed off.

use crate::gate::Capability;
use serde::{Deserialize, Serialize};

/// Frames a client may send while unauthenticated.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientFrame {
    Auth { token: String },
}

/// Frames the server sends to conclude admission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerFrame {
    Authenticated { scope: Capability },
    PermissionDenied { reason: &'static str },
}

impl ServerFrame {
    pub fn to_json(&self) -> String {
        // Serializing these variants cannot fail; fall back to an empty object regardless.
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_auth_frame() {
        let frame: ClientFrame = serde_json::from_str(r#"{"type":"auth","token":"u-1"}"#).unwrap();
        assert_eq!(
            frame,
            ClientFrame::Auth {
                token: "u-1".into()
            }
        );
    }

    #[test]
    fn rejects_unknown_frames() {
        assert!(serde_json::from_str::<ClientFrame>(r#"{"type":"sync","data":[]}"#).is_err());
        assert!(serde_json::from_str::<ClientFrame>(r#"{"token":"u-1"}"#).is_err());
    }

    #[test]
    fn server_frames_serialize() {
        assert_eq!(
            ServerFrame::Authenticated {
                scope: Capability::ReadOnly
            }
            .to_json(),
            r#"{"type":"authenticated","scope":"read-only"}"#
        );
        assert_eq!(
            ServerFrame::PermissionDenied {
                reason: "connection refused"
            }
            .to_json(),
            r#"{"type":"permission-denied","reason":"connection refused"}"#
        );
    }
}
