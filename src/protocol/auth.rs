use std::fmt::Debug;

use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Account credentials for a single machine. Immutable once built.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    serial_number: String,
    token: String,
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("serial_number", &self.serial_number)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn new(
        username: impl Into<String>,
        serial_number: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Credentials {
            username: username.into(),
            serial_number: serial_number.into(),
            token: token.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn serial_number(&self) -> &str {
        &self.serial_number
    }

    /// Builds the authentication payload: `base64(username:serial)@base64(token)`, as ASCII.
    pub fn auth_payload(&self) -> Vec<u8> {
        let user = STANDARD.encode(format!("{}:{}", self.username, self.serial_number));
        let token = STANDARD.encode(&self.token);
        format!("{}@{}", user, token).into_bytes()
    }
}
