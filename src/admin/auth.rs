//! HTTP Basic authentication for the admin listener.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Realm announced in `WWW-Authenticate`.
pub const REALM: &str = "Admin Interface";

/// The username/password pair the admin page accepts.
#[derive(Debug, Clone)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Checks an `Authorization` header value such as `Basic YWRtaW46cHc=`.
    pub fn verify(&self, authorization: Option<&str>) -> bool {
        let Some((user, pass)) = authorization.and_then(decode_basic) else {
            return false;
        };

        let user_ok = constant_time_eq(user.as_bytes(), self.username.as_bytes());
        let pass_ok = constant_time_eq(pass.as_bytes(), self.password.as_bytes());
        user_ok & pass_ok
    }

    pub fn challenge() -> String {
        format!("Basic realm=\"{}\"", REALM)
    }
}

/// Decodes `Basic <base64(user:pass)>` into its two halves.
pub fn decode_basic(header: &str) -> Option<(String, String)> {
    let (scheme, encoded) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, pass) = decoded.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
