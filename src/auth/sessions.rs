//! In-memory bearer-token registry.
//!
//! Tokens are opaque 32-hex strings with an expiry; they live only as long
//! as the process. A restart logs everyone out.

use std::{collections::HashMap, sync::Mutex};

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;

pub struct Sessions {
    ttl: Duration,
    active: Mutex<HashMap<String, Session>>,
}

struct Session {
    user_id: String,
    expires_at: DateTime<Utc>,
}

impl Sessions {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            active: Mutex::new(HashMap::new()),
        }
    }

    /// Issues a fresh token for the given user.
    pub fn issue(&self, user_id: &str) -> String {
        let mut bytes = [0u8; 16];
        rand::rng().fill_bytes(&mut bytes);
        let token: String = bytes.iter().map(|b| format!("{b:02x}")).collect();

        self.active.lock().unwrap().insert(
            token.clone(),
            Session {
                user_id: user_id.to_string(),
                expires_at: Utc::now() + self.ttl,
            },
        );
        token
    }

    /// Resolves an `Authorization` header to a user id. Expired entries
    /// are dropped on touch.
    pub fn authenticate(&self, header: Option<&str>) -> Option<String> {
        let token = header?.strip_prefix("Bearer ")?.trim();
        let mut active = self.active.lock().unwrap();

        match active.get(token) {
            Some(session) if session.expires_at > Utc::now() => Some(session.user_id.clone()),
            Some(_) => {
                active.remove(token);
                None
            }
            None => None,
        }
    }

    /// Forgets a token. Unknown tokens are a silent no-op.
    pub fn revoke(&self, header: Option<&str>) {
        let Some(token) = header.and_then(|h| h.strip_prefix("Bearer ")) else {
            return;
        };
        self.active.lock().unwrap().remove(token.trim());
    }
}
