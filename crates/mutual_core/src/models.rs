use std::fmt;

use serde::{Deserialize, Serialize};

/// Snapshot of one remote account as returned by the followee listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Profile {
    pub id: u64,
    #[serde(default)]
    pub id_str: String,
    pub screen_name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub friends_count: u64,
    #[serde(default)]
    pub followers_count: u64,
    #[serde(default)]
    pub statuses_count: u64,
    #[serde(default)]
    pub listed_count: u64,
    #[serde(default)]
    pub protected: bool,
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub time_zone: Option<String>,
    #[serde(default)]
    pub created_at: String,
}

impl Profile {
    pub fn export_id(&self) -> String {
        if self.id_str.trim().is_empty() {
            self.id.to_string()
        } else {
            self.id_str.clone()
        }
    }
}

/// Records that `following` follows `follower`, and `follower` is also one of
/// the target account's followees.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MutualPair {
    pub following: String,
    pub follower: String,
}

impl MutualPair {
    pub fn new<A: Into<String>, B: Into<String>>(following: A, follower: B) -> Self {
        Self {
            following: following.into(),
            follower: follower.into(),
        }
    }
}

/// Continuation token of a cursored listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cursor(String);

impl Cursor {
    pub const START: &'static str = "-1";
    pub const END: &'static str = "0";

    pub fn start() -> Self {
        Self(Self::START.to_string())
    }

    pub fn end() -> Self {
        Self(Self::END.to_string())
    }

    pub fn new<T: Into<String>>(token: T) -> Self {
        Self(token.into())
    }

    pub fn is_end(&self) -> bool {
        self.0 == Self::END
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Cursor,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next_cursor: Cursor) -> Self {
        Self { items, next_cursor }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FriendsListPayload {
    #[serde(default)]
    pub users: Vec<Profile>,
    #[serde(default)]
    pub next_cursor_str: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FriendIdsPayload {
    #[serde(default)]
    pub ids: Vec<u64>,
    #[serde(default)]
    pub next_cursor_str: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: String,
}

/// Error body; the API answers with either an `errors` list or a bare `error`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorPayload {
    #[serde(default)]
    pub errors: Vec<ApiErrorDetail>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ApiErrorPayload {
    pub fn describe(&self) -> Option<String> {
        if let Some(first) = self.errors.first() {
            return Some(match first.code {
                Some(code) => format!("{} (code={code})", first.message),
                None => first.message.clone(),
            });
        }
        self.error.clone()
    }
}
