use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION},
    Client, StatusCode,
};
use serde::de::DeserializeOwned;

use crate::credentials::Credentials;
use crate::errors::{ApiError, ApiErrorKind, MutualError};
use crate::models::{
    ApiErrorPayload, Cursor, FriendIdsPayload, FriendsListPayload, Page, Profile,
};
use crate::paginate::FetchMode;

pub const DEFAULT_BASE_URL: &str = "https://api.twitter.com";
pub const FRIENDS_LIST_PATH: &str = "/1.1/friends/list.json";
pub const FRIEND_IDS_PATH: &str = "/1.1/friends/ids.json";

pub const MAX_FRIENDS_PAGE_SIZE: u32 = 200;
pub const MAX_IDS_PAGE_SIZE: u32 = 5000;

pub const DEFAULT_HEADERS: [(&str, &str); 1] = [("user-agent", "mutual-following-list/0.1")];

/// One page of a cursored followee listing.
///
/// Implementations classify every failure into an [`ApiErrorKind`] so callers
/// never inspect transport details.
#[async_trait]
pub trait ListingClient: Send + Sync {
    async fn list_friends_page(
        &self,
        account: &str,
        cursor: Cursor,
    ) -> Result<Page<Profile>, ApiError>;

    async fn list_friend_ids_page(
        &self,
        account: &str,
        cursor: Cursor,
    ) -> Result<Page<u64>, ApiError>;
}

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub timeout: Duration,
    pub base_url: Option<String>,
    pub friends_page_size: u32,
    pub ids_page_size: u32,
    pub extra_headers: HashMap<String, String>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            base_url: None,
            friends_page_size: MAX_FRIENDS_PAGE_SIZE,
            ids_page_size: MAX_IDS_PAGE_SIZE,
            extra_headers: HashMap::new(),
        }
    }
}

#[derive(Clone)]
pub struct TwitterClient {
    client: Client,
    credentials: Credentials,
    base_url: String,
    options: ClientOptions,
}

impl TwitterClient {
    pub fn new(credentials: Credentials, options: ClientOptions) -> Result<Self, MutualError> {
        let mut headers = HeaderMap::new();
        for (name, value) in DEFAULT_HEADERS.iter() {
            headers.insert(
                HeaderName::from_static(name),
                HeaderValue::from_static(value),
            );
        }
        for (key, value) in &options.extra_headers {
            let header_name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|err| MutualError::Other(format!("invalid header name: {err}")))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|err| MutualError::Other(format!("invalid header value: {err}")))?;
            headers.insert(header_name, header_value);
        }

        let client = Client::builder()
            .timeout(options.timeout)
            .default_headers(headers)
            .build()
            .map_err(|err| MutualError::Api(ApiError::from(err)))?;

        let base_url = options
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client,
            credentials,
            base_url,
            options,
        })
    }

    async fn request<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let authorization = self
            .credentials
            .authorization_header("GET", &url, params)
            .map_err(|err| ApiError::new(ApiErrorKind::Other, err.to_string()))?;
        let response = self
            .client
            .get(&url)
            .query(params)
            .header(AUTHORIZATION, authorization)
            .send()
            .await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        if !status.is_success() {
            return Err(classify_failure(status, &bytes));
        }
        serde_json::from_slice(&bytes)
            .map_err(|err| ApiError::protocol(format!("response is not valid JSON: {err}")))
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }
}

#[async_trait]
impl ListingClient for TwitterClient {
    async fn list_friends_page(
        &self,
        account: &str,
        cursor: Cursor,
    ) -> Result<Page<Profile>, ApiError> {
        let count = FetchMode::Profiles.page_size(&self.options).to_string();
        let payload: FriendsListPayload = self
            .request(
                FRIENDS_LIST_PATH,
                &[
                    ("screen_name", account),
                    ("cursor", cursor.as_str()),
                    ("count", count.as_str()),
                ],
            )
            .await?;
        let next_cursor = require_cursor(payload.next_cursor_str)?;
        Ok(Page::new(payload.users, next_cursor))
    }

    async fn list_friend_ids_page(
        &self,
        account: &str,
        cursor: Cursor,
    ) -> Result<Page<u64>, ApiError> {
        let count = FetchMode::Ids.page_size(&self.options).to_string();
        let payload: FriendIdsPayload = self
            .request(
                FRIEND_IDS_PATH,
                &[
                    ("screen_name", account),
                    ("cursor", cursor.as_str()),
                    ("count", count.as_str()),
                ],
            )
            .await?;
        let next_cursor = require_cursor(payload.next_cursor_str)?;
        Ok(Page::new(payload.ids, next_cursor))
    }
}

fn require_cursor(token: Option<String>) -> Result<Cursor, ApiError> {
    match token {
        Some(token) if !token.trim().is_empty() => Ok(Cursor::new(token.trim())),
        _ => Err(ApiError::protocol("response is missing next_cursor_str")),
    }
}

/// Maps a non-success response onto an [`ApiErrorKind`].
pub fn classify_failure(status: StatusCode, body: &[u8]) -> ApiError {
    let payload: ApiErrorPayload = serde_json::from_slice(body).unwrap_or_default();
    let message = payload.describe().unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("unexpected status")
            .to_string()
    });
    let kind = if status == StatusCode::UNAUTHORIZED {
        ApiErrorKind::AuthorizationDenied
    } else {
        ApiErrorKind::Other
    };
    let message = if status == StatusCode::TOO_MANY_REQUESTS {
        format!("rate limit exceeded: {message}")
    } else {
        message
    };
    ApiError::new(kind, message).with_status(status.as_u16())
}
