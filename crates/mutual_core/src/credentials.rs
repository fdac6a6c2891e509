use std::fmt;
use std::fs;
use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use uuid::Uuid;

use crate::errors::MutualError;

pub const DEFAULT_CREDENTIALS_FILE: &str = "APIKEY.txt";

const SIGNATURE_METHOD: &str = "HMAC-SHA1";
const OAUTH_VERSION: &str = "1.0";

type HmacSha1 = Hmac<Sha1>;

/// Application and user tokens, one per line in the credentials file.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_secret: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"<redacted>")
            .field("access_token", &self.access_token)
            .field("access_secret", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn new<A, B, C, D>(
        consumer_key: A,
        consumer_secret: B,
        access_token: C,
        access_secret: D,
    ) -> Self
    where
        A: Into<String>,
        B: Into<String>,
        C: Into<String>,
        D: Into<String>,
    {
        Self {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
            access_token: access_token.into(),
            access_secret: access_secret.into(),
        }
    }

    pub fn parse(content: &str) -> Result<Self, MutualError> {
        let lines: Vec<&str> = content.lines().map(str::trim).take(4).collect();
        if lines.len() < 4 {
            return Err(MutualError::Credentials(format!(
                "expected 4 lines (consumer key, consumer secret, access token, access secret), found {}",
                lines.len()
            )));
        }
        if let Some(position) = lines.iter().position(|line| line.is_empty()) {
            return Err(MutualError::Credentials(format!(
                "line {} is empty",
                position + 1
            )));
        }
        Ok(Self::new(lines[0], lines[1], lines[2], lines[3]))
    }

    /// OAuth 1.0a `Authorization` header for one request, signed with HMAC-SHA1.
    ///
    /// `url` is the request URL without its query string; `query` holds the
    /// query parameters, which take part in the signature.
    pub fn authorization_header(
        &self,
        method: &str,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<String, MutualError> {
        let nonce = Uuid::new_v4().simple().to_string();
        let timestamp = Utc::now().timestamp().to_string();
        self.sign_request(method, url, query, &nonce, &timestamp)
    }

    /// Same as [`Credentials::authorization_header`] with a fixed nonce and timestamp.
    pub fn sign_request(
        &self,
        method: &str,
        url: &str,
        query: &[(&str, &str)],
        nonce: &str,
        timestamp: &str,
    ) -> Result<String, MutualError> {
        let oauth_params = [
            ("oauth_consumer_key", self.consumer_key.as_str()),
            ("oauth_nonce", nonce),
            ("oauth_signature_method", SIGNATURE_METHOD),
            ("oauth_timestamp", timestamp),
            ("oauth_token", self.access_token.as_str()),
            ("oauth_version", OAUTH_VERSION),
        ];
        let mut all_params: Vec<(&str, &str)> = oauth_params.to_vec();
        all_params.extend_from_slice(query);
        let signature = self.signature(method, url, &all_params)?;

        let mut header_params: Vec<(&str, &str)> = oauth_params.to_vec();
        header_params.push(("oauth_signature", signature.as_str()));
        header_params.sort_unstable();
        let joined = header_params
            .iter()
            .map(|(key, value)| format!("{key}=\"{}\"", urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join(", ");
        Ok(format!("OAuth {joined}"))
    }

    fn signature(
        &self,
        method: &str,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<String, MutualError> {
        let mut encoded: Vec<(String, String)> = params
            .iter()
            .map(|(key, value)| {
                (
                    urlencoding::encode(key).into_owned(),
                    urlencoding::encode(value).into_owned(),
                )
            })
            .collect();
        encoded.sort();
        let parameter_string = encoded
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&");
        let base_string = format!(
            "{}&{}&{}",
            method.to_ascii_uppercase(),
            urlencoding::encode(url),
            urlencoding::encode(&parameter_string)
        );
        let signing_key = format!(
            "{}&{}",
            urlencoding::encode(&self.consumer_secret),
            urlencoding::encode(&self.access_secret)
        );

        let mut mac = HmacSha1::new_from_slice(signing_key.as_bytes())
            .map_err(|err| MutualError::Credentials(format!("cannot build signing key: {err}")))?;
        mac.update(base_string.as_bytes());
        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }
}

pub fn load_credentials(path: &Path) -> Result<Credentials, MutualError> {
    let content = fs::read_to_string(path).map_err(|err| {
        MutualError::Credentials(format!("cannot read {}: {err}", path.display()))
    })?;
    Credentials::parse(&content)
}
