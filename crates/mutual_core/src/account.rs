use url::Url;

use crate::errors::MutualError;

const PROFILE_HOSTS: [&str; 4] = ["twitter.com", "www.twitter.com", "x.com", "www.x.com"];

/// Accepts `alice`, `@alice` or a profile URL and returns the bare screen name.
pub fn parse_account(input: &str) -> Result<String, MutualError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(MutualError::InvalidAccount("account is empty".to_string()));
    }

    let candidate = if trimmed.contains("://") {
        let url = Url::parse(trimmed)
            .map_err(|err| MutualError::InvalidAccount(format!("cannot parse URL: {err}")))?;
        let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
        if !PROFILE_HOSTS.contains(&host.as_str()) {
            return Err(MutualError::InvalidAccount(format!(
                "unsupported host: {host}"
            )));
        }
        url.path_segments()
            .and_then(|mut segments| segments.find(|segment| !segment.is_empty()))
            .map(str::to_string)
            .ok_or_else(|| MutualError::InvalidAccount("URL has no screen name".to_string()))?
    } else {
        trimmed.trim_start_matches('@').to_string()
    };

    if candidate.is_empty() {
        return Err(MutualError::InvalidAccount("account is empty".to_string()));
    }
    if !candidate
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
    {
        return Err(MutualError::InvalidAccount(format!(
            "screen name contains illegal characters: {candidate}"
        )));
    }
    Ok(candidate)
}
