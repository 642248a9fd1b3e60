/// Channel reference normalisation.
///
/// Users paste channels as `name`, `@name`, `t.me/name`, `https://t.me/name`,
/// web-preview links (`https://t.me/s/name`) or post links
/// (`https://t.me/name/123`). All of them reduce to one canonical username.
use url::Url;

use crate::error::ResolveError;

const CHANNEL_HOSTS: &[&str] = &["t.me", "telegram.me"];

/// Maximum username length accepted.
const MAX_USERNAME_LEN: usize = 32;

/// Reduce a free-text reference to a canonical username (lowercase, no `@`).
pub fn normalize_reference(input: &str) -> Result<String, ResolveError> {
    let trimmed = input.trim();
    let invalid = || ResolveError::InvalidReference(trimmed.to_string());

    let lowered = trimmed.to_ascii_lowercase();
    let candidate = if lowered.starts_with("http://") || lowered.starts_with("https://") {
        username_from_url(trimmed).ok_or_else(invalid)?
    } else if CHANNEL_HOSTS
        .iter()
        .any(|host| lowered.starts_with(&format!("{}/", host)))
    {
        username_from_url(&format!("https://{}", trimmed)).ok_or_else(invalid)?
    } else {
        trimmed.strip_prefix('@').unwrap_or(trimmed).to_string()
    };

    if is_valid_username(&candidate) {
        Ok(candidate.to_ascii_lowercase())
    } else {
        Err(invalid())
    }
}

fn username_from_url(raw: &str) -> Option<String> {
    let url = Url::parse(raw).ok()?;
    let host = url.host_str()?.to_ascii_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    if !CHANNEL_HOSTS.contains(&host) {
        return None;
    }

    let mut segments = url.path_segments()?.filter(|s| !s.is_empty());
    let first = segments.next()?;
    // t.me/s/<name> is the public web preview of a channel
    let name = if first == "s" { segments.next()? } else { first };
    Some(name.strip_prefix('@').unwrap_or(name).to_string())
}

fn is_valid_username(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    first.is_ascii_alphabetic()
        && name.len() <= MAX_USERNAME_LEN
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
