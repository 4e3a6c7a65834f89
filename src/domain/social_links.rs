//! Social link validation.

use url::Url;

use super::error::DomainError;

const MAX_PLATFORM_LEN: usize = 40;

/// Lowercase, trimmed platform key (`facebook`, `x`, `youtube`).
pub fn normalize_platform(raw: &str) -> Result<String, DomainError> {
    let platform = raw.trim().to_ascii_lowercase();
    if platform.is_empty() {
        return Err(DomainError::validation("platform", "must not be empty"));
    }
    if platform.len() > MAX_PLATFORM_LEN {
        return Err(DomainError::validation(
            "platform",
            format!("must be at most {MAX_PLATFORM_LEN} characters"),
        ));
    }
    if !platform
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(DomainError::validation(
            "platform",
            "may only contain letters, digits, `-` and `_`",
        ));
    }
    Ok(platform)
}

/// Absolute http(s) URL, returned in its serialized form.
pub fn normalize_url(raw: &str) -> Result<String, DomainError> {
    let url = Url::parse(raw.trim())
        .map_err(|err| DomainError::validation("url", err.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url.to_string()),
        other => Err(DomainError::validation(
            "url",
            format!("scheme `{other}` is not allowed"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_is_trimmed_and_lowercased() {
        assert_eq!(normalize_platform("  Facebook ").unwrap(), "facebook");
    }

    #[test]
    fn platform_rejects_blank_and_symbols() {
        assert!(normalize_platform("   ").is_err());
        assert!(normalize_platform("face book").is_err());
    }

    #[test]
    fn url_requires_http_scheme() {
        assert_eq!(
            normalize_url("https://facebook.com/waterboard").unwrap(),
            "https://facebook.com/waterboard"
        );
        assert!(normalize_url("javascript:alert(1)").is_err());
        assert!(normalize_url("not a url").is_err());
    }
}
