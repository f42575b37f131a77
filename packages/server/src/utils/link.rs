/// Why a submitted project link was refused.
#[derive(Debug, PartialEq, Eq)]
pub enum LinkError {
    /// Link is empty or whitespace-only.
    Empty,
    /// Link is longer than [`MAX_LINK_LEN`].
    TooLong,
    /// Link does not start with `http://` or `https://`.
    UnsupportedScheme,
    /// Nothing follows the scheme.
    MissingHost,
    /// Link contains whitespace or control characters.
    InvalidCharacter,
}

pub const MAX_LINK_LEN: usize = 2048;

impl LinkError {
    /// Returns a human-readable error message.
    pub fn message(&self, field: &str) -> String {
        match self {
            Self::Empty => format!("{field} must not be empty"),
            Self::TooLong => format!("{field} must be at most {MAX_LINK_LEN} characters"),
            Self::UnsupportedScheme => format!("{field} must start with http:// or https://"),
            Self::MissingHost => format!("{field} must include a host"),
            Self::InvalidCharacter => {
                format!("{field} must not contain whitespace or control characters")
            }
        }
    }
}

/// Validates an absolute web link and returns it trimmed.
pub fn validate_web_link(link: &str) -> Result<&str, LinkError> {
    let trimmed = link.trim();

    if trimmed.is_empty() {
        return Err(LinkError::Empty);
    }

    if trimmed.len() > MAX_LINK_LEN {
        return Err(LinkError::TooLong);
    }

    if trimmed
        .chars()
        .any(|c| c.is_whitespace() || c.is_control())
    {
        return Err(LinkError::InvalidCharacter);
    }

    let rest = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .ok_or(LinkError::UnsupportedScheme)?;

    let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
    if host.is_empty() {
        return Err(LinkError::MissingHost);
    }

    Ok(trimmed)
}
