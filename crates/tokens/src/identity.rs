//! Client identity derivation.

/// Platform reported when the user agent yields nothing usable.
pub const UNKNOWN_PLATFORM: &str = "unknown";

/// Derives the short platform string used for identity matching.
///
/// Takes the first entry of the user agent's first parenthesised comment,
/// falling back to the first product name, then to [`UNKNOWN_PLATFORM`].
///
/// ```
/// use credcore_tokens::identity::platform_from_user_agent;
///
/// assert_eq!(platform_from_user_agent("Mozilla/5.0 (X11; Linux x86_64)"), "X11");
/// assert_eq!(platform_from_user_agent("curl/8.4.0"), "curl");
/// assert_eq!(platform_from_user_agent(""), "unknown");
/// ```
#[must_use]
pub fn platform_from_user_agent(user_agent: &str) -> String {
    first_comment_entry(user_agent)
        .or_else(|| first_product(user_agent))
        .unwrap_or(UNKNOWN_PLATFORM)
        .to_owned()
}

fn first_comment_entry(user_agent: &str) -> Option<&str> {
    let (_, rest) = user_agent.split_once('(')?;
    let (comment, _) = rest.split_once(')')?;
    let entry = comment.split(';').next()?.trim();
    (!entry.is_empty()).then_some(entry)
}

fn first_product(user_agent: &str) -> Option<&str> {
    let token = user_agent.split_whitespace().next()?;
    let name = token.split('/').next()?.trim();
    (!name.is_empty() && !name.starts_with('(')).then_some(name)
}
