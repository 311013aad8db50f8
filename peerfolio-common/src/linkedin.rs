//! LinkedIn profile URL canonicalization and placeholder profile info
//!
//! Every lookup, dedup and self-review comparison goes through
//! [`normalize_linkedin_url`]. The canonical form is
//! `https://www.linkedin.com/in/<lowercase-username>/` and nothing else is
//! ever stored as a `people.linkedin_url` key.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Scheme and host used for every canonical URL
pub const CANONICAL_PREFIX: &str = "https://www.linkedin.com/in/";

/// Titles handed out by [`generate_profile_info`], indexed by username length
pub const PROFILE_TITLES: [&str; 8] = [
    "Software Engineer",
    "Product Manager",
    "Data Scientist",
    "UX Designer",
    "Marketing Manager",
    "Project Manager",
    "Business Analyst",
    "Sales Executive",
];

// The username is the whole path segment; it must end at `/`, `?`, `#` or
// the end of input, never part-way through
static PROFILE_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)linkedin\.com/in/([^/?#\s]+)(?:[/?#]|$)")
        .expect("static LinkedIn pattern compiles")
});

/// Placeholder display data derived from a profile URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileInfo {
    pub name: String,
    pub title: String,
}

/// Canonicalize a LinkedIn profile URL
///
/// Returns `None` when the input has no `linkedin.com/in/<username>` segment.
/// Scheme, `www.`, trailing slash, query string, fragment and username case
/// do not affect the result.
///
/// # Examples
/// ```
/// use peerfolio_common::linkedin::normalize_linkedin_url;
///
/// assert_eq!(
///     normalize_linkedin_url("http://linkedin.com/in/Jane-Doe?trk=abc").as_deref(),
///     Some("https://www.linkedin.com/in/jane-doe/")
/// );
/// assert_eq!(normalize_linkedin_url("https://linkedin.com/company/acme"), None);
/// ```
pub fn normalize_linkedin_url(url: &str) -> Option<String> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return None;
    }

    let username = PROFILE_URL.captures(trimmed)?.get(1)?.as_str().to_lowercase();
    Some(format!("{}{}/", CANONICAL_PREFIX, username))
}

/// Username segment of a LinkedIn URL (lower-cased), or `None` if invalid
pub fn extract_linkedin_username(url: &str) -> Option<String> {
    let canonical = normalize_linkedin_url(url)?;
    // https: / "" / www.linkedin.com / in / <username> / ""
    canonical
        .split('/')
        .nth(4)
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
}

/// True if the string contains a recognizable profile URL
pub fn is_valid_linkedin_url(url: &str) -> bool {
    normalize_linkedin_url(url).is_some()
}

/// Canonical URL for display, falling back to the trimmed raw input
///
/// Never use the result as a dedup key; only [`normalize_linkedin_url`]
/// output may be persisted.
pub fn canonical_or_raw(url: &str) -> String {
    normalize_linkedin_url(url).unwrap_or_else(|| url.trim().to_string())
}

/// Derive a placeholder name and title from a profile URL
///
/// Pure: the same username always yields the same name and title.
pub fn generate_profile_info(url: &str) -> Option<ProfileInfo> {
    let username = extract_linkedin_username(url)?;

    let name = username
        .split(|c| c == '-' || c == '_')
        .filter(|part| !part.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ");

    let title = PROFILE_TITLES[username.chars().count() % PROFILE_TITLES.len()].to_string();

    Some(ProfileInfo { name, title })
}

fn capitalize(part: &str) -> String {
    let mut chars = part.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
