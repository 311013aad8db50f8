//! Input validation for submissions and registrations
//!
//! Each validator returns a cleaned value or `Error::ValidationFailed` with the
//! message shown to the user.

use crate::api::types::{Registration, ReportSubmission, ReviewSubmission};
use crate::db::Relationship;
use crate::linkedin::normalize_linkedin_url;
use crate::rating::{MAX_RATING, MIN_RATING};
use crate::{Error, Result};
use chrono::{DateTime, Utc};

pub const MIN_REVIEW_CONTENT_CHARS: usize = 20;
pub const MIN_REPORT_REASON_CHARS: usize = 10;
pub const MIN_NAME_CHARS: usize = 2;
pub const MIN_PASSWORD_CHARS: usize = 8;
pub const MAX_TAGS: usize = 10;
pub const MAX_TAG_CHARS: usize = 50;

/// Review submission after validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidReview {
    /// Canonical form, safe to use as a dedup key
    pub linkedin_url: String,
    pub person_name: Option<String>,
    pub person_title: Option<String>,
    pub relationship: Relationship,
    pub rating: i64,
    pub content: String,
    pub is_anonymous: bool,
    pub tags: Vec<String>,
    pub interaction_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidReport {
    pub review_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidRegistration {
    pub name: String,
    /// Lower-cased
    pub email: String,
    pub linkedin_url: String,
    pub password: String,
}

fn invalid(message: &str) -> Error {
    Error::ValidationFailed(message.to_string())
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Validate a review form
pub fn validate_review(input: &ReviewSubmission, now: DateTime<Utc>) -> Result<ValidReview> {
    if input.linkedin_url.trim().is_empty() {
        return Err(invalid("LinkedIn URL is required."));
    }
    let linkedin_url = normalize_linkedin_url(&input.linkedin_url).ok_or_else(|| {
        invalid("Please enter a valid LinkedIn profile URL (https://linkedin.com/in/profile-name).")
    })?;

    let person_name = non_blank(&input.person_name);
    if let Some(name) = &person_name {
        if name.chars().count() < MIN_NAME_CHARS {
            return Err(invalid("Name must be at least 2 characters."));
        }
    }

    let relationship = Relationship::from_str(input.relationship.trim())
        .ok_or_else(|| invalid("Please select your relationship to this person."))?;

    if !(MIN_RATING..=MAX_RATING).contains(&input.rating) {
        return Err(invalid("Please provide a rating between 1 and 5."));
    }

    let content = input.content.trim().to_string();
    if content.chars().count() < MIN_REVIEW_CONTENT_CHARS {
        return Err(invalid(
            "Please provide a detailed review (minimum 20 characters).",
        ));
    }

    let interaction_date = input.interaction_date.unwrap_or(now);
    if interaction_date > now {
        return Err(invalid("Interaction date cannot be in the future."));
    }

    Ok(ValidReview {
        linkedin_url,
        person_name,
        person_title: non_blank(&input.person_title),
        relationship,
        rating: input.rating,
        content,
        is_anonymous: input.is_anonymous,
        tags: clean_tags(&input.tags)?,
        interaction_date,
    })
}

/// Trim, drop blanks and de-duplicate while keeping first-seen order
pub fn clean_tags(tags: &[String]) -> Result<Vec<String>> {
    let mut cleaned: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.trim();
        if tag.is_empty() || cleaned.iter().any(|t| t == tag) {
            continue;
        }
        if tag.chars().count() > MAX_TAG_CHARS {
            return Err(invalid("Tags must be at most 50 characters."));
        }
        cleaned.push(tag.to_string());
    }
    if cleaned.len() > MAX_TAGS {
        return Err(invalid("A review can have at most 10 tags."));
    }
    Ok(cleaned)
}

pub fn validate_report(input: &ReportSubmission) -> Result<ValidReport> {
    let review_id = input.review_id.trim();
    if review_id.is_empty() {
        return Err(invalid("A review must be selected."));
    }
    let reason = input.reason.trim();
    if reason.chars().count() < MIN_REPORT_REASON_CHARS {
        return Err(invalid("Please provide a reason for reporting this review."));
    }
    Ok(ValidReport {
        review_id: review_id.to_string(),
        reason: reason.to_string(),
    })
}

pub fn validate_registration(input: &Registration) -> Result<ValidRegistration> {
    let name = input.name.trim();
    if name.chars().count() < MIN_NAME_CHARS {
        return Err(invalid("Name must be at least 2 characters."));
    }

    let email = input.email.trim().to_lowercase();
    if !looks_like_email(&email) {
        return Err(invalid("Please enter a valid email address."));
    }

    if input.linkedin_url.trim().is_empty() {
        return Err(invalid("LinkedIn URL is required."));
    }
    let linkedin_url = normalize_linkedin_url(&input.linkedin_url).ok_or_else(|| {
        invalid("Please enter a valid LinkedIn profile URL (https://linkedin.com/in/profile-name).")
    })?;

    if input.password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(invalid("Password must be at least 8 characters."));
    }
    if input.password != input.confirm_password {
        return Err(invalid("Passwords do not match."));
    }
    if !input.accept_terms {
        return Err(invalid(
            "You must accept the Terms of Service and Privacy Policy to register.",
        ));
    }

    Ok(ValidRegistration {
        name: name.to_string(),
        email,
        linkedin_url,
        password: input.password.clone(),
    })
}

/// `local@domain.tld` with no whitespace
fn looks_like_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .map(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
                    .unwrap_or(false)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn submission() -> ReviewSubmission {
        ReviewSubmission {
            linkedin_url: "https://linkedin.com/in/Jane-Doe".to_string(),
            person_name: Some("Jane Doe".to_string()),
            person_title: Some("  ".to_string()),
            relationship: "colleague".to_string(),
            rating: 4,
            content: "Thorough, kind reviewer".to_string(),
            is_anonymous: false,
            tags: vec![
                " Leadership ".to_string(),
                "Leadership".to_string(),
                "".to_string(),
                "Mentorship".to_string(),
            ],
            interaction_date: None,
        }
    }

    #[test]
    fn test_valid_review_is_cleaned() {
        let now = Utc::now();
        let review = validate_review(&submission(), now).unwrap();
        assert_eq!(review.linkedin_url, "https://www.linkedin.com/in/jane-doe/");
        assert_eq!(review.person_title, None);
        assert_eq!(review.relationship, Relationship::Colleague);
        assert_eq!(review.tags, vec!["Leadership", "Mentorship"]);
        assert_eq!(review.interaction_date, now);
    }

    #[test]
    fn test_rating_out_of_range() {
        for rating in [0, 6, -1] {
            let mut input = submission();
            input.rating = rating;
            assert!(matches!(
                validate_review(&input, Utc::now()),
                Err(Error::ValidationFailed(_))
            ));
        }
    }

    #[test]
    fn test_short_content_rejected() {
        let mut input = submission();
        // 19 characters once trimmed
        input.content = "   nineteen chars ok!!   ".to_string();
        assert_eq!(input.content.trim().chars().count(), 19);
        assert!(validate_review(&input, Utc::now()).is_err());
    }

    #[test]
    fn test_bad_url_and_relationship() {
        let mut input = submission();
        input.linkedin_url = "https://example.com/jane".to_string();
        assert!(validate_review(&input, Utc::now()).is_err());

        let mut input = submission();
        input.relationship = "boss".to_string();
        assert!(validate_review(&input, Utc::now()).is_err());
    }

    #[test]
    fn test_future_interaction_date_rejected() {
        let now = Utc::now();
        let mut input = submission();
        input.interaction_date = Some(now + Duration::days(2));
        assert!(validate_review(&input, now).is_err());
    }

    #[test]
    fn test_too_many_tags() {
        let tags: Vec<String> = (0..11).map(|i| format!("tag{}", i)).collect();
        assert!(clean_tags(&tags).is_err());
    }

    #[test]
    fn test_report_reason_length() {
        let short = ReportSubmission {
            review_id: "r1".to_string(),
            reason: "  spam   ".to_string(),
        };
        assert!(validate_report(&short).is_err());

        let ok = ReportSubmission {
            review_id: "r1".to_string(),
            reason: "This is harassment".to_string(),
        };
        assert_eq!(validate_report(&ok).unwrap().reason, "This is harassment");
    }

    fn registration() -> Registration {
        Registration {
            name: "Jane Doe".to_string(),
            email: "Jane@Example.com".to_string(),
            linkedin_url: "linkedin.com/in/jane-doe".to_string(),
            password: "correct horse".to_string(),
            confirm_password: "correct horse".to_string(),
            accept_terms: true,
        }
    }

    #[test]
    fn test_registration_normalizes_email_and_url() {
        let valid = validate_registration(&registration()).unwrap();
        assert_eq!(valid.email, "jane@example.com");
        assert_eq!(valid.linkedin_url, "https://www.linkedin.com/in/jane-doe/");
    }

    #[test]
    fn test_registration_rules() {
        let mut input = registration();
        input.confirm_password = "different".to_string();
        assert!(validate_registration(&input).is_err());

        let mut input = registration();
        input.accept_terms = false;
        assert!(validate_registration(&input).is_err());

        let mut input = registration();
        input.password = "short".to_string();
        input.confirm_password = "short".to_string();
        assert!(validate_registration(&input).is_err());
    }

    #[test]
    fn test_email_shape() {
        assert!(looks_like_email("a@b.co"));
        assert!(!looks_like_email("a@b"));
        assert!(!looks_like_email("@b.co"));
        assert!(!looks_like_email("a b@c.de"));
        assert!(!looks_like_email("a@@b.co"));
    }
}
