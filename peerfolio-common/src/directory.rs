//! Read-side queries: person profiles, search, rankings and "my reviews"
//!
//! Only approved reviews are ever shown about a person. Anonymous reviews
//! are projected without their author.

use crate::api::auth::Session;
use crate::db::models::{Person, Relationship, Review};
use crate::db::{people, reviews, users};
use crate::linkedin::{canonical_or_raw, generate_profile_info, ProfileInfo};
use crate::rating::average_rating;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};

/// Queries shorter than this return no results
pub const MIN_SEARCH_QUERY_CHARS: usize = 2;
pub const SEARCH_RESULT_LIMIT: i64 = 10;
pub const DEFAULT_TOP_RATED_LIMIT: usize = 50;

/// Author shown on a non-anonymous review
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewAuthor {
    pub id: String,
    pub name: String,
}

/// Review as shown to other users
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublicReview {
    pub id: String,
    pub rating: i64,
    pub content: String,
    pub relationship: Relationship,
    pub is_anonymous: bool,
    pub interaction_date: DateTime<Utc>,
    pub tags: Vec<String>,
    /// `None` for anonymous reviews
    pub author: Option<ReviewAuthor>,
    pub created_at: DateTime<Utc>,
}

impl PublicReview {
    fn project(review: Review, author_name: String) -> Self {
        let author = if review.is_anonymous {
            None
        } else {
            Some(ReviewAuthor {
                id: review.author_id.clone(),
                name: author_name,
            })
        };
        Self {
            id: review.id,
            rating: review.rating,
            content: review.content,
            relationship: review.relationship,
            is_anonymous: review.is_anonymous,
            interaction_date: review.interaction_date,
            tags: review.tags,
            author,
            created_at: review.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PersonProfile {
    pub person: Person,
    /// Placeholder name/title derived from the URL while the stored ones are missing
    pub suggested: Option<ProfileInfo>,
    pub average_rating: f64,
    pub review_count: usize,
    pub reviews: Vec<PublicReview>,
}

/// Outcome of a lookup by LinkedIn URL
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PersonLookup {
    Known(PersonProfile),
    /// Nobody has reviewed this profile yet
    Unknown {
        linkedin_url: String,
        suggested: Option<ProfileInfo>,
    },
}

/// Person with rating aggregate, for search results and rankings
#[derive(Debug, Clone, Serialize)]
pub struct PersonSummary {
    pub person: Person,
    pub average_rating: f64,
    pub review_count: usize,
}

/// One of the caller's own reviews with the person it is about
#[derive(Debug, Clone, Serialize)]
pub struct AuthoredReview {
    pub review: Review,
    pub person: Option<Person>,
}

// ========================================
// Person Profiles
// ========================================

pub async fn get_person_by_linkedin_url(db: &SqlitePool, url: &str) -> Result<PersonLookup> {
    let linkedin_url = canonical_or_raw(url);
    let mut conn = db.acquire().await?;

    match people::find_person_by_url(&mut conn, &linkedin_url).await? {
        Some(person) => Ok(PersonLookup::Known(build_profile(&mut conn, person).await?)),
        None => Ok(PersonLookup::Unknown {
            suggested: generate_profile_info(&linkedin_url),
            linkedin_url,
        }),
    }
}

pub async fn get_person_by_id(db: &SqlitePool, id: &str) -> Result<PersonProfile> {
    let mut conn = db.acquire().await?;
    let person = people::find_person_by_id(&mut conn, id)
        .await?
        .ok_or_else(|| Error::NotFound("Person not found.".to_string()))?;
    build_profile(&mut conn, person).await
}

async fn build_profile(conn: &mut SqliteConnection, person: Person) -> Result<PersonProfile> {
    let approved = reviews::list_approved_for_person(conn, &person.id).await?;
    let ratings: Vec<i64> = approved.iter().map(|(r, _)| r.rating).collect();

    let suggested = if person.name.is_none() || person.title.is_none() {
        generate_profile_info(&person.linkedin_url)
    } else {
        None
    };

    Ok(PersonProfile {
        suggested,
        average_rating: average_rating(&ratings),
        review_count: ratings.len(),
        reviews: approved
            .into_iter()
            .map(|(review, author_name)| PublicReview::project(review, author_name))
            .collect(),
        person,
    })
}

// ========================================
// Search and Rankings
// ========================================

/// Case-insensitive substring search on name or title
pub async fn search_people(db: &SqlitePool, query: &str) -> Result<Vec<PersonSummary>> {
    let query = query.trim();
    if query.chars().count() < MIN_SEARCH_QUERY_CHARS {
        return Ok(Vec::new());
    }

    let mut conn = db.acquire().await?;
    let found = people::search_people(&mut conn, query, SEARCH_RESULT_LIMIT).await?;

    let mut results = Vec::with_capacity(found.len());
    for person in found {
        let ratings = people::approved_ratings(&mut conn, &person.id).await?;
        results.push(PersonSummary {
            average_rating: average_rating(&ratings),
            review_count: ratings.len(),
            person,
        });
    }
    Ok(results)
}

/// People with approved reviews, best average first
pub async fn top_rated_people(db: &SqlitePool, limit: usize) -> Result<Vec<PersonSummary>> {
    let mut conn = db.acquire().await?;
    let mut ranked: Vec<PersonSummary> = people::people_with_approved_ratings(&mut conn)
        .await?
        .into_iter()
        .map(|(person, ratings)| PersonSummary {
            average_rating: average_rating(&ratings),
            review_count: ratings.len(),
            person,
        })
        .collect();

    // Ties go to the better-reviewed person
    ranked.sort_by(|a, b| {
        b.average_rating
            .total_cmp(&a.average_rating)
            .then(b.review_count.cmp(&a.review_count))
    });
    ranked.truncate(limit);
    Ok(ranked)
}

// ========================================
// Caller's Own Reviews
// ========================================

/// Reviews the caller wrote, any approval state, newest first
pub async fn reviews_by_author(
    db: &SqlitePool,
    session: Option<&Session>,
) -> Result<Vec<AuthoredReview>> {
    let session = Session::require_user(session, "You must be logged in to view your reviews.")?;
    let mut conn = db.acquire().await?;

    let mut authored = Vec::new();
    for review in reviews::list_by_author(&mut conn, &session.user_id).await? {
        let person = people::find_person_by_id(&mut conn, &review.person_id).await?;
        authored.push(AuthoredReview { review, person });
    }
    Ok(authored)
}

/// Approved reviews about the caller's own LinkedIn profile
pub async fn reviews_about_me(
    db: &SqlitePool,
    session: Option<&Session>,
) -> Result<Vec<PublicReview>> {
    let session = Session::require_user(session, "You must be logged in to view your reviews.")?;
    let mut conn = db.acquire().await?;

    let user = users::find_user_by_id(&mut conn, &session.user_id)
        .await?
        .ok_or_else(|| Error::NotFound("User not found.".to_string()))?;

    let Some(own_url) = user.linkedin_url.as_deref() else {
        return Ok(Vec::new());
    };

    let Some(person) = people::find_person_by_url(&mut conn, &canonical_or_raw(own_url)).await?
    else {
        return Ok(Vec::new());
    };

    Ok(reviews::list_approved_for_person(&mut conn, &person.id)
        .await?
        .into_iter()
        .map(|(review, author_name)| PublicReview::project(review, author_name))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn review(is_anonymous: bool) -> Review {
        let now = Utc::now();
        Review {
            id: "r1".to_string(),
            rating: 4,
            content: "Reliable and thoughtful teammate.".to_string(),
            relationship: Relationship::Colleague,
            is_anonymous,
            is_approved: true,
            interaction_date: now,
            author_id: "u1".to_string(),
            person_id: "p1".to_string(),
            tags: vec!["Teamwork".to_string()],
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_anonymous_review_hides_author() {
        let public = PublicReview::project(review(true), "Alice".to_string());
        assert!(public.author.is_none());
        assert!(public.is_anonymous);
    }

    #[test]
    fn test_named_review_shows_author() {
        let public = PublicReview::project(review(false), "Alice".to_string());
        assert_eq!(
            public.author,
            Some(ReviewAuthor {
                id: "u1".to_string(),
                name: "Alice".to_string()
            })
        );
    }

    #[test]
    fn test_unknown_lookup_serializes_with_status() {
        let lookup = PersonLookup::Unknown {
            linkedin_url: "https://www.linkedin.com/in/jane-doe/".to_string(),
            suggested: generate_profile_info("https://linkedin.com/in/jane-doe"),
        };
        let json = serde_json::to_value(&lookup).unwrap();
        assert_eq!(json["status"], "unknown");
        assert_eq!(json["suggested"]["name"], "Jane Doe");
    }

    #[tokio::test]
    async fn test_short_search_query_returns_nothing() {
        let pool = crate::db::open_in_memory().await.unwrap();
        assert!(search_people(&pool, "a").await.unwrap().is_empty());
        assert!(search_people(&pool, "  ").await.unwrap().is_empty());
    }
}
