//! Profile lookups, search, rankings and the caller's own reviews

use chrono::{Duration, Utc};
use peerfolio_common::api::auth::Session;
use peerfolio_common::api::types::ReviewSubmission;
use peerfolio_common::db::users::{insert_user, NewUser};
use peerfolio_common::db::{open_in_memory, Role};
use peerfolio_common::directory::{
    get_person_by_id, get_person_by_linkedin_url, reviews_about_me, reviews_by_author,
    search_people, top_rated_people, PersonLookup,
};
use peerfolio_common::moderation::submit_review;
use peerfolio_common::{Error, ModerationPolicy};
use sqlx::SqlitePool;

async fn create_user(pool: &SqlitePool, name: &str, linkedin_url: Option<&str>) -> Session {
    let email = format!("{}@example.com", name.to_lowercase());
    let mut conn = pool.acquire().await.unwrap();
    let user = insert_user(
        &mut conn,
        &NewUser {
            name,
            email: &email,
            password_hash: "not-a-real-hash",
            linkedin_url,
            role: Role::User,
            terms_accepted_at: None,
        },
        Utc::now(),
    )
    .await
    .unwrap();
    Session {
        user_id: user.id,
        role: Role::User,
    }
}

async fn review(
    pool: &SqlitePool,
    author: &Session,
    url: &str,
    name: Option<&str>,
    title: Option<&str>,
    rating: i64,
    anonymous: bool,
) -> String {
    let input = ReviewSubmission {
        linkedin_url: url.to_string(),
        person_name: name.map(str::to_string),
        person_title: title.map(str::to_string),
        relationship: "manager".to_string(),
        rating,
        content: "Clear goals, fair feedback and steady support.".to_string(),
        is_anonymous: anonymous,
        tags: vec![],
        interaction_date: Some(Utc::now() - Duration::days(30)),
    };
    submit_review(pool, Some(author), &input, ModerationPolicy::AutoApprove, Utc::now())
        .await
        .unwrap()
        .review
        .id
}

#[tokio::test]
async fn test_unknown_profile_gets_suggestion() {
    let pool = open_in_memory().await.unwrap();

    match get_person_by_linkedin_url(&pool, "https://linkedin.com/in/jane-doe")
        .await
        .unwrap()
    {
        PersonLookup::Unknown {
            linkedin_url,
            suggested,
        } => {
            assert_eq!(linkedin_url, "https://www.linkedin.com/in/jane-doe/");
            let suggested = suggested.unwrap();
            assert_eq!(suggested.name, "Jane Doe");
            assert_eq!(suggested.title, "Software Engineer");
        }
        PersonLookup::Known(_) => panic!("nobody has reviewed Jane yet"),
    }
}

#[tokio::test]
async fn test_profile_hides_anonymous_authors() {
    let pool = open_in_memory().await.unwrap();
    let alice = create_user(&pool, "Alice", None).await;
    let bob = create_user(&pool, "Bob", None).await;

    review(&pool, &alice, "linkedin.com/in/jane-doe", None, None, 4, false).await;
    review(&pool, &bob, "linkedin.com/in/jane-doe", None, None, 5, true).await;

    let PersonLookup::Known(profile) = get_person_by_linkedin_url(&pool, "linkedin.com/in/jane-doe")
        .await
        .unwrap()
    else {
        panic!("Jane should be known");
    };

    assert_eq!(profile.review_count, 2);
    assert_eq!(profile.average_rating, 4.5);
    assert!(profile.suggested.is_some());

    let named: Vec<_> = profile.reviews.iter().filter_map(|r| r.author.as_ref()).collect();
    assert_eq!(named.len(), 1);
    assert_eq!(named[0].name, "Alice");

    let by_id = get_person_by_id(&pool, &profile.person.id).await.unwrap();
    assert_eq!(by_id.review_count, 2);

    assert!(matches!(
        get_person_by_id(&pool, "missing").await,
        Err(Error::NotFound(_))
    ));
}

#[tokio::test]
async fn test_search_matches_name_or_title() {
    let pool = open_in_memory().await.unwrap();
    let alice = create_user(&pool, "Alice", None).await;

    review(&pool, &alice, "linkedin.com/in/jane-doe", Some("Jane Doe"), Some("Data Scientist"), 4, false).await;
    review(&pool, &alice, "linkedin.com/in/john-roe", Some("John Roe"), Some("Sales Lead"), 2, false).await;

    let by_name = search_people(&pool, "JANE").await.unwrap();
    assert_eq!(by_name.len(), 1);
    assert_eq!(by_name[0].person.name.as_deref(), Some("Jane Doe"));
    assert_eq!(by_name[0].average_rating, 4.0);
    assert_eq!(by_name[0].review_count, 1);

    let by_title = search_people(&pool, "sales").await.unwrap();
    assert_eq!(by_title.len(), 1);
    assert_eq!(by_title[0].person.name.as_deref(), Some("John Roe"));

    // LIKE wildcards are matched literally
    assert!(search_people(&pool, "%%").await.unwrap().is_empty());
    assert!(search_people(&pool, "j").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_top_rated_orders_by_average() {
    let pool = open_in_memory().await.unwrap();
    let alice = create_user(&pool, "Alice", None).await;
    let bob = create_user(&pool, "Bob", None).await;

    review(&pool, &alice, "linkedin.com/in/low", None, None, 2, false).await;
    review(&pool, &alice, "linkedin.com/in/high", None, None, 5, false).await;
    review(&pool, &bob, "linkedin.com/in/high", None, None, 4, false).await;
    review(&pool, &bob, "linkedin.com/in/mid", None, None, 3, false).await;

    let top = top_rated_people(&pool, 10).await.unwrap();
    let urls: Vec<_> = top.iter().map(|p| p.person.linkedin_url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            "https://www.linkedin.com/in/high/",
            "https://www.linkedin.com/in/mid/",
            "https://www.linkedin.com/in/low/",
        ]
    );
    assert_eq!(top[0].average_rating, 4.5);

    assert_eq!(top_rated_people(&pool, 1).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_my_reviews_and_received_reviews() {
    let pool = open_in_memory().await.unwrap();
    let alice = create_user(&pool, "Alice", None).await;
    let jane = create_user(&pool, "Jane", Some("https://linkedin.com/in/Jane-Doe")).await;

    let id = review(&pool, &alice, "https://www.linkedin.com/in/jane-doe/", None, None, 5, true).await;

    let mine = reviews_by_author(&pool, Some(&alice)).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].review.id, id);
    assert_eq!(
        mine[0].person.as_ref().unwrap().linkedin_url,
        "https://www.linkedin.com/in/jane-doe/"
    );

    let received = reviews_about_me(&pool, Some(&jane)).await.unwrap();
    assert_eq!(received.len(), 1);
    assert!(received[0].author.is_none());

    assert!(reviews_about_me(&pool, Some(&alice)).await.unwrap().is_empty());
    assert!(matches!(
        reviews_by_author(&pool, None).await,
        Err(Error::Unauthorized(_))
    ));
}
