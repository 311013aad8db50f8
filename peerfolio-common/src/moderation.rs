//! Review and report lifecycle
//!
//! Review: PENDING (`is_approved = false`) -> APPROVED, or hard-deleted on
//! rejection. Report: OPEN (`resolved = false`) -> RESOLVED, optionally
//! deleting the reported review.
//!
//! Every transition that reads before it writes runs in a single
//! `BEGIN IMMEDIATE` transaction, so concurrent writers queue on the busy
//! timeout instead of failing a read-to-write upgrade. Deleting a review
//! resolves every open report that points at it in the same transaction, so
//! an open report never references a missing review.

use crate::api::auth::Session;
use crate::api::types::{ReportSubmission, ReviewSubmission};
use crate::db::models::{Person, Report, Review};
use crate::db::{people, reports, reviews, tags, users};
use crate::linkedin::normalize_linkedin_url;
use crate::validation::{validate_report, validate_review, ValidReview};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use tracing::{info, warn};

/// Initial state of new (and edited) reviews
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationPolicy {
    /// Reviews are visible immediately; admins moderate after the fact
    #[default]
    AutoApprove,
    /// Reviews start PENDING until an admin approves them
    RequireApproval,
}

impl ModerationPolicy {
    fn approved_on_create(&self) -> bool {
        matches!(self, ModerationPolicy::AutoApprove)
    }
}

/// What an admin does with a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportDisposition {
    /// Close the report, keep the review
    Ignore,
    /// Delete the review, then close the report
    RemoveReview,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmittedReview {
    pub review: Review,
    pub person: Person,
}

#[derive(Debug, Clone, Serialize)]
pub struct RejectedReview {
    pub review_id: String,
    /// Open reports closed along with the deletion
    pub reports_resolved: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolvedReport {
    pub report: Report,
    pub review_removed: bool,
    /// Other open reports on the same review closed by the removal
    pub other_reports_resolved: u64,
}

/// Name and email of an account, as shown in the admin queues
#[derive(Debug, Clone, Serialize)]
pub struct AccountSummary {
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PendingReview {
    pub review: Review,
    pub author: Option<AccountSummary>,
    pub person: Option<Person>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OpenReport {
    pub report: Report,
    pub reporter: Option<AccountSummary>,
    pub review: Option<PendingReview>,
}

/// One page of an admin queue
#[derive(Debug, Clone, Serialize)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub total: i64,
}

// ========================================
// Author Transitions
// ========================================

/// Create a review about the person behind `input.linkedin_url`
pub async fn submit_review(
    db: &SqlitePool,
    session: Option<&Session>,
    input: &ReviewSubmission,
    policy: ModerationPolicy,
    now: DateTime<Utc>,
) -> Result<SubmittedReview> {
    let session = Session::require_user(session, "You must be logged in to submit a review.")?;
    let valid = validate_review(input, now)?;

    let mut tx = begin_write(db).await?;

    ensure_not_self_review(&mut tx, &session.user_id, &valid.linkedin_url).await?;

    if let Some(existing) = people::find_person_by_url(&mut tx, &valid.linkedin_url).await? {
        if let Some(existing_review_id) =
            reviews::find_review_id_by_pair(&mut tx, &session.user_id, &existing.id).await?
        {
            return Err(Error::DuplicateReview { existing_review_id });
        }
    }

    let person = people::upsert_person(
        &mut tx,
        &valid.linkedin_url,
        valid.person_name.as_deref(),
        valid.person_title.as_deref(),
        now,
    )
    .await?;

    let review_id = match reviews::insert_review(
        &mut tx,
        &session.user_id,
        &person.id,
        &fields(&valid),
        policy.approved_on_create(),
        now,
    )
    .await
    {
        Ok(id) => id,
        Err(Error::StoreConflict(_)) => {
            // Lost a race with a concurrent submission for the same pair
            let existing_review_id =
                reviews::find_review_id_by_pair(&mut tx, &session.user_id, &person.id)
                    .await?
                    .ok_or_else(|| Error::Internal("Review conflict without existing review".to_string()))?;
            return Err(Error::DuplicateReview { existing_review_id });
        }
        Err(e) => return Err(e),
    };

    tags::replace_review_tags(&mut tx, &review_id, &valid.tags).await?;

    let review = reviews::find_review(&mut tx, &review_id)
        .await?
        .ok_or_else(|| Error::Internal(format!("Review {} vanished after insert", review_id)))?;

    tx.commit().await?;

    info!(
        "Review {} submitted by {} for {} (approved: {})",
        review.id, session.user_id, person.linkedin_url, review.is_approved
    );
    Ok(SubmittedReview { review, person })
}

/// Update the author's own review in place
///
/// The reviewed person cannot change; the tag set is replaced, not merged.
pub async fn edit_review(
    db: &SqlitePool,
    session: Option<&Session>,
    review_id: &str,
    input: &ReviewSubmission,
    policy: ModerationPolicy,
    now: DateTime<Utc>,
) -> Result<Review> {
    let session = Session::require_user(session, "You must be logged in to edit a review.")?;
    let valid = validate_review(input, now)?;

    let mut tx = begin_write(db).await?;

    let existing = reviews::find_review(&mut tx, review_id)
        .await?
        .ok_or_else(|| Error::NotFound("Review not found.".to_string()))?;

    if existing.author_id != session.user_id {
        return Err(Error::Unauthorized(
            "You can only edit your own reviews.".to_string(),
        ));
    }

    let person = people::find_person_by_id(&mut tx, &existing.person_id)
        .await?
        .ok_or_else(|| Error::Internal(format!("Review {} has no person", review_id)))?;

    if person.linkedin_url != valid.linkedin_url {
        return Err(Error::ImmutableSubject);
    }

    ensure_not_self_review(&mut tx, &session.user_id, &valid.linkedin_url).await?;

    let is_approved = match policy {
        ModerationPolicy::AutoApprove => existing.is_approved,
        ModerationPolicy::RequireApproval => false,
    };
    reviews::update_review(&mut tx, review_id, &fields(&valid), is_approved, now).await?;
    tags::replace_review_tags(&mut tx, review_id, &valid.tags).await?;

    let review = reviews::find_review(&mut tx, review_id)
        .await?
        .ok_or_else(|| Error::NotFound("Review not found.".to_string()))?;

    tx.commit().await?;

    info!("Review {} edited by its author", review_id);
    Ok(review)
}

/// Lodge a complaint against a review
pub async fn report_review(
    db: &SqlitePool,
    session: Option<&Session>,
    input: &ReportSubmission,
    now: DateTime<Utc>,
) -> Result<Report> {
    let session = Session::require_user(session, "You must be logged in to report a review.")?;
    let valid = validate_report(input)?;

    // Existence check and insert share the write lock, so a concurrent
    // deletion cannot leave this report pointing at nothing
    let mut tx = begin_write(db).await?;

    if reviews::find_review(&mut tx, &valid.review_id).await?.is_none() {
        return Err(Error::NotFound("Review not found.".to_string()));
    }

    let report =
        reports::insert_report(&mut tx, &session.user_id, &valid.review_id, &valid.reason, now)
            .await?;

    tx.commit().await?;

    info!("Review {} reported by {}", valid.review_id, session.user_id);
    Ok(report)
}

// ========================================
// Admin Transitions
// ========================================

/// PENDING -> APPROVED
pub async fn approve_review(
    db: &SqlitePool,
    session: Option<&Session>,
    review_id: &str,
    now: DateTime<Utc>,
) -> Result<Review> {
    let admin = Session::require_admin(session)?;
    let mut conn = db.acquire().await?;

    if !reviews::set_approved(&mut conn, review_id, true, now).await? {
        return Err(Error::NotFound("Review not found.".to_string()));
    }

    let review = reviews::find_review(&mut conn, review_id)
        .await?
        .ok_or_else(|| Error::NotFound("Review not found.".to_string()))?;

    info!("Review {} approved by {}", review_id, admin.user_id);
    Ok(review)
}

/// Hard-delete a review and close every open report on it
pub async fn reject_review(
    db: &SqlitePool,
    session: Option<&Session>,
    review_id: &str,
    now: DateTime<Utc>,
) -> Result<RejectedReview> {
    let admin = Session::require_admin(session)?;
    let mut tx = begin_write(db).await?;

    let reports_resolved =
        reports::resolve_all_for_review(&mut tx, review_id, &admin.user_id, now).await?;

    if !reviews::delete_review(&mut tx, review_id).await? {
        return Err(Error::NotFound("Review not found.".to_string()));
    }

    tx.commit().await?;

    info!(
        "Review {} rejected by {} ({} open reports resolved)",
        review_id, admin.user_id, reports_resolved
    );
    Ok(RejectedReview {
        review_id: review_id.to_string(),
        reports_resolved,
    })
}

/// OPEN -> RESOLVED, optionally deleting the reported review first
pub async fn resolve_report(
    db: &SqlitePool,
    session: Option<&Session>,
    report_id: &str,
    disposition: ReportDisposition,
    now: DateTime<Utc>,
) -> Result<ResolvedReport> {
    let admin = Session::require_admin(session)?;
    let mut tx = begin_write(db).await?;

    let report = reports::find_report(&mut tx, report_id)
        .await?
        .ok_or_else(|| Error::NotFound("Report not found.".to_string()))?;

    let mut review_removed = false;
    let mut other_reports_resolved = 0;

    if disposition == ReportDisposition::RemoveReview {
        review_removed = reviews::delete_review(&mut tx, &report.review_id).await?;
        if !review_removed {
            warn!(
                "Report {} points at review {} which no longer exists",
                report_id, report.review_id
            );
        }
        if !report.resolved {
            reports::mark_resolved(&mut tx, report_id, &admin.user_id, now).await?;
        }
        other_reports_resolved =
            reports::resolve_all_for_review(&mut tx, &report.review_id, &admin.user_id, now)
                .await?;
    } else if !report.resolved {
        reports::mark_resolved(&mut tx, report_id, &admin.user_id, now).await?;
    }

    let report = reports::find_report(&mut tx, report_id)
        .await?
        .ok_or_else(|| Error::NotFound("Report not found.".to_string()))?;

    tx.commit().await?;

    info!(
        "Report {} resolved by {} (review removed: {})",
        report_id, admin.user_id, review_removed
    );
    Ok(ResolvedReport {
        report,
        review_removed,
        other_reports_resolved,
    })
}

// ========================================
// Admin Queues
// ========================================

/// Number of reviews awaiting approval
pub async fn count_pending_reviews(db: &SqlitePool, session: Option<&Session>) -> Result<i64> {
    Session::require_admin(session)?;
    let mut conn = db.acquire().await?;
    reviews::count_pending(&mut conn).await
}

/// Number of unresolved reports
pub async fn count_open_reports(db: &SqlitePool, session: Option<&Session>) -> Result<i64> {
    Session::require_admin(session)?;
    let mut conn = db.acquire().await?;
    reports::count_open(&mut conn).await
}

/// Reviews awaiting approval, oldest first
pub async fn list_pending_reviews(
    db: &SqlitePool,
    session: Option<&Session>,
    limit: i64,
    offset: i64,
) -> Result<Listing<PendingReview>> {
    Session::require_admin(session)?;
    let mut conn = db.acquire().await?;

    let total = reviews::count_pending(&mut conn).await?;
    let mut items = Vec::new();
    for review in reviews::list_pending(&mut conn, limit, offset).await? {
        items.push(pending_entry(&mut conn, review).await?);
    }
    Ok(Listing { items, total })
}

/// Unresolved reports, oldest first, with reporter and reported review
pub async fn list_open_reports(
    db: &SqlitePool,
    session: Option<&Session>,
    limit: i64,
    offset: i64,
) -> Result<Listing<OpenReport>> {
    Session::require_admin(session)?;
    let mut conn = db.acquire().await?;

    let total = reports::count_open(&mut conn).await?;
    let mut items = Vec::new();
    for report in reports::list_open(&mut conn, limit, offset).await? {
        let reporter = account_summary(&mut conn, &report.reporter_id).await?;
        let review = match reviews::find_review(&mut conn, &report.review_id).await? {
            Some(review) => Some(pending_entry(&mut conn, review).await?),
            None => None,
        };
        items.push(OpenReport {
            report,
            reporter,
            review,
        });
    }
    Ok(Listing { items, total })
}

// ========================================
// Helpers
// ========================================

/// Transaction holding the database write lock from its first statement
async fn begin_write(db: &SqlitePool) -> Result<Transaction<'static, Sqlite>> {
    Ok(db.begin_with("BEGIN IMMEDIATE").await?)
}

fn fields(valid: &ValidReview) -> reviews::ReviewFields<'_> {
    reviews::ReviewFields {
        rating: valid.rating,
        content: &valid.content,
        relationship: valid.relationship,
        is_anonymous: valid.is_anonymous,
        interaction_date: valid.interaction_date,
    }
}

/// `SelfReview` if the author's own LinkedIn URL is the target
async fn ensure_not_self_review(
    conn: &mut SqliteConnection,
    author_id: &str,
    target_url: &str,
) -> Result<()> {
    let author = users::find_user_by_id(conn, author_id)
        .await?
        .ok_or_else(|| Error::Unauthorized("Your account no longer exists.".to_string()))?;

    if let Some(own) = author.linkedin_url.as_deref() {
        let own = normalize_linkedin_url(own).unwrap_or_else(|| own.trim().to_string());
        if own == target_url {
            return Err(Error::SelfReview);
        }
    }
    Ok(())
}

async fn account_summary(
    conn: &mut SqliteConnection,
    user_id: &str,
) -> Result<Option<AccountSummary>> {
    Ok(users::find_user_by_id(conn, user_id)
        .await?
        .map(|u| AccountSummary {
            id: u.id,
            name: u.name,
            email: u.email,
        }))
}

async fn pending_entry(conn: &mut SqliteConnection, review: Review) -> Result<PendingReview> {
    let author = account_summary(&mut *conn, &review.author_id).await?;
    let person = people::find_person_by_id(&mut *conn, &review.person_id).await?;
    Ok(PendingReview {
        review,
        author,
        person,
    })
}
