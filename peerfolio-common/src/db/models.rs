//! Database models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    /// Value stored in `users.role`
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }

    /// Parse the stored value; unknown values fall back to the least privileged role
    pub fn from_db(value: &str) -> Self {
        match value {
            "ADMIN" => Role::Admin,
            _ => Role::User,
        }
    }
}

/// How the author knows the reviewed person
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relationship {
    Mentor,
    Interviewer,
    Manager,
    Colleague,
    Employee,
    Client,
    Consultant,
    Other,
}

impl Relationship {
    pub const ALL: [Relationship; 8] = [
        Relationship::Mentor,
        Relationship::Interviewer,
        Relationship::Manager,
        Relationship::Colleague,
        Relationship::Employee,
        Relationship::Client,
        Relationship::Consultant,
        Relationship::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Relationship::Mentor => "mentor",
            Relationship::Interviewer => "interviewer",
            Relationship::Manager => "manager",
            Relationship::Colleague => "colleague",
            Relationship::Employee => "employee",
            Relationship::Client => "client",
            Relationship::Consultant => "consultant",
            Relationship::Other => "other",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|r| r.as_str() == value)
    }
}

/// Registered account (password hash never leaves the db layer)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub linkedin_url: Option<String>,
    pub role: Role,
    pub terms_accepted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Reviewable subject keyed by canonical LinkedIn URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: String,
    pub linkedin_url: String,
    pub name: Option<String>,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    pub rating: i64,
    pub content: String,
    pub relationship: Relationship,
    pub is_anonymous: bool,
    pub is_approved: bool,
    pub interaction_date: DateTime<Utc>,
    pub author_id: String,
    pub person_id: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: String,
    pub reason: String,
    pub resolved: bool,
    pub reporter_id: String,
    /// Kept after the review is deleted
    pub review_id: String,
    pub resolved_by: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relationship_round_trip_names() {
        for rel in Relationship::ALL {
            assert_eq!(Relationship::from_str(rel.as_str()), Some(rel));
        }
        assert_eq!(Relationship::from_str("boss"), None);
    }

    #[test]
    fn test_unknown_role_is_user() {
        assert_eq!(Role::from_db("ADMIN"), Role::Admin);
        assert_eq!(Role::from_db("SUPERUSER"), Role::User);
    }

    #[test]
    fn test_relationship_serde_lowercase() {
        let json = serde_json::to_string(&Relationship::Colleague).unwrap();
        assert_eq!(json, "\"colleague\"");
    }
}
