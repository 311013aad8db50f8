//! # PeerFolio Common Library
//!
//! Shared code for the PeerFolio review service:
//! - LinkedIn URL normalization and placeholder profile info
//! - Review/report moderation state machine
//! - Directory queries and rating aggregation
//! - Accounts, sessions and input validation
//! - Database schema and queries
//! - Configuration loading

pub mod accounts;
pub mod api;
pub mod config;
pub mod db;
pub mod directory;
pub mod error;
pub mod linkedin;
pub mod moderation;
pub mod rating;
pub mod validation;

pub use error::{Error, Result};
pub use moderation::{ModerationPolicy, ReportDisposition};
