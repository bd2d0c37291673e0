//! Core domain concepts shared across all subdomains.
//!
//! - [`question::Question`] — a validated extraction question
//! - [`model::ModelClass`] — context-size class of a provider model
//! - [`error::DomainError`] — domain-level errors

pub mod error;
pub mod model;
pub mod question;
pub mod string;
