//! Validation and sanitization of leaderboard records.
//!
//! Raw records are untyped JSON. Each field is checked against a declarative
//! rule table; text is HTML-escaped before it is checked or stored, so nothing
//! that leaves this crate (including error messages) carries live markup.

pub mod engine;
pub mod error;
pub mod rules;
pub mod sanitize;

pub use engine::{BatchReport, EntryWarnings, RejectedEntry, SanitizedEntry, ValidationReport, Validator};
pub use error::ValidationError;
pub use rules::{Field, FieldKind, FieldRule, Severity};
pub use sanitize::escape_html;
