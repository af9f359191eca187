//! Table-driven verification of structured data.
//!
//! Expected data arrives as human-written tables. The [`format`] layer
//! coerces each cell into a typed [`Value`] (numbers, currency, dates,
//! booleans, JSON, entity references, `{{expressions}}`) and renames keys;
//! the [`matcher`] compares the result against actual data with wildcard,
//! regex, null and date rules; the [`verify`] layer turns failed searches
//! into [`Failure::Validation`] messages that point at the closest match.

#![forbid(unsafe_code)]

pub mod adapter;
pub mod assertion;
pub mod coerce;
pub mod config;
pub mod context;
pub mod expr;
pub mod failure;
pub mod format;
pub mod matcher;
pub mod resolve;
pub mod table;
pub mod time;
pub mod value;
pub mod verify;

pub use coerce::{Coercer, FormatOptions, NumberParsing};
pub use config::Profile;
pub use context::TestContext;
pub use failure::{Failure, FailureCode, Result};
pub use format::Formatter;
pub use matcher::{MatchOptions, MatchScore, match_score, matches};
pub use resolve::{EntityResolver, EntityResolverRegistry};
pub use table::DataTable;
pub use value::Value;
pub use verify::{TableVerifyOptions, Verifier, VerifyOptions};
