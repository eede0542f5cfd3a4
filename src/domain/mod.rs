//! Core domain models for list-dependents
//!
//! This module contains the fundamental types used throughout the application:
//! - The dependent record written one per NDJSON line
//! - The name-keyed collection records are reconciled in
//! - Single-package lookup outcomes
//! - Change counts and summaries

mod collection;
mod dependent;
mod lookup;
mod summary;

pub use collection::DependentsCollection;
pub use dependent::{age_in_days, DependentRecord, PackageManifest};
pub use lookup::PackageLookup;
pub use summary::{format_summary, ChangeCounts, SummaryMode, ALL_UP_TO_DATE};
