//! list-dependents - npm dependents discovery library
//!
//! This library provides the core functionality for discovering the
//! dependents of an npm module and maintaining NDJSON collections of them:
//! - Paginated fetching of JSON and HTML listings
//! - Bounded concurrent enrichment of discovered dependents
//! - Filtering and sorting of dependent records
//! - Reconciliation of fresh discoveries against a prior collection

pub mod cli;
pub mod commands;
pub mod concurrency;
pub mod discovery;
pub mod domain;
pub mod error;
pub mod filter;
pub mod ndjson;
pub mod output;
pub mod pagination;
pub mod progress;
pub mod reconcile;
pub mod registry;
