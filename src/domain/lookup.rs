//! Outcome of looking up a single package

/// Result of a single-package lookup
///
/// Keeps "nothing usable came back" apart from "the registry says the
/// package is gone", since callers treat the two differently.
#[derive(Debug, Clone, PartialEq)]
pub enum PackageLookup<T> {
    /// The package was found and its data is usable
    Found(T),
    /// The lookup failed or returned unusable data
    NotFound,
    /// The package no longer exists upstream
    Removed,
}

impl<T> PackageLookup<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> PackageLookup<U> {
        match self {
            PackageLookup::Found(value) => PackageLookup::Found(f(value)),
            PackageLookup::NotFound => PackageLookup::NotFound,
            PackageLookup::Removed => PackageLookup::Removed,
        }
    }
}
