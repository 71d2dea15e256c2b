//! Domain types and collaborator traits for the Amobagan product API.
//!
//! Nothing in this crate performs I/O. Product lookup and nutrition analysis
//! are expressed as the [`catalog::ProductCatalog`] and
//! [`analysis::NutritionAnalyzer`] traits; concrete implementations live in
//! `amobagan-upstream` (HTTP) and in the test suites (in-memory doubles).

pub mod analysis;
pub mod barcode;
pub mod catalog;
pub mod error;
pub mod nutrition;
pub mod product;
pub mod stream;
pub mod types;
