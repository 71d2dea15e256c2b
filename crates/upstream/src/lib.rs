//! HTTP clients for the services that do the actual product work.
//!
//! - [`catalog::OpenFoodFactsCatalog`] -- barcode lookup against an Open Food
//!   Facts compatible API.
//! - [`analysis::AnalysisServiceClient`] -- nutrition analysis, one-shot and
//!   streamed as newline-delimited JSON.
//!
//! Both implement the collaborator traits from `amobagan-core` so the API
//! crate never sees `reqwest` types.

pub mod analysis;
pub mod catalog;
pub mod error;
mod ndjson;

pub use error::UpstreamError;
