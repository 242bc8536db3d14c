//! # Engine Module
//!
//! Bond perception and model assembly on top of the stateless [`crate::core`]
//! layer.
//!
//! ## Overview
//!
//! Readers in [`crate::core::io`] stop at [`ModelParts`](crate::core::models::model::ModelParts):
//! atoms, chain indices and cell metadata. The engine turns those parts into a
//! finished [`Model`](crate::core::models::model::Model) by hashing every atom
//! into [`Cubicles`](crate::core::spatial::cubicles::Cubicles) and testing each
//! atom only against its 27-bucket neighbourhood.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Bond thresholds, map loading options and the TOML file form
//! - **Connectivity** ([`connectivity`]) - The bond rule with fast and all-pairs builders
//! - **Assembly** ([`assembly`]) - The single path from parsed parts to a sealed model
//! - **Error Handling** ([`error`]) - The aggregated error returned by the workflows

pub mod assembly;
pub mod config;
pub mod connectivity;
pub mod error;
