//! # xtal
//!
//! Ingestion and geometry for crystallographic data: macromolecular and
//! small-molecule coordinate files, chemical component dictionaries and
//! electron density maps.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer layout so that parsing, analysis and
//! orchestration stay independent of each other.
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Atom`, `Model`,
//!   `UnitCell`, `GridArray`), the CIF tokenizer and every file-format reader.
//!   Nothing in this layer decides *how* bonds are perceived.
//!
//! - **[`engine`]: The Logic Core.** Configuration, bond perception over the
//!   `Cubicles` spatial hash and final model assembly. Every ingestion path
//!   funnels through [`engine::assembly::assemble_model`].
//!
//! - **[`workflows`]: The Public API.** One-call entry points that pick a
//!   reader, run the engine and return a finished `Model` or `DensityMap`.

pub mod core;
pub mod engine;
pub mod workflows;
