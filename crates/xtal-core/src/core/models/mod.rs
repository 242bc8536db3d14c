//! Molecular representation: atoms, models, hierarchy views and selections.
//!
//! A [`model::Model`] is an immutable, flat list of [`atom::Atom`]s with
//! precomputed connectivity. Chains and residues are derived views rebuilt
//! lazily from chain-index runs rather than an owned tree.

pub mod atom;
pub mod bonds;
pub mod chain;
pub mod model;
pub mod residues;
pub mod selection;
