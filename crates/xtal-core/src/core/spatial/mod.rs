//! Spatial indexing of atom positions.

pub mod cubicles;
