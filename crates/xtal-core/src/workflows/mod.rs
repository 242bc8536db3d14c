//! # Workflows Module
//!
//! One-call entry points for turning files into finished values.
//!
//! ## Overview
//!
//! Callers should not need to know which reader handles which format or that
//! bond perception runs after parsing. The functions in [`load`] pick a reader
//! (by name, by file extension or by sniffing the CIF categories), run the
//! [`engine`](crate::engine) and return a [`Model`](crate::core::models::model::Model),
//! [`DensityMap`](crate::core::density::map::DensityMap) or
//! [`CifReader`](crate::core::io::cif::CifReader). Every failure is reported
//! as an [`XtalError`](crate::engine::error::XtalError).

pub mod load;
