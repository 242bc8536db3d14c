pub mod cif;
pub mod map;
pub mod model;
