use crate::core::density::map::DensityMap;
use crate::core::models::model::ModelParts;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

/// Interface shared by the coordinate file readers.
///
/// Implementors parse a text stream into [`ModelParts`]; turning those parts
/// into a bonded model is left to the caller.
pub trait StructureFile {
    /// The error type for parsing and I/O failures.
    type Error: Error + From<io::Error>;

    /// Reads a structure from a buffered reader.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails or the reader fails.
    fn read_from(reader: &mut impl BufRead) -> Result<ModelParts, Self::Error>;

    /// Reads a structure from in-memory text.
    fn read_from_str(text: &str) -> Result<ModelParts, Self::Error> {
        Self::read_from(&mut text.as_bytes())
    }

    /// Reads a structure from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or parsing fails.
    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<ModelParts, Self::Error> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }
}

/// Interface shared by the binary density map decoders.
pub trait MapFile {
    type Error: Error + From<io::Error>;

    /// Decodes a complete file image.
    ///
    /// # Errors
    ///
    /// Returns an error if the header is invalid or the payload is truncated.
    fn decode(bytes: &[u8]) -> Result<DensityMap, Self::Error>;

    fn read_from(reader: &mut impl Read) -> Result<DensityMap, Self::Error> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Self::decode(&bytes)
    }

    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<DensityMap, Self::Error> {
        let file = File::open(path)?;
        Self::read_from(&mut BufReader::new(file))
    }
}
