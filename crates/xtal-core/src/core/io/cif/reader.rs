use super::block::CifBlock;
use super::parser::CifParser;
use super::{CifError, canonical};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// A set of parsed CIF data blocks.
///
/// Blocks are kept in file order; a later block with the same name replaces
/// the earlier one. Text can be supplied all at once ([`CifReader::parse`]),
/// as an iterator of chunks, or incrementally with [`CifReader::feed`]
/// followed by [`CifReader::finish`].
#[derive(Debug)]
pub struct CifReader {
    blocks: Vec<CifBlock>,
    parser: CifParser<Vec<CifBlock>>,
}

impl Default for CifReader {
    fn default() -> Self {
        Self::new()
    }
}

impl CifReader {
    pub fn new() -> Self {
        Self {
            blocks: Vec::new(),
            parser: CifParser::new(Vec::new()),
        }
    }

    pub fn parse(text: &str) -> Result<Self, CifError> {
        Self::from_chunks([text])
    }

    pub fn from_chunks<I, S>(chunks: I) -> Result<Self, CifError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut reader = Self::new();
        for chunk in chunks {
            reader.feed(chunk.as_ref())?;
        }
        reader.finish()?;
        Ok(reader)
    }

    pub fn read_from(reader: &mut impl BufRead) -> Result<Self, CifError> {
        let mut cif = Self::new();
        let mut line = String::new();
        while reader.read_line(&mut line)? > 0 {
            cif.feed(&line)?;
            line.clear();
        }
        cif.finish()?;
        Ok(cif)
    }

    pub fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Self, CifError> {
        let file = File::open(path)?;
        Self::read_from(&mut BufReader::new(file))
    }

    pub fn feed(&mut self, chunk: &str) -> Result<(), CifError> {
        self.parser.feed(chunk)?;
        self.collect_completed();
        Ok(())
    }

    pub fn finish(&mut self) -> Result<(), CifError> {
        self.parser.finish()?;
        self.collect_completed();
        Ok(())
    }

    fn collect_completed(&mut self) {
        let completed = std::mem::take(self.parser.sink_mut());
        for block in completed {
            self.add_block(block);
        }
    }

    pub fn add_block(&mut self, block: CifBlock) {
        match self.blocks.iter_mut().find(|b| b.name() == block.name()) {
            Some(existing) => *existing = block,
            None => self.blocks.push(block),
        }
    }

    pub fn blocks(&self) -> &[CifBlock] {
        &self.blocks
    }

    pub fn into_blocks(self) -> Vec<CifBlock> {
        self.blocks
    }

    pub fn first_block(&self) -> Option<&CifBlock> {
        self.blocks.first()
    }

    pub fn get_block(&self, name: &str) -> Option<&CifBlock> {
        let name = canonical(name);
        self.blocks.iter().find(|b| b.name() == name)
    }

    /// First block that defines any tag of `category`.
    pub fn find_block_with(&self, category: &str) -> Option<&CifBlock> {
        self.blocks.iter().find(|b| b.has_category(category))
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
