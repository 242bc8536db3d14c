use super::block::CifBlock;
use super::tokenizer::{self, Statement};
use super::value::CifValue;
use super::{CifError, canonical};
use tracing::debug;

/// Receives each data block once it is complete.
pub trait BlockSink {
    fn on_block(&mut self, block: CifBlock);
}

impl<F: FnMut(CifBlock)> BlockSink for F {
    fn on_block(&mut self, block: CifBlock) {
        self(block)
    }
}

impl BlockSink for Vec<CifBlock> {
    fn on_block(&mut self, block: CifBlock) {
        self.push(block);
    }
}

/// Where a multi-line text field's value goes once it closes.
#[derive(Debug)]
enum TextTarget {
    Tag(String),
    Loop,
}

#[derive(Debug)]
enum State {
    /// Between statements.
    Init,
    /// Collecting the tags of a `loop_`.
    LoopHeader,
    /// Reading loop values.
    LoopBody,
    /// A tag whose value is on a following line.
    Tag { tag: String, line: usize },
    /// Inside a `;` delimited text field.
    TextField {
        lines: Vec<String>,
        start_line: usize,
        target: TextTarget,
    },
}

/// Incremental, line-driven CIF parser.
///
/// Input may arrive in arbitrary chunks through [`CifParser::feed`]; only
/// complete lines are processed and the remainder is carried over.
/// [`CifParser::finish`] flushes the last line and hands the final block to
/// the sink. After an error the parser should be discarded.
#[derive(Debug)]
pub struct CifParser<S: BlockSink> {
    sink: S,
    pending: String,
    line_number: usize,
    state: State,
    block: Option<CifBlock>,
    loop_tags: Vec<String>,
    loop_index: usize,
    row: Vec<CifValue>,
}

impl<S: BlockSink> CifParser<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            pending: String::new(),
            line_number: 0,
            state: State::Init,
            block: None,
            loop_tags: Vec::new(),
            loop_index: 0,
            row: Vec::new(),
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Feeds a chunk of text, processing every complete line in it.
    pub fn feed(&mut self, chunk: &str) -> Result<(), CifError> {
        self.pending.push_str(chunk);
        let Some(last_newline) = self.pending.rfind('\n') else {
            return Ok(());
        };
        let rest = self.pending.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.pending, rest);
        for line in complete.lines() {
            self.process_line(line)?;
        }
        Ok(())
    }

    /// Processes any trailing partial line and closes the open block.
    pub fn finish(&mut self) -> Result<(), CifError> {
        if !self.pending.is_empty() {
            let line = std::mem::take(&mut self.pending);
            self.process_line(&line)?;
        }
        match std::mem::replace(&mut self.state, State::Init) {
            State::TextField { start_line, .. } => {
                return Err(CifError::UnterminatedTextField { line: start_line });
            }
            State::Tag { tag, line } => return Err(CifError::MissingValue { line, tag }),
            State::LoopHeader => {
                self.begin_loop_body()?;
                self.finish_loop()?;
            }
            State::LoopBody => self.finish_loop()?,
            State::Init => {}
        }
        self.emit_block();
        self.line_number = 0;
        Ok(())
    }

    fn process_line(&mut self, raw: &str) -> Result<(), CifError> {
        self.line_number += 1;
        let line = raw.strip_suffix('\r').unwrap_or(raw);
        let in_text = matches!(self.state, State::TextField { .. });
        if !in_text && line.trim_start().starts_with('#') {
            return Ok(());
        }
        let state = std::mem::replace(&mut self.state, State::Init);
        self.state = self.dispatch(state, line)?;
        Ok(())
    }

    fn dispatch(&mut self, state: State, line: &str) -> Result<State, CifError> {
        match state {
            State::Init => self.step_init(line),
            State::LoopHeader => self.step_loop_header(line),
            State::LoopBody => self.step_loop_body(line),
            State::Tag { tag, line: tag_line } => self.step_tag_value(tag, tag_line, line),
            State::TextField {
                lines,
                start_line,
                target,
            } => self.step_text_field(lines, start_line, target, line),
        }
    }

    fn step_init(&mut self, line: &str) -> Result<State, CifError> {
        match tokenizer::classify(line) {
            Statement::Block(name) => {
                self.emit_block();
                self.block = Some(CifBlock::new(name));
                Ok(State::Init)
            }
            Statement::Loop => {
                self.current_block("loop_")?;
                self.loop_tags.clear();
                self.row.clear();
                Ok(State::LoopHeader)
            }
            Statement::Tag(tag, rest) => self.step_tag(tag, rest),
            Statement::Save | Statement::None => Ok(State::Init),
        }
    }

    fn step_tag(&mut self, tag: &str, rest: &str) -> Result<State, CifError> {
        let line = self.line_number;
        let block = self.current_block(tag)?;
        match tokenizer::split_values(rest).into_iter().next() {
            Some(value) => {
                block.set_scalar(tag, value);
                Ok(State::Init)
            }
            None => Ok(State::Tag {
                tag: canonical(tag),
                line,
            }),
        }
    }

    fn step_tag_value(&mut self, tag: String, tag_line: usize, line: &str) -> Result<State, CifError> {
        if let Some(first) = line.strip_prefix(';') {
            return Ok(State::TextField {
                lines: first_text_line(first),
                start_line: self.line_number,
                target: TextTarget::Tag(tag),
            });
        }
        if tokenizer::classify(line) != Statement::None {
            return Err(CifError::MissingValue { line: tag_line, tag });
        }
        match tokenizer::split_values(line).into_iter().next() {
            Some(value) => {
                self.current_block(&tag)?.set_scalar(&tag, value);
                Ok(State::Init)
            }
            None => Ok(State::Tag { tag, line: tag_line }),
        }
    }

    fn step_loop_header(&mut self, line: &str) -> Result<State, CifError> {
        match tokenizer::classify(line) {
            Statement::Tag(tag, rest) if rest.is_empty() || rest.starts_with('#') => {
                self.loop_tags.push(canonical(tag));
                Ok(State::LoopHeader)
            }
            _ if line.trim().is_empty() => Ok(State::LoopHeader),
            _ => {
                self.begin_loop_body()?;
                self.step_loop_body(line)
            }
        }
    }

    fn begin_loop_body(&mut self) -> Result<(), CifError> {
        if self.loop_tags.is_empty() {
            return Err(CifError::EmptyLoop {
                line: self.line_number,
            });
        }
        let tags = std::mem::take(&mut self.loop_tags);
        let block = self.current_block("loop_")?;
        self.loop_index = block.add_loop(tags.as_slice());
        self.loop_tags = tags;
        Ok(())
    }

    fn step_loop_body(&mut self, line: &str) -> Result<State, CifError> {
        if let Some(first) = line.strip_prefix(';') {
            return Ok(State::TextField {
                lines: first_text_line(first),
                start_line: self.line_number,
                target: TextTarget::Loop,
            });
        }
        match tokenizer::classify(line) {
            Statement::None => {
                for value in tokenizer::split_values(line) {
                    self.push_loop_value(value)?;
                }
                Ok(State::LoopBody)
            }
            _ => {
                self.finish_loop()?;
                self.step_init(line)
            }
        }
    }

    fn step_text_field(
        &mut self,
        mut lines: Vec<String>,
        start_line: usize,
        target: TextTarget,
        line: &str,
    ) -> Result<State, CifError> {
        if line.trim_end() != ";" {
            lines.push(line.to_string());
            return Ok(State::TextField {
                lines,
                start_line,
                target,
            });
        }
        let value = CifValue::Text(lines.join("\n"));
        match target {
            TextTarget::Tag(tag) => {
                self.current_block(&tag)?.set_scalar(&tag, value);
                Ok(State::Init)
            }
            TextTarget::Loop => {
                self.push_loop_value(value)?;
                Ok(State::LoopBody)
            }
        }
    }

    fn push_loop_value(&mut self, value: CifValue) -> Result<(), CifError> {
        self.row.push(value);
        if self.row.len() == self.loop_tags.len() {
            let row = std::mem::take(&mut self.row);
            let loop_index = self.loop_index;
            self.current_block("loop_")?.append_loop_row(loop_index, row)?;
        }
        Ok(())
    }

    fn finish_loop(&mut self) -> Result<(), CifError> {
        if !self.row.is_empty() {
            return Err(CifError::RaggedLoop {
                line: self.line_number,
                columns: self.loop_tags.len(),
                values: self.row.len(),
            });
        }
        self.loop_tags.clear();
        Ok(())
    }

    fn current_block(&mut self, tag: &str) -> Result<&mut CifBlock, CifError> {
        let line = self.line_number;
        self.block.as_mut().ok_or_else(|| CifError::NoBlock {
            line,
            tag: tag.to_string(),
        })
    }

    fn emit_block(&mut self) {
        if let Some(block) = self.block.take() {
            debug!(block = block.name(), tags = block.keys().count(), "Completed CIF data block");
            self.sink.on_block(block);
        }
    }
}

/// Text on the opening `;` line, if any, is the first line of the field.
fn first_text_line(rest: &str) -> Vec<String> {
    if rest.trim().is_empty() {
        Vec::new()
    } else {
        vec![rest.to_string()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_all(text: &str) -> Result<Vec<CifBlock>, CifError> {
        let mut parser = CifParser::new(Vec::new());
        parser.feed(text)?;
        parser.finish()?;
        Ok(parser.into_sink())
    }

    mod statements {
        use super::*;

        #[test]
        fn scalars_loops_and_blocks() {
            let text = "\
data_one
_cell.length_a 10.0
_cell.length_b   '11 .5'
loop_
_atom.id
_atom.name
1 CA
2 'C B'
data_two
_x.y 3
";
            let blocks = parse_all(text).unwrap();
            assert_eq!(blocks.len(), 2);
            let one = &blocks[0];
            assert_eq!(one.get_f64("_cell.length_a"), Some(10.0));
            assert_eq!(one.get_scalar("_cell.length_b"), Some(&CifValue::Text("11 .5".into())));
            assert_eq!(one.get_column("_atom.name").unwrap()[1], CifValue::Text("C B".into()));
            assert_eq!(blocks[1].get_f64("_x.y"), Some(3.0));
        }

        #[test]
        fn loop_rows_may_span_lines() {
            let text = "data_x\nloop_\n_a.p\n_a.q\n_a.r\n1 2\n3\n4 5 6\n";
            let blocks = parse_all(text).unwrap();
            let column = blocks[0].get_column("_a.r").unwrap();
            assert_eq!(column, &[CifValue::from(3.0), CifValue::from(6.0)]);
        }

        #[test]
        fn loop_header_tags_may_carry_comments() {
            let text = "data_x\nloop_\n_a.b # first column\n_a.c\n1 2\n3 4\n";
            let blocks = parse_all(text).unwrap();
            assert_eq!(
                blocks[0].get_column("_a.b").unwrap(),
                &[CifValue::from(1.0), CifValue::from(3.0)]
            );
            assert_eq!(
                blocks[0].get_column("_a.c").unwrap(),
                &[CifValue::from(2.0), CifValue::from(4.0)]
            );
        }

        #[test]
        fn value_on_following_line() {
            let blocks = parse_all("data_x\n_a.b\n\n  'spaced value'\n").unwrap();
            assert_eq!(blocks[0].get_scalar("_a.b"), Some(&CifValue::Text("spaced value".into())));
        }

        #[test]
        fn comments_and_save_frames_are_skipped() {
            let text = "# header\ndata_x\n  # inside\nsave_frame\n_a.b 1 # trailing\nsave_\n";
            let blocks = parse_all(text).unwrap();
            assert_eq!(blocks[0].get_f64("_a.b"), Some(1.0));
            assert_eq!(blocks[0].keys().count(), 1);
        }

        #[test]
        fn crlf_line_endings() {
            let blocks = parse_all("data_x\r\n_a.b 2\r\n").unwrap();
            assert_eq!(blocks[0].get_f64("_a.b"), Some(2.0));
        }
    }

    mod text_fields {
        use super::*;

        #[test]
        fn scalar_text_field_keeps_lines_and_hashes() {
            let text = "data_x\n_a.b\n;line one\n# not a comment\n;\n_a.c 5\n";
            let blocks = parse_all(text).unwrap();
            assert_eq!(
                blocks[0].get_scalar("_a.b"),
                Some(&CifValue::Text("line one\n# not a comment".into()))
            );
            assert_eq!(blocks[0].get_f64("_a.c"), Some(5.0));
        }

        #[test]
        fn text_field_inside_loop() {
            let text = "data_x\nloop_\n_a.id\n_a.text\n1\n;\nfirst\nsecond\n;\n2 short\n";
            let blocks = parse_all(text).unwrap();
            let column = blocks[0].get_column("_a.text").unwrap();
            assert_eq!(column[0], CifValue::Text("first\nsecond".into()));
            assert_eq!(column[1], CifValue::Text("short".into()));
        }

        #[test]
        fn unterminated_text_field_is_an_error() {
            let err = parse_all("data_x\n_a.b\n;never closed\n").unwrap_err();
            assert!(matches!(err, CifError::UnterminatedTextField { line: 3 }));
        }
    }

    mod errors {
        use super::*;

        #[test]
        fn item_before_any_block() {
            let err = parse_all("_a.b 1\n").unwrap_err();
            assert!(matches!(err, CifError::NoBlock { line: 1, .. }));
        }

        #[test]
        fn partial_row_at_loop_end() {
            let err = parse_all("data_x\nloop_\n_a.p\n_a.q\n1 2 3\n_b.c 1\n").unwrap_err();
            assert!(matches!(err, CifError::RaggedLoop { columns: 2, values: 1, .. }));
            let err = parse_all("data_x\nloop_\n_a.p\n_a.q\n1 2 3\n").unwrap_err();
            assert!(matches!(err, CifError::RaggedLoop { .. }));
        }

        #[test]
        fn loop_without_tags() {
            let err = parse_all("data_x\nloop_\n1 2\n").unwrap_err();
            assert!(matches!(err, CifError::EmptyLoop { line: 3 }));
        }

        #[test]
        fn tag_without_value() {
            let err = parse_all("data_x\n_a.b\n_a.c 1\n").unwrap_err();
            assert!(matches!(err, CifError::MissingValue { line: 2, .. }));
        }
    }

    mod streaming {
        use super::*;

        #[test]
        fn chunk_boundaries_do_not_matter() {
            let text = "data_x\n_a.b 'quoted value'\nloop_\n_c.d\n_c.e\n1 2\n3 4\n_f.g\n;\ntext\n;\n";
            let whole = parse_all(text).unwrap();
            for size in [1, 2, 3, 7, 16] {
                let mut parser = CifParser::new(Vec::new());
                let bytes: Vec<char> = text.chars().collect();
                for chunk in bytes.chunks(size) {
                    parser.feed(&chunk.iter().collect::<String>()).unwrap();
                }
                parser.finish().unwrap();
                assert_eq!(parser.into_sink(), whole, "chunk size {}", size);
            }
        }

        #[test]
        fn callback_sink_sees_blocks_in_order() {
            let mut names = Vec::new();
            {
                let mut parser = CifParser::new(|block: CifBlock| names.push(block.name().to_string()));
                parser.feed("data_a\n_x.y 1\ndata_b\n_x.y 2").unwrap();
                parser.finish().unwrap();
            }
            assert_eq!(names, vec!["a", "b"]);
        }
    }
}
