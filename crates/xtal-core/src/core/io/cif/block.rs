use super::value::CifValue;
use super::{CifError, canonical};
use std::collections::HashMap;
use std::fmt;
use std::io::{self, Write};

/// One `loop_` table: a list of tags and a column of values per tag.
#[derive(Debug, Clone, PartialEq)]
pub struct CifLoop {
    tags: Vec<String>,
    columns: Vec<Vec<CifValue>>,
}

impl CifLoop {
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn column(&self, index: usize) -> Option<&[CifValue]> {
        self.columns.get(index).map(Vec::as_slice)
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    pub fn row(&self, index: usize) -> Option<Vec<&CifValue>> {
        self.columns.iter().map(|c| c.get(index)).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Scalar(usize),
    Column { loop_index: usize, column: usize },
}

/// A `data_` block: scalar data items plus loop tables, keyed by tag.
///
/// Tags keep the order in which they were first defined. Redefining a tag
/// replaces its earlier value.
#[derive(Debug, Clone, PartialEq)]
pub struct CifBlock {
    name: String,
    order: Vec<String>,
    scalars: Vec<CifValue>,
    loops: Vec<CifLoop>,
    index: HashMap<String, Slot>,
}

impl CifBlock {
    pub fn new(name: &str) -> Self {
        Self {
            name: canonical(name),
            order: Vec::new(),
            scalars: Vec::new(),
            loops: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_scalar(&mut self, tag: &str, value: CifValue) {
        let tag = canonical(tag);
        if let Some(Slot::Scalar(i)) = self.index.get(&tag) {
            self.scalars[*i] = value;
            return;
        }
        self.scalars.push(value);
        self.register(tag, Slot::Scalar(self.scalars.len() - 1));
    }

    /// Starts a new loop over `tags` and returns its index.
    pub fn add_loop<S: AsRef<str>>(&mut self, tags: &[S]) -> usize {
        let loop_index = self.loops.len();
        let tags: Vec<String> = tags.iter().map(|t| canonical(t.as_ref())).collect();
        for (column, tag) in tags.iter().enumerate() {
            self.register(tag.clone(), Slot::Column { loop_index, column });
        }
        self.loops.push(CifLoop {
            columns: vec![Vec::new(); tags.len()],
            tags,
        });
        loop_index
    }

    /// Appends one complete row to a loop.
    pub fn append_loop_row(&mut self, loop_index: usize, row: Vec<CifValue>) -> Result<(), CifError> {
        let Some(table) = self.loops.get_mut(loop_index) else {
            return Err(CifError::LoopLengthMismatch {
                expected: 0,
                found: row.len(),
            });
        };
        if row.len() != table.columns.len() {
            return Err(CifError::LoopLengthMismatch {
                expected: table.columns.len(),
                found: row.len(),
            });
        }
        for (column, value) in table.columns.iter_mut().zip(row) {
            column.push(value);
        }
        Ok(())
    }

    fn register(&mut self, tag: String, slot: Slot) {
        if self.index.insert(tag.clone(), slot).is_none() {
            self.order.push(tag);
        }
    }

    /// All tags in definition order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Tags belonging to `category` (e.g. `_atom_site`), in definition order.
    pub fn group_keys<'a>(&'a self, category: &str) -> impl Iterator<Item = &'a str> + 'a {
        let prefix = format!("{}.", canonical(category));
        self.keys().filter(move |k| k.starts_with(&prefix))
    }

    /// Distinct category names in order of first appearance.
    ///
    /// The category of a tag is everything before its first `.`; tags
    /// without a dot form their own category.
    pub fn groups(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for key in self.keys() {
            let group = key.split('.').next().unwrap_or(key);
            if !seen.contains(&group) {
                seen.push(group);
            }
        }
        seen
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.group_keys(category).next().is_some()
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.index.contains_key(&canonical(tag))
    }

    /// Scalar value of a tag. A looped tag with exactly one row also counts.
    pub fn get_scalar(&self, tag: &str) -> Option<&CifValue> {
        match self.index.get(&canonical(tag))? {
            Slot::Scalar(i) => self.scalars.get(*i),
            Slot::Column { .. } => match self.get_column(tag)? {
                [single] => Some(single),
                _ => None,
            },
        }
    }

    /// All values of a tag. A scalar reads as a one-element column.
    pub fn get_column(&self, tag: &str) -> Option<&[CifValue]> {
        match *self.index.get(&canonical(tag))? {
            Slot::Scalar(i) => self.scalars.get(i).map(std::slice::from_ref),
            Slot::Column { loop_index, column } => self.loops.get(loop_index)?.column(column),
        }
    }

    pub fn get_f64(&self, tag: &str) -> Option<f64> {
        self.get_scalar(tag).and_then(CifValue::as_f64)
    }

    pub fn loops(&self) -> &[CifLoop] {
        &self.loops
    }

    /// Rows of a category as records keyed by the part of the tag after the dot.
    ///
    /// Looped categories yield one record per row; a category written as
    /// scalars yields a single record. Unknown categories yield nothing.
    pub fn rows_as_records(&self, category: &str) -> Vec<CifRecord<'_>> {
        let columns: Vec<(&str, &[CifValue])> = self
            .group_keys(category)
            .filter_map(|tag| {
                let item = tag.split_once('.').map_or(tag, |(_, item)| item);
                self.get_column(tag).map(|values| (item, values))
            })
            .collect();
        let n_rows = columns.iter().map(|(_, values)| values.len()).max().unwrap_or(0);

        (0..n_rows)
            .map(|row| CifRecord {
                fields: columns
                    .iter()
                    .filter_map(|(item, values)| values.get(row).map(|v| (*item, v)))
                    .collect(),
            })
            .collect()
    }

    /// Serializes the block as CIF text. Parsing the output gives back an
    /// equal block.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        write!(writer, "{}", self)
    }
}

impl fmt::Display for CifBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "data_{}", self.name)?;
        for tag in &self.order {
            if let Some(Slot::Scalar(i)) = self.index.get(tag) {
                match format_value(&self.scalars[*i]) {
                    Formatted::Inline(text) => writeln!(f, "{} {}", tag, text)?,
                    Formatted::TextField(text) => writeln!(f, "{}\n;\n{}\n;", tag, text)?,
                }
            }
        }
        for (loop_index, table) in self.loops.iter().enumerate() {
            // Columns whose tag was later redefined elsewhere are not written.
            let live: Vec<usize> = (0..table.tags.len())
                .filter(|&column| self.index.get(&table.tags[column]) == Some(&Slot::Column { loop_index, column }))
                .collect();
            if live.is_empty() {
                continue;
            }
            writeln!(f, "loop_")?;
            for &column in &live {
                writeln!(f, "{}", table.tags[column])?;
            }
            for row in 0..table.n_rows() {
                let mut line = String::new();
                for &column in &live {
                    match format_value(&table.columns[column][row]) {
                        Formatted::Inline(text) => {
                            if !line.is_empty() {
                                line.push(' ');
                            }
                            line.push_str(&text);
                        }
                        Formatted::TextField(text) => {
                            if !line.is_empty() {
                                writeln!(f, "{}", line)?;
                                line.clear();
                            }
                            writeln!(f, ";\n{}\n;", text)?;
                        }
                    }
                }
                if !line.is_empty() {
                    writeln!(f, "{}", line)?;
                }
            }
        }
        Ok(())
    }
}

enum Formatted {
    Inline(String),
    TextField(String),
}

fn format_value(value: &CifValue) -> Formatted {
    let text = match value {
        CifValue::Number { raw, .. } => return Formatted::Inline(raw.clone()),
        CifValue::Text(t) => t,
    };
    if text.contains('\n') {
        return Formatted::TextField(text.clone());
    }

    let reserved = ["data_", "loop_", "save_", "global_", "stop_"]
        .iter()
        .any(|word| text.len() >= word.len() && text[..word.len()].eq_ignore_ascii_case(word));
    let needs_quotes = text.is_empty()
        || reserved
        || text.chars().any(char::is_whitespace)
        || text.starts_with(['_', '#', '$', '\'', '"', ';', '[', ']']);
    if !needs_quotes {
        return Formatted::Inline(text.clone());
    }

    let fits = |q: char| !text.contains(&format!("{q} ")) && !text.ends_with(q);
    if fits('\'') {
        Formatted::Inline(format!("'{}'", text))
    } else if fits('"') {
        Formatted::Inline(format!("\"{}\"", text))
    } else {
        Formatted::TextField(text.clone())
    }
}

/// One row of a category, keyed by item name (the part of the tag after the dot).
#[derive(Debug, Clone, PartialEq)]
pub struct CifRecord<'a> {
    fields: Vec<(&'a str, &'a CifValue)>,
}

impl<'a> CifRecord<'a> {
    pub fn get(&self, item: &str) -> Option<&'a CifValue> {
        let item = canonical(item);
        self.fields.iter().find(|(k, _)| *k == item).map(|(_, v)| *v)
    }

    /// Non-null label of an item.
    pub fn get_str(&self, item: &str) -> Option<String> {
        self.get(item).filter(|v| !v.is_null()).map(CifValue::to_label)
    }

    pub fn get_f64(&self, item: &str) -> Option<f64> {
        self.get(item).and_then(CifValue::as_f64)
    }

    pub fn items(&self) -> impl Iterator<Item = (&'a str, &'a CifValue)> + '_ {
        self.fields.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
