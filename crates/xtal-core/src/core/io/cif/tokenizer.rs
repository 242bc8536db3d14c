use super::value::CifValue;

/// The statement a line opens, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statement<'a> {
    /// `data_<name>`
    Block(&'a str),
    /// `loop_`
    Loop,
    /// `_<tag>` followed by the rest of the line.
    Tag(&'a str, &'a str),
    /// `save_` frame delimiters, skipped.
    Save,
    /// Anything else: values, blank lines.
    None,
}

pub fn classify(line: &str) -> Statement<'_> {
    let trimmed = line.trim_start();
    let first = trimmed.split_whitespace().next().unwrap_or("");
    let rest = trimmed[first.len()..].trim();

    if starts_with_ignore_case(first, "data_") {
        Statement::Block(&first[5..])
    } else if first.eq_ignore_ascii_case("loop_") {
        Statement::Loop
    } else if starts_with_ignore_case(first, "save_") {
        Statement::Save
    } else if first.starts_with('_') {
        Statement::Tag(first, rest)
    } else {
        Statement::None
    }
}

fn starts_with_ignore_case(s: &str, prefix: &str) -> bool {
    s.len() >= prefix.len() && s.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}

/// Splits one line of values.
///
/// Values are separated by whitespace. A value starting with `'` or `"` runs
/// to the next matching quote that is followed by whitespace or the end of
/// the line (or to the end of the line if there is none). An unquoted `#`
/// at the start of a token ends the line.
pub fn split_values(line: &str) -> Vec<CifValue> {
    let bytes = line.as_bytes();
    let n = bytes.len();
    let mut values = Vec::new();
    let mut i = 0;

    while i < n {
        let c = bytes[i];
        if c.is_ascii_whitespace() {
            i += 1;
        } else if c == b'#' {
            break;
        } else if c == b'\'' || c == b'"' {
            let close = (i + 1..n).find(|&j| bytes[j] == c && (j + 1 == n || bytes[j + 1].is_ascii_whitespace()));
            match close {
                Some(j) => {
                    values.push(CifValue::parse(&line[i + 1..j]));
                    i = j + 1;
                }
                None => {
                    values.push(CifValue::parse(&line[i + 1..]));
                    i = n;
                }
            }
        } else {
            let start = i;
            while i < n && !bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            values.push(CifValue::parse(&line[start..i]));
        }
    }
    values
}
