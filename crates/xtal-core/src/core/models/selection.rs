use super::atom::Atom;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Empty selection string")]
    Empty,
    #[error("Malformed selection clause '{0}' (expected key=value[,value...])")]
    Malformed(String),
    #[error("Unrecognized selector token '{0}'")]
    UnrecognizedToken(String),
    #[error("Invalid residue range '{0}'")]
    InvalidRange(String),
    #[error("Bad {kind} '{value}' (at most {max} characters)")]
    FieldTooLong {
        kind: &'static str,
        value: String,
        max: usize,
    },
}

/// A parsed atom selection expression.
///
/// Clauses are separated by whitespace and combine with AND; comma-separated
/// values within a clause combine with OR:
///
/// ```text
/// chain=A,B resname=HIS resi=10-20,42 name=CA
/// ```
///
/// Recognized keys are `chain`, `resname` (any key starting with `resnam`),
/// `resi`/`resseq` and `name`. Residue ranges are inclusive.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AtomSelector {
    chains: Option<Vec<String>>,
    resnames: Option<Vec<String>>,
    resseqs: Option<Vec<(i32, i32)>>,
    names: Option<Vec<String>>,
}

impl AtomSelector {
    pub fn parse(text: &str) -> Result<Self, SelectionError> {
        let mut selector = Self::default();
        let mut clauses = text.split_whitespace().peekable();
        if clauses.peek().is_none() {
            return Err(SelectionError::Empty);
        }

        for clause in clauses {
            let (key, values) = clause
                .split_once('=')
                .ok_or_else(|| SelectionError::Malformed(clause.to_string()))?;
            let fields: Vec<&str> = values.split(',').collect();
            if fields.iter().any(|f| f.is_empty()) {
                return Err(SelectionError::Malformed(clause.to_string()));
            }

            if key == "chain" {
                let chains = selector.chains.get_or_insert_with(Vec::new);
                for field in fields {
                    chains.push(validate_field(field, "chain ID", 2)?.to_string());
                }
            } else if key.starts_with("resnam") {
                let resnames = selector.resnames.get_or_insert_with(Vec::new);
                for field in fields {
                    resnames.push(validate_field(field, "residue name", 3)?.to_string());
                }
            } else if key == "resi" || key == "resseq" {
                let ranges = selector.resseqs.get_or_insert_with(Vec::new);
                for field in fields {
                    ranges.push(parse_resseq_range(field)?);
                }
            } else if key == "name" {
                let names = selector.names.get_or_insert_with(Vec::new);
                for field in fields {
                    names.push(validate_field(field, "atom name", 4)?.to_string());
                }
            } else {
                return Err(SelectionError::UnrecognizedToken(key.to_string()));
            }
        }
        Ok(selector)
    }

    pub fn is_in_selection(&self, atom: &Atom) -> bool {
        if let Some(chains) = &self.chains {
            if !chains.iter().any(|c| *c == atom.chain) {
                return false;
            }
        }
        if let Some(resnames) = &self.resnames {
            if !resnames.iter().any(|r| *r == atom.resname) {
                return false;
            }
        }
        if let Some(ranges) = &self.resseqs {
            let Some(resseq) = atom.resseq_as_int() else {
                return false;
            };
            if !ranges.iter().any(|&(lo, hi)| lo <= resseq && resseq <= hi) {
                return false;
            }
        }
        if let Some(names) = &self.names {
            if !names.iter().any(|n| *n == atom.name) {
                return false;
            }
        }
        true
    }
}

impl FromStr for AtomSelector {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn validate_field<'a>(value: &'a str, kind: &'static str, max: usize) -> Result<&'a str, SelectionError> {
    if value.chars().count() > max {
        return Err(SelectionError::FieldTooLong {
            kind,
            value: value.to_string(),
            max,
        });
    }
    Ok(value)
}

fn parse_resseq_range(field: &str) -> Result<(i32, i32), SelectionError> {
    let invalid = || SelectionError::InvalidRange(field.to_string());
    let parse_bound = |s: &str| -> Result<i32, SelectionError> {
        validate_field(s, "residue number", 4)?;
        s.parse().map_err(|_| invalid())
    };

    // A leading minus belongs to the first bound, not the range separator.
    let split_at = field
        .char_indices()
        .skip(1)
        .find(|&(_, c)| c == '-')
        .map(|(i, _)| i);
    match split_at {
        None => {
            let n = parse_bound(field)?;
            Ok((n, n))
        }
        Some(i) => {
            let lo = parse_bound(&field[..i])?;
            let hi = parse_bound(&field[i + 1..])?;
            if lo > hi {
                return Err(invalid());
            }
            Ok((lo, hi))
        }
    }
}
