use super::slice_and_trim;
use super::traits::StructureFile;
use crate::core::cell::unit_cell::{CellError, UnitCell};
use crate::core::models::atom::{Atom, infer_element};
use crate::core::models::chain::ChainSegmenter;
use crate::core::models::model::{ModelParts, ModelSource};
use nalgebra::Point3;
use std::io::{self, BufRead};
use thiserror::Error;

const MIN_ATOM_LEN: usize = 66;
const MIN_ANISOU_LEN: usize = 70;
const MIN_CRYST1_LEN: usize = 54;
const ANISOU_SCALE: f64 = 1.0e-4;

#[derive(Debug, Error)]
pub enum PdbError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: PdbParseErrorKind },
    #[error("Invalid CRYST1 cell on line {line}: {source}")]
    Cell { line: usize, source: CellError },
}

#[derive(Debug, Error)]
pub enum PdbParseErrorKind {
    #[error("{record} record is too short (need at least {min} characters, found {found})")]
    TruncatedRecord {
        record: &'static str,
        min: usize,
        found: usize,
    },
    #[error("Invalid float format in columns {columns} (value: '{value}')")]
    InvalidFloat { columns: String, value: String },
    #[error("Invalid integer format in columns {columns} (value: '{value}')")]
    InvalidInt { columns: String, value: String },
    #[error("ANISOU record does not follow an atom record")]
    AnisouWithoutAtom,
    #[error("ANISOU record for '{found}' does not match preceding atom '{expected}'")]
    AnisouMismatch { expected: String, found: String },
}

/// Reader for fixed-column PDB coordinate files.
///
/// Only the first model is read: parsing stops at the first `ENDMDL` or
/// `END` record. `TER` records and chain label changes both start a new
/// chain segment.
pub struct PdbFile;

impl StructureFile for PdbFile {
    type Error = PdbError;

    fn read_from(reader: &mut impl BufRead) -> Result<ModelParts, Self::Error> {
        let mut parts = ModelParts::new(ModelSource::Pdb);
        let mut segmenter = ChainSegmenter::new();

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = line_num + 1;

            match slice_and_trim(&line, 0, 6) {
                record @ ("ATOM" | "HETATM") => {
                    let mut atom = parse_atom(&line, line_num)?;
                    atom.hetero = record == "HETATM";
                    let chain_index = segmenter.next_index(&atom.chain);
                    parts.push_atom(atom, chain_index);
                }
                "ANISOU" => {
                    let uij = parse_anisou(&line, line_num, parts.atoms.last())?;
                    if let Some(atom) = parts.atoms.last_mut() {
                        atom.set_uij(Some(uij));
                    }
                }
                "CRYST1" => {
                    let (cell, space_group) = parse_cryst1(&line, line_num)?;
                    parts.unit_cell = Some(cell);
                    parts.space_group = space_group;
                }
                "TER" => segmenter.terminate(),
                "ENDMDL" | "END" => break,
                _ => {}
            }
        }
        Ok(parts)
    }
}

fn require_len(line: &str, line_num: usize, record: &'static str, min: usize) -> Result<(), PdbError> {
    if line.len() < min {
        return Err(PdbError::Parse {
            line: line_num,
            kind: PdbParseErrorKind::TruncatedRecord {
                record,
                min,
                found: line.len(),
            },
        });
    }
    Ok(())
}

fn parse_f64(line: &str, line_num: usize, start: usize, end: usize) -> Result<f64, PdbError> {
    let field = slice_and_trim(line, start, end);
    field.parse().map_err(|_| PdbError::Parse {
        line: line_num,
        kind: PdbParseErrorKind::InvalidFloat {
            columns: format!("{}-{}", start + 1, end),
            value: field.into(),
        },
    })
}

fn parse_f64_or(line: &str, line_num: usize, start: usize, end: usize, default: f64) -> Result<f64, PdbError> {
    if slice_and_trim(line, start, end).is_empty() {
        Ok(default)
    } else {
        parse_f64(line, line_num, start, end)
    }
}

fn parse_i32(line: &str, line_num: usize, start: usize, end: usize) -> Result<i32, PdbError> {
    let field = slice_and_trim(line, start, end);
    field.parse().map_err(|_| PdbError::Parse {
        line: line_num,
        kind: PdbParseErrorKind::InvalidInt {
            columns: format!("{}-{}", start + 1, end),
            value: field.into(),
        },
    })
}

/// `2+` / `1-` style charge field; anything unreadable counts as neutral.
fn parse_charge(field: &str) -> i32 {
    let digits: String = field.chars().filter(char::is_ascii_digit).collect();
    match digits.parse::<i32>() {
        Ok(magnitude) if field.contains('-') => -magnitude,
        Ok(magnitude) => magnitude,
        Err(_) => 0,
    }
}

fn parse_atom(line: &str, line_num: usize) -> Result<Atom, PdbError> {
    require_len(line, line_num, "ATOM/HETATM", MIN_ATOM_LEN)?;

    let position = Point3::new(
        parse_f64(line, line_num, 30, 38)?,
        parse_f64(line, line_num, 38, 46)?,
        parse_f64(line, line_num, 46, 54)?,
    );
    let name = slice_and_trim(line, 12, 16);
    let mut atom = Atom::new(name, position);
    atom.altloc = slice_and_trim(line, 16, 17).to_string();
    atom.resname = slice_and_trim(line, 17, 20).to_string();
    atom.chain = slice_and_trim(line, 20, 22).to_string();
    atom.resseq = slice_and_trim(line, 22, 26).to_string();
    atom.icode = slice_and_trim(line, 26, 27).to_string();
    atom.occupancy = parse_f64_or(line, line_num, 54, 60, 1.0)?;
    atom.b_factor = parse_f64_or(line, line_num, 60, 66, 0.0)?;

    let element = slice_and_trim(line, 76, 78);
    atom.element = if element.is_empty() {
        infer_element(line.get(12..16).unwrap_or(name))
    } else {
        element.to_ascii_uppercase()
    };
    atom.formal_charge = parse_charge(slice_and_trim(line, 78, 80));
    Ok(atom)
}

fn parse_anisou(line: &str, line_num: usize, previous: Option<&Atom>) -> Result<[f64; 6], PdbError> {
    require_len(line, line_num, "ANISOU", MIN_ANISOU_LEN)?;
    let Some(atom) = previous else {
        return Err(PdbError::Parse {
            line: line_num,
            kind: PdbParseErrorKind::AnisouWithoutAtom,
        });
    };

    let found = [
        slice_and_trim(line, 12, 16),
        slice_and_trim(line, 16, 17),
        slice_and_trim(line, 17, 20),
        slice_and_trim(line, 20, 22),
        slice_and_trim(line, 22, 26),
        slice_and_trim(line, 26, 27),
    ];
    let expected = [
        atom.name.as_str(),
        atom.altloc.as_str(),
        atom.resname.as_str(),
        atom.chain.as_str(),
        atom.resseq.as_str(),
        atom.icode.as_str(),
    ];
    if found != expected {
        return Err(PdbError::Parse {
            line: line_num,
            kind: PdbParseErrorKind::AnisouMismatch {
                expected: expected.join(" "),
                found: found.join(" "),
            },
        });
    }

    let mut uij = [0.0; 6];
    for (k, value) in uij.iter_mut().enumerate() {
        let start = 28 + 7 * k;
        *value = f64::from(parse_i32(line, line_num, start, start + 7)?) * ANISOU_SCALE;
    }
    Ok(uij)
}

fn parse_cryst1(line: &str, line_num: usize) -> Result<(UnitCell, Option<String>), PdbError> {
    require_len(line, line_num, "CRYST1", MIN_CRYST1_LEN)?;
    let cell = UnitCell::new(
        parse_f64(line, line_num, 6, 15)?,
        parse_f64(line, line_num, 15, 24)?,
        parse_f64(line, line_num, 24, 33)?,
        parse_f64(line, line_num, 33, 40)?,
        parse_f64(line, line_num, 40, 47)?,
        parse_f64(line, line_num, 47, 54)?,
    )
    .map_err(|source| PdbError::Cell {
        line: line_num,
        source,
    })?;
    let space_group = slice_and_trim(line, 55, 66);
    let space_group = (!space_group.is_empty()).then(|| space_group.to_string());
    Ok((cell, space_group))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(clippy::too_many_arguments)]
    fn atom_line(
        record: &str,
        name: &str,
        altloc: &str,
        resname: &str,
        chain: &str,
        resseq: i32,
        xyz: [f64; 3],
        element: &str,
    ) -> String {
        format!(
            "{:<6}{:>5} {:<4}{:1}{:>3}{:>2}{:>4}{:1}   {:>8.3}{:>8.3}{:>8.3}{:>6.2}{:>6.2}          {:>2}{:2}",
            record, 1, name, altloc, resname, chain, resseq, "", xyz[0], xyz[1], xyz[2], 1.0, 20.0, element, ""
        )
    }

    fn anisou_line(name: &str, resname: &str, chain: &str, resseq: i32, u: [i32; 6]) -> String {
        format!(
            "ANISOU{:>5} {:<4}{:1}{:>3}{:>2}{:>4}{:1} {:>7}{:>7}{:>7}{:>7}{:>7}{:>7}",
            1, name, "", resname, chain, resseq, "", u[0], u[1], u[2], u[3], u[4], u[5]
        )
    }

    fn read(lines: &[String]) -> Result<ModelParts, PdbError> {
        PdbFile::read_from_str(&lines.join("\n"))
    }

    #[test]
    fn fixture_lines_have_pdb_widths() {
        assert_eq!(atom_line("ATOM", " CA ", "", "GLY", "A", 1, [0.0; 3], "C").len(), 80);
        assert_eq!(anisou_line(" CA ", "GLY", "A", 1, [0; 6]).len(), 70);
    }

    mod records {
        use super::*;

        #[test]
        fn atoms_chains_and_hetero_flags() {
            let lines = vec![
                atom_line("ATOM", " N  ", "", "GLY", "A", 1, [1.0, 2.0, 3.0], "N"),
                atom_line("ATOM", " CA ", "", "GLY", "A", 1, [2.0, 2.0, 3.0], "C"),
                "TER".to_string(),
                atom_line("ATOM", " N  ", "", "ALA", "A", 5, [9.0, 2.0, 3.0], "N"),
                atom_line("HETATM", "ZN  ", "", " ZN", "B", 401, [0.5, -1.0, 7.25], "ZN"),
            ];
            let parts = read(&lines).unwrap();
            assert_eq!(parts.atoms.len(), 4);
            assert_eq!(parts.chain_indices, vec![0, 0, 1, 2]);
            let ca = &parts.atoms[1];
            assert_eq!(ca.name, "CA");
            assert_eq!(ca.resseq, "1");
            assert_eq!(ca.b_factor, 20.0);
            assert_eq!(*ca.position(), Point3::new(2.0, 2.0, 3.0));
            let zn = &parts.atoms[3];
            assert!(zn.hetero && !ca.hetero);
            assert_eq!(zn.resname, "ZN");
            assert_eq!(zn.element, "ZN");
            assert!(zn.is_ion());
            assert!(parts.unit_cell.is_none());
        }

        #[test]
        fn two_character_chain_ids_fill_both_columns() {
            let lines = vec![
                atom_line("ATOM", " CA ", "", "GLY", "AB", 1, [0.0; 3], "C"),
                atom_line("ATOM", " CA ", "", "GLY", "CB", 2, [5.0, 0.0, 0.0], "C"),
                anisou_line(" CA ", "GLY", "CB", 2, [100; 6]),
            ];
            let parts = read(&lines).unwrap();
            let chains: Vec<&str> = parts.atoms.iter().map(|a| a.chain.as_str()).collect();
            assert_eq!(chains, vec!["AB", "CB"]);
            assert_eq!(parts.chain_indices, vec![0, 1]);
            assert!(parts.atoms[1].uij().is_some());

            let wrong_chain = vec![
                atom_line("ATOM", " CA ", "", "GLY", "AB", 1, [0.0; 3], "C"),
                anisou_line(" CA ", "GLY", "CB", 1, [100; 6]),
            ];
            assert!(matches!(
                read(&wrong_chain).unwrap_err(),
                PdbError::Parse { kind: PdbParseErrorKind::AnisouMismatch { .. }, .. }
            ));
        }

        #[test]
        fn blank_element_is_inferred_from_name() {
            let lines = vec![atom_line("ATOM", " CB ", "", "ALA", "A", 1, [0.0; 3], "")];
            assert_eq!(read(&lines).unwrap().atoms[0].element, "C");
        }

        #[test]
        fn charge_field() {
            assert_eq!(parse_charge("2+"), 2);
            assert_eq!(parse_charge("1-"), -1);
            assert_eq!(parse_charge(""), 0);
            assert_eq!(parse_charge("x"), 0);
        }

        #[test]
        fn anisou_attaches_to_previous_atom() {
            let lines = vec![
                atom_line("ATOM", " CA ", "", "GLY", "A", 1, [0.0; 3], "C"),
                anisou_line(" CA ", "GLY", "A", 1, [1000, 2000, 3000, 0, -100, 50]),
            ];
            let parts = read(&lines).unwrap();
            let uij = parts.atoms[0].uij().unwrap();
            let expected = [0.1, 0.2, 0.3, 0.0, -0.01, 0.005];
            for (got, want) in uij.iter().zip(expected) {
                assert!((got - want).abs() < 1e-12);
            }
        }

        #[test]
        fn cryst1_sets_cell_and_space_group() {
            let cryst1 = format!(
                "CRYST1{:>9.3}{:>9.3}{:>9.3}{:>7.2}{:>7.2}{:>7.2} {:<11}{:>4}",
                50.0, 60.0, 70.0, 90.0, 95.0, 90.0, "P 1 21 1", 2
            );
            let lines = vec![cryst1, atom_line("ATOM", " CA ", "", "GLY", "A", 1, [0.0; 3], "C")];
            let parts = read(&lines).unwrap();
            let cell = parts.unit_cell.unwrap();
            assert_eq!(cell.parameters(), [50.0, 60.0, 70.0, 90.0, 95.0, 90.0]);
            assert_eq!(parts.space_group.as_deref(), Some("P 1 21 1"));
        }

        #[test]
        fn reading_stops_after_first_model() {
            let lines = vec![
                "MODEL        1".to_string(),
                atom_line("ATOM", " CA ", "", "GLY", "A", 1, [0.0; 3], "C"),
                "ENDMDL".to_string(),
                "MODEL        2".to_string(),
                atom_line("ATOM", " CA ", "", "GLY", "A", 1, [1.0; 3], "C"),
                "ENDMDL".to_string(),
            ];
            assert_eq!(read(&lines).unwrap().atoms.len(), 1);
        }
    }

    mod errors {
        use super::*;

        #[test]
        fn truncated_atom_record_reports_line() {
            let mut short = atom_line("ATOM", " CA ", "", "GLY", "A", 1, [0.0; 3], "C");
            short.truncate(60);
            let lines = vec!["HEADER    TEST".to_string(), short];
            let err = read(&lines).unwrap_err();
            assert!(matches!(
                err,
                PdbError::Parse {
                    line: 2,
                    kind: PdbParseErrorKind::TruncatedRecord { min: 66, found: 60, .. }
                }
            ));
        }

        #[test]
        fn unreadable_coordinate() {
            let mut line = atom_line("ATOM", " CA ", "", "GLY", "A", 1, [0.0; 3], "C");
            line.replace_range(30..38, "   x.abc");
            let err = read(&[line]).unwrap_err();
            assert!(matches!(
                err,
                PdbError::Parse { kind: PdbParseErrorKind::InvalidFloat { ref columns, .. }, .. } if columns == "31-38"
            ));
        }

        #[test]
        fn anisou_needs_a_matching_atom() {
            let orphan = vec![anisou_line(" CA ", "GLY", "A", 1, [1; 6])];
            assert!(matches!(
                read(&orphan).unwrap_err(),
                PdbError::Parse { kind: PdbParseErrorKind::AnisouWithoutAtom, .. }
            ));

            let mismatched = vec![
                atom_line("ATOM", " CA ", "", "GLY", "A", 1, [0.0; 3], "C"),
                anisou_line(" CB ", "GLY", "A", 1, [1; 6]),
            ];
            assert!(matches!(
                read(&mismatched).unwrap_err(),
                PdbError::Parse { kind: PdbParseErrorKind::AnisouMismatch { .. }, .. }
            ));
        }

        #[test]
        fn degenerate_cell_is_rejected() {
            let cryst1 = format!(
                "CRYST1{:>9.3}{:>9.3}{:>9.3}{:>7.2}{:>7.2}{:>7.2} {:<11}",
                10.0, 10.0, 0.0, 90.0, 90.0, 90.0, "P 1"
            );
            assert!(matches!(read(&[cryst1]).unwrap_err(), PdbError::Cell { line: 1, .. }));
        }
    }
}
