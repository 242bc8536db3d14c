use nalgebra::{Matrix3, Point3, Vector3};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SymmetryError {
    #[error("Symmetry operator '{0}' must have exactly three comma-separated components")]
    WrongComponentCount(String),
    #[error("Symmetry operator component {index} is empty")]
    EmptyComponent { index: usize },
    #[error("Unexpected character '{ch}' in symmetry operator component '{component}'")]
    UnexpectedCharacter { component: String, ch: char },
    #[error("Invalid number '{value}' in symmetry operator component '{component}'")]
    InvalidNumber { component: String, value: String },
}

/// A crystallographic symmetry operation acting on fractional coordinates.
///
/// Parsed from the usual Jones-faithful notation (`-x+1/2,y,-z`), the form
/// used by `_symmetry_equiv_pos_as_xyz` and `_space_group_symop.operation_xyz`.
#[derive(Debug, Clone, PartialEq)]
pub struct SymmetryOperator {
    rotation: Matrix3<f64>,
    translation: Vector3<f64>,
}

impl SymmetryOperator {
    pub fn identity() -> Self {
        Self {
            rotation: Matrix3::identity(),
            translation: Vector3::zeros(),
        }
    }

    pub fn new(rotation: Matrix3<f64>, translation: Vector3<f64>) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    pub fn parse(text: &str) -> Result<Self, SymmetryError> {
        let components: Vec<&str> = text.trim().split(',').collect();
        if components.len() != 3 {
            return Err(SymmetryError::WrongComponentCount(text.to_string()));
        }

        let mut rotation = Matrix3::zeros();
        let mut translation = Vector3::zeros();
        for (row, component) in components.iter().enumerate() {
            let (coefficients, shift) = parse_component(row, component)?;
            for (col, value) in coefficients.iter().enumerate() {
                rotation[(row, col)] = *value;
            }
            translation[row] = shift;
        }
        Ok(Self {
            rotation,
            translation,
        })
    }

    pub fn rotation(&self) -> &Matrix3<f64> {
        &self.rotation
    }

    pub fn translation(&self) -> &Vector3<f64> {
        &self.translation
    }

    pub fn is_identity(&self) -> bool {
        self.rotation == Matrix3::identity() && self.translation == Vector3::zeros()
    }

    /// Applies the operator to a point in fractional coordinates.
    pub fn apply(&self, frac: &Point3<f64>) -> Point3<f64> {
        Point3::from(self.rotation * frac.coords + self.translation)
    }
}

impl FromStr for SymmetryOperator {
    type Err = SymmetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SymmetryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const AXES: [char; 3] = ['x', 'y', 'z'];
        for row in 0..3 {
            if row > 0 {
                f.write_str(",")?;
            }
            let mut wrote_term = false;
            for (col, axis) in AXES.iter().enumerate() {
                let coefficient = self.rotation[(row, col)];
                if coefficient == 0.0 {
                    continue;
                }
                let sign = if coefficient < 0.0 {
                    "-"
                } else if wrote_term {
                    "+"
                } else {
                    ""
                };
                if (coefficient.abs() - 1.0).abs() < 1e-9 {
                    write!(f, "{}{}", sign, axis)?;
                } else {
                    write!(f, "{}{}{}", sign, coefficient.abs(), axis)?;
                }
                wrote_term = true;
            }
            let shift = self.translation[row];
            if shift != 0.0 {
                let sign = if shift < 0.0 { "-" } else if wrote_term { "+" } else { "" };
                write!(f, "{}{}", sign, format_fraction(shift.abs()))?;
            } else if !wrote_term {
                f.write_str("0")?;
            }
        }
        Ok(())
    }
}

fn parse_component(index: usize, component: &str) -> Result<([f64; 3], f64), SymmetryError> {
    let text: Vec<char> = component
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if text.is_empty() {
        return Err(SymmetryError::EmptyComponent { index });
    }

    let invalid_number = |value: String| SymmetryError::InvalidNumber {
        component: component.trim().to_string(),
        value,
    };

    let mut coefficients = [0.0; 3];
    let mut shift = 0.0;
    let mut i = 0;
    while i < text.len() {
        let mut sign = 1.0;
        while i < text.len() && (text[i] == '+' || text[i] == '-') {
            if text[i] == '-' {
                sign = -sign;
            }
            i += 1;
        }
        let Some(&ch) = text.get(i) else {
            return Err(invalid_number(text.iter().collect()));
        };

        if let Some(axis) = axis_index(ch) {
            coefficients[axis] += sign;
            i += 1;
        } else if ch.is_ascii_digit() || ch == '.' {
            let start = i;
            while i < text.len() && (text[i].is_ascii_digit() || text[i] == '.' || text[i] == '/') {
                i += 1;
            }
            let token: String = text[start..i].iter().collect();
            let value = parse_fraction(&token).ok_or_else(|| invalid_number(token.clone()))?;
            match text.get(i).copied().and_then(axis_index) {
                Some(axis) => {
                    coefficients[axis] += sign * value;
                    i += 1;
                }
                None => shift += sign * value,
            }
        } else {
            return Err(SymmetryError::UnexpectedCharacter {
                component: component.trim().to_string(),
                ch,
            });
        }
    }
    Ok((coefficients, shift))
}

fn axis_index(ch: char) -> Option<usize> {
    match ch {
        'x' => Some(0),
        'y' => Some(1),
        'z' => Some(2),
        _ => None,
    }
}

fn parse_fraction(token: &str) -> Option<f64> {
    match token.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.parse().ok()?;
            let den: f64 = den.parse().ok()?;
            (den != 0.0).then(|| num / den)
        }
        None => token.parse().ok(),
    }
}

fn format_fraction(value: f64) -> String {
    for den in [2u32, 3, 4, 6, 8, 12] {
        let num = value * den as f64;
        if (num - num.round()).abs() < 1e-6 {
            let num = num.round() as i64;
            if num % den as i64 == 0 {
                return (num / den as i64).to_string();
            }
            return format!("{}/{}", num, den);
        }
    }
    value.to_string()
}
