use super::MapError;
use super::grid::GridArray;
use super::map::{DensityMap, MapFormat, MapHeader};
use crate::core::cell::unit_cell::UnitCell;
use crate::core::io::traits::MapFile;
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use tracing::debug;

const HEADER_BYTES: usize = 1024;

/// Header words 0-24 of a CCP4/MRC map.
#[derive(Debug, Clone, Copy)]
struct RawHeader {
    n_crs: [i32; 3],
    mode: i32,
    start: [i32; 3],
    n_grid: [i32; 3],
    cell: [f32; 6],
    axes: [i32; 3],
    min: f32,
    max: f32,
    mean: f32,
    space_group: i32,
    symmetry_bytes: i32,
}

impl RawHeader {
    fn read<B: ByteOrder>(bytes: &[u8]) -> Self {
        let int = |w: usize| B::read_i32(&bytes[4 * w..4 * w + 4]);
        let float = |w: usize| B::read_f32(&bytes[4 * w..4 * w + 4]);
        Self {
            n_crs: [int(0), int(1), int(2)],
            mode: int(3),
            start: [int(4), int(5), int(6)],
            n_grid: [int(7), int(8), int(9)],
            cell: [float(10), float(11), float(12), float(13), float(14), float(15)],
            axes: [int(16), int(17), int(18)],
            min: float(19),
            max: float(20),
            mean: float(21),
            space_group: int(22),
            symmetry_bytes: int(23),
        }
    }

    /// Zero-based axis (x=0, y=1, z=2) for columns, rows and sections.
    fn axis_order(&self) -> Option<[usize; 3]> {
        let order = self.axes.map(|a| {
            a.checked_sub(1)
                .and_then(|v| usize::try_from(v).ok())
                .unwrap_or(usize::MAX)
        });
        let mut seen = [false; 3];
        for &axis in &order {
            if axis > 2 || seen[axis] {
                return None;
            }
            seen[axis] = true;
        }
        Some(order)
    }

    fn is_plausible(&self) -> bool {
        self.axis_order().is_some() && (0..=2).contains(&self.mode)
    }
}

/// Decoder for CCP4/MRC binary maps.
///
/// Byte order is detected from the header: the little-endian reading is
/// used when it yields a valid axis permutation and data mode, otherwise the
/// big-endian one. Modes 0 (int8), 1 (int16) and 2 (float32) are supported.
pub struct Ccp4File;

impl MapFile for Ccp4File {
    type Error = MapError;

    fn decode(bytes: &[u8]) -> Result<DensityMap, Self::Error> {
        if bytes.len() < HEADER_BYTES {
            return Err(MapError::TooShort {
                expected: HEADER_BYTES,
                found: bytes.len(),
            });
        }
        let little = RawHeader::read::<LittleEndian>(bytes);
        if little.is_plausible() {
            return decode_with::<LittleEndian>(bytes, &little);
        }
        let big = RawHeader::read::<BigEndian>(bytes);
        if big.axis_order().is_some() {
            return decode_with::<BigEndian>(bytes, &big);
        }
        if little.axis_order().is_some() {
            return Err(MapError::UnsupportedMode(little.mode));
        }
        Err(MapError::InvalidAxisOrder(little.axes))
    }
}

fn positive(values: [i32; 3], what: &str) -> Result<[usize; 3], MapError> {
    let mut out = [0usize; 3];
    for (o, &v) in out.iter_mut().zip(&values) {
        *o = usize::try_from(v)
            .ok()
            .filter(|&n| n > 0)
            .ok_or_else(|| MapError::InvalidDimensions(format!("{} {:?} must be positive", what, values)))?;
    }
    Ok(out)
}

fn decode_with<B: ByteOrder>(bytes: &[u8], header: &RawHeader) -> Result<DensityMap, MapError> {
    let order = header.axis_order().ok_or(MapError::InvalidAxisOrder(header.axes))?;
    let value_size: usize = match header.mode {
        0 => 1,
        1 => 2,
        2 => 4,
        mode => return Err(MapError::UnsupportedMode(mode)),
    };
    let n_crs = positive(header.n_crs, "section extent")?;
    let n_grid = positive(header.n_grid, "cell grid")?;
    let [a, b, c, alpha, beta, gamma] = header.cell.map(f64::from);
    let unit_cell = UnitCell::new(a, b, c, alpha, beta, gamma)?;

    let mut n_xyz = [0usize; 3];
    let mut origin = [0i64; 3];
    for crs in 0..3 {
        n_xyz[order[crs]] = n_crs[crs];
        origin[order[crs]] = i64::from(header.start[crs]);
    }

    let symmetry_bytes = usize::try_from(header.symmetry_bytes)
        .map_err(|_| MapError::InvalidDimensions(format!("symmetry record length {}", header.symmetry_bytes)))?;
    let offset = HEADER_BYTES
        .checked_add(symmetry_bytes)
        .ok_or_else(|| MapError::InvalidDimensions(format!("symmetry record length {}", symmetry_bytes)))?;
    // The payload length is checked before the grid is allocated.
    let expected = n_crs
        .iter()
        .try_fold(value_size, |acc, &n| acc.checked_mul(n))
        .and_then(|payload| payload.checked_add(offset))
        .ok_or_else(|| MapError::InvalidDimensions(format!("section extent {:?} is too large", n_crs)))?;
    if bytes.len() != expected {
        return Err(MapError::MapSizeMismatch {
            expected,
            found: bytes.len(),
        });
    }
    let mut grid = GridArray::new(n_xyz, n_grid, origin)?;

    let mut pos = offset;
    for s in 0..n_crs[2] {
        for r in 0..n_crs[1] {
            for col in 0..n_crs[0] {
                let index = [col, r, s];
                let mut xyz = [0i64; 3];
                for crs in 0..3 {
                    xyz[order[crs]] = origin[order[crs]] + index[crs] as i64;
                }
                let raw = &bytes[pos..pos + value_size];
                let value = match header.mode {
                    0 => f32::from(raw[0] as i8),
                    1 => f32::from(B::read_i16(raw)),
                    _ => B::read_f32(raw),
                };
                grid.set_grid_value(xyz[0], xyz[1], xyz[2], value)?;
                pos += value_size;
            }
        }
    }

    debug!(
        mode = header.mode,
        n_crs = ?n_crs,
        axes = ?header.axes,
        n_grid = ?n_grid,
        "Decoded CCP4 map"
    );
    let stats = MapHeader {
        mode: header.mode,
        min: header.min,
        max: header.max,
        mean: header.mean,
        space_group_number: header.space_group,
    };
    Ok(DensityMap::new(MapFormat::Ccp4, unit_cell, grid, Some(stats)))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Image {
        n_crs: [i32; 3],
        start: [i32; 3],
        axes: [i32; 3],
        mode: i32,
        symmetry: Vec<u8>,
    }

    impl Default for Image {
        fn default() -> Self {
            Self {
                n_crs: [2, 3, 4],
                start: [0, 0, 0],
                axes: [1, 2, 3],
                mode: 2,
                symmetry: Vec::new(),
            }
        }
    }

    impl Image {
        fn count(&self) -> usize {
            self.n_crs.iter().map(|&n| n as usize).product()
        }

        fn encode<B: ByteOrder>(&self) -> Vec<u8> {
            let mut bytes = vec![0u8; HEADER_BYTES];
            let words: [(usize, i32); 15] = [
                (0, self.n_crs[0]),
                (1, self.n_crs[1]),
                (2, self.n_crs[2]),
                (3, self.mode),
                (4, self.start[0]),
                (5, self.start[1]),
                (6, self.start[2]),
                (7, 10),
                (8, 10),
                (9, 10),
                (16, self.axes[0]),
                (17, self.axes[1]),
                (18, self.axes[2]),
                (22, 19),
                (23, self.symmetry.len() as i32),
            ];
            for (w, v) in words {
                B::write_i32(&mut bytes[4 * w..4 * w + 4], v);
            }
            for (w, v) in [(10, 20.0), (11, 30.0), (12, 40.0), (13, 90.0), (14, 90.0), (15, 90.0), (21, 0.5)] {
                B::write_f32(&mut bytes[4 * w..4 * w + 4], v);
            }
            bytes.extend_from_slice(&self.symmetry);
            for n in 0..self.count() {
                match self.mode {
                    0 => bytes.push(n as i8 as u8),
                    1 => {
                        let mut buf = [0u8; 2];
                        B::write_i16(&mut buf, n as i16 - 5);
                        bytes.extend_from_slice(&buf);
                    }
                    _ => {
                        let mut buf = [0u8; 4];
                        B::write_f32(&mut buf, n as f32 * 0.5);
                        bytes.extend_from_slice(&buf);
                    }
                }
            }
            bytes
        }
    }

    #[test]
    fn identity_axis_order() {
        let image = Image::default();
        let map = Ccp4File::decode(&image.encode::<LittleEndian>()).unwrap();
        assert_eq!(map.n_real(), [2, 3, 4]);
        assert_eq!(map.n_grid(), [10, 10, 10]);
        let grid = map.grid();
        for s in 0..4i64 {
            for r in 0..3i64 {
                for c in 0..2i64 {
                    let n = c + 2 * r + 6 * s;
                    assert_eq!(grid.get_grid_value(c, r, s).unwrap(), n as f32 * 0.5);
                }
            }
        }
        assert_eq!(map.unit_cell().parameters(), [20.0, 30.0, 40.0, 90.0, 90.0, 90.0]);
    }

    #[test]
    fn permuted_axes_scatter_to_logical_positions() {
        // Columns run along z, rows along x, sections along y.
        let image = Image {
            axes: [3, 1, 2],
            start: [1, 0, -1],
            ..Image::default()
        };
        let map = Ccp4File::decode(&image.encode::<LittleEndian>()).unwrap();
        assert_eq!(map.n_real(), [3, 4, 2]);
        assert_eq!(map.origin(), [0, -1, 1]);
        let grid = map.grid();
        for s in 0..4i64 {
            for r in 0..3i64 {
                for c in 0..2i64 {
                    let n = c + 2 * r + 6 * s;
                    let value = grid.get_grid_value(r, s - 1, c + 1).unwrap();
                    assert_eq!(value, n as f32 * 0.5, "crs ({}, {}, {})", c, r, s);
                }
            }
        }
    }

    #[test]
    fn big_endian_maps_decode_identically() {
        let image = Image {
            axes: [2, 3, 1],
            ..Image::default()
        };
        let little = Ccp4File::decode(&image.encode::<LittleEndian>()).unwrap();
        let big = Ccp4File::decode(&image.encode::<BigEndian>()).unwrap();
        assert_eq!(little.grid(), big.grid());
    }

    #[test]
    fn integer_modes_and_symmetry_records() {
        let bytes = Image {
            mode: 0,
            symmetry: vec![b' '; 80],
            ..Image::default()
        }
        .encode::<LittleEndian>();
        let map = Ccp4File::decode(&bytes).unwrap();
        assert_eq!(map.grid().get_grid_value(1, 2, 3).unwrap(), 23.0);

        let bytes = Image {
            mode: 1,
            ..Image::default()
        }
        .encode::<BigEndian>();
        let map = Ccp4File::decode(&bytes).unwrap();
        assert_eq!(map.grid().get_grid_value(0, 0, 0).unwrap(), -5.0);
    }

    #[test]
    fn header_statistics_are_kept() {
        let map = Ccp4File::decode(&Image::default().encode::<LittleEndian>()).unwrap();
        let header = map.header().unwrap();
        assert_eq!(header.mode, 2);
        assert_eq!(header.mean, 0.5);
        assert_eq!(header.space_group_number, 19);
    }

    #[test]
    fn truncated_payload_is_a_size_mismatch() {
        let mut bytes = Image::default().encode::<LittleEndian>();
        bytes.truncate(bytes.len() - 4);
        assert!(matches!(
            Ccp4File::decode(&bytes),
            Err(MapError::MapSizeMismatch { expected, found }) if expected == found + 4
        ));
    }

    #[test]
    fn oversized_extent_is_rejected_before_allocating() {
        let mut bytes = Image::default().encode::<LittleEndian>();
        bytes.truncate(HEADER_BYTES);
        for w in 0..3 {
            LittleEndian::write_i32(&mut bytes[4 * w..4 * w + 4], 40_000);
        }
        assert!(matches!(
            Ccp4File::decode(&bytes),
            Err(MapError::MapSizeMismatch { expected, found: HEADER_BYTES }) if expected == HEADER_BYTES + 4 * 40_000usize.pow(3)
        ));
    }

    #[test]
    fn invalid_headers() {
        assert!(matches!(
            Ccp4File::decode(&[0u8; 100]),
            Err(MapError::TooShort { found: 100, .. })
        ));
        let bytes = Image {
            axes: [1, 1, 3],
            ..Image::default()
        }
        .encode::<LittleEndian>();
        assert!(matches!(Ccp4File::decode(&bytes), Err(MapError::InvalidAxisOrder([1, 1, 3]))));
        let bytes = Image {
            mode: 6,
            ..Image::default()
        }
        .encode::<LittleEndian>();
        assert!(matches!(Ccp4File::decode(&bytes), Err(MapError::UnsupportedMode(6))));
    }
}
