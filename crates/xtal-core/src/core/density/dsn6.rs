use super::MapError;
use super::grid::GridArray;
use super::map::{DensityMap, MapFormat};
use crate::core::cell::unit_cell::UnitCell;
use crate::core::io::traits::MapFile;
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use tracing::debug;

const HEADER_BYTES: usize = 512;
const BRICK_EDGE: usize = 8;
const BRICK_BYTES: usize = BRICK_EDGE * BRICK_EDGE * BRICK_EDGE;
/// Header word 18 always holds this value; it identifies the byte order.
const SENTINEL: i16 = 100;

/// Decoder for DSN6 ("O" format) brick maps.
///
/// The 512-byte header holds 16-bit words in either byte order. Densities
/// are bytes packed in 8x8x8 bricks with each pair of bytes swapped, and are
/// rescaled as `(byte - plus) / prod`. Voxels of edge bricks that fall
/// outside the map extent are dropped.
pub struct Dsn6File;

impl Dsn6File {
    /// Decodes a map, optionally normalizing it to zero mean and unit sigma.
    pub fn decode_with_options(bytes: &[u8], sigma_scale: bool) -> Result<DensityMap, MapError> {
        if bytes.len() < HEADER_BYTES {
            return Err(MapError::TooShort {
                expected: HEADER_BYTES,
                found: bytes.len(),
            });
        }
        let header = read_header::<LittleEndian>(bytes);
        let header = if header[18] == SENTINEL {
            header
        } else {
            let swapped = read_header::<BigEndian>(bytes);
            if swapped[18] != SENTINEL {
                return Err(MapError::EndianDetection {
                    expected: SENTINEL,
                    found: header[18],
                });
            }
            swapped
        };

        let origin = [0, 1, 2].map(|w| i64::from(header[w]));
        let n_real = extent(&header, 3, "map extent")?;
        let n_grid = extent(&header, 6, "cell grid")?;
        let cell_scale = header[17];
        if cell_scale == 0 || header[15] == 0 {
            return Err(MapError::InvalidDimensions(format!(
                "cell scale {} and density scale {} must be non-zero",
                cell_scale, header[15]
            )));
        }
        let [a, b, c, alpha, beta, gamma] = [9, 10, 11, 12, 13, 14].map(|w| f64::from(header[w]) / f64::from(cell_scale));
        let unit_cell = UnitCell::new(a, b, c, alpha, beta, gamma)?;
        let prod = f64::from(header[15]) / 100.0;
        let plus = f64::from(header[16]);

        let n_bricks = n_real.map(|n| n.div_ceil(BRICK_EDGE));
        let expected = HEADER_BYTES + n_bricks.iter().product::<usize>() * BRICK_BYTES;
        if bytes.len() < expected {
            return Err(MapError::MapSizeMismatch {
                expected,
                found: bytes.len(),
            });
        }

        let mut grid = GridArray::new(n_real, n_grid, origin)?;
        let mut offset = HEADER_BYTES;
        let mut brick = [0u8; BRICK_BYTES];
        for zz in 0..n_bricks[2] {
            for yy in 0..n_bricks[1] {
                for xx in 0..n_bricks[0] {
                    for (pair, chunk) in brick
                        .chunks_exact_mut(2)
                        .zip(bytes[offset..offset + BRICK_BYTES].chunks_exact(2))
                    {
                        pair[0] = chunk[1];
                        pair[1] = chunk[0];
                    }
                    offset += BRICK_BYTES;
                    fill_brick(&mut grid, &brick, [xx, yy, zz], n_real, origin, prod, plus)?;
                }
            }
        }

        debug!(n_real = ?n_real, n_grid = ?n_grid, prod, plus, "Decoded DSN6 map");
        if sigma_scale {
            grid.sigma_scale();
        }
        Ok(DensityMap::new(MapFormat::Dsn6, unit_cell, grid, None))
    }
}

impl MapFile for Dsn6File {
    type Error = MapError;

    fn decode(bytes: &[u8]) -> Result<DensityMap, Self::Error> {
        Self::decode_with_options(bytes, true)
    }
}

fn read_header<B: ByteOrder>(bytes: &[u8]) -> [i16; 256] {
    let mut words = [0i16; 256];
    B::read_i16_into(&bytes[..HEADER_BYTES], &mut words);
    words
}

fn extent(header: &[i16; 256], first: usize, what: &str) -> Result<[usize; 3], MapError> {
    let values = [header[first], header[first + 1], header[first + 2]];
    let mut out = [0usize; 3];
    for (o, &v) in out.iter_mut().zip(&values) {
        *o = usize::try_from(v)
            .ok()
            .filter(|&n| n > 0)
            .ok_or_else(|| MapError::InvalidDimensions(format!("{} {:?} must be positive", what, values)))?;
    }
    Ok(out)
}

fn fill_brick(
    grid: &mut GridArray,
    brick: &[u8; BRICK_BYTES],
    brick_index: [usize; 3],
    n_real: [usize; 3],
    origin: [i64; 3],
    prod: f64,
    plus: f64,
) -> Result<(), MapError> {
    let mut voxels = brick.iter();
    for z in 0..BRICK_EDGE {
        for y in 0..BRICK_EDGE {
            for x in 0..BRICK_EDGE {
                let Some(&byte) = voxels.next() else {
                    return Ok(());
                };
                let local = [
                    brick_index[0] * BRICK_EDGE + x,
                    brick_index[1] * BRICK_EDGE + y,
                    brick_index[2] * BRICK_EDGE + z,
                ];
                if local.iter().zip(&n_real).any(|(l, n)| l >= n) {
                    continue;
                }
                let density = (f64::from(byte) - plus) / prod;
                grid.set_grid_value(
                    origin[0] + local[0] as i64,
                    origin[1] + local[1] as i64,
                    origin[2] + local[2] as i64,
                    density as f32,
                )?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const N_REAL: [usize; 3] = [10, 3, 2];
    const PLUS: i16 = 10;

    fn voxel(x: usize, y: usize, z: usize) -> u8 {
        ((x + 10 * y + 30 * z) % 200) as u8 + 20
    }

    fn image<B: ByteOrder>(sentinel: i16) -> Vec<u8> {
        let mut words = [0i16; 256];
        words[..3].copy_from_slice(&[-2, 0, 5]);
        words[3..6].copy_from_slice(&[N_REAL[0] as i16, N_REAL[1] as i16, N_REAL[2] as i16]);
        words[6..9].copy_from_slice(&[20, 20, 20]);
        words[9..15].copy_from_slice(&[200, 250, 300, 900, 900, 900]);
        words[15] = 200;
        words[16] = PLUS;
        words[17] = 10;
        words[18] = sentinel;
        let mut bytes = vec![0u8; HEADER_BYTES];
        B::write_i16_into(&words, &mut bytes);

        let n_bricks = N_REAL.map(|n| n.div_ceil(BRICK_EDGE));
        for zz in 0..n_bricks[2] {
            for yy in 0..n_bricks[1] {
                for xx in 0..n_bricks[0] {
                    let mut brick = Vec::with_capacity(BRICK_BYTES);
                    for z in 0..BRICK_EDGE {
                        for y in 0..BRICK_EDGE {
                            for x in 0..BRICK_EDGE {
                                brick.push(voxel(xx * 8 + x, yy * 8 + y, zz * 8 + z));
                            }
                        }
                    }
                    for pair in brick.chunks_exact(2) {
                        bytes.extend_from_slice(&[pair[1], pair[0]]);
                    }
                }
            }
        }
        bytes
    }

    #[test]
    fn bricks_are_unpacked_and_rescaled() {
        let map = Dsn6File::decode_with_options(&image::<LittleEndian>(SENTINEL), false).unwrap();
        assert_eq!(map.format(), MapFormat::Dsn6);
        assert_eq!(map.n_real(), [10, 3, 2]);
        assert_eq!(map.origin(), [-2, 0, 5]);
        assert_eq!(map.unit_cell().parameters(), [20.0, 25.0, 30.0, 90.0, 90.0, 90.0]);
        let grid = map.grid();
        for z in 0..2 {
            for y in 0..3 {
                for x in 0..10 {
                    let expected = (f32::from(voxel(x, y, z)) - f32::from(PLUS)) / 2.0;
                    let value = grid.get_grid_value(x as i64 - 2, y as i64, z as i64 + 5).unwrap();
                    assert_eq!(value, expected, "voxel ({}, {}, {})", x, y, z);
                }
            }
        }
    }

    #[test]
    fn big_endian_header_is_detected_by_swapping() {
        let little = Dsn6File::decode_with_options(&image::<LittleEndian>(SENTINEL), false).unwrap();
        let big = Dsn6File::decode_with_options(&image::<BigEndian>(SENTINEL), false).unwrap();
        assert_eq!(little.grid(), big.grid());
    }

    #[test]
    fn missing_sentinel_fails_endian_detection() {
        let err = Dsn6File::decode_with_options(&image::<LittleEndian>(99), false).unwrap_err();
        assert!(matches!(err, MapError::EndianDetection { expected: 100, found: 99 }));
    }

    #[test]
    fn sigma_scaling_is_on_by_default() {
        let map = Dsn6File::decode(&image::<LittleEndian>(SENTINEL)).unwrap();
        let (mean, deviation) = map.grid().mean_and_deviation();
        assert!(mean.abs() < 1e-5);
        assert!((deviation - 1.0).abs() < 1e-5);
    }

    #[test]
    fn missing_bricks_are_a_size_mismatch() {
        let mut bytes = image::<LittleEndian>(SENTINEL);
        bytes.truncate(bytes.len() - 1);
        assert!(matches!(
            Dsn6File::decode_with_options(&bytes, false),
            Err(MapError::MapSizeMismatch { .. })
        ));
    }
}
