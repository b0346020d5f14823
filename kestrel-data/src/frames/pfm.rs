//! Portable Float Map reader.
//!
//! DispNet writes its disparity maps as single channel PFM (`Pf`). Rows are stored
//! bottom to top; a negative scale marks little-endian samples.

use std::io::Write;
use std::path::Path;

use thiserror::Error;

/// Reasons a buffer is not a usable single channel PFM.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PfmError {
    #[error("color PFM is not a depth map")]
    Color,

    #[error("bad magic {0:?}")]
    BadMagic(Option<String>),

    #[error("missing {0}")]
    MissingField(&'static str),

    #[error("bad {field}: {value:?}")]
    BadField { field: &'static str, value: String },

    #[error("empty {0}x{1} map")]
    Empty(u32, u32),

    #[error("{0}x{1} map does not fit in memory")]
    TooLarge(u32, u32),

    #[error("expected {expected} samples, found {found} bytes")]
    Truncated { expected: usize, found: usize },
}

/// A decoded single channel float map, rows top to bottom.
#[derive(Debug, Clone, PartialEq)]
pub struct PfmImage {
    pub width: u32,
    pub height: u32,
    pub data: Vec<f32>,
}

fn next_token<'a>(bytes: &'a [u8], pos: &mut usize) -> Option<&'a str> {
    while *pos < bytes.len() && bytes[*pos].is_ascii_whitespace() {
        *pos += 1;
    }
    let start = *pos;
    while *pos < bytes.len() && !bytes[*pos].is_ascii_whitespace() {
        *pos += 1;
    }
    if start == *pos {
        return None;
    }
    std::str::from_utf8(&bytes[start..*pos]).ok()
}

/// Parse a PFM file held in memory.
pub fn parse(bytes: &[u8]) -> Result<PfmImage, PfmError> {
    let mut pos = 0;

    match next_token(bytes, &mut pos) {
        Some("Pf") => {}
        Some("PF") => return Err(PfmError::Color),
        other => return Err(PfmError::BadMagic(other.map(str::to_string))),
    }

    let mut header_value = |field: &'static str| {
        next_token(bytes, &mut pos).ok_or(PfmError::MissingField(field))
    };
    let width: u32 = parse_field("width", header_value("width")?)?;
    let height: u32 = parse_field("height", header_value("height")?)?;
    let scale: f32 = parse_field("scale", header_value("scale")?)?;

    if width == 0 || height == 0 {
        return Err(PfmError::Empty(width, height));
    }

    // Exactly one whitespace byte separates the header from the samples.
    pos += 1;

    // Sizes come from an untrusted header; the body length bounds the allocation.
    let (count, byte_len) = (width as usize)
        .checked_mul(height as usize)
        .and_then(|count| Some((count, count.checked_mul(4)?)))
        .ok_or(PfmError::TooLarge(width, height))?;
    let body = bytes.get(pos..).unwrap_or_default();
    if body.len() < byte_len {
        return Err(PfmError::Truncated {
            expected: count,
            found: body.len(),
        });
    }

    let little_endian = scale < 0.0;
    let mut data = vec![0.0f32; count];
    let row_len = width as usize;
    for (src_row, chunk) in body[..byte_len].chunks_exact(row_len * 4).enumerate() {
        let dst_row = height as usize - 1 - src_row;
        for (x, sample) in chunk.chunks_exact(4).enumerate() {
            let raw = [sample[0], sample[1], sample[2], sample[3]];
            data[dst_row * row_len + x] = if little_endian {
                f32::from_le_bytes(raw)
            } else {
                f32::from_be_bytes(raw)
            };
        }
    }

    Ok(PfmImage {
        width,
        height,
        data,
    })
}

fn parse_field<T: std::str::FromStr>(field: &'static str, value: &str) -> Result<T, PfmError> {
    value.parse().map_err(|_| PfmError::BadField {
        field,
        value: value.to_string(),
    })
}

/// Write a little-endian single channel PFM. `data` is given top to bottom.
pub fn write(path: &Path, width: u32, height: u32, data: &[f32]) -> std::io::Result<()> {
    let mut out = Vec::with_capacity(32 + data.len() * 4);
    write!(out, "Pf\n{} {}\n-1.0\n", width, height)?;
    for row in data.chunks(width.max(1) as usize).rev() {
        for v in row {
            out.extend_from_slice(&v.to_le_bytes());
        }
    }
    std::fs::write(path, out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flips_rows() {
        let mut bytes = b"Pf\n2 2\n-1.0\n".to_vec();
        for v in [3.0f32, 4.0, 1.0, 2.0] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        let pfm = parse(&bytes).unwrap();
        assert_eq!((pfm.width, pfm.height), (2, 2));
        assert_eq!(pfm.data, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_parse_big_endian() {
        let mut bytes = b"Pf 1 1 1.0\n".to_vec();
        bytes.extend_from_slice(&12.5f32.to_be_bytes());
        assert_eq!(parse(&bytes).unwrap().data, vec![12.5]);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse(b"PF\n1 1\n-1.0\n"), Err(PfmError::Color));
        assert!(matches!(parse(b"P5\n1 1\n255\n"), Err(PfmError::BadMagic(_))));
        assert_eq!(
            parse(b"Pf\n2 2\n-1.0\n\0\0\0\0"),
            Err(PfmError::Truncated {
                expected: 4,
                found: 4
            })
        );
        assert!(matches!(
            parse(b"Pf\nwide 2\n-1.0\n"),
            Err(PfmError::BadField { field: "width", .. })
        ));
        assert_eq!(parse(b"Pf\n3"), Err(PfmError::MissingField("height")));
        assert_eq!(parse(b"Pf\n0 4\n-1.0\n"), Err(PfmError::Empty(0, 4)));
    }

    #[test]
    fn test_parse_huge_header_without_samples() {
        let err = parse(b"Pf\n4294967295 4294967295\n-1.0\n\0\0\0\0").unwrap_err();
        assert!(matches!(
            err,
            PfmError::TooLarge(..) | PfmError::Truncated { .. }
        ));

        assert!(matches!(
            parse(b"Pf\n100000 100000\n-1.0\n\0\0\0\0"),
            Err(PfmError::Truncated { found: 4, .. })
        ));
    }

    #[test]
    fn test_write_then_parse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("disp.pfm");
        let data = vec![0.5, 1.5, 2.5, 3.5, 4.5, 5.5];
        write(&path, 2, 3, &data).unwrap();

        let pfm = parse(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!((pfm.width, pfm.height), (2, 3));
        assert_eq!(pfm.data, data);
    }
}
