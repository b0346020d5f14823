//! printf-style frame filename patterns.
//!
//! Dataset conventions name their per-frame files with a C format string such as
//! `%06d.png`. Only the integer subset is supported: `%d`, `%Nd`, `%0Nd` and the
//! `%%` escape. A pattern must contain exactly one index conversion.

use thiserror::Error;

/// Widest field accepted in a conversion such as `%06d`.
pub const MAX_FIELD_WIDTH: usize = 64;

/// Errors produced while rendering a filename pattern.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("Pattern '{0}' has no frame index conversion")]
    MissingIndex(String),

    #[error("Pattern '{0}' has more than one frame index conversion")]
    MultipleIndices(String),

    #[error("Pattern '{pattern}' has an unsupported conversion at byte {offset}")]
    Unsupported { pattern: String, offset: usize },

    #[error("Pattern '{0}' ends inside a conversion")]
    Truncated(String),

    #[error(
        "Pattern '{pattern}' has a field width above {} at byte {offset}",
        MAX_FIELD_WIDTH
    )]
    WidthTooLarge { pattern: String, offset: usize },
}

/// Render `pattern` with `frame_idx` substituted for its index conversion.
pub fn render_frame_name(pattern: &str, frame_idx: usize) -> Result<String, PatternError> {
    let mut out = String::with_capacity(pattern.len() + 8);
    let mut conversions = 0;
    let mut chars = pattern.char_indices().peekable();

    while let Some((offset, c)) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }

        if let Some(&(_, '%')) = chars.peek() {
            chars.next();
            out.push('%');
            continue;
        }

        let mut zero_pad = false;
        if let Some(&(_, '0')) = chars.peek() {
            zero_pad = true;
            chars.next();
        }

        let mut width = 0usize;
        let mut conversion = None;
        for (_, c) in chars.by_ref() {
            match c.to_digit(10) {
                Some(digit) => {
                    width = width * 10 + digit as usize;
                    if width > MAX_FIELD_WIDTH {
                        return Err(PatternError::WidthTooLarge {
                            pattern: pattern.to_string(),
                            offset,
                        });
                    }
                }
                None => {
                    conversion = Some(c);
                    break;
                }
            }
        }

        match conversion {
            Some('d') | Some('i') | Some('u') => {
                conversions += 1;
                if conversions > 1 {
                    return Err(PatternError::MultipleIndices(pattern.to_string()));
                }
                if zero_pad {
                    out.push_str(&format!("{:0width$}", frame_idx, width = width));
                } else {
                    out.push_str(&format!("{:>width$}", frame_idx, width = width));
                }
            }
            Some(_) => {
                return Err(PatternError::Unsupported {
                    pattern: pattern.to_string(),
                    offset,
                });
            }
            None => return Err(PatternError::Truncated(pattern.to_string())),
        }
    }

    if conversions == 0 {
        return Err(PatternError::MissingIndex(pattern.to_string()));
    }

    Ok(out)
}

/// Check that `pattern` renders without rendering anything in particular.
pub fn check_pattern(pattern: &str) -> Result<(), PatternError> {
    render_frame_name(pattern, 0).map(|_| ())
}
