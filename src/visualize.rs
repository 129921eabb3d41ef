//! ASCII-art rendering of a delta field.
//!
//! The field is reduced to at most 64 columns. Character cells are about
//! twice as tall as wide, so each block covers twice as many rows as
//! columns. Every block maps its largest delta to one of 17 glyphs.

use core::fmt::{self, Write};

use crate::delta::DeltaField;
use crate::sink::{Highlight, TextSink};

/// Glyphs from no difference to the largest one.
const PALETTE: &[u8; 17] = b" .,:~=+?7IZ$08DNM";

/// Indent of every rendered row.
pub(crate) const MARGIN: &str = "          ";

const MAX_COLUMNS: u32 = 64;

/// Render `field` as rows of glyphs, the top image row first.
///
/// `max` is the max delta of the field and maps to the heaviest glyph.
/// Blocks containing NaN or infinity always use the heaviest glyph. With
/// colors enabled, blocks above `max_threshold` (and special blocks) are
/// red and blocks above `mean_threshold` yellow.
///
/// Rows are separated by `\n` with no trailing newline. An empty field
/// writes nothing.
pub fn render_delta_image(
    sink: &mut TextSink<'_>,
    field: &DeltaField,
    max: f32,
    max_threshold: f32,
    mean_threshold: f32,
) -> fmt::Result {
    let (width, height) = field.size();
    if width == 0 || height == 0 {
        return Ok(());
    }

    let block_width = width.div_ceil(MAX_COLUMNS);
    let block_height = 2 * block_width;
    let columns = width.div_ceil(block_width);
    let rows = height.div_ceil(block_height);

    for row in 0..rows {
        if row > 0 {
            sink.write_char('\n')?;
        }
        sink.write_str(MARGIN)?;
        sink.write_char('|')?;

        // Row 0 is the bottom of the image
        let y = (rows - row - 1) * block_height;
        for column in 0..columns {
            let x = column * block_width;
            let block = block_max(
                field,
                x,
                y,
                block_width.min(width - x),
                block_height.min(height - y),
            );
            let (glyph, highlight) = match block {
                None => (PALETTE[PALETTE.len() - 1], Some(Highlight::Red)),
                Some(value) => {
                    let highlight = if value > max_threshold {
                        Some(Highlight::Red)
                    } else if value > mean_threshold {
                        Some(Highlight::Yellow)
                    } else {
                        None
                    };
                    (PALETTE[glyph_index(value, max)], highlight)
                }
            };
            sink.write_highlighted(highlight, format_args!("{}", glyph as char))?;
        }

        sink.write_char('|')?;
    }
    Ok(())
}

/// Largest value of a block, `None` if it contains a special value.
fn block_max(field: &DeltaField, x: u32, y: u32, width: u32, height: u32) -> Option<f32> {
    let mut max = 0.0f32;
    for yb in y..y + height {
        for xb in x..x + width {
            let value = field.get(xb, yb);
            if !value.is_finite() {
                return None;
            }
            max = max.max(value);
        }
    }
    Some(max)
}

fn glyph_index(value: f32, max: f32) -> usize {
    if max == 0.0 {
        return 0;
    }
    // NaN from a bogus max casts to 0
    let ratio = (value / max).clamp(0.0, 1.0);
    (ratio * (PALETTE.len() - 1) as f32).round() as usize
}
