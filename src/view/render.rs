//! Line rendering
//!
//! Paints one grid row at a time from cell runs. Painting goes through the
//! [`Surface`] trait so the pass is backend-agnostic and testable; the
//! facade owns the row loop, selection intersection and trailing fill.

use crate::session::{CellRun, Rgb, SessionError, TerminalSession};
use crate::view::metrics::CellMetrics;

/// Text attributes for one glyph draw call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlyphStyle {
    pub color: Rgb,
    pub bold: bool,
    pub underline: bool,
    pub strike: bool,
}

/// Minimal painting backend. `draw_glyph` takes the text baseline origin.
pub trait Surface {
    fn fill_rect(&mut self, x: i32, y: i32, width: i32, height: i32, color: Rgb, alpha: u8);
    fn draw_glyph(&mut self, cp: char, x: i32, y: i32, style: &GlyphStyle);
}

/// Paint one row: for each run, a background fill over its span, then each
/// codepoint at its sub-column. Cells under the visible cursor or inside
/// `[sel_col1, sel_col2)` are inverted: a foreground overlay rect with the
/// glyph drawn in the background color. NUL cells paint background only.
///
/// `top` is the pixel top of the row; `cursor` carries the visible cursor's
/// `(row, col)`. `run` is caller-owned scratch reused across rows.
#[allow(clippy::too_many_arguments)]
pub fn draw_row<S: TerminalSession + ?Sized>(
    surface: &mut dyn Surface,
    session: &S,
    metrics: &CellMetrics,
    top: i32,
    row: i32,
    cols: usize,
    cursor: Option<(i32, i32)>,
    sel: Option<(i32, i32)>,
    bg_alpha: u8,
    run: &mut CellRun,
) -> Result<(), SessionError> {
    let cw = metrics.cell_width;
    let ch = metrics.cell_height;
    let left = metrics.margins.left;

    let mut col = 0usize;
    while col < cols {
        session.cell_run(row, col, run)?;
        let span = run.col_span.max(1);
        let fg = run.fg;
        let bg = run.bg;
        let style = GlyphStyle {
            color: fg,
            bold: run.bold,
            underline: run.underline,
            strike: run.strike,
        };
        let inverted_style = GlyphStyle { color: bg, ..style };

        let x = left + col as i32 * cw;
        surface.fill_rect(x, top, span as i32 * cw, ch, bg, bg_alpha);

        let mut sub = 0usize;
        for (i, &cp) in run.codepoints().iter().enumerate() {
            let width = run.widths()[i] as usize;
            let current = (col + sub) as i32;

            let under_cursor = cursor == Some((row, current));
            let in_selection = sel.is_some_and(|(c1, c2)| c1 <= current && current < c2);
            let invert = under_cursor || in_selection;
            if invert {
                surface.fill_rect(
                    left + current * cw,
                    top,
                    width.max(1) as i32 * cw,
                    ch,
                    fg,
                    u8::MAX,
                );
            }

            if cp != '\0' {
                let gx = left + current * cw;
                let gy = top - metrics.cell_top;
                surface.draw_glyph(cp, gx, gy, if invert { &inverted_style } else { &style });
            }

            sub += width;
        }

        col += span;
    }
    Ok(())
}
