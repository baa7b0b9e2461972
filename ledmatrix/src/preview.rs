//! Text preview of a grid, for running without a display attached

use crate::grid::ColorGrid;

/// Renders every other row of `grid` as shaded block characters
pub fn ascii(grid: &ColorGrid) -> String {
    let mut out = String::with_capacity(grid.size() * (grid.size() / 2 + 1) * 3);
    for row in grid.rows().step_by(2) {
        for cell in row {
            out.push(shade(cell.luminance()));
        }
        out.push('\n');
    }
    out
}

fn shade(luminance: f32) -> char {
    match luminance as u32 {
        l if l > 200 => '█',
        l if l > 150 => '▓',
        l if l > 100 => '▒',
        l if l > 50 => '░',
        _ => ' ',
    }
}
