use macroquad::color::{BLACK, Color};
use macroquad::math::{Rect, Vec2};
use macroquad::shapes::{draw_line, draw_rectangle};

use crate::keyboard::Keyboard;

const OUTLINE_THICKNESS: f32 = 1.0;

/// Screen-space bands and edges for one key, ready to draw every frame.
pub struct KeyDrawing {
    bands: Vec<Rect>,
    edges: Vec<(Vec2, Vec2)>,
    fill: Color,
}

pub fn build_drawings(keyboard: &Keyboard, origin: Vec2) -> Vec<KeyDrawing> {
    let mut drawings = Vec::with_capacity(keyboard.len());
    keyboard.for_each_key(|outline, fill| {
        let bands = outline
            .fill_bands()
            .into_iter()
            .map(|band| band.offset(origin))
            .collect();
        let edges = outline
            .edges()
            .map(|(start, end)| (start + origin, end + origin))
            .collect();
        drawings.push(KeyDrawing { bands, edges, fill });
    });
    drawings
}

pub fn draw_keyboard(drawings: &[KeyDrawing]) {
    for drawing in drawings {
        for band in &drawing.bands {
            draw_rectangle(band.x, band.y, band.w, band.h, drawing.fill);
        }
        for (start, end) in &drawing.edges {
            draw_line(start.x, start.y, end.x, end.y, OUTLINE_THICKNESS, BLACK);
        }
    }
}
