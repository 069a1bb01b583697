use macroquad::math::{Rect, Vec2};

/// Closed polygon describing the visible and clickable area of a key.
///
/// Containment follows the usual raster convention: points on a left or top
/// edge are inside, points on a right or bottom edge are outside, so two
/// outlines sharing an edge never both claim it.
#[derive(Clone, Debug, PartialEq)]
pub struct Outline {
    points: Vec<Vec2>,
}

impl Outline {
    pub fn new(points: Vec<Vec2>) -> Self {
        Self { points }
    }

    pub fn from_coords(coords: &[(f32, f32)]) -> Self {
        Self::new(coords.iter().map(|&(x, y)| Vec2::new(x, y)).collect())
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn edges(&self) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
        let count = self.points.len();
        (0..count).map(move |i| (self.points[i], self.points[(i + 1) % count]))
    }

    pub fn contains(&self, point: Vec2) -> bool {
        if self.points.len() < 3 {
            return false;
        }
        let crossings = self
            .crossings(point.y)
            .into_iter()
            .filter(|x| point.x < *x)
            .count();
        crossings % 2 == 1
    }

    pub fn bounds(&self) -> Rect {
        let Some(first) = self.points.first() else {
            return Rect::new(0.0, 0.0, 0.0, 0.0);
        };
        let (min, max) = self
            .points
            .iter()
            .fold((*first, *first), |(min, max), p| (min.min(*p), max.max(*p)));
        Rect::new(min.x, min.y, max.x - min.x, max.y - min.y)
    }

    /// Splits the outline into horizontal bands of filled rectangles.
    ///
    /// Exact for axis-aligned outlines, which is all the keyboard builds.
    pub fn fill_bands(&self) -> Vec<Rect> {
        let mut levels: Vec<f32> = self.points.iter().map(|p| p.y).collect();
        levels.sort_by(f32::total_cmp);
        levels.dedup();

        let mut bands = Vec::new();
        for pair in levels.windows(2) {
            let (top, bottom) = (pair[0], pair[1]);
            let mut xs = self.crossings((top + bottom) * 0.5);
            xs.sort_by(f32::total_cmp);
            for span in xs.chunks_exact(2) {
                bands.push(Rect::new(span[0], top, span[1] - span[0], bottom - top));
            }
        }
        bands
    }

    /// X coordinates where a horizontal line at `y` crosses the outline.
    ///
    /// An edge counts when `y` lies in `[low, high)` of its vertical extent.
    fn crossings(&self, y: f32) -> Vec<f32> {
        self.edges()
            .filter(|(a, b)| (a.y > y) != (b.y > y))
            .map(|(a, b)| (b.x - a.x) * (y - a.y) / (b.y - a.y) + a.x)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Outline {
        Outline::from_coords(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)])
    }

    // Key-like shape: narrow on top, full width along the bottom half.
    fn notched() -> Outline {
        Outline::from_coords(&[
            (0.0, 0.0),
            (30.0, 0.0),
            (30.0, 100.0),
            (40.0, 100.0),
            (40.0, 200.0),
            (0.0, 200.0),
        ])
    }

    #[test]
    fn left_and_top_edges_are_inside() {
        let outline = square();
        assert!(outline.contains(Vec2::new(0.0, 0.0)));
        assert!(outline.contains(Vec2::new(0.0, 5.0)));
        assert!(outline.contains(Vec2::new(5.0, 0.0)));
    }

    #[test]
    fn right_and_bottom_edges_are_outside() {
        let outline = square();
        assert!(!outline.contains(Vec2::new(10.0, 5.0)));
        assert!(!outline.contains(Vec2::new(5.0, 10.0)));
        assert!(!outline.contains(Vec2::new(10.0, 10.0)));
    }

    #[test]
    fn notch_excludes_upper_right_corner() {
        let outline = notched();
        assert!(outline.contains(Vec2::new(29.0, 10.0)));
        assert!(!outline.contains(Vec2::new(30.0, 10.0)));
        assert!(!outline.contains(Vec2::new(35.0, 99.0)));
        assert!(outline.contains(Vec2::new(35.0, 100.0)));
        assert!(outline.contains(Vec2::new(39.9, 199.9)));
    }

    #[test]
    fn degenerate_outline_contains_nothing() {
        let outline = Outline::from_coords(&[(0.0, 0.0), (10.0, 10.0)]);
        assert!(!outline.contains(Vec2::new(0.0, 0.0)));
        assert!(!Outline::new(Vec::new()).contains(Vec2::ZERO));
    }

    #[test]
    fn nan_point_is_outside() {
        assert!(!square().contains(Vec2::new(f32::NAN, 5.0)));
    }

    #[test]
    fn bounds_cover_all_vertices() {
        let bounds = notched().bounds();
        assert_eq!(bounds, Rect::new(0.0, 0.0, 40.0, 200.0));
        assert_eq!(Outline::new(Vec::new()).bounds().w, 0.0);
    }

    #[test]
    fn fill_bands_tile_the_notched_shape() {
        let bands = notched().fill_bands();
        assert_eq!(
            bands,
            vec![
                Rect::new(0.0, 0.0, 30.0, 100.0),
                Rect::new(0.0, 100.0, 40.0, 100.0),
            ]
        );
    }

    #[test]
    fn fill_bands_split_around_a_central_gap() {
        // U shape: two posts joined along the bottom.
        let outline = Outline::from_coords(&[
            (0.0, 0.0),
            (10.0, 0.0),
            (10.0, 50.0),
            (20.0, 50.0),
            (20.0, 0.0),
            (30.0, 0.0),
            (30.0, 60.0),
            (0.0, 60.0),
        ]);
        let bands = outline.fill_bands();
        assert_eq!(bands.len(), 3);
        let area: f32 = bands.iter().map(|r| r.w * r.h).sum();
        assert_eq!(area, 30.0 * 60.0 - 10.0 * 50.0);
    }
}
