use geo::{Area, Coord, EuclideanDistance, LineString, Polygon, Simplify};
use image::{DynamicImage, GenericImage, GrayImage, Luma, Rgba};
use imageproc::{drawing::draw_polygon_mut, point::Point};

use crate::{FrameSize, Rect};

pub(crate) fn to_geo_line(points: &[Point<i32>]) -> LineString<f64> {
    let points = points
        .iter()
        .map(|point| Coord {
            x: point.x as f64,
            y: point.y as f64,
        })
        .collect();
    LineString::new(points)
}

pub fn euclidean_distance(x1: i32, y1: i32, x2: i32, y2: i32) -> f64 {
    let from = geo::Point::new(x1 as f64, y1 as f64);
    let to = geo::Point::new(x2 as f64, y2 as f64);
    from.euclidean_distance(&to)
}

/// Area enclosed by the closed contour polygon.
pub fn contour_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    Polygon::new(to_geo_line(points), vec![]).unsigned_area()
}

/// Douglas-Peucker approximation of the contour, keeping only original vertices.
pub fn simplify_contour(points: &[Point<i32>], epsilon: f64) -> Vec<Point<i32>> {
    if points.len() < 3 {
        return points.to_vec();
    }
    to_geo_line(points)
        .simplify(&epsilon)
        .coords()
        .map(|coord| Point::new(coord.x.round() as i32, coord.y.round() as i32))
        .collect()
}

/// Inclusive pixel extent of the points, so a single point is a 1x1 rect.
pub fn bounding_rect(points: &[Point<i32>]) -> Option<Rect> {
    let first = points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for point in &points[1..] {
        min_x = min_x.min(point.x);
        min_y = min_y.min(point.y);
        max_x = max_x.max(point.x);
        max_y = max_y.max(point.y);
    }
    Some(Rect::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
}

/// Widens a glyph rect so its crop carries some background around the glyph.
pub fn apply_margin(rect: Rect, margin: i32, frame: FrameSize) -> Rect {
    let half = (margin.max(0) + 1) / 2;
    let mut margin_x = half;
    if rect.width < 1 && margin > 0 {
        margin_x = 2;
    }

    let (x, width) = if rect.width < rect.height / 5 {
        // thin glyphs such as "1" get a width derived from their height
        let x = (rect.x - rect.height / 6).max(0);
        let width = if x + rect.height < frame.width {
            rect.height / 2
        } else {
            frame.width - x - 1
        };
        (x, width)
    } else {
        let x = (rect.x - margin_x).max(0);
        let width = if x + rect.width + 3 * margin_x < frame.width {
            rect.width + 3 * margin_x
        } else {
            frame.width - x - 1
        };
        (x, width)
    };

    let y = (rect.y - half).max(0);
    let height = if y + rect.height + 2 * half < frame.height {
        rect.height + 2 * half
    } else {
        frame.height - y - 1
    };

    Rect::new(x, y, width, height)
}

pub(crate) fn part_image(image: &DynamicImage, rect: &Rect) -> DynamicImage {
    let x = (rect.x.max(0) as u32).min(image.width());
    let y = (rect.y.max(0) as u32).min(image.height());
    let width = (rect.width.max(0) as u32).min(image.width() - x);
    let height = (rect.height.max(0) as u32).min(image.height() - y);
    log::trace!("Slicing glyph crop to {rect:?}");
    image.crop_imm(x, y, width, height)
}

/// Blanks every crop pixel outside the given outlines. `origin` is the crop's top left
/// corner in frame coordinates.
pub(crate) fn mask_outlines<'a, I>(crop: &mut DynamicImage, origin: Point<i32>, outlines: I)
where
    I: IntoIterator<Item = &'a [Point<i32>]>,
{
    let (width, height) = (crop.width(), crop.height());
    let mut mask = GrayImage::new(width, height);
    for outline in outlines {
        let mut points = outline
            .iter()
            .map(|point| Point::new(point.x - origin.x, point.y - origin.y))
            .collect::<Vec<_>>();
        points.dedup();
        if points.len() > 1 && points.first() == points.last() {
            points.pop();
        }
        match points.as_slice() {
            [] => {}
            [point] => {
                let inside = (0..width as i32).contains(&point.x)
                    && (0..height as i32).contains(&point.y);
                if inside {
                    mask.put_pixel(point.x as u32, point.y as u32, Luma([255]));
                }
            }
            polygon => draw_polygon_mut(&mut mask, polygon, Luma([255])),
        }
    }

    for (x, y, Luma([value])) in mask.enumerate_pixels() {
        if *value == 0 {
            crop.put_pixel(x, y, Rgba([0, 0, 0, 255]));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn square(x: i32, y: i32, side: i32) -> Vec<Point<i32>> {
        vec![
            Point::new(x, y),
            Point::new(x + side, y),
            Point::new(x + side, y + side),
            Point::new(x, y + side),
        ]
    }

    #[test]
    fn contour_area_is_shoelace_area() {
        assert_eq!(contour_area(&square(4, 4, 10)), 100.0);
        assert_eq!(contour_area(&square(4, 4, 10)[..2]), 0.0);
    }

    #[test]
    fn bounding_rect_is_inclusive() {
        assert_eq!(bounding_rect(&square(4, 6, 10)), Some(Rect::new(4, 6, 11, 11)));
        assert_eq!(bounding_rect(&[]), None);
    }

    #[test]
    fn simplify_keeps_corners() {
        let mut outline = Vec::new();
        for x in 0..20 {
            outline.push(Point::new(x, 0));
        }
        for y in 1..20 {
            outline.push(Point::new(19, y));
        }
        let simplified = simplify_contour(&outline, 3.0);
        assert!(simplified.len() < outline.len());
        assert_eq!(bounding_rect(&simplified), bounding_rect(&outline));
    }

    #[test]
    fn distance_between_corners() {
        assert_eq!(euclidean_distance(0, 0, 3, 4), 5.0);
        assert_eq!(euclidean_distance(-2, 7, -2, 7), 0.0);
    }

    #[test]
    fn mask_blanks_pixels_outside_outline() {
        let mut crop = DynamicImage::ImageLuma8(GrayImage::from_pixel(10, 10, Luma([200])));
        let outline = square(12, 12, 4);
        mask_outlines(&mut crop, Point::new(10, 10), [outline.as_slice()]);

        let crop = crop.to_luma8();
        assert_eq!(crop.get_pixel(2, 2).0, [200]);
        assert_eq!(crop.get_pixel(6, 6).0, [200]);
        assert_eq!(crop.get_pixel(4, 4).0, [200]);
        assert_eq!(crop.get_pixel(1, 1).0, [0]);
        assert_eq!(crop.get_pixel(8, 3).0, [0]);
    }

    #[test]
    fn margin_widens_regular_glyph() {
        let frame = FrameSize::new(200, 100);
        let rect = apply_margin(Rect::new(20, 20, 10, 14), 4, frame);
        assert_eq!(rect, Rect::new(18, 18, 16, 18));
    }

    #[test]
    fn margin_reshapes_thin_glyph() {
        let frame = FrameSize::new(200, 100);
        let rect = apply_margin(Rect::new(30, 20, 2, 24), 4, frame);
        assert_eq!(rect, Rect::new(26, 18, 12, 28));
    }

    #[test]
    fn margin_clamps_to_frame() {
        let frame = FrameSize::new(40, 30);
        let rect = apply_margin(Rect::new(0, 0, 36, 28), 4, frame);
        assert_eq!(rect, Rect::new(0, 0, 39, 29));
    }
}
