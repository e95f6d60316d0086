use imageproc::point::Point;

use crate::util::{bounding_rect, simplify_contour};

/// Polygon simplification tolerance applied before taking a contour's bounding rect.
const CONTOUR_EPSILON: f64 = 3.0;

/// Axis aligned integer rectangle in frame pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    /// Negative sizes are clamped to zero.
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width: width.max(0),
            height: height.max(0),
        }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// True for rects that cover no pixels.
    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn area(&self) -> i64 {
        self.width as i64 * self.height as i64
    }

    pub fn center(&self) -> Point<i32> {
        Point::new(self.x + self.width / 2, self.y + self.height / 2)
    }

    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rect::new(
            x,
            y,
            self.right().max(other.right()) - x,
            self.bottom().max(other.bottom()) - y,
        )
    }

    pub fn intersection_area(&self, other: &Rect) -> i64 {
        let dx = self.right().min(other.right()) - self.x.max(other.x);
        let dy = self.bottom().min(other.bottom()) - self.y.max(other.y);
        if dx > 0 && dy > 0 {
            dx as i64 * dy as i64
        } else {
            0
        }
    }

    /// True when the shared area covers more than `threshold` of either rectangle.
    pub fn overlaps(&self, other: &Rect, threshold: f32) -> bool {
        let overlapped = self.intersection_area(other);
        if overlapped == 0 {
            return false;
        }
        [self.area(), other.area()]
            .into_iter()
            .filter(|area| *area > 0)
            .any(|area| overlapped as f64 / area as f64 > threshold as f64)
    }
}

/// Pixel dimensions of the frame (or frame window) the boxes were found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSize {
    pub width: i32,
    pub height: i32,
}

impl FrameSize {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    pub fn mid_x(&self) -> i32 {
        self.width / 2
    }
}

impl From<(u32, u32)> for FrameSize {
    fn from((width, height): (u32, u32)) -> Self {
        Self::new(width as i32, height as i32)
    }
}

/// One detected glyph candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterBox {
    contour: Vec<Point<i32>>,
    /// Contours of boxes merged into this one.
    absorbed: Vec<Vec<Point<i32>>>,
    pub rect: Rect,
    pub text: String,
}

impl CharacterBox {
    /// Builds an unlabeled box from a raw contour. Returns `None` for an empty contour.
    pub fn from_contour(contour: Vec<Point<i32>>) -> Option<Self> {
        let simplified = simplify_contour(&contour, CONTOUR_EPSILON);
        let rect = bounding_rect(&simplified)?;
        Some(Self {
            contour,
            absorbed: Vec::new(),
            rect,
            text: String::new(),
        })
    }

    /// Builds a box whose contour is the outline of `rect`.
    pub fn from_rect(rect: Rect, text: impl Into<String>) -> Self {
        let contour = vec![
            Point::new(rect.x, rect.y),
            Point::new(rect.right(), rect.y),
            Point::new(rect.right(), rect.bottom()),
            Point::new(rect.x, rect.bottom()),
        ];
        Self {
            contour,
            absorbed: Vec::new(),
            rect,
            text: text.into(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn contour(&self) -> &[Point<i32>] {
        &self.contour
    }

    /// The box's own contour followed by the contours of every box merged into it.
    pub fn outlines(&self) -> impl Iterator<Item = &[Point<i32>]> {
        std::iter::once(self.contour.as_slice())
            .chain(self.absorbed.iter().map(Vec::as_slice))
    }

    /// Grows the rect over `other` and keeps its outlines for masking.
    pub fn absorb(&mut self, other: CharacterBox) {
        self.rect = self.rect.union(&other.rect);
        self.absorbed.push(other.contour);
        self.absorbed.extend(other.absorbed);
    }

    pub fn center(&self) -> Point<i32> {
        self.rect.center()
    }

    pub fn height(&self) -> i32 {
        self.rect.height
    }
}

/// Maps raw contours to unlabeled boxes, skipping empty contours.
pub fn boxes_from_contours<I>(contours: I) -> Vec<CharacterBox>
where
    I: IntoIterator<Item = Vec<Point<i32>>>,
{
    contours
        .into_iter()
        .filter_map(CharacterBox::from_contour)
        .collect()
}

/// Boxes believed to form one word or field, in insertion order.
pub type Cluster = Vec<CharacterBox>;

/// The text of one surviving cluster and the center of its leftmost glyph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledText {
    pub text: String,
    pub center: Point<i32>,
}

/// Which selection rule a frame window is read with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Home/away team names: twin pairs, refined by cluster size.
    Name,
    /// Home/away scores: twin pairs, refined by glyph height.
    Score,
    /// Match clock: vertically monotonic clusters.
    Clock,
}
