use serde::{Deserialize, Serialize};

/// Canvas coordinates. Relative to the parent's frame when the node has a parent.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Translate from a parent's local frame into the parent's enclosing frame.
    pub fn offset_by(&self, origin: Position) -> Position {
        Position::new(self.x + origin.x, self.y + origin.y)
    }

    /// Translate into the local frame of something positioned at `origin`.
    pub fn relative_to(&self, origin: Position) -> Position {
        Position::new(self.x - origin.x, self.y - origin.y)
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle used for containment and bounding box calculations.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub origin: Position,
    pub size: Size,
}

impl Rect {
    pub fn new(origin: Position, size: Size) -> Self {
        Self { origin, size }
    }

    pub fn min_x(&self) -> f64 {
        self.origin.x
    }

    pub fn min_y(&self) -> f64 {
        self.origin.y
    }

    pub fn max_x(&self) -> f64 {
        self.origin.x + self.size.width
    }

    pub fn max_y(&self) -> f64 {
        self.origin.y + self.size.height
    }

    /// True when `other` lies entirely inside `self`, edges included.
    pub fn contains(&self, other: &Rect) -> bool {
        other.min_x() >= self.min_x()
            && other.min_y() >= self.min_y()
            && other.max_x() <= self.max_x()
            && other.max_y() <= self.max_y()
    }

    pub fn padded(&self, padding: f64) -> Rect {
        Rect::new(
            Position::new(self.origin.x - padding, self.origin.y - padding),
            Size::new(
                self.size.width + padding * 2.0,
                self.size.height + padding * 2.0,
            ),
        )
    }

    /// Smallest rectangle covering every input, or `None` for an empty input.
    pub fn bounding<I>(rects: I) -> Option<Rect>
    where
        I: IntoIterator<Item = Rect>,
    {
        let mut iter = rects.into_iter();
        let first = iter.next()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) =
            (first.min_x(), first.min_y(), first.max_x(), first.max_y());

        for rect in iter {
            min_x = min_x.min(rect.min_x());
            min_y = min_y.min(rect.min_y());
            max_x = max_x.max(rect.max_x());
            max_y = max_y.max(rect.max_y());
        }

        Some(Rect::new(
            Position::new(min_x, min_y),
            Size::new(max_x - min_x, max_y - min_y),
        ))
    }
}
