//! Geometry primitives for match rectangles and hit testing

/// Point in page coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FloatPoint {
    pub x: f32,
    pub y: f32,
}

impl FloatPoint {
    /// Create a new point
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point
    pub fn distance_squared(&self, other: &FloatPoint) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

/// Rectangle in page coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FloatRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl FloatRect {
    /// Create a new rectangle
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create an empty rectangle
    pub fn empty() -> Self {
        Self::default()
    }

    /// Check if rectangle is empty
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Check if rectangles intersect
    pub fn intersects(&self, other: &FloatRect) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }

    /// Union of two rectangles
    pub fn union(&self, other: &FloatRect) -> FloatRect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }

        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = (self.x + self.width).max(other.x + other.width);
        let bottom = (self.y + self.height).max(other.y + other.height);

        FloatRect::new(x, y, right - x, bottom - y)
    }

    /// Center point of the rectangle
    pub fn center(&self) -> FloatPoint {
        FloatPoint::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Translate by an offset
    pub fn translated(&self, dx: f32, dy: f32) -> FloatRect {
        FloatRect::new(self.x + dx, self.y + dy, self.width, self.height)
    }
}
