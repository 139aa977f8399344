pub use kurbo::{Affine, Point, Rect, Size, Vec2};

/// Straight (non-premultiplied) RGBA8 color handed to the rendering backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);
    pub const BLACK: Self = Self::new(0, 0, 0, 255);
    pub const WHITE: Self = Self::new(255, 255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub fn is_transparent(self) -> bool {
        self.a == 0
    }
}

impl Default for Rgba8 {
    fn default() -> Self {
        Self::TRANSPARENT
    }
}

/// Decomposed 2D transform of a node relative to its parent.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Transform2D {
    pub translate: Vec2,
    pub rotation_rad: f64,
    pub scale: Vec2, // default (1,1)
}

impl Default for Transform2D {
    fn default() -> Self {
        Self {
            translate: Vec2::ZERO,
            rotation_rad: 0.0,
            scale: Vec2::new(1.0, 1.0),
        }
    }
}

impl Transform2D {
    pub fn new(translate: Vec2, rotation_rad: f64, scale: f64) -> Self {
        Self {
            translate,
            rotation_rad,
            scale: Vec2::new(scale, scale),
        }
    }

    pub fn to_affine(self) -> Affine {
        // Canonical order: T(translate) * R(rot) * S(scale).
        // The node origin is its anchor point, so rotation and scale pivot there.
        Affine::translate(self.translate)
            * Affine::rotate(self.rotation_rad)
            * Affine::scale_non_uniform(self.scale.x, self.scale.y)
    }
}

/// Inverse of `a`, or `None` when `a` collapses an axis (zero scale).
pub fn invert_affine(a: Affine) -> Option<Affine> {
    let det = a.determinant();
    if det.abs() <= f64::EPSILON || !det.is_finite() {
        return None;
    }
    Some(a.inverse())
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
