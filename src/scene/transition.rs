use crate::{
    animation::ease::Ease,
    foundation::core::{Size, Vec2},
    foundation::error::{TrialkitError, TrialkitResult},
};

/// Action key used for the moves a slide transition runs on both scenes.
pub(crate) const TRANSITION_KEY: &str = "trialkit.transition";

/// Direction content travels during a slide.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlideDirection {
    Left,
    Right,
    Up,
    Down,
}

impl SlideDirection {
    /// Displacement of a full surface of `size` in this direction.
    pub(crate) fn offset(self, size: Size) -> Vec2 {
        match self {
            Self::Left => Vec2::new(-size.width, 0.0),
            Self::Right => Vec2::new(size.width, 0.0),
            Self::Up => Vec2::new(0.0, -size.height),
            Self::Down => Vec2::new(0.0, size.height),
        }
    }
}

/// How a newly presented scene replaces the current one.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Transition {
    /// Swap on the next frame.
    #[default]
    None,
    /// The incoming scene pushes the outgoing one off the surface.
    Slide {
        direction: SlideDirection,
        duration_ms: f64,
        #[serde(default)]
        ease: Ease,
    },
}

impl Transition {
    pub fn slide(direction: SlideDirection, duration_ms: f64) -> TrialkitResult<Self> {
        let t = Self::Slide {
            direction,
            duration_ms,
            ease: Ease::Linear,
        };
        t.validate()?;
        Ok(t)
    }

    pub fn eased(self, ease: Ease) -> Self {
        match self {
            Self::None => Self::None,
            Self::Slide {
                direction,
                duration_ms,
                ..
            } => Self::Slide {
                direction,
                duration_ms,
                ease,
            },
        }
    }

    pub fn validate(&self) -> TrialkitResult<()> {
        if let Self::Slide { duration_ms, .. } = *self
            && (!duration_ms.is_finite() || duration_ms < 0.0)
        {
            return Err(TrialkitError::configuration(format!(
                "transition duration must be finite and >= 0 (got {duration_ms})"
            )));
        }
        Ok(())
    }
}
