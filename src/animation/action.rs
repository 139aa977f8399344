use std::fmt;
use std::rc::Rc;

use crate::{
    animation::ease::Ease,
    foundation::core::{Point, Vec2},
    foundation::error::{TrialkitError, TrialkitResult},
    node::id::NodeId,
    scene::stage::Stage,
};

/// Callback run by [`Action::custom`]. Receives the stage and the node the action runs on.
pub type CustomCallback = Rc<dyn Fn(&mut Stage, NodeId)>;

/// Node property animated by a tween.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum TweenProperty {
    MoveTo(Point),
    MoveBy(Vec2),
    ScaleTo(f64),
    RotateTo(f64),
    RotateBy(f64),
    AlphaTo(f64),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Tween {
    pub(crate) property: TweenProperty,
    pub(crate) duration_ms: f64,
    pub(crate) ease: Ease,
}

pub(crate) enum ActionKind {
    Tween(Tween),
    Wait { duration_ms: f64 },
    Custom(CustomCallback),
    Sequence(Vec<Action>),
    Group(Vec<Action>),
    /// `count == None` repeats forever.
    Repeat { body: Action, count: Option<u32> },
}

/// Immutable description of a timed or instantaneous node mutation.
///
/// Actions are cheap to clone and can be run any number of times, on any number of nodes.
/// Running one creates an independent run with its own elapsed time (see
/// [`Stage::run_action`]). Malformed parameters are rejected here, so a run never fails halfway.
///
/// ```
/// use trialkit::{Action, Ease, Point};
///
/// let slide = Action::move_to(Point::new(200.0, 400.0), 250.0)
///     .unwrap()
///     .eased(Ease::OutCubic);
/// let blink = Action::repeat(
///     Action::sequence([
///         Action::fade_alpha_to(0.0, 100.0).unwrap(),
///         Action::fade_alpha_to(1.0, 100.0).unwrap(),
///     ]),
///     3,
/// )
/// .unwrap();
/// assert_eq!(Action::group([slide, blink]).duration_ms(), Some(600.0));
/// ```
#[derive(Clone)]
pub struct Action {
    pub(crate) kind: Rc<ActionKind>,
}

fn check_duration(duration_ms: f64) -> TrialkitResult<f64> {
    if !duration_ms.is_finite() || duration_ms < 0.0 {
        return Err(TrialkitError::animation(format!(
            "duration must be finite and >= 0 (got {duration_ms})"
        )));
    }
    Ok(duration_ms)
}

fn check_finite(what: &str, v: f64) -> TrialkitResult<f64> {
    if !v.is_finite() {
        return Err(TrialkitError::animation(format!(
            "{what} must be finite (got {v})"
        )));
    }
    Ok(v)
}

impl Action {
    fn new(kind: ActionKind) -> Self {
        Self {
            kind: Rc::new(kind),
        }
    }

    fn tween(property: TweenProperty, duration_ms: f64) -> TrialkitResult<Self> {
        Ok(Self::new(ActionKind::Tween(Tween {
            property,
            duration_ms: check_duration(duration_ms)?,
            ease: Ease::Linear,
        })))
    }

    /// Move the node's position (in its parent's space) to `point`.
    pub fn move_to(point: Point, duration_ms: f64) -> TrialkitResult<Self> {
        check_finite("move target x", point.x)?;
        check_finite("move target y", point.y)?;
        Self::tween(TweenProperty::MoveTo(point), duration_ms)
    }

    /// Move the node by `delta` relative to where it is when the run starts.
    pub fn move_by(delta: Vec2, duration_ms: f64) -> TrialkitResult<Self> {
        check_finite("move delta x", delta.x)?;
        check_finite("move delta y", delta.y)?;
        Self::tween(TweenProperty::MoveBy(delta), duration_ms)
    }

    pub fn scale_to(scale: f64, duration_ms: f64) -> TrialkitResult<Self> {
        Self::tween(
            TweenProperty::ScaleTo(check_finite("scale", scale)?),
            duration_ms,
        )
    }

    /// Rotate to an absolute angle in radians.
    pub fn rotate_to(radians: f64, duration_ms: f64) -> TrialkitResult<Self> {
        Self::tween(
            TweenProperty::RotateTo(check_finite("rotation", radians)?),
            duration_ms,
        )
    }

    /// Rotate by `radians` relative to the angle at run start.
    pub fn rotate_by(radians: f64, duration_ms: f64) -> TrialkitResult<Self> {
        Self::tween(
            TweenProperty::RotateBy(check_finite("rotation", radians)?),
            duration_ms,
        )
    }

    pub fn fade_alpha_to(alpha: f64, duration_ms: f64) -> TrialkitResult<Self> {
        if !(0.0..=1.0).contains(&alpha) {
            return Err(TrialkitError::animation(format!(
                "alpha target must be within [0, 1] (got {alpha})"
            )));
        }
        Self::tween(TweenProperty::AlphaTo(alpha), duration_ms)
    }

    pub fn wait(duration_ms: f64) -> TrialkitResult<Self> {
        Ok(Self::new(ActionKind::Wait {
            duration_ms: check_duration(duration_ms)?,
        }))
    }

    /// Invoke `callback` once, on the frame the run reaches it.
    pub fn custom(callback: impl Fn(&mut Stage, NodeId) + 'static) -> Self {
        Self::new(ActionKind::Custom(Rc::new(callback)))
    }

    /// Run `actions` one after another.
    pub fn sequence(actions: impl IntoIterator<Item = Action>) -> Self {
        Self::new(ActionKind::Sequence(actions.into_iter().collect()))
    }

    /// Run `actions` together; completes when the last one does.
    pub fn group(actions: impl IntoIterator<Item = Action>) -> Self {
        Self::new(ActionKind::Group(actions.into_iter().collect()))
    }

    pub fn repeat(body: Action, count: u32) -> TrialkitResult<Self> {
        if count == 0 {
            return Err(TrialkitError::animation("repeat count must be > 0"));
        }
        Ok(Self::new(ActionKind::Repeat {
            body,
            count: Some(count),
        }))
    }

    /// Repeat `body` until the run is removed.
    pub fn repeat_forever(body: Action) -> Self {
        Self::new(ActionKind::Repeat { body, count: None })
    }

    /// Copy of this action with `ease` applied. Only tweens are affected.
    pub fn eased(self, ease: Ease) -> Self {
        match &*self.kind {
            ActionKind::Tween(t) => Self::new(ActionKind::Tween(Tween { ease, ..*t })),
            _ => self,
        }
    }

    /// Total duration, or `None` when the action repeats forever.
    pub fn duration_ms(&self) -> Option<f64> {
        match &*self.kind {
            ActionKind::Tween(t) => Some(t.duration_ms),
            ActionKind::Wait { duration_ms } => Some(*duration_ms),
            ActionKind::Custom(_) => Some(0.0),
            ActionKind::Sequence(items) => items.iter().map(Action::duration_ms).sum(),
            ActionKind::Group(items) => items
                .iter()
                .map(Action::duration_ms)
                .try_fold(0.0f64, |acc, d| d.map(|d| acc.max(d))),
            ActionKind::Repeat { body, count } => {
                let n = f64::from((*count)?);
                body.duration_ms().map(|d| d * n)
            }
        }
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.kind {
            ActionKind::Tween(t) => f.debug_tuple("Tween").field(t).finish(),
            ActionKind::Wait { duration_ms } => f.debug_tuple("Wait").field(duration_ms).finish(),
            ActionKind::Custom(_) => f.write_str("Custom"),
            ActionKind::Sequence(items) => f.debug_tuple("Sequence").field(items).finish(),
            ActionKind::Group(items) => f.debug_tuple("Group").field(items).finish(),
            ActionKind::Repeat { body, count } => f
                .debug_struct("Repeat")
                .field("body", body)
                .field("count", count)
                .finish(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/action.rs"]
mod tests;
