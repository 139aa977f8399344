use crate::{
    animation::{
        action::{Action, ActionKind, Tween, TweenProperty},
        scheduler::RunId,
    },
    foundation::core::Point,
    node::id::NodeId,
    scene::stage::Stage,
};

/// Slack used when comparing accumulated frame deltas against durations, so that deltas
/// summing to a duration complete the run despite float rounding.
const TIME_EPSILON_MS: f64 = 1e-6;

/// Most body instances a repeat completes in one advance. Time left over past the cap is
/// dropped, so very short bodies cannot stall a frame.
pub(crate) const MAX_REPEATS_PER_ADVANCE: u32 = 64;

/// Lifecycle of an action run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RunState {
    /// Scheduled, not yet advanced.
    Pending,
    Running,
    Completed,
    Cancelled,
}

impl RunState {
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// Result of advancing a run by one delta.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Step {
    Running,
    /// Finished during this advance with `leftover_ms` of the delta unused.
    Completed { leftover_ms: f64 },
    /// The node went away under the run.
    Cancelled,
}

#[derive(Clone, Copy, Debug)]
enum Endpoints {
    Point { from: Point, to: Point },
    Scalar { from: f64, to: f64 },
}

enum RunBody {
    Tween {
        tween: Tween,
        elapsed: f64,
        endpoints: Option<Endpoints>,
    },
    Wait {
        duration_ms: f64,
        elapsed: f64,
    },
    Custom,
    Sequence {
        index: usize,
        current: Option<Box<ActionRun>>,
    },
    Group {
        members: Vec<ActionRun>,
    },
    Repeat {
        completed: u32,
        current: Box<ActionRun>,
    },
}

/// Live execution of one [`Action`] on one node.
///
/// Composite runs own their child runs; dropping or cancelling a run drops every nested run
/// with it, so no nested callback can fire afterwards.
pub(crate) struct ActionRun {
    action: Action,
    state: RunState,
    body: RunBody,
}

impl ActionRun {
    pub(crate) fn new(action: Action) -> Self {
        let body = match &*action.kind {
            ActionKind::Tween(t) => RunBody::Tween {
                tween: *t,
                elapsed: 0.0,
                endpoints: None,
            },
            ActionKind::Wait { duration_ms } => RunBody::Wait {
                duration_ms: *duration_ms,
                elapsed: 0.0,
            },
            ActionKind::Custom(_) => RunBody::Custom,
            ActionKind::Sequence(_) => RunBody::Sequence {
                index: 0,
                current: None,
            },
            ActionKind::Group(items) => RunBody::Group {
                members: items.iter().cloned().map(ActionRun::new).collect(),
            },
            ActionKind::Repeat { body, .. } => RunBody::Repeat {
                completed: 0,
                current: Box::new(ActionRun::new(body.clone())),
            },
        };
        Self {
            action,
            state: RunState::Pending,
            body,
        }
    }

    pub(crate) fn state(&self) -> RunState {
        self.state
    }

    pub(crate) fn cancel(&mut self) {
        if self.state.is_finished() {
            return;
        }
        self.state = RunState::Cancelled;
        match &mut self.body {
            RunBody::Sequence { current, .. } => *current = None,
            RunBody::Group { members } => members.clear(),
            RunBody::Repeat { current, .. } => current.cancel(),
            RunBody::Tween { .. } | RunBody::Wait { .. } | RunBody::Custom => {}
        }
    }

    /// Advance by `dt` milliseconds, applying values to `node`.
    ///
    /// `run_id` is the top-level run this belongs to; composite runs stop between members once
    /// a cancellation for it has been requested.
    pub(crate) fn advance(
        &mut self,
        stage: &mut Stage,
        run_id: RunId,
        node: NodeId,
        dt: f64,
    ) -> Step {
        if self.state.is_finished() {
            return match self.state {
                RunState::Completed => Step::Completed { leftover_ms: dt },
                _ => Step::Cancelled,
            };
        }
        self.state = RunState::Running;
        let step = match &mut self.body {
            RunBody::Tween {
                tween,
                elapsed,
                endpoints,
            } => advance_tween(stage, node, tween, elapsed, endpoints, dt),
            RunBody::Wait {
                duration_ms,
                elapsed,
            } => {
                *elapsed += dt;
                if *elapsed + TIME_EPSILON_MS >= *duration_ms {
                    Step::Completed {
                        leftover_ms: (*elapsed - *duration_ms).max(0.0),
                    }
                } else {
                    Step::Running
                }
            }
            RunBody::Custom => {
                if let ActionKind::Custom(callback) = &*self.action.kind {
                    let callback = callback.clone();
                    callback(stage, node);
                }
                Step::Completed { leftover_ms: dt }
            }
            RunBody::Sequence { index, current } => {
                let ActionKind::Sequence(items) = &*self.action.kind else {
                    unreachable!("sequence run built from a sequence action");
                };
                advance_sequence(stage, run_id, node, items, index, current, dt)
            }
            RunBody::Group { members } => advance_group(stage, run_id, node, members, dt),
            RunBody::Repeat { completed, current } => {
                let ActionKind::Repeat { body, count } = &*self.action.kind else {
                    unreachable!("repeat run built from a repeat action");
                };
                advance_repeat(stage, run_id, node, body, *count, completed, current, dt)
            }
        };
        match step {
            Step::Running => {}
            Step::Completed { .. } => self.state = RunState::Completed,
            Step::Cancelled => self.cancel(),
        }
        step
    }
}

fn capture_endpoints(stage: &Stage, node: NodeId, property: TweenProperty) -> Option<Endpoints> {
    let n = stage.nodes().node(node).ok()?;
    Some(match property {
        TweenProperty::MoveTo(to) => Endpoints::Point {
            from: n.position(),
            to,
        },
        TweenProperty::MoveBy(delta) => Endpoints::Point {
            from: n.position(),
            to: n.position() + delta,
        },
        TweenProperty::ScaleTo(to) => Endpoints::Scalar {
            from: n.scale(),
            to,
        },
        TweenProperty::RotateTo(to) => Endpoints::Scalar {
            from: n.rotation(),
            to,
        },
        TweenProperty::RotateBy(delta) => Endpoints::Scalar {
            from: n.rotation(),
            to: n.rotation() + delta,
        },
        TweenProperty::AlphaTo(to) => Endpoints::Scalar {
            from: n.alpha(),
            to,
        },
    })
}

fn advance_tween(
    stage: &mut Stage,
    node: NodeId,
    tween: &Tween,
    elapsed: &mut f64,
    endpoints: &mut Option<Endpoints>,
    dt: f64,
) -> Step {
    // Start values are sampled when the run starts, not when it was scheduled.
    if endpoints.is_none() {
        *endpoints = capture_endpoints(stage, node, tween.property);
    }
    let Some(ends) = *endpoints else {
        return Step::Cancelled;
    };

    *elapsed += dt;
    let done = *elapsed + TIME_EPSILON_MS >= tween.duration_ms;
    // The end value is written exactly once the duration is reached.
    let p = if done {
        1.0
    } else {
        tween.ease.apply(*elapsed / tween.duration_ms)
    };

    let Ok(n) = stage.nodes_mut().node_mut(node) else {
        return Step::Cancelled;
    };
    match ends {
        Endpoints::Point { from, to } => {
            n.set_position(if done { to } else { from.lerp(to, p) });
        }
        Endpoints::Scalar { from, to } => {
            let v = if done { to } else { lerp(from, to, p) };
            match tween.property {
                TweenProperty::ScaleTo(_) => n.set_scale(v),
                TweenProperty::RotateTo(_) | TweenProperty::RotateBy(_) => n.set_rotation(v),
                TweenProperty::AlphaTo(_) => n.set_alpha(v),
                TweenProperty::MoveTo(_) | TweenProperty::MoveBy(_) => {}
            }
        }
    }

    if done {
        Step::Completed {
            leftover_ms: (*elapsed - tween.duration_ms).max(0.0),
        }
    } else {
        Step::Running
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

fn advance_sequence(
    stage: &mut Stage,
    run_id: RunId,
    node: NodeId,
    items: &[Action],
    index: &mut usize,
    current: &mut Option<Box<ActionRun>>,
    mut dt: f64,
) -> Step {
    loop {
        if stage.actions.is_cancel_requested(run_id) {
            return Step::Cancelled;
        }
        if current.is_none() {
            let Some(next) = items.get(*index) else {
                return Step::Completed { leftover_ms: dt };
            };
            *current = Some(Box::new(ActionRun::new(next.clone())));
        }
        let Some(run) = current.as_mut() else {
            unreachable!("current run was just populated");
        };
        match run.advance(stage, run_id, node, dt) {
            Step::Running => return Step::Running,
            Step::Cancelled => return Step::Cancelled,
            Step::Completed { leftover_ms } => {
                dt = leftover_ms;
                *index += 1;
                *current = None;
            }
        }
    }
}

fn advance_group(
    stage: &mut Stage,
    run_id: RunId,
    node: NodeId,
    members: &mut [ActionRun],
    dt: f64,
) -> Step {
    let mut all_done = true;
    let mut leftover = dt;
    for member in members.iter_mut() {
        if member.state() == RunState::Completed {
            continue;
        }
        if stage.actions.is_cancel_requested(run_id) {
            return Step::Cancelled;
        }
        match member.advance(stage, run_id, node, dt) {
            Step::Running => all_done = false,
            Step::Completed { leftover_ms } => leftover = leftover.min(leftover_ms),
            Step::Cancelled => return Step::Cancelled,
        }
    }
    if all_done {
        Step::Completed {
            leftover_ms: leftover,
        }
    } else {
        Step::Running
    }
}

#[allow(clippy::too_many_arguments)]
fn advance_repeat(
    stage: &mut Stage,
    run_id: RunId,
    node: NodeId,
    body: &Action,
    count: Option<u32>,
    completed: &mut u32,
    current: &mut ActionRun,
    mut dt: f64,
) -> Step {
    let mut instances = 0u32;
    loop {
        if stage.actions.is_cancel_requested(run_id) {
            return Step::Cancelled;
        }
        let before = dt;
        match current.advance(stage, run_id, node, dt) {
            Step::Running => return Step::Running,
            Step::Cancelled => return Step::Cancelled,
            Step::Completed { leftover_ms } => {
                *completed = completed.saturating_add(1);
                instances += 1;
                if count.is_some_and(|n| *completed >= n) {
                    return Step::Completed { leftover_ms };
                }
                *current = ActionRun::new(body.clone());
                dt = leftover_ms;
                // An infinite zero-length body runs once per frame.
                if count.is_none() && leftover_ms >= before {
                    return Step::Running;
                }
                if instances >= MAX_REPEATS_PER_ADVANCE {
                    tracing::debug!(
                        run = ?run_id,
                        dropped_ms = leftover_ms,
                        "repeat capped for this frame"
                    );
                    return Step::Running;
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/run.rs"]
mod tests;
