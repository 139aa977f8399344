use std::collections::{HashSet, VecDeque};

use crate::{
    animation::{
        action::Action,
        run::{ActionRun, RunState, Step},
    },
    node::id::NodeId,
    scene::stage::Stage,
};

/// Number of finished runs whose final state stays queryable through [`Stage::run_state`].
const FINISHED_LOG_CAP: usize = 1024;

/// Handle to a scheduled action run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RunId(pub(crate) u64);

struct ScheduledRun {
    id: RunId,
    node: NodeId,
    key: Option<String>,
    run: ActionRun,
}

/// Bookkeeping for runs taken out of the scheduler while a frame advances them.
#[derive(Clone, Debug)]
struct InFlight {
    id: RunId,
    node: NodeId,
    key: Option<String>,
    state: RunState,
}

/// Owns every action run, in scheduling order.
#[derive(Default)]
pub(crate) struct ActionScheduler {
    runs: Vec<ScheduledRun>,
    in_flight: Vec<InFlight>,
    cancel_requests: HashSet<RunId>,
    finished: VecDeque<(RunId, RunState)>,
    next_id: u64,
}

impl ActionScheduler {
    pub(crate) fn schedule(&mut self, node: NodeId, key: Option<String>, action: Action) -> RunId {
        if let Some(k) = key.as_deref() {
            self.cancel_matching(|n, rk| n == node && rk == Some(k));
        }
        let id = RunId(self.next_id);
        self.next_id += 1;
        self.runs.push(ScheduledRun {
            id,
            node,
            key,
            run: ActionRun::new(action),
        });
        id
    }

    /// Cancel every live run for which `pred(node, key)` holds.
    ///
    /// Runs currently being advanced are flagged and stop at their next step boundary.
    pub(crate) fn cancel_matching(
        &mut self,
        pred: impl Fn(NodeId, Option<&str>) -> bool,
    ) -> usize {
        let mut n = 0;
        for entry in &mut self.runs {
            if !entry.run.state().is_finished() && pred(entry.node, entry.key.as_deref()) {
                entry.run.cancel();
                n += 1;
            }
        }
        for meta in &self.in_flight {
            if !meta.state.is_finished()
                && pred(meta.node, meta.key.as_deref())
                && self.cancel_requests.insert(meta.id)
            {
                n += 1;
            }
        }
        n
    }

    pub(crate) fn is_cancel_requested(&self, id: RunId) -> bool {
        self.cancel_requests.contains(&id)
    }

    pub(crate) fn has_matching(&self, pred: impl Fn(NodeId, Option<&str>) -> bool) -> bool {
        self.runs
            .iter()
            .any(|r| !r.run.state().is_finished() && pred(r.node, r.key.as_deref()))
            || self.in_flight.iter().any(|m| {
                !m.state.is_finished()
                    && !self.cancel_requests.contains(&m.id)
                    && pred(m.node, m.key.as_deref())
            })
    }

    pub(crate) fn state_of(&self, id: RunId) -> Option<RunState> {
        if let Some(r) = self.runs.iter().find(|r| r.id == id) {
            return Some(r.run.state());
        }
        if let Some(m) = self.in_flight.iter().find(|m| m.id == id) {
            return Some(if self.cancel_requests.contains(&id) {
                RunState::Cancelled
            } else {
                m.state
            });
        }
        self.finished
            .iter()
            .rev()
            .find(|(fid, _)| *fid == id)
            .map(|(_, s)| *s)
    }

    /// Live run count, including runs not yet started.
    pub(crate) fn len(&self) -> usize {
        self.runs
            .iter()
            .filter(|r| !r.run.state().is_finished())
            .count()
            + self
                .in_flight
                .iter()
                .filter(|m| !m.state.is_finished())
                .count()
    }

    fn record_finished(&mut self, id: RunId, state: RunState) {
        if self.finished.len() == FINISHED_LOG_CAP {
            self.finished.pop_front();
        }
        self.finished.push_back((id, state));
    }

    fn mark_in_flight(&mut self, id: RunId, state: RunState) {
        if let Some(m) = self.in_flight.iter_mut().find(|m| m.id == id) {
            m.state = state;
        }
    }
}

/// Advance every run whose node lives in one of `scenes` by `dt` milliseconds.
///
/// Runs are advanced in scheduling order. Runs scheduled while this executes stay pending until
/// the next call. Returns the number of runs that completed.
pub(crate) fn advance_actions(stage: &mut Stage, scenes: &[NodeId], dt: f64) -> usize {
    let mut runs = std::mem::take(&mut stage.actions.runs);
    stage.actions.in_flight = runs
        .iter()
        .map(|r| InFlight {
            id: r.id,
            node: r.node,
            key: r.key.clone(),
            state: r.run.state(),
        })
        .collect();

    let mut completed = 0;
    for entry in &mut runs {
        if entry.run.state().is_finished() {
            continue;
        }
        if stage.actions.is_cancel_requested(entry.id) {
            entry.run.cancel();
            stage.actions.mark_in_flight(entry.id, RunState::Cancelled);
            continue;
        }
        if !stage.nodes.contains(entry.node) {
            tracing::debug!(run = ?entry.id, node = ?entry.node, "dropping run for disposed node");
            entry.run.cancel();
            stage.actions.mark_in_flight(entry.id, RunState::Cancelled);
            continue;
        }
        let in_scope = stage
            .nodes
            .scene_of(entry.node)
            .is_some_and(|s| scenes.contains(&s));
        if !in_scope {
            continue;
        }

        match entry.run.advance(stage, entry.id, entry.node, dt) {
            Step::Running => {}
            Step::Completed { .. } => {
                completed += 1;
                tracing::debug!(
                    run = ?entry.id,
                    node = ?entry.node,
                    key = ?entry.key,
                    "action run completed"
                );
            }
            Step::Cancelled => {
                tracing::debug!(run = ?entry.id, node = ?entry.node, "action run cancelled");
            }
        }
        stage.actions.mark_in_flight(entry.id, entry.run.state());
    }

    let sched = &mut stage.actions;
    for entry in &mut runs {
        if sched.cancel_requests.contains(&entry.id) {
            entry.run.cancel();
        }
    }
    sched.cancel_requests.clear();
    sched.in_flight.clear();

    let mut kept = Vec::with_capacity(runs.len());
    for entry in runs {
        let state = entry.run.state();
        if state.is_finished() {
            sched.record_finished(entry.id, state);
        } else {
            kept.push(entry);
        }
    }
    // Runs scheduled during this pass start next frame, after the ones already queued.
    let scheduled_during = std::mem::replace(&mut sched.runs, kept);
    for entry in scheduled_during {
        let state = entry.run.state();
        if state.is_finished() {
            sched.record_finished(entry.id, state);
        } else {
            sched.runs.push(entry);
        }
    }
    completed
}

#[cfg(test)]
#[path = "../../tests/unit/animation/scheduler.rs"]
mod tests;
