//! Per-tick snapshots handed to external consumers (renderers, live plots, streaming exports).
//!
//! A snapshot is an owned copy of what a consumer needs to draw one frame. Consumers are free to
//! keep it across ticks; the engine never sees it again.

use glam::DVec2;
use serde::Serialize;

use crate::agent::{Agent, Compartment};
use crate::stats::TimeSeriesPoint;
use crate::transition::TransitionCounts;

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct AgentView {
    pub position: DVec2,
    pub compartment: Compartment,
    pub vaccinated: bool,
}

impl From<&Agent> for AgentView {
    fn from(agent: &Agent) -> Self {
        AgentView {
            position: agent.position,
            compartment: agent.compartment,
            vaccinated: agent.vaccinated(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub tick: u64,
    pub point: TimeSeriesPoint,
    /// Agents in index order.
    pub agents: Vec<AgentView>,
    /// Transitions applied during this tick. Zero for the initial state.
    pub transitions: TransitionCounts,
}

impl Snapshot {
    pub(crate) fn capture(
        point: TimeSeriesPoint,
        agents: &[Agent],
        transitions: TransitionCounts,
    ) -> Self {
        Snapshot {
            tick: point.tick,
            point,
            agents: agents.iter().map(AgentView::from).collect(),
            transitions,
        }
    }
}

pub(crate) type Subscriber = dyn FnMut(&Snapshot);
