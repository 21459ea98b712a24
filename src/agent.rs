use glam::DVec2;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumCount, EnumIter};

/// Index of an agent in the population. Agents are never removed, so the index is stable for
/// the whole run.
pub type AgentId = usize;

/// The SEIR state of an agent.
///
/// Compartments are ordered; an agent only ever moves to the immediate successor of its
/// current compartment.
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumCount,
)]
pub enum Compartment {
    Susceptible,
    Exposed,
    Infected,
    Recovered,
}

impl Compartment {
    /// The one compartment reachable from `self` in a single tick.
    #[must_use]
    pub fn successor(self) -> Option<Compartment> {
        match self {
            Compartment::Susceptible => Some(Compartment::Exposed),
            Compartment::Exposed => Some(Compartment::Infected),
            Compartment::Infected => Some(Compartment::Recovered),
            Compartment::Recovered => None,
        }
    }

    #[must_use]
    pub fn can_transition_to(self, next: Compartment) -> bool {
        self.successor() == Some(next)
    }

    /// Column position in a [`crate::stats::TimeSeriesPoint`].
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Vaccination status, assigned once at initialization.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Vaccination {
    #[default]
    Unvaccinated,
    SingleDose,
    FullyVaccinated,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub position: DVec2,
    pub velocity: DVec2,
    pub compartment: Compartment,
    /// Ticks elapsed since entering `compartment`.
    pub time_in_compartment: u32,
    /// Sampled number of ticks to remain Exposed or Infected.
    pub dwell_period: Option<u32>,
    pub vaccination: Vaccination,
}

impl Agent {
    #[must_use]
    pub fn new(position: DVec2, velocity: DVec2, compartment: Compartment) -> Self {
        Agent {
            position,
            velocity,
            compartment,
            time_in_compartment: 0,
            dwell_period: None,
            vaccination: Vaccination::Unvaccinated,
        }
    }

    /// A motionless agent, mostly useful for constructing scenarios by hand.
    #[must_use]
    pub fn stationary(x: f64, y: f64, compartment: Compartment) -> Self {
        Agent::new(DVec2::new(x, y), DVec2::ZERO, compartment)
    }

    #[must_use]
    pub fn with_vaccination(mut self, vaccination: Vaccination) -> Self {
        self.vaccination = vaccination;
        self
    }

    #[must_use]
    pub fn with_dwell_period(mut self, ticks: u32) -> Self {
        self.dwell_period = Some(ticks);
        self
    }

    #[must_use]
    pub fn vaccinated(&self) -> bool {
        self.vaccination != Vaccination::Unvaccinated
    }

    /// Moves the agent to `next`, resetting its timer.
    pub(crate) fn enter(&mut self, next: Compartment, dwell_period: Option<u32>) {
        debug_assert!(self.compartment.can_transition_to(next));
        self.compartment = next;
        self.time_in_compartment = 0;
        self.dwell_period = dwell_period;
    }
}
