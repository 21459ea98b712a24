//! The SEIR state machine, applied to every agent once per tick.
//!
//! For each agent, in index order:
//! 1. `time_in_compartment` is incremented.
//! 2. The agent's current compartment selects exactly one rule:
//!    * Susceptible with `k ≥ 1` contacts: one Bernoulli trial with probability
//!      `1 - (1 - p)^k`, where `p` is the per-contact transmission probability reduced by the
//!      agent's vaccine efficacy. Success moves the agent to Exposed.
//!    * Exposed whose timer reached its incubation period: moves to Infected.
//!    * Infected whose timer reached its infectious period: moves to Recovered.
//!    * Recovered: terminal.
//!
//! A transition resets the timer and samples the dwell period of the new compartment. Because a
//! single rule fires per agent per tick, no agent can skip a compartment.

use log::debug;

use crate::agent::{Agent, Compartment};
use crate::contact::ContactSet;
use crate::parameters::{PeriodDistribution, SimulationParameters};
use crate::random::RandomSource;

/// Number of transitions of each kind applied during one tick.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TransitionCounts {
    pub exposures: usize,
    pub infections: usize,
    pub recoveries: usize,
}

pub struct TransitionEngine {
    parameters: SimulationParameters,
}

/// Probability that at least one of `contacts` independent trials with probability `p`
/// succeeds.
#[must_use]
pub fn combined_exposure_probability(p: f64, contacts: usize) -> f64 {
    if contacts == 0 || p <= 0.0 {
        return 0.0;
    }
    let contacts = i32::try_from(contacts).unwrap_or(i32::MAX);
    1.0 - (1.0 - p).powi(contacts)
}

impl TransitionEngine {
    #[must_use]
    pub fn new(parameters: &SimulationParameters) -> Self {
        TransitionEngine {
            parameters: parameters.clone(),
        }
    }

    /// Dwell period to sample when an agent enters `compartment`.
    fn period_for(&self, compartment: Compartment) -> Option<&PeriodDistribution> {
        match compartment {
            Compartment::Exposed => Some(&self.parameters.incubation_period),
            Compartment::Infected => Some(&self.parameters.infectious_period),
            Compartment::Susceptible | Compartment::Recovered => None,
        }
    }

    fn enter(&self, agent: &mut Agent, next: Compartment, rng: &mut RandomSource) {
        let dwell_period = self.period_for(next).map(|period| period.sample(rng));
        agent.enter(next, dwell_period);
    }

    /// The agent's current dwell period, sampling one if it was never assigned.
    fn dwell_period(&self, agent: &mut Agent, rng: &mut RandomSource) -> u32 {
        match (agent.dwell_period, self.period_for(agent.compartment)) {
            (Some(period), _) => period,
            (None, Some(distribution)) => {
                let period = distribution.sample(rng);
                agent.dwell_period = Some(period);
                period
            }
            (None, None) => 0,
        }
    }

    /// Applies one tick of transitions. `contacts` must have been detected on the same agent
    /// positions and compartments, before any of this tick's transitions.
    pub fn apply(
        &self,
        tick: u64,
        agents: &mut [Agent],
        contacts: &ContactSet,
        rng: &mut RandomSource,
    ) -> TransitionCounts {
        let transmission_probability = self.parameters.transmission_probability_at(tick);
        let mut counts = TransitionCounts::default();

        for (id, agent) in agents.iter_mut().enumerate() {
            agent.time_in_compartment = agent.time_in_compartment.saturating_add(1);

            match agent.compartment {
                Compartment::Susceptible => {
                    let p = transmission_probability
                        * (1.0 - self.parameters.efficacy_for(agent.vaccination));
                    let probability = combined_exposure_probability(p, contacts.contacts_of(id));
                    if probability > 0.0 && rng.sample_bool(probability) {
                        self.enter(agent, Compartment::Exposed, rng);
                        counts.exposures += 1;
                    }
                }
                Compartment::Exposed => {
                    let dwell_period = self.dwell_period(agent, rng);
                    if agent.time_in_compartment >= dwell_period {
                        self.enter(agent, Compartment::Infected, rng);
                        counts.infections += 1;
                    }
                }
                Compartment::Infected => {
                    let dwell_period = self.dwell_period(agent, rng);
                    if agent.time_in_compartment >= dwell_period {
                        self.enter(agent, Compartment::Recovered, rng);
                        counts.recoveries += 1;
                    }
                }
                Compartment::Recovered => {}
            }
        }

        if counts != TransitionCounts::default() {
            debug!(
                "tick {tick}: {} exposed, {} infectious, {} recovered",
                counts.exposures, counts.infections, counts.recoveries
            );
        }
        counts
    }
}
