use serde::{Deserialize, Serialize};

use crate::agent::{Agent, Compartment};
use crate::error::{Result, SeirError};

/// Compartment counts at the end of one tick.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub tick: u64,
    pub susceptible: usize,
    pub exposed: usize,
    pub infected: usize,
    pub recovered: usize,
}

impl TimeSeriesPoint {
    #[must_use]
    pub fn total(&self) -> usize {
        self.susceptible + self.exposed + self.infected + self.recovered
    }

    #[must_use]
    pub fn count(&self, compartment: Compartment) -> usize {
        match compartment {
            Compartment::Susceptible => self.susceptible,
            Compartment::Exposed => self.exposed,
            Compartment::Infected => self.infected,
            Compartment::Recovered => self.recovered,
        }
    }

    /// Exposed plus infected: agents that still carry the infection.
    #[must_use]
    pub fn active(&self) -> usize {
        self.exposed + self.infected
    }
}

/// Tallies compartment counts into an append-only, tick-ordered series.
pub struct StatsAggregator {
    population_size: usize,
    series: Vec<TimeSeriesPoint>,
}

impl StatsAggregator {
    #[must_use]
    pub fn new(population_size: usize) -> Self {
        Self {
            population_size,
            series: Vec::new(),
        }
    }

    /// Counts `agents` by compartment, appends the point and returns it.
    ///
    /// # Errors
    ///
    /// Returns `SeirError::InvariantViolation` if the counts don't sum to the population size or
    /// `tick` doesn't follow the last recorded tick. Nothing is appended in that case.
    pub fn record(&mut self, tick: u64, agents: &[Agent]) -> Result<TimeSeriesPoint> {
        let mut counts = [0usize; 4];
        for agent in agents {
            counts[agent.compartment.index()] += 1;
        }
        let point = TimeSeriesPoint {
            tick,
            susceptible: counts[Compartment::Susceptible.index()],
            exposed: counts[Compartment::Exposed.index()],
            infected: counts[Compartment::Infected.index()],
            recovered: counts[Compartment::Recovered.index()],
        };

        if point.total() != self.population_size {
            return Err(invariant_violation(
                tick,
                format!(
                    "compartment counts sum to {}, expected {}",
                    point.total(),
                    self.population_size
                ),
                agents,
            ));
        }
        if let Some(last) = self.series.last() {
            if tick <= last.tick {
                return Err(invariant_violation(
                    tick,
                    format!("tick {tick} recorded after tick {}", last.tick),
                    agents,
                ));
            }
        }

        self.series.push(point);
        Ok(point)
    }

    #[must_use]
    pub fn series(&self) -> &[TimeSeriesPoint] {
        &self.series
    }

    #[must_use]
    pub fn latest(&self) -> Option<&TimeSeriesPoint> {
        self.series.last()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.series.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// The first point with the largest infected count.
    #[must_use]
    pub fn peak_infected(&self) -> Option<&TimeSeriesPoint> {
        peak_infected(&self.series)
    }
}

/// The first point of `series` with the largest infected count.
#[must_use]
pub fn peak_infected(series: &[TimeSeriesPoint]) -> Option<&TimeSeriesPoint> {
    series
        .iter()
        .reduce(|best, point| if point.infected > best.infected { point } else { best })
}

/// Builds an `InvariantViolation` that carries a JSON dump of `agents`.
pub(crate) fn invariant_violation(tick: u64, message: String, agents: &[Agent]) -> SeirError {
    let state_dump = serde_json::to_string(agents)
        .unwrap_or_else(|e| format!("<failed to serialize agents: {e}>"));
    log::error!("invariant violated at tick {tick}: {message}");
    SeirError::InvariantViolation {
        tick,
        message,
        state_dump,
    }
}
