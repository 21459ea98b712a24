//! The simulation loop.
//!
//! A [`Simulation`] owns its parameters, the population, the random source and the time series.
//! Nothing is shared between simulations, so independent runs can live side by side (or on
//! separate threads). Each call to [`Simulation::step`] advances exactly one tick:
//!
//! 1. motion ([`MotionModel::advance`]), followed by a bounds check
//! 2. contact detection ([`ContactDetector::find_contacts`])
//! 3. transitions ([`TransitionEngine::apply`])
//! 4. aggregation ([`StatsAggregator::record`])
//! 5. publication of a [`Snapshot`] to every subscriber
//!
//! An invariant violation in steps 1 or 4 halts the simulation: the failing `step` returns the
//! error and every later `step` refuses to run.

use std::f64::consts::TAU;

use glam::DVec2;
use log::{debug, error, info, trace};

use crate::agent::{Agent, Compartment, Vaccination};
use crate::contact::ContactDetector;
use crate::error::{Result, SeirError};
use crate::motion::MotionModel;
use crate::parameters::SimulationParameters;
use crate::random::RandomSource;
use crate::snapshot::{Snapshot, Subscriber};
use crate::stats::{invariant_violation, StatsAggregator, TimeSeriesPoint};
use crate::transition::{TransitionCounts, TransitionEngine};

/// When [`Simulation::run`] may end before the requested number of ticks.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum StopPolicy {
    /// Always run the requested number of ticks.
    #[default]
    RunAllTicks,
    /// Stop as soon as no agent is Exposed or Infected.
    WhenNoActiveInfection,
}

pub struct Simulation {
    parameters: SimulationParameters,
    agents: Vec<Agent>,
    rng: RandomSource,
    motion: MotionModel,
    detector: ContactDetector,
    transitions: TransitionEngine,
    stats: StatsAggregator,
    tick: u64,
    stop_policy: StopPolicy,
    subscribers: Vec<Box<Subscriber>>,
    halted: bool,
}

impl Simulation {
    /// Validates `parameters` and builds a randomly placed population from `seed`.
    ///
    /// Agents are placed uniformly in the area with a uniformly random heading and a speed in
    /// `[0, max_speed]`. Seeded infections are drawn without replacement; every remaining agent is
    /// then vaccinated with probability `vaccination_rate`.
    ///
    /// # Errors
    ///
    /// Returns `SeirError::ConfigurationError` if the parameters are invalid.
    pub fn new(parameters: SimulationParameters, seed: u64) -> Result<Self> {
        parameters.validate()?;
        let mut rng = RandomSource::new(seed);
        let agents = initial_population(&parameters, &mut rng);
        Self::build(parameters, rng, agents)
    }

    /// Builds a simulation from an explicit population. Exposed or Infected agents without a
    /// dwell period get one sampled, in index order.
    ///
    /// # Errors
    ///
    /// Returns `SeirError::ConfigurationError` if the parameters are invalid, the number of
    /// agents doesn't match `parameters.population`, or an agent lies outside the area.
    pub fn with_agents(
        parameters: SimulationParameters,
        seed: u64,
        mut agents: Vec<Agent>,
    ) -> Result<Self> {
        parameters.validate()?;
        if agents.len() != parameters.population {
            return Err(SeirError::configuration(format!(
                "expected {} agents, got {}",
                parameters.population,
                agents.len()
            )));
        }
        let motion = MotionModel::new(&parameters);
        if let Some((id, agent)) = agents
            .iter()
            .enumerate()
            .find(|(_, agent)| !motion.bounds().contains(agent.position))
        {
            return Err(SeirError::configuration(format!(
                "agent {id} at {} lies outside the {}x{} area",
                agent.position, parameters.width, parameters.height
            )));
        }
        if let Some(agent) = agents
            .iter()
            .find(|agent| !agent.velocity.is_finite())
        {
            return Err(SeirError::configuration(format!(
                "agent velocity {} is not finite",
                agent.velocity
            )));
        }

        let mut rng = RandomSource::new(seed);
        for agent in &mut agents {
            if agent.dwell_period.is_none() {
                agent.dwell_period = match agent.compartment {
                    Compartment::Exposed => Some(parameters.incubation_period.sample(&mut rng)),
                    Compartment::Infected => Some(parameters.infectious_period.sample(&mut rng)),
                    Compartment::Susceptible | Compartment::Recovered => None,
                };
            }
        }
        Self::build(parameters, rng, agents)
    }

    fn build(parameters: SimulationParameters, rng: RandomSource, agents: Vec<Agent>) -> Result<Self> {
        let motion = MotionModel::new(&parameters);
        let detector = ContactDetector::new(
            parameters.infection_radius,
            parameters.contact_strategy,
            parameters.population,
        );
        let transitions = TransitionEngine::new(&parameters);
        let mut stats = StatsAggregator::new(parameters.population);
        let initial = stats.record(0, &agents)?;
        debug!(
            "simulation initialized (seed={}, population={}, contacts={:?}): {:?}",
            rng.base_seed(),
            parameters.population,
            detector.strategy(),
            initial
        );

        Ok(Simulation {
            parameters,
            agents,
            rng,
            motion,
            detector,
            transitions,
            stats,
            tick: 0,
            stop_policy: StopPolicy::default(),
            subscribers: Vec::new(),
            halted: false,
        })
    }

    #[must_use]
    pub fn with_stop_policy(mut self, stop_policy: StopPolicy) -> Self {
        self.stop_policy = stop_policy;
        self
    }

    /// Registers a consumer that receives a snapshot after every tick.
    pub fn subscribe(&mut self, subscriber: impl FnMut(&Snapshot) + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    /// Advances exactly one tick and returns its point.
    ///
    /// # Errors
    ///
    /// Returns `SeirError::InvariantViolation` if an agent left the area or the counts don't sum
    /// to the population. The simulation is halted afterwards.
    pub fn step(&mut self) -> Result<TimeSeriesPoint> {
        if self.halted {
            return Err(invariant_violation(
                self.tick,
                "simulation halted after an earlier invariant violation".to_string(),
                &self.agents,
            ));
        }

        let tick = self.tick + 1;
        trace!("starting tick {tick}");

        self.motion.advance(&mut self.agents, &mut self.rng);
        if let Err(e) = self.check_bounds(tick) {
            self.halted = true;
            return Err(e);
        }

        let contacts = self.detector.find_contacts(&self.agents);
        let counts = self
            .transitions
            .apply(tick, &mut self.agents, &contacts, &mut self.rng);

        let point = match self.stats.record(tick, &self.agents) {
            Ok(point) => point,
            Err(e) => {
                self.halted = true;
                return Err(e);
            }
        };
        self.tick = tick;
        self.publish(point, counts);
        Ok(point)
    }

    /// Steps up to `total_ticks` times and returns the points produced by this call. With
    /// [`StopPolicy::WhenNoActiveInfection`] the run ends early once `E + I == 0`.
    ///
    /// # Errors
    ///
    /// Propagates the first error returned by [`Simulation::step`].
    pub fn run(&mut self, total_ticks: u64) -> Result<Vec<TimeSeriesPoint>> {
        let mut points = Vec::new();
        for _ in 0..total_ticks {
            if self.should_stop() {
                info!("no active infection left at tick {}, stopping", self.tick);
                break;
            }
            points.push(self.step()?);
        }
        info!(
            "run finished at tick {} ({} ticks this run)",
            self.tick,
            points.len()
        );
        Ok(points)
    }

    fn should_stop(&self) -> bool {
        match self.stop_policy {
            StopPolicy::RunAllTicks => false,
            StopPolicy::WhenNoActiveInfection => {
                self.stats.latest().is_some_and(|point| point.active() == 0)
            }
        }
    }

    fn check_bounds(&self, tick: u64) -> Result<()> {
        let bounds = self.motion.bounds();
        match self
            .agents
            .iter()
            .position(|agent| !bounds.contains(agent.position))
        {
            None => Ok(()),
            Some(id) => {
                error!("agent {id} left the area at tick {tick}");
                Err(invariant_violation(
                    tick,
                    format!(
                        "agent {id} at {} is outside the area after motion",
                        self.agents[id].position
                    ),
                    &self.agents,
                ))
            }
        }
    }

    fn publish(&mut self, point: TimeSeriesPoint, counts: TransitionCounts) {
        if self.subscribers.is_empty() {
            return;
        }
        let snapshot = Snapshot::capture(point, &self.agents, counts);
        for subscriber in &mut self.subscribers {
            subscriber(&snapshot);
        }
    }

    /// A snapshot of the current state, independent of any subscription.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let point = self
            .stats
            .latest()
            .copied()
            .unwrap_or(TimeSeriesPoint {
                tick: self.tick,
                susceptible: 0,
                exposed: 0,
                infected: 0,
                recovered: 0,
            });
        Snapshot::capture(point, &self.agents, TransitionCounts::default())
    }

    #[must_use]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    #[must_use]
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    #[must_use]
    pub fn parameters(&self) -> &SimulationParameters {
        &self.parameters
    }

    /// Every point so far, starting with tick 0.
    #[must_use]
    pub fn series(&self) -> &[TimeSeriesPoint] {
        self.stats.series()
    }

    #[must_use]
    pub fn stats(&self) -> &StatsAggregator {
        &self.stats
    }
}

fn initial_population(parameters: &SimulationParameters, rng: &mut RandomSource) -> Vec<Agent> {
    let mut agents: Vec<Agent> = (0..parameters.population)
        .map(|_| {
            let position = DVec2::new(
                rng.sample_range(0.0..=parameters.width),
                rng.sample_range(0.0..=parameters.height),
            );
            let angle: f64 = rng.sample_range(0.0..TAU);
            let speed: f64 = rng.sample_range(0.0..=parameters.max_speed);
            Agent::new(position, DVec2::from_angle(angle) * speed, Compartment::Susceptible)
        })
        .collect();

    let seeded = parameters.initial_infected + parameters.initial_exposed;
    for (order, id) in rng
        .sample_indices(parameters.population, seeded)
        .into_iter()
        .enumerate()
    {
        let agent = &mut agents[id];
        if order < parameters.initial_infected {
            agent.compartment = Compartment::Infected;
            agent.dwell_period = Some(parameters.infectious_period.sample(rng));
        } else {
            agent.compartment = Compartment::Exposed;
            agent.dwell_period = Some(parameters.incubation_period.sample(rng));
        }
    }

    for agent in &mut agents {
        if agent.compartment != Compartment::Susceptible {
            continue;
        }
        // Both draws are always made so that the vaccination rate doesn't shift the
        // random stream for the rest of the run.
        let vaccinated = rng.sample_bool(parameters.vaccination_rate);
        let single_dose = rng.sample_bool(parameters.single_dose_fraction);
        agent.vaccination = match (vaccinated, single_dose) {
            (false, _) => Vaccination::Unvaccinated,
            (true, true) => Vaccination::SingleDose,
            (true, false) => Vaccination::FullyVaccinated,
        };
    }
    agents
}
