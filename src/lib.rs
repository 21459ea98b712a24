//! A tick-stepped spatial SEIR simulation engine
//!
//! A population of mobile agents moves around a rectangular area. Susceptible agents that come
//! within the infection radius of an Infected agent may become Exposed; Exposed agents become
//! Infected after an incubation period and Infected agents Recover after an infectious period.
//! Vaccinated agents are partially or fully protected.
//!
//! The central object is the [`Simulation`], which owns everything a run needs: the
//! [`SimulationParameters`], the agents, a seeded [`RandomSource`] and the time series. Each
//! tick runs four stages in a fixed order:
//! * [`motion`]: agents move, bouncing off (or wrapping around) the edges of the area
//! * [`contact`]: Susceptible–Infected pairs within range are detected
//! * [`transition`]: the SEIR state machine is applied to every agent
//! * [`stats`]: compartment counts are appended to the time series
//!
//! After each tick, subscribers receive an owned [`Snapshot`] suitable for drawing a frame or a
//! live chart. A fixed seed and parameter set always reproduce the same run.
//!
//! ```rust
//! use spatial_seir::{Simulation, SimulationParametersBuilder};
//!
//! let parameters = SimulationParametersBuilder::default()
//!     .population(200)
//!     .build()
//!     .unwrap();
//! let mut simulation = Simulation::new(parameters, 42).unwrap();
//! let points = simulation.run(50).unwrap();
//! assert!(points.iter().all(|p| p.total() == 200));
//! ```
pub mod agent;
pub mod contact;
pub mod error;
pub mod hashing;
pub mod log;
pub mod motion;
pub mod parameters;
pub mod random;
pub mod report;
pub mod runner;
pub mod simulation;
pub mod snapshot;
pub mod stats;
pub mod transition;

pub use agent::{Agent, AgentId, Compartment, Vaccination};
pub use error::{Result, SeirError};
pub use parameters::{
    Boundary, ContactStrategy, ControlMeasures, PeriodDistribution, SimulationParameters,
    SimulationParametersBuilder,
};
pub use random::RandomSource;
pub use simulation::{Simulation, StopPolicy};
pub use snapshot::{AgentView, Snapshot};
pub use stats::TimeSeriesPoint;

// Re-exports for consumers that build agents by hand.
pub use glam;
