//! Per-tick movement: random velocity perturbation, speed clamp, then one step of travel with
//! boundary handling.

use glam::DVec2;
use log::trace;

use crate::agent::Agent;
use crate::parameters::{Boundary, SimulationParameters};
use crate::random::RandomSource;

/// The closed rectangle `[0, width] × [0, height]` agents move in.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Bounds {
    pub max: DVec2,
}

impl Bounds {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Bounds {
            max: DVec2::new(width, height),
        }
    }

    #[must_use]
    pub fn contains(&self, point: DVec2) -> bool {
        point.cmpge(DVec2::ZERO).all() && point.cmple(self.max).all()
    }
}

pub struct MotionModel {
    bounds: Bounds,
    max_speed: f64,
    velocity_jitter: f64,
    boundary: Boundary,
}

impl MotionModel {
    #[must_use]
    pub fn new(parameters: &SimulationParameters) -> Self {
        MotionModel {
            bounds: Bounds::new(parameters.width, parameters.height),
            max_speed: parameters.max_speed,
            velocity_jitter: parameters.velocity_jitter,
            boundary: parameters.boundary,
        }
    }

    #[must_use]
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Moves every agent one tick, in index order.
    pub fn advance(&self, agents: &mut [Agent], rng: &mut RandomSource) {
        trace!("advancing {} agents", agents.len());
        for agent in agents.iter_mut() {
            if self.velocity_jitter > 0.0 {
                let jitter = self.velocity_jitter;
                agent.velocity += DVec2::new(
                    rng.sample_range(-jitter..=jitter),
                    rng.sample_range(-jitter..=jitter),
                );
            }
            agent.velocity = agent.velocity.clamp_length_max(self.max_speed);
            agent.position += agent.velocity;

            match self.boundary {
                Boundary::Reflect => reflect(agent, self.bounds.max),
                Boundary::Wrap => wrap(agent, self.bounds.max),
            }
        }
    }
}

fn reflect(agent: &mut Agent, max: DVec2) {
    for axis in 0..2 {
        if agent.position[axis] < 0.0 {
            agent.position[axis] = 0.0;
            agent.velocity[axis] = agent.velocity[axis].abs();
        } else if agent.position[axis] > max[axis] {
            agent.position[axis] = max[axis];
            agent.velocity[axis] = -agent.velocity[axis].abs();
        }
    }
}

fn wrap(agent: &mut Agent, max: DVec2) {
    for axis in 0..2 {
        let coordinate = agent.position[axis];
        if !(0.0..=max[axis]).contains(&coordinate) {
            // `rem_euclid` can round up to exactly `max` for tiny negative inputs, which is
            // still inside the closed area.
            agent.position[axis] = coordinate.rem_euclid(max[axis]);
        }
    }
}
