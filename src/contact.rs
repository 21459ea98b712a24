//! Detection of Susceptible–Infected pairs within the infection radius.
//!
//! Two strategies are available. [`ContactStrategy::AllPairs`] compares every susceptible agent
//! with every infected agent. [`ContactStrategy::Grid`] buckets infected agents into square cells
//! about one radius wide and only compares against the 3×3 block of cells around each
//! susceptible agent. Both use the same distance predicate and produce the same normalized
//! [`ContactSet`].

use glam::DVec2;
use log::trace;

use crate::agent::{Agent, AgentId, Compartment};
use crate::hashing::HashMap;
use crate::parameters::ContactStrategy;

// Grid cells are a hair wider than the radius so that rounding in `floor(x / cell)` can never
// push two agents within range more than one cell apart.
const GRID_CELL_PADDING: f64 = 1.0 + 1e-9;

/// A susceptible agent within range of an infected agent during one tick.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContactEvent {
    pub susceptible: AgentId,
    pub infected: AgentId,
}

/// The contacts of one tick, sorted by `(susceptible, infected)` without duplicates.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContactSet {
    events: Vec<ContactEvent>,
}

impl ContactSet {
    fn from_sorted(events: Vec<ContactEvent>) -> Self {
        debug_assert!(events.windows(2).all(|pair| pair[0] < pair[1]));
        ContactSet { events }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ContactEvent> {
        self.events.iter()
    }

    #[must_use]
    pub fn contains(&self, susceptible: AgentId, infected: AgentId) -> bool {
        self.events
            .binary_search(&ContactEvent {
                susceptible,
                infected,
            })
            .is_ok()
    }

    /// Number of infected agents in contact with `susceptible` this tick.
    #[must_use]
    pub fn contacts_of(&self, susceptible: AgentId) -> usize {
        let start = self.events.partition_point(|e| e.susceptible < susceptible);
        let end = self.events.partition_point(|e| e.susceptible <= susceptible);
        end - start
    }
}

impl<'a> IntoIterator for &'a ContactSet {
    type Item = &'a ContactEvent;
    type IntoIter = std::slice::Iter<'a, ContactEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

pub struct ContactDetector {
    radius: f64,
    strategy: ContactStrategy,
}

impl ContactDetector {
    /// `strategy` is resolved here, so `Auto` picks a concrete algorithm for `population`.
    #[must_use]
    pub fn new(radius: f64, strategy: ContactStrategy, population: usize) -> Self {
        ContactDetector {
            radius,
            strategy: strategy.resolve(population),
        }
    }

    #[must_use]
    pub fn strategy(&self) -> ContactStrategy {
        self.strategy
    }

    #[must_use]
    pub fn find_contacts(&self, agents: &[Agent]) -> ContactSet {
        let contacts = match self.strategy {
            ContactStrategy::Grid => find_contacts_grid(agents, self.radius),
            ContactStrategy::AllPairs | ContactStrategy::Auto => {
                find_contacts_all_pairs(agents, self.radius)
            }
        };
        trace!(
            "found {} contacts with {:?}",
            contacts.len(),
            self.strategy
        );
        contacts
    }
}

#[inline]
fn in_range(a: DVec2, b: DVec2, radius: f64) -> bool {
    a.distance_squared(b) <= radius * radius
}

fn indices_in(agents: &[Agent], compartment: Compartment) -> Vec<AgentId> {
    agents
        .iter()
        .enumerate()
        .filter(|(_, agent)| agent.compartment == compartment)
        .map(|(id, _)| id)
        .collect()
}

/// The reference definition: every susceptible agent against every infected agent.
#[must_use]
pub fn find_contacts_all_pairs(agents: &[Agent], radius: f64) -> ContactSet {
    let infected = indices_in(agents, Compartment::Infected);
    let mut events = Vec::new();
    if infected.is_empty() {
        return ContactSet::default();
    }
    for (susceptible, agent) in agents.iter().enumerate() {
        if agent.compartment != Compartment::Susceptible {
            continue;
        }
        for &other in &infected {
            if in_range(agent.position, agents[other].position, radius) {
                events.push(ContactEvent {
                    susceptible,
                    infected: other,
                });
            }
        }
    }
    ContactSet::from_sorted(events)
}

type Cell = (i64, i64);

fn cell_of(position: DVec2, cell_size: f64) -> Cell {
    let cell = (position / cell_size).floor();
    // Saturating casts; positions are bounded so this never matters in practice.
    (cell.x as i64, cell.y as i64)
}

/// Spatial-hash variant of [`find_contacts_all_pairs`] with the same result.
#[must_use]
pub fn find_contacts_grid(agents: &[Agent], radius: f64) -> ContactSet {
    // A zero radius only matches identical positions; any positive cell size works.
    let cell_size = if radius > 0.0 {
        radius * GRID_CELL_PADDING
    } else {
        1.0
    };

    let mut cells: HashMap<Cell, Vec<AgentId>> = HashMap::default();
    for id in indices_in(agents, Compartment::Infected) {
        cells
            .entry(cell_of(agents[id].position, cell_size))
            .or_default()
            .push(id);
    }
    if cells.is_empty() {
        return ContactSet::default();
    }

    let mut events = Vec::new();
    let mut nearby = Vec::new();
    for (susceptible, agent) in agents.iter().enumerate() {
        if agent.compartment != Compartment::Susceptible {
            continue;
        }
        let (cx, cy) = cell_of(agent.position, cell_size);
        nearby.clear();
        for dx in -1..=1 {
            for dy in -1..=1 {
                let Some(bucket) = cells.get(&(cx.saturating_add(dx), cy.saturating_add(dy)))
                else {
                    continue;
                };
                nearby.extend(
                    bucket
                        .iter()
                        .copied()
                        .filter(|&other| in_range(agent.position, agents[other].position, radius)),
                );
            }
        }
        // Saturated cell coordinates at the far edge can name the same bucket twice.
        nearby.sort_unstable();
        nearby.dedup();
        events.extend(nearby.iter().map(|&infected| ContactEvent {
            susceptible,
            infected,
        }));
    }
    ContactSet::from_sorted(events)
}
