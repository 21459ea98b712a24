use std::fs;
use std::path::Path;

use derive_builder::Builder;
use log::debug;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use crate::agent::Vaccination;
use crate::error::{Result, SeirError};
use crate::random::RandomSource;

/// How long an agent stays Exposed (incubation) or Infected (infectious period).
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PeriodDistribution {
    /// Every agent stays exactly `ticks` ticks.
    Fixed { ticks: u32 },
    /// Sampled per agent from a normal distribution, rounded to whole ticks and never less
    /// than one tick.
    Normal { mean: f64, std_dev: f64 },
}

impl PeriodDistribution {
    fn validate(&self, name: &str) -> Result<()> {
        match *self {
            PeriodDistribution::Fixed { ticks } if ticks == 0 => Err(SeirError::configuration(
                format!("{name} must be at least one tick"),
            )),
            PeriodDistribution::Normal { mean, std_dev }
                if !(mean.is_finite() && mean > 0.0) =>
            {
                Err(SeirError::configuration(format!(
                    "{name} mean must be positive and finite, got {mean} (std_dev {std_dev})"
                )))
            }
            PeriodDistribution::Normal { std_dev, .. }
                if !(std_dev.is_finite() && std_dev >= 0.0) =>
            {
                Err(SeirError::configuration(format!(
                    "{name} std_dev must be non-negative and finite, got {std_dev}"
                )))
            }
            _ => Ok(()),
        }
    }

    /// Draws one period. Fixed periods consume no randomness.
    pub fn sample(&self, rng: &mut RandomSource) -> u32 {
        match *self {
            PeriodDistribution::Fixed { ticks } => ticks,
            PeriodDistribution::Normal { mean, std_dev } => {
                let z: f64 = rng.sample_distr(StandardNormal);
                // `as` saturates for values beyond `u32::MAX`.
                (mean + std_dev * z).round().max(1.0) as u32
            }
        }
    }
}

/// What happens to an agent that walks into the edge of the area.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Boundary {
    /// Clamp to the wall and turn the offending velocity component around.
    #[default]
    Reflect,
    /// Re-enter from the opposite side (toroidal area).
    Wrap,
}

/// Algorithm used to find contacts. Every strategy yields the same contact set.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactStrategy {
    /// All-pairs for small populations, grid above [`GRID_THRESHOLD`] agents.
    #[default]
    Auto,
    AllPairs,
    Grid,
}

/// Populations above this size use the grid index under [`ContactStrategy::Auto`].
pub const GRID_THRESHOLD: usize = 256;

impl ContactStrategy {
    #[must_use]
    pub fn resolve(self, population: usize) -> ContactStrategy {
        match self {
            ContactStrategy::Auto if population > GRID_THRESHOLD => ContactStrategy::Grid,
            ContactStrategy::Auto => ContactStrategy::AllPairs,
            other => other,
        }
    }
}

/// Lowers per-contact transmission from `start_tick` onward (distancing, masks, ...).
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ControlMeasures {
    pub start_tick: u64,
    pub transmission_probability: f64,
}

/// Immutable configuration for one run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Builder)]
#[serde(default, deny_unknown_fields)]
#[builder(default)]
pub struct SimulationParameters {
    pub population: usize,
    pub width: f64,
    pub height: f64,

    /// Agents seeded Infected at tick 0.
    pub initial_infected: usize,
    /// Agents seeded Exposed at tick 0.
    pub initial_exposed: usize,

    pub infection_radius: f64,
    /// Per-contact chance of exposure for an unvaccinated agent.
    pub transmission_probability: f64,
    #[builder(setter(strip_option))]
    pub control_measures: Option<ControlMeasures>,

    /// Fraction of the population vaccinated at initialization.
    pub vaccination_rate: f64,
    /// Fractional reduction in transmission probability for fully vaccinated agents.
    pub vaccine_efficacy: f64,
    /// Fraction of vaccinated agents that only received a single dose.
    pub single_dose_fraction: f64,
    /// Efficacy for single-dose agents. Defaults to `vaccine_efficacy`.
    #[builder(setter(strip_option))]
    pub single_dose_efficacy: Option<f64>,

    pub incubation_period: PeriodDistribution,
    pub infectious_period: PeriodDistribution,

    pub max_speed: f64,
    /// Largest per-component velocity perturbation applied each tick.
    pub velocity_jitter: f64,
    pub boundary: Boundary,
    pub contact_strategy: ContactStrategy,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        SimulationParameters {
            population: 1000,
            width: 800.0,
            height: 600.0,
            initial_infected: 1,
            initial_exposed: 0,
            infection_radius: 15.0,
            transmission_probability: 0.3,
            control_measures: None,
            vaccination_rate: 0.0,
            vaccine_efficacy: 1.0,
            single_dose_fraction: 0.0,
            single_dose_efficacy: None,
            incubation_period: PeriodDistribution::Normal {
                mean: 60.0,
                std_dev: 20.0,
            },
            infectious_period: PeriodDistribution::Normal {
                mean: 80.0,
                std_dev: 15.0,
            },
            max_speed: 0.4,
            velocity_jitter: 0.05,
            boundary: Boundary::Reflect,
            contact_strategy: ContactStrategy::Auto,
        }
    }
}

fn check_probability(name: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SeirError::configuration(format!(
            "{name} must be within [0, 1], got {value}"
        )))
    }
}

fn check_non_negative(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SeirError::configuration(format!(
            "{name} must be non-negative and finite, got {value}"
        )))
    }
}

impl SimulationParameters {
    /// Loads parameters from a JSON file. Missing fields take their default values. The result
    /// is not validated, so overrides can still be applied; call [`Self::validate`] afterwards.
    ///
    /// # Errors
    ///
    /// Fails if the file can't be read or parsed.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        debug!("loading parameters from {}", path.display());
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Checks every parameter. Returns the first problem found.
    ///
    /// # Errors
    ///
    /// Returns `SeirError::ConfigurationError` describing the invalid parameter.
    pub fn validate(&self) -> Result<()> {
        if self.population == 0 {
            return Err(SeirError::configuration("population must be positive"));
        }
        for (name, value) in [("width", self.width), ("height", self.height)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(SeirError::configuration(format!(
                    "{name} must be positive and finite, got {value}"
                )));
            }
        }
        match self.initial_infected.checked_add(self.initial_exposed) {
            Some(seeded) if seeded <= self.population => {}
            _ => {
                return Err(SeirError::configuration(format!(
                    "cannot seed {} infected and {} exposed agents in a population of {}",
                    self.initial_infected, self.initial_exposed, self.population
                )));
            }
        }
        check_non_negative("infection_radius", self.infection_radius)?;
        check_probability("transmission_probability", self.transmission_probability)?;
        if let Some(control) = &self.control_measures {
            check_probability(
                "control_measures.transmission_probability",
                control.transmission_probability,
            )?;
        }
        check_probability("vaccination_rate", self.vaccination_rate)?;
        check_probability("vaccine_efficacy", self.vaccine_efficacy)?;
        check_probability("single_dose_fraction", self.single_dose_fraction)?;
        if let Some(efficacy) = self.single_dose_efficacy {
            check_probability("single_dose_efficacy", efficacy)?;
        }
        self.incubation_period.validate("incubation_period")?;
        self.infectious_period.validate("infectious_period")?;
        check_non_negative("max_speed", self.max_speed)?;
        check_non_negative("velocity_jitter", self.velocity_jitter)?;
        Ok(())
    }

    /// Per-contact transmission probability in effect during `tick`.
    #[must_use]
    pub fn transmission_probability_at(&self, tick: u64) -> f64 {
        match self.control_measures {
            Some(control) if tick >= control.start_tick => control.transmission_probability,
            _ => self.transmission_probability,
        }
    }

    /// Fractional reduction in transmission probability for an agent's vaccination status.
    #[must_use]
    pub fn efficacy_for(&self, vaccination: Vaccination) -> f64 {
        match vaccination {
            Vaccination::Unvaccinated => 0.0,
            Vaccination::SingleDose => self.single_dose_efficacy.unwrap_or(self.vaccine_efficacy),
            Vaccination::FullyVaccinated => self.vaccine_efficacy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn assert_config_error(parameters: &SimulationParameters, needle: &str) {
        match parameters.validate() {
            Err(SeirError::ConfigurationError(message)) => {
                assert!(message.contains(needle), "unexpected message: {message}");
            }
            other => panic!("expected configuration error, got {other:?}"),
        }
    }

    #[test]
    fn defaults_are_valid() {
        SimulationParameters::default().validate().unwrap();
        let built = SimulationParametersBuilder::default().build().unwrap();
        assert_eq!(built, SimulationParameters::default());
    }

    #[test]
    fn rejects_invalid_values() {
        let base = SimulationParameters::default();

        let mut p = base.clone();
        p.population = 0;
        assert_config_error(&p, "population");

        let mut p = base.clone();
        p.infection_radius = -1.0;
        assert_config_error(&p, "infection_radius");

        let mut p = base.clone();
        p.transmission_probability = 1.5;
        assert_config_error(&p, "transmission_probability");

        let mut p = base.clone();
        p.vaccination_rate = -0.1;
        assert_config_error(&p, "vaccination_rate");

        let mut p = base.clone();
        p.incubation_period = PeriodDistribution::Fixed { ticks: 0 };
        assert_config_error(&p, "incubation_period");

        let mut p = base.clone();
        p.infectious_period = PeriodDistribution::Normal {
            mean: 0.0,
            std_dev: 1.0,
        };
        assert_config_error(&p, "infectious_period");

        let mut p = base.clone();
        p.initial_infected = 600;
        p.initial_exposed = 401;
        assert_config_error(&p, "cannot seed");

        let mut p = base.clone();
        p.initial_infected = usize::MAX;
        p.initial_exposed = 2;
        assert_config_error(&p, "cannot seed");

        let mut p = base.clone();
        p.width = f64::NAN;
        assert_config_error(&p, "width");

        let mut p = base;
        p.transmission_probability = f64::NAN;
        assert_config_error(&p, "transmission_probability");
    }

    #[test]
    fn control_measures_switch_probability() {
        let p = SimulationParametersBuilder::default()
            .transmission_probability(0.3)
            .control_measures(ControlMeasures {
                start_tick: 200,
                transmission_probability: 0.1,
            })
            .build()
            .unwrap();
        assert_eq!(p.transmission_probability_at(0), 0.3);
        assert_eq!(p.transmission_probability_at(199), 0.3);
        assert_eq!(p.transmission_probability_at(200), 0.1);
    }

    #[test]
    fn efficacy_by_dose() {
        let mut p = SimulationParameters::default();
        p.vaccine_efficacy = 0.9;
        assert_eq!(p.efficacy_for(Vaccination::Unvaccinated), 0.0);
        assert_eq!(p.efficacy_for(Vaccination::SingleDose), 0.9);
        assert_eq!(p.efficacy_for(Vaccination::FullyVaccinated), 0.9);
        p.single_dose_efficacy = Some(0.5);
        assert_eq!(p.efficacy_for(Vaccination::SingleDose), 0.5);
    }

    #[test]
    fn normal_periods_are_at_least_one_tick() {
        let period = PeriodDistribution::Normal {
            mean: 1.0,
            std_dev: 5.0,
        };
        let mut rng = RandomSource::new(7);
        for _ in 0..1000 {
            assert!(period.sample(&mut rng) >= 1);
        }
        assert_eq!(PeriodDistribution::Fixed { ticks: 3 }.sample(&mut rng), 3);
    }

    #[test]
    fn loads_partial_json() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "population": 50,
                "infection_radius": 5.0,
                "incubation_period": {{ "kind": "fixed", "ticks": 3 }},
                "boundary": "wrap"
            }}"#
        )
        .unwrap();
        let p = SimulationParameters::from_json_file(file.path()).unwrap();
        assert_eq!(p.population, 50);
        assert_eq!(p.infection_radius, 5.0);
        assert_eq!(p.incubation_period, PeriodDistribution::Fixed { ticks: 3 });
        assert_eq!(p.boundary, Boundary::Wrap);
        assert_eq!(p.width, SimulationParameters::default().width);
    }

    #[test]
    fn json_with_invalid_values_fails_validation() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "transmission_probability": 2.0 }}"#).unwrap();
        let p = SimulationParameters::from_json_file(file.path()).unwrap();
        assert_config_error(&p, "transmission_probability");

        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "populaton": 10 }}"#).unwrap();
        assert!(matches!(
            SimulationParameters::from_json_file(file.path()),
            Err(SeirError::JsonError(_))
        ));
    }

    #[test]
    fn auto_strategy_resolution() {
        assert_eq!(
            ContactStrategy::Auto.resolve(GRID_THRESHOLD),
            ContactStrategy::AllPairs
        );
        assert_eq!(
            ContactStrategy::Auto.resolve(GRID_THRESHOLD + 1),
            ContactStrategy::Grid
        );
        assert_eq!(ContactStrategy::AllPairs.resolve(10_000), ContactStrategy::AllPairs);
    }
}
