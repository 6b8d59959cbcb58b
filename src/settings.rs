//! Analysis settings with validated, chainable setters.

use crate::error::{Error, Result};

/// Cut-set probability formula used when no BDD is available.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Approximation {
    /// Sum of cut-set probabilities.
    RareEvent,
    /// Min-cut upper bound, `1 - prod(1 - P(c))`.
    Mcub,
    /// Truncated inclusion-exclusion (`approx = "no"`).
    None,
}

/// Configuration of one analysis run.
///
/// Numeric options are validated at the setter, so a constructed `Settings`
/// is always internally consistent. Setters chain:
///
/// ```
/// use fta_rs::settings::Settings;
///
/// let mut settings = Settings::default();
/// settings
///     .probability_analysis(true)
///     .importance_analysis(true)
///     .approx("rare-event").unwrap()
///     .limit_order(11).unwrap()
///     .mission_time(48.0).unwrap()
///     .num_trials(777).unwrap()
///     .seed(97531);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    probability_analysis: bool,
    importance_analysis: bool,
    uncertainty_analysis: bool,
    ccf_analysis: bool,
    approximation: Approximation,
    limit_order: u32,
    mission_time: f64,
    cut_off: f64,
    num_sums: u32,
    num_trials: u32,
    seed: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            probability_analysis: false,
            importance_analysis: false,
            uncertainty_analysis: false,
            ccf_analysis: false,
            approximation: Approximation::None,
            limit_order: 20,
            mission_time: 8760.0,
            cut_off: 1e-8,
            num_sums: 7,
            num_trials: 1000,
            seed: 0,
        }
    }
}

impl Settings {
    pub fn probability_analysis(&mut self, flag: bool) -> &mut Self {
        self.probability_analysis = flag;
        self
    }

    /// Importance analysis consumes probability results, so enabling it
    /// enables the probability analysis as well.
    pub fn importance_analysis(&mut self, flag: bool) -> &mut Self {
        self.importance_analysis = flag;
        if flag {
            self.probability_analysis = true;
        }
        self
    }

    /// Uncertainty analysis likewise implies the probability analysis.
    pub fn uncertainty_analysis(&mut self, flag: bool) -> &mut Self {
        self.uncertainty_analysis = flag;
        if flag {
            self.probability_analysis = true;
        }
        self
    }

    /// Common-cause expansion happens before graph construction, outside
    /// this core; only the flag is carried here.
    pub fn ccf_analysis(&mut self, flag: bool) -> &mut Self {
        self.ccf_analysis = flag;
        self
    }

    /// Selects the approximation by its configuration name:
    /// `"rare-event"`, `"mcub"`, or `"no"`.
    pub fn approx(&mut self, name: &str) -> Result<&mut Self> {
        self.approximation = match name {
            "rare-event" => Approximation::RareEvent,
            "mcub" => Approximation::Mcub,
            "no" => Approximation::None,
            other => {
                return Err(Error::settings(format!("unknown approximation '{}'", other)));
            }
        };
        Ok(self)
    }

    pub fn limit_order(&mut self, limit: u32) -> Result<&mut Self> {
        if limit < 1 {
            return Err(Error::settings("limit_order must be at least 1"));
        }
        self.limit_order = limit;
        Ok(self)
    }

    /// Mission time in hours.
    pub fn mission_time(&mut self, hours: f64) -> Result<&mut Self> {
        if !(hours > 0.0) || !hours.is_finite() {
            return Err(Error::settings(format!("mission_time must be positive, got {}", hours)));
        }
        self.mission_time = hours;
        Ok(self)
    }

    pub fn cut_off(&mut self, cut_off: f64) -> Result<&mut Self> {
        if !(0.0..=1.0).contains(&cut_off) || !cut_off.is_finite() {
            return Err(Error::settings(format!("cut_off out of [0, 1]: {}", cut_off)));
        }
        self.cut_off = cut_off;
        Ok(self)
    }

    /// Truncation depth of the inclusion-exclusion expansion.
    pub fn num_sums(&mut self, n: u32) -> Result<&mut Self> {
        if n < 1 {
            return Err(Error::settings("num_sums must be at least 1"));
        }
        self.num_sums = n;
        Ok(self)
    }

    pub fn num_trials(&mut self, n: u32) -> Result<&mut Self> {
        if n < 1 {
            return Err(Error::settings("num_trials must be at least 1"));
        }
        self.num_trials = n;
        Ok(self)
    }

    pub fn seed(&mut self, seed: u64) -> &mut Self {
        self.seed = seed;
        self
    }

    pub fn is_probability_analysis(&self) -> bool {
        self.probability_analysis
    }

    pub fn is_importance_analysis(&self) -> bool {
        self.importance_analysis
    }

    pub fn is_uncertainty_analysis(&self) -> bool {
        self.uncertainty_analysis
    }

    pub fn is_ccf_analysis(&self) -> bool {
        self.ccf_analysis
    }

    pub fn approximation(&self) -> Approximation {
        self.approximation
    }

    pub fn get_limit_order(&self) -> u32 {
        self.limit_order
    }

    pub fn get_mission_time(&self) -> f64 {
        self.mission_time
    }

    pub fn get_cut_off(&self) -> f64 {
        self.cut_off
    }

    pub fn get_num_sums(&self) -> u32 {
        self.num_sums
    }

    pub fn get_num_trials(&self) -> u32 {
        self.num_trials
    }

    pub fn get_seed(&self) -> u64 {
        self.seed
    }
}
