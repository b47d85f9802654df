// Fault Policy Port
//
// Decides, per façade call, how long to stall and whether to fail before dispatch.

use crate::error::{AppError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;
use std::time::Duration;

/// Request verb of the façade boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Post,
    Put,
    Patch,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Patch => "PATCH",
        }
    }

    pub fn is_write(&self) -> bool {
        !matches!(self, Verb::Get)
    }
}

impl std::str::FromStr for Verb {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Verb::Get),
            "POST" => Ok(Verb::Post),
            "PUT" => Ok(Verb::Put),
            "PATCH" => Ok(Verb::Patch),
            other => Err(AppError::Validation(format!("unsupported verb {}", other))),
        }
    }
}

impl std::fmt::Display for Verb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The call a plan is requested for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operation {
    pub verb: Verb,
    /// Route template, e.g. `jobs/{id}/reorder`
    pub resource: &'static str,
}

impl Operation {
    pub const fn new(verb: Verb, resource: &'static str) -> Self {
        Self { verb, resource }
    }

    pub fn is_write(&self) -> bool {
        self.verb.is_write()
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.verb, self.resource)
    }
}

/// Outcome decided before dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaultPlan {
    pub delay: Duration,
    pub fail: bool,
}

impl FaultPlan {
    pub const PASS: FaultPlan = FaultPlan {
        delay: Duration::ZERO,
        fail: false,
    };

    pub const FAIL: FaultPlan = FaultPlan {
        delay: Duration::ZERO,
        fail: true,
    };
}

/// Fault policy interface
pub trait FaultPolicy: Send + Sync {
    fn plan(&self, operation: &Operation) -> FaultPlan;
}

/// Latency and failure settings
#[derive(Debug, Clone, PartialEq)]
pub struct FaultConfig {
    pub min_latency_ms: u64,
    pub max_latency_ms: u64,
    /// Probability in [0, 1] of an injected failure
    pub failure_rate: f64,
    /// Whether GET requests may also fail
    pub fail_reads: bool,
}

impl Default for FaultConfig {
    fn default() -> Self {
        Self {
            min_latency_ms: 200,
            max_latency_ms: 1200,
            failure_rate: 0.075,
            fail_reads: true,
        }
    }
}

impl FaultConfig {
    /// No latency, no failures
    pub fn disabled() -> Self {
        Self {
            min_latency_ms: 0,
            max_latency_ms: 0,
            failure_rate: 0.0,
            fail_reads: false,
        }
    }

    /// Defaults overridden by `TALENTFLOW_*` environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            min_latency_ms: env_or("TALENTFLOW_MIN_LATENCY_MS", defaults.min_latency_ms)?,
            max_latency_ms: env_or("TALENTFLOW_MAX_LATENCY_MS", defaults.max_latency_ms)?,
            failure_rate: env_or("TALENTFLOW_FAILURE_RATE", defaults.failure_rate)?,
            fail_reads: env_or("TALENTFLOW_FAIL_READS", defaults.fail_reads)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_latency_ms > self.max_latency_ms {
            return Err(AppError::Config(format!(
                "min latency {}ms exceeds max latency {}ms",
                self.min_latency_ms, self.max_latency_ms
            )));
        }
        if !(0.0..=1.0).contains(&self.failure_rate) {
            return Err(AppError::Config(format!(
                "failure rate {} is outside [0, 1]",
                self.failure_rate
            )));
        }
        Ok(())
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{} has an invalid value: {}", key, raw))),
        Err(_) => Ok(default),
    }
}

/// Randomized latency and failure (production)
pub struct RandomFaultPolicy {
    config: FaultConfig,
    rng: Mutex<StdRng>,
}

impl RandomFaultPolicy {
    pub fn new(config: FaultConfig) -> Result<Self> {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Reproducible sequence of plans
    pub fn seeded(config: FaultConfig, seed: u64) -> Result<Self> {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: FaultConfig, rng: StdRng) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            rng: Mutex::new(rng),
        })
    }

    pub fn config(&self) -> &FaultConfig {
        &self.config
    }
}

impl FaultPolicy for RandomFaultPolicy {
    fn plan(&self, operation: &Operation) -> FaultPlan {
        let mut rng = match self.rng.lock() {
            Ok(rng) => rng,
            Err(poisoned) => poisoned.into_inner(),
        };
        let delay_ms = rng.gen_range(self.config.min_latency_ms..=self.config.max_latency_ms);
        let eligible = operation.is_write() || self.config.fail_reads;
        FaultPlan {
            delay: Duration::from_millis(delay_ms),
            fail: eligible && rng.gen_bool(self.config.failure_rate),
        }
    }
}

/// Pass every call straight through
pub struct NoFaults;

impl FaultPolicy for NoFaults {
    fn plan(&self, _operation: &Operation) -> FaultPlan {
        FaultPlan::PASS
    }
}

pub mod mocks {
    use super::*;
    use std::collections::VecDeque;

    /// Replays queued plans in call order, then passes. Records every operation seen.
    #[derive(Default)]
    pub struct ScriptedFaults {
        script: Mutex<VecDeque<FaultPlan>>,
        seen: Mutex<Vec<Operation>>,
    }

    impl ScriptedFaults {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn then(self, plan: FaultPlan) -> Self {
            self.push(plan);
            self
        }

        /// Fail the next call
        pub fn fail_next(&self) {
            self.push(FaultPlan::FAIL);
        }

        pub fn push(&self, plan: FaultPlan) {
            self.script.lock().unwrap().push_back(plan);
        }

        pub fn seen(&self) -> Vec<Operation> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl FaultPolicy for ScriptedFaults {
        fn plan(&self, operation: &Operation) -> FaultPlan {
            self.seen.lock().unwrap().push(*operation);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(FaultPlan::PASS)
        }
    }

    /// Fails every write, passes every read
    pub struct FailWrites;

    impl FaultPolicy for FailWrites {
        fn plan(&self, operation: &Operation) -> FaultPlan {
            if operation.is_write() {
                FaultPlan::FAIL
            } else {
                FaultPlan::PASS
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REORDER: Operation = Operation {
        verb: Verb::Patch,
        resource: "jobs/{id}/reorder",
    };
    const LIST: Operation = Operation {
        verb: Verb::Get,
        resource: "jobs",
    };

    #[test]
    fn test_defaults_are_valid() {
        let config = FaultConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.min_latency_ms, 200);
        assert_eq!(config.max_latency_ms, 1200);
    }

    #[test]
    fn test_validate_rejects_bad_ranges() {
        let mut config = FaultConfig::default();
        config.min_latency_ms = 5_000;
        assert!(config.validate().is_err());

        let mut config = FaultConfig::default();
        config.failure_rate = 1.5;
        assert!(RandomFaultPolicy::new(config).is_err());
    }

    #[test]
    fn test_delay_stays_in_range() {
        let policy = RandomFaultPolicy::seeded(FaultConfig::default(), 7).unwrap();
        for _ in 0..200 {
            let plan = policy.plan(&REORDER);
            assert!(plan.delay >= Duration::from_millis(200));
            assert!(plan.delay <= Duration::from_millis(1200));
        }
    }

    #[test]
    fn test_reads_can_be_exempted() {
        let config = FaultConfig {
            failure_rate: 1.0,
            fail_reads: false,
            ..FaultConfig::disabled()
        };
        let policy = RandomFaultPolicy::seeded(config, 1).unwrap();
        assert!(!policy.plan(&LIST).fail);
        assert!(policy.plan(&REORDER).fail);
    }

    #[test]
    fn test_seeded_policy_is_reproducible() {
        let a = RandomFaultPolicy::seeded(FaultConfig::default(), 42).unwrap();
        let b = RandomFaultPolicy::seeded(FaultConfig::default(), 42).unwrap();
        for _ in 0..20 {
            assert_eq!(a.plan(&REORDER), b.plan(&REORDER));
        }
    }

    #[test]
    fn test_scripted_faults_replay_then_pass() {
        let policy = mocks::ScriptedFaults::new().then(FaultPlan::FAIL);
        assert!(policy.plan(&REORDER).fail);
        assert!(!policy.plan(&REORDER).fail);
        assert_eq!(policy.seen().len(), 2);
    }

    #[test]
    fn test_verb_parsing() {
        assert_eq!("patch".parse::<Verb>().unwrap(), Verb::Patch);
        assert!("DELETE".parse::<Verb>().is_err());
        assert!(!Verb::Get.is_write());
    }
}
