//! Health-check registry backing the ops HTTP endpoints.
//!
//! `/health` reports overall liveness and readiness by running every
//! registered check; `/alive` reports liveness only, running just the checks
//! tagged live. Checks are registered during startup and the registry is
//! read-only while serving.

use serde::Serialize;

/// Outcome of a single named check.
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub name: String,
    pub healthy: bool,
}

/// Aggregated report returned by the health endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub checks: Vec<CheckResult>,
}

impl HealthReport {
    fn from_results(checks: Vec<CheckResult>) -> Self {
        let healthy = checks.iter().all(|check| check.healthy);
        Self {
            status: if healthy { "pass" } else { "fail" },
            checks,
        }
    }

    /// True when every reported check passed.
    pub fn healthy(&self) -> bool {
        self.status == "pass"
    }
}

type Probe = Box<dyn Fn() -> bool + Send + Sync>;

struct HealthCheck {
    name: String,
    live: bool,
    probe: Probe,
}

/// Registry of named health checks.
#[derive(Default)]
pub struct HealthRegistry {
    checks: Vec<HealthCheck>,
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a named check.
    ///
    /// `live` marks the check as a liveness probe, reported by `/alive`;
    /// readiness-only checks are reported by `/health` alone.
    pub fn register<F>(&mut self, name: impl Into<String>, live: bool, probe: F)
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.checks.push(HealthCheck {
            name: name.into(),
            live,
            probe: Box::new(probe),
        });
    }

    /// Run every registered check (liveness and readiness).
    pub fn check_all(&self) -> HealthReport {
        HealthReport::from_results(self.checks.iter().map(run_check).collect())
    }

    /// Run only the checks tagged live.
    pub fn check_live(&self) -> HealthReport {
        HealthReport::from_results(
            self.checks
                .iter()
                .filter(|check| check.live)
                .map(run_check)
                .collect(),
        )
    }
}

fn run_check(check: &HealthCheck) -> CheckResult {
    CheckResult {
        name: check.name.clone(),
        healthy: (check.probe)(),
    }
}
