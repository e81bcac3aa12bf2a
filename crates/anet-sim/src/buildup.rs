//! Buildup: seed data before the scheduled run
//!
//! Each step runs its story `number` times in a row as one user, after its
//! pre-delay. The grow gate is always open. A failing iteration is logged
//! and the step carries on.

use std::fmt;

use rand::seq::SliceRandom;

use crate::gateway::SimContext;
use crate::probability::GrowGate;
use crate::scenario::{BuildupStep, Scenario};

/// What one buildup step did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub name: String,
    pub number: u64,
    /// Iterations that returned an error
    pub failed: u64,
    /// Whether the step was skipped for lack of a user
    pub skipped: bool,
}

impl fmt::Display for StepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Executed '{}' {} times", self.name, self.number)?;
        if self.failed > 0 {
            write!(f, " ({} failed)", self.failed)?;
        }
        if self.skipped {
            write!(f, " (skipped: no user)")?;
        }
        Ok(())
    }
}

/// Run every buildup step of `scenario` in order
pub async fn run_buildup(ctx: &SimContext, scenario: &Scenario) -> Vec<StepReport> {
    if scenario.buildup.is_empty() {
        tracing::info!("no scenario buildup found");
        return Vec::new();
    }
    tracing::info!(steps = scenario.buildup.len(), "buildup starting");
    let mut reports = Vec::with_capacity(scenario.buildup.len());
    for step in &scenario.buildup {
        reports.push(run_step(ctx, scenario, step).await);
    }
    reports
}

async fn run_step(ctx: &SimContext, scenario: &Scenario, step: &BuildupStep) -> StepReport {
    let mut report = StepReport {
        name: step.name.clone(),
        number: step.number,
        failed: 0,
        skipped: false,
    };
    let user_type = step
        .user_types
        .choose(&mut rand::thread_rng())
        .and_then(|name| scenario.user_type(name))
        .cloned();
    let user = match user_type {
        Some(user_type) => match user_type.provider.user(ctx).await {
            Ok(user) => user,
            Err(error) => {
                tracing::warn!(step = %step.name, %error, "user lookup failed");
                None
            }
        },
        None => None,
    };
    let Some(user) = user else {
        tracing::warn!(step = %step.name, "buildup step skipped: no user available");
        report.skipped = true;
        return report;
    };

    tokio::time::sleep(step.pre_delay).await;
    let gate = GrowGate::Always;
    for i in 0..step.number {
        if let Err(error) = step.runnable.run(ctx, &user, &gate, &step.arguments).await {
            tracing::warn!(step = %step.name, iteration = i, %error, "buildup iteration failed");
            report.failed += 1;
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_line_mentions_failures() {
        let mut report = StepReport {
            name: "Create person".into(),
            number: 100,
            failed: 0,
            skipped: false,
        };
        assert_eq!(report.to_string(), "Executed 'Create person' 100 times");
        report.failed = 3;
        assert_eq!(report.to_string(), "Executed 'Create person' 100 times (3 failed)");
    }
}
