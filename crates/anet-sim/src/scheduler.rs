//! Gaussian workload scheduler
//!
//! Every story gets a nominal period of `cycle_length / frequency`. Actual
//! delays between runs are drawn from `Normal(period, period / 2)`, so the
//! long-run rate matches the frequency while individual runs jitter. Start
//! phases are spread uniformly over the first period.
//!
//! Story runs are spawned and not awaited by the tick loop. Timing state is
//! advanced before a run starts, so a failing story cannot spin.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::task::{JoinError, JoinSet};
use tokio::time::Instant;

use crate::error::StoryError;
use crate::gateway::SimContext;
use crate::probability::{open_unit, Normal};
use crate::scenario::{Story, UserType};
use crate::stories::{StoryArgs, StoryOutcome};

/// Running statistics of the delays drawn for one story
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunStatistics {
    /// Number of executions
    pub n: u64,
    /// Sum of drawn delays, in milliseconds
    pub sum: f64,
    /// Sum of squared deviations of the delays from the nominal period
    pub sum_var: f64,
}

impl RunStatistics {
    /// Account for one execution
    pub fn record(&mut self, delay_ms: f64, period_ms: f64) {
        self.n += 1;
        self.sum += delay_ms;
        self.sum_var += (delay_ms - period_ms).powi(2);
    }

    /// Mean delay in milliseconds, `None` before the first execution
    #[must_use]
    pub fn mean(&self) -> Option<f64> {
        (self.n > 0).then(|| self.sum / self.n as f64)
    }

    /// Root mean square deviation from the period, in milliseconds
    #[must_use]
    pub fn stddev(&self) -> Option<f64> {
        (self.n > 0).then(|| (self.sum_var / self.n as f64).sqrt())
    }
}

/// Timing state of one story
#[derive(Debug, Clone)]
pub struct ScheduledRun {
    pub story: Story,
    /// Nominal period in milliseconds
    pub period: f64,
    /// Distribution delays are drawn from
    pub delays: Normal,
    /// Elapsed milliseconds after which the story may run again
    pub next_execute_ms: f64,
    pub statistics: RunStatistics,
}

impl ScheduledRun {
    /// Draw the delay until the next execution
    pub fn sample_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.delays.ppf(open_unit(rng))
    }
}

/// Timing state for every story, with phases spread over the first period
///
/// Stories with a frequency of zero or less get an infinite period and
/// never come due.
pub fn build_schedule<R: Rng + ?Sized>(
    stories: &[Story],
    cycle_length_ms: f64,
    rng: &mut R,
) -> Vec<ScheduledRun> {
    stories
        .iter()
        .map(|story| {
            let (period, next_execute_ms) = if story.frequency > 0.0 {
                let period = cycle_length_ms / story.frequency;
                (period, rng.gen::<f64>() * period)
            } else {
                (f64::INFINITY, f64::INFINITY)
            };
            ScheduledRun {
                story: story.clone(),
                period,
                delays: Normal::new(period, period / 2.0),
                next_execute_ms,
                statistics: RunStatistics::default(),
            }
        })
        .collect()
}

/// What one user type's turn in a tick did
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// The picked story is not run by this user type
    NotEligible { story: String, user_type: String },
    /// The picked story is not due yet
    NotDue { story: String },
    /// No user of this type was available
    NoUser { story: String, user_type: String },
    /// The story was started as `user`
    Spawned { story: String, user: String },
}

type Finished = (String, String, Result<StoryOutcome, StoryError>);

/// Drives scheduled stories for a set of user types
#[derive(Debug)]
pub struct WorkloadScheduler {
    ctx: SimContext,
    user_types: Vec<UserType>,
    runs: Vec<ScheduledRun>,
    role_delay: Duration,
    rng: StdRng,
    running: JoinSet<Finished>,
}

impl WorkloadScheduler {
    /// Scheduler over `stories`, with cycles of `cycle_length`
    #[must_use]
    pub fn new(
        ctx: SimContext,
        user_types: Vec<UserType>,
        stories: &[Story],
        cycle_length: Duration,
    ) -> Self {
        Self::with_rng(ctx, user_types, stories, cycle_length, StdRng::from_entropy())
    }

    /// Same as [`WorkloadScheduler::new`], drawing from `rng`
    #[must_use]
    pub fn with_rng(
        ctx: SimContext,
        user_types: Vec<UserType>,
        stories: &[Story],
        cycle_length: Duration,
        mut rng: StdRng,
    ) -> Self {
        let runs = build_schedule(stories, cycle_length.as_secs_f64() * 1000.0, &mut rng);
        Self {
            ctx,
            user_types,
            runs,
            role_delay: Duration::from_millis(10),
            rng,
            running: JoinSet::new(),
        }
    }

    /// Pause between user types within a tick
    #[inline]
    #[must_use]
    pub fn with_role_delay(mut self, role_delay: Duration) -> Self {
        self.role_delay = role_delay;
        self
    }

    #[must_use]
    pub fn runs(&self) -> &[ScheduledRun] {
        &self.runs
    }

    /// Number of story runs still in flight
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.running.len()
    }

    /// Give every user type one chance to start a random story
    ///
    /// `now_ms` is the elapsed time since the start of the run.
    pub async fn tick(&mut self, now_ms: f64) -> Vec<TickOutcome> {
        let user_types = self.user_types.clone();
        let mut outcomes = Vec::with_capacity(user_types.len());
        if user_types.is_empty() {
            tokio::time::sleep(self.role_delay).await;
        }
        for user_type in &user_types {
            tokio::time::sleep(self.role_delay).await;
            if self.runs.is_empty() {
                continue;
            }
            let index = self.rng.gen_range(0..self.runs.len());
            outcomes.push(self.turn(index, user_type, now_ms).await);
        }
        outcomes
    }

    async fn turn(&mut self, index: usize, user_type: &UserType, now_ms: f64) -> TickOutcome {
        let story = self.runs[index].story.clone();
        if !story.is_eligible(&user_type.name) {
            return TickOutcome::NotEligible {
                story: story.name,
                user_type: user_type.name.clone(),
            };
        }
        if now_ms <= self.runs[index].next_execute_ms {
            return TickOutcome::NotDue { story: story.name };
        }

        let delay = self.runs[index].sample_delay(&mut self.rng);
        let user = match user_type.provider.user(&self.ctx).await {
            Ok(user) => user,
            Err(error) => {
                tracing::warn!(story = %story.name, user_type = %user_type.name, %error, "user lookup failed");
                None
            }
        };
        let run = &mut self.runs[index];
        run.next_execute_ms = now_ms + delay;
        run.statistics.record(delay, run.period);
        tracing::trace!(story = %story.name, delay_ms = delay, next_ms = run.next_execute_ms, "scheduled next run");

        let Some(user) = user else {
            tracing::info!("{} skipped: no {} user available", story.name, user_type.name);
            return TickOutcome::NoUser {
                story: story.name,
                user_type: user_type.name.clone(),
            };
        };

        let ctx = self.ctx.clone();
        let gate = story.gate();
        let name = story.name.clone();
        let user_name = user.name.clone();
        let runnable = story.runnable;
        self.running.spawn(async move {
            let result = runnable.run(&ctx, &user, &gate, &StoryArgs::new()).await;
            (name, user.name, result)
        });
        TickOutcome::Spawned {
            story: story.name,
            user: user_name,
        }
    }

    /// Log story runs that already finished
    pub fn reap(&mut self) {
        while let Some(joined) = self.running.try_join_next() {
            log_finished(joined);
        }
    }

    /// Wait for every story run still in flight
    pub async fn drain(&mut self) {
        while let Some(joined) = self.running.join_next().await {
            log_finished(joined);
        }
    }

    /// Tick until `total` has elapsed, then wait for in-flight runs
    pub async fn run(&mut self, total: Duration) {
        if self.runs.is_empty() {
            tracing::warn!("no scenario stories found");
            return;
        }
        let start = Instant::now();
        while start.elapsed() < total {
            let now_ms = start.elapsed().as_secs_f64() * 1000.0;
            self.tick(now_ms).await;
            self.reap();
        }
        self.drain().await;
    }

    /// One line per story with its execution count and delay statistics
    #[must_use]
    pub fn summary(&self) -> Vec<String> {
        self.runs
            .iter()
            .map(|run| {
                let stats = run.statistics;
                let secs = |ms: Option<f64>| ms.map_or_else(|| "-".to_string(), |ms| format!("{:.1}", ms / 1000.0));
                format!(
                    "Executed {} {} times (mean: {} s, stddev: {} s)",
                    run.story.name,
                    stats.n,
                    secs(stats.mean()),
                    secs(stats.stddev()),
                )
            })
            .collect()
    }
}

fn log_finished(joined: Result<Finished, JoinError>) {
    match joined {
        Ok((story, user, Ok(outcome))) => {
            tracing::info!("{user} performed {story} -> {outcome}");
        }
        Ok((story, user, Err(error))) => {
            tracing::warn!(%story, %user, %error, transient = error.is_transient(), "story failed");
        }
        Err(error) => tracing::error!(%error, "story task aborted"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stories::CreateNote;
    use std::sync::Arc;

    fn story(frequency: f64) -> Story {
        Story::new("note", frequency, Arc::new(CreateNote)).with_users(["admin"])
    }

    #[test]
    fn period_follows_frequency() {
        let mut rng = StdRng::seed_from_u64(1);
        let runs = build_schedule(&[story(10.0), story(4.0)], 180_000.0, &mut rng);
        assert!((runs[0].period - 18_000.0).abs() < 1e-9);
        assert!((runs[1].period - 45_000.0).abs() < 1e-9);
        for run in &runs {
            assert!(run.next_execute_ms >= 0.0 && run.next_execute_ms < run.period);
            assert!((run.delays.stddev - run.period / 2.0).abs() < 1e-9);
            assert_eq!(run.statistics, RunStatistics::default());
        }
    }

    #[test]
    fn zero_frequency_never_comes_due() {
        let mut rng = StdRng::seed_from_u64(1);
        let runs = build_schedule(&[story(0.0)], 180_000.0, &mut rng);
        assert!(runs[0].next_execute_ms.is_infinite());
    }

    #[test]
    fn statistics_use_the_nominal_period() {
        let mut stats = RunStatistics::default();
        assert_eq!(stats.mean(), None);
        stats.record(1_000.0, 2_000.0);
        stats.record(3_000.0, 2_000.0);
        assert_eq!(stats.n, 2);
        assert_eq!(stats.mean(), Some(2_000.0));
        assert_eq!(stats.stddev(), Some(1_000.0));
    }

    #[test]
    fn delays_center_on_the_period() {
        let mut rng = StdRng::seed_from_u64(21);
        let runs = build_schedule(&[story(10.0)], 180_000.0, &mut rng);
        let n = 2_000;
        let mean = (0..n).map(|_| runs[0].sample_delay(&mut rng)).sum::<f64>() / f64::from(n);
        assert!((mean - 18_000.0).abs() < 1_000.0, "mean = {mean}");
    }
}
