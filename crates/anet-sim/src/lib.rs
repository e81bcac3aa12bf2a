//! ANET workload simulator
//!
//! Drives synthetic users against the ANET GraphQL API:
//! - a buildup phase seeding data with a fixed number of story runs
//! - a scheduled phase firing stories at Gaussian-distributed intervals
//! - grow gates keeping entity populations near a target size
//!
//! ```no_run
//! # async fn demo(ctx: anet_sim::SimContext) -> Result<(), anet_sim::SimError> {
//! use std::time::Duration;
//! let scenario = anet_sim::scenario("default")?;
//! anet_sim::run_buildup(&ctx, &scenario).await;
//! let mut scheduler = anet_sim::WorkloadScheduler::new(
//!     ctx,
//!     scenario.user_types.clone(),
//!     &scenario.stories,
//!     Duration::from_secs(180),
//! );
//! scheduler.run(Duration::from_secs(180)).await;
//! for line in scheduler.summary() {
//!     println!("{line}");
//! }
//! # Ok(())
//! # }
//! ```

#![allow(missing_docs)]

pub mod buildup;
pub mod config;
pub mod error;
pub mod gateway;
pub mod kinds;
pub mod logging;
pub mod lorem;
pub mod populate;
pub mod probability;
pub mod scenario;
pub mod scenarios;
pub mod scheduler;
pub mod stories;
pub mod users;

pub use buildup::{run_buildup, StepReport};
pub use config::SimConfig;
pub use error::{SimError, StoryError};
pub use gateway::{GraphQl, SimContext};
pub use kinds::{NoteTarget, OrganizationType, PersonRole, PositionType};
pub use logging::init_logging;
pub use probability::{erf, erfinv, normal_cdf, normal_pdf, normal_ppf, with_probability, GrowGate, Normal};
pub use scenario::{BuildupStep, Scenario, Story, UserType};
pub use scenarios::{known_scenarios, scenario};
pub use scheduler::{build_schedule, RunStatistics, ScheduledRun, TickOutcome, WorkloadScheduler};
pub use stories::{StoryArgs, StoryOutcome, StoryRunnable};
pub use users::{ExistingPositionHolder, NewUser, SimUser, UserProvider};
