//! Scenario building blocks
//!
//! A scenario names the user types it simulates, an optional buildup that
//! seeds data before the run, and the stories scheduled during the run.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::SimError;
use crate::probability::GrowGate;
use crate::stories::{StoryArgs, StoryRunnable};
use crate::users::UserProvider;

/// A kind of simulated user
#[derive(Debug, Clone)]
pub struct UserType {
    pub name: String,
    /// Relative weight of this user type
    pub frequency: f64,
    pub provider: Arc<dyn UserProvider>,
}

impl UserType {
    #[must_use]
    pub fn new(name: impl Into<String>, frequency: f64, provider: Arc<dyn UserProvider>) -> Self {
        Self {
            name: name.into(),
            frequency,
            provider,
        }
    }
}

/// A named unit of synthetic work with a target execution frequency
#[derive(Debug, Clone)]
pub struct Story {
    pub name: String,
    /// Executions per scheduling cycle; zero or less never runs
    pub frequency: f64,
    /// Target population mean, for population-changing stories
    pub mean: Option<f64>,
    pub stddev: Option<f64>,
    pub user_types: Vec<String>,
    pub runnable: Arc<dyn StoryRunnable>,
}

impl Story {
    #[must_use]
    pub fn new(name: impl Into<String>, frequency: f64, runnable: Arc<dyn StoryRunnable>) -> Self {
        Self {
            name: name.into(),
            frequency,
            mean: None,
            stddev: None,
            user_types: Vec::new(),
            runnable,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_users<I, S>(mut self, user_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.user_types = user_types.into_iter().map(Into::into).collect();
        self
    }

    /// Keep the affected population around `mean` give or take `stddev`
    #[inline]
    #[must_use]
    pub fn with_target(mut self, mean: f64, stddev: f64) -> Self {
        self.mean = Some(mean);
        self.stddev = Some(stddev);
        self
    }

    /// Whether users of `user_type` run this story
    #[must_use]
    pub fn is_eligible(&self, user_type: &str) -> bool {
        self.user_types.iter().any(|t| t == user_type)
    }

    /// Grow gate handed to the runnable
    #[must_use]
    pub fn gate(&self) -> GrowGate {
        GrowGate::for_target(self.mean, self.stddev)
    }
}

/// A story run a fixed number of times before the scheduled run starts
#[derive(Debug, Clone)]
pub struct BuildupStep {
    pub name: String,
    pub number: u64,
    /// Wait before the first iteration
    pub pre_delay: Duration,
    pub user_types: Vec<String>,
    pub runnable: Arc<dyn StoryRunnable>,
    pub arguments: StoryArgs,
}

impl BuildupStep {
    #[must_use]
    pub fn new(name: impl Into<String>, number: u64, runnable: Arc<dyn StoryRunnable>) -> Self {
        Self {
            name: name.into(),
            number,
            pre_delay: Duration::ZERO,
            user_types: Vec::new(),
            runnable,
            arguments: StoryArgs::default(),
        }
    }

    #[inline]
    #[must_use]
    pub fn with_users<I, S>(mut self, user_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.user_types = user_types.into_iter().map(Into::into).collect();
        self
    }

    #[inline]
    #[must_use]
    pub fn with_pre_delay(mut self, pre_delay: Duration) -> Self {
        self.pre_delay = pre_delay;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_arguments(mut self, arguments: StoryArgs) -> Self {
        self.arguments = arguments;
        self
    }
}

/// A complete simulation setup
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: String,
    pub description: String,
    pub user_types: Vec<UserType>,
    pub buildup: Vec<BuildupStep>,
    pub stories: Vec<Story>,
}

impl Scenario {
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            user_types: Vec::new(),
            buildup: Vec::new(),
            stories: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_user_type(mut self, user_type: UserType) -> Self {
        self.user_types.push(user_type);
        self
    }

    #[must_use]
    pub fn with_buildup(mut self, step: BuildupStep) -> Self {
        self.buildup.push(step);
        self
    }

    #[must_use]
    pub fn with_story(mut self, story: Story) -> Self {
        self.stories.push(story);
        self
    }

    /// User type by name
    #[must_use]
    pub fn user_type(&self, name: &str) -> Option<&UserType> {
        self.user_types.iter().find(|t| t.name == name)
    }

    /// Check every referenced user type exists
    ///
    /// # Errors
    /// `UnknownUserType` for the first dangling reference
    pub fn validate(&self) -> Result<(), SimError> {
        let referenced = self
            .stories
            .iter()
            .flat_map(|s| &s.user_types)
            .chain(self.buildup.iter().flat_map(|b| &b.user_types));
        for name in referenced {
            if self.user_type(name).is_none() {
                return Err(SimError::UnknownUserType {
                    scenario: self.name.clone(),
                    user_type: name.clone(),
                });
            }
        }
        Ok(())
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.description)
    }
}
