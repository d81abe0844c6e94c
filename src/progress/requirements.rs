//! Requirement evaluation
//!
//! A requirement compares the last observed value of one metric against a
//! target. Observations replace the previous value (last write wins).

use serde::{Deserialize, Serialize};

use crate::error::{ProgressError, Result};

/// Named category of a progress signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    /// Total lessons completed
    Lessons,
    /// Consecutive practice days
    Streak,
    /// Session accuracy in percent
    Accuracy,
    /// Characters mastered
    Characters,
    /// Minutes practised
    PracticeTime,
}

impl MetricType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lessons => "lessons",
            Self::Streak => "streak",
            Self::Accuracy => "accuracy",
            Self::Characters => "characters",
            Self::PracticeTime => "practice_time",
        }
    }

    /// Parse an event's metric name. Unknown names yield `None`.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "lessons" => Some(Self::Lessons),
            "streak" => Some(Self::Streak),
            "accuracy" => Some(Self::Accuracy),
            "characters" => Some(Self::Characters),
            "practice_time" => Some(Self::PracticeTime),
            _ => None,
        }
    }

    pub fn all() -> &'static [MetricType] {
        &[
            Self::Lessons,
            Self::Streak,
            Self::Accuracy,
            Self::Characters,
            Self::PracticeTime,
        ]
    }

    /// Metrics backed by a ledger counter (re-checked on session start)
    pub fn ledger_backed() -> &'static [MetricType] {
        &[Self::Lessons, Self::Streak, Self::Characters]
    }

    /// Reject values this metric can never take
    pub fn validate(&self, value: f64) -> Result<()> {
        if !value.is_finite() || value < 0.0 {
            return Err(ProgressError::invalid(format!(
                "{} value must be a finite non-negative number, got {}",
                self.as_str(),
                value
            )));
        }
        match self {
            Self::Lessons | Self::Streak | Self::Characters if value.fract() != 0.0 => {
                Err(ProgressError::invalid(format!(
                    "{} is a count and must be a whole number, got {}",
                    self.as_str(),
                    value
                )))
            }
            Self::Accuracy if value > 100.0 => Err(ProgressError::invalid(format!(
                "accuracy is a percentage, got {}",
                value
            ))),
            _ => Ok(()),
        }
    }
}

impl std::fmt::Display for MetricType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single measurable condition gating an unlock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    pub metric: MetricType,
    pub target: f64,
    pub current: f64,
    pub completed: bool,
    pub description: String,
}

impl Requirement {
    pub fn new(metric: MetricType, target: f64, description: impl Into<String>) -> Self {
        Self {
            metric,
            target,
            current: 0.0,
            completed: false,
            description: description.into(),
        }
    }

    /// Seed with a previously observed value
    pub fn with_current(mut self, current: f64) -> Self {
        self.current = current;
        self.completed = current >= self.target;
        self
    }

    /// Progress percentage (0.0 - 1.0)
    pub fn progress(&self) -> f32 {
        if self.completed || self.target <= 0.0 {
            1.0
        } else {
            (self.current / self.target).min(1.0) as f32
        }
    }
}

/// Evaluate a requirement against one observation.
///
/// Only acts when `metric` matches; otherwise the requirement comes back
/// unchanged.
pub fn evaluate(requirement: &Requirement, metric: MetricType, observed: f64) -> Requirement {
    if requirement.metric != metric {
        return requirement.clone();
    }
    Requirement {
        current: observed,
        completed: observed >= requirement.target,
        ..requirement.clone()
    }
}

/// Logical AND over a requirement list. An empty list is never complete.
pub fn all_completed(requirements: &[Requirement]) -> bool {
    !requirements.is_empty() && requirements.iter().all(|r| r.completed)
}
