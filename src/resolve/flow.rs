//! Branch-flow rules: which base branches a head branch may target.
//!
//! Rules are written as `source=target1,target2`, where every part is a glob
//! pattern. Rules are evaluated in order and the first rule whose source
//! pattern matches the head branch decides the outcome.

use std::str::FromStr;

use glob::Pattern;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while parsing a flow rule.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FlowRuleError {
    /// The rule was not of the form `source=targets`.
    #[error("flow rule `{rule}` must look like `source=target1,target2`")]
    Malformed {
        /// Rule text as supplied.
        rule: String,
    },
    /// One of the patterns was not a valid glob.
    #[error("flow rule `{rule}` contains an invalid pattern: {message}")]
    InvalidPattern {
        /// Rule text as supplied.
        rule: String,
        /// Parser message.
        message: String,
    },
}

/// A single ordered flow rule.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowRule {
    source: Pattern,
    targets: Vec<Pattern>,
}

impl FlowRule {
    /// Source branch pattern.
    #[must_use]
    pub fn source(&self) -> &str {
        self.source.as_str()
    }

    /// Allowed target patterns, in declaration order.
    #[must_use]
    pub fn targets(&self) -> Vec<String> {
        self.targets
            .iter()
            .map(|target| target.as_str().to_owned())
            .collect()
    }

    fn allows(&self, base: &str) -> bool {
        self.targets.iter().any(|target| target.matches(base))
    }
}

impl FromStr for FlowRule {
    type Err = FlowRuleError;

    fn from_str(rule: &str) -> Result<Self, Self::Err> {
        let malformed = || FlowRuleError::Malformed {
            rule: rule.to_owned(),
        };
        let (raw_source, raw_targets) = rule.split_once('=').ok_or_else(malformed)?;
        let source = raw_source.trim();
        let target_list: Vec<&str> = raw_targets
            .split(',')
            .map(str::trim)
            .filter(|target| !target.is_empty())
            .collect();
        if source.is_empty() || target_list.is_empty() {
            return Err(malformed());
        }

        let compile = |pattern: &str| {
            Pattern::new(pattern).map_err(|error| FlowRuleError::InvalidPattern {
                rule: rule.to_owned(),
                message: error.to_string(),
            })
        };

        Ok(Self {
            source: compile(source)?,
            targets: target_list
                .into_iter()
                .map(compile)
                .collect::<Result<_, _>>()?,
        })
    }
}

/// Parses every rule, failing on the first malformed entry.
///
/// # Errors
///
/// Returns [`FlowRuleError`] for the first rule that cannot be parsed.
pub fn parse_flow_rules<S: AsRef<str>>(rules: &[S]) -> Result<Vec<FlowRule>, FlowRuleError> {
    rules.iter().map(|rule| rule.as_ref().parse()).collect()
}

/// A head/base pairing that the matching rule does not allow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowViolation {
    /// Source pattern of the rule that matched.
    pub rule: String,
    /// Head branch of the pull request.
    pub head: String,
    /// Base branch of the pull request.
    pub base: String,
    /// Targets the rule allows.
    pub expected_targets: Vec<String>,
}

/// Result of evaluating the flow rules for one pull request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FlowAssessment {
    /// Source pattern of the matching rule, if any.
    pub phase: Option<String>,
    /// Violation reported by the matching rule.
    pub violation: Option<FlowViolation>,
}

/// Evaluates `rules` in order against a head/base branch pair.
#[must_use]
pub fn assess_flow(head: &str, base: &str, rules: &[FlowRule]) -> FlowAssessment {
    let Some(rule) = rules.iter().find(|rule| rule.source.matches(head)) else {
        return FlowAssessment::default();
    };

    let violation = (!rule.allows(base)).then(|| FlowViolation {
        rule: rule.source().to_owned(),
        head: head.to_owned(),
        base: base.to_owned(),
        expected_targets: rule.targets(),
    });

    FlowAssessment {
        phase: Some(rule.source().to_owned()),
        violation,
    }
}
