//! Pure resolvers that collapse raw hosting signals into small canonical
//! states.

pub mod activity;
pub mod ci;
pub mod flow;
pub mod review;

pub use activity::{count_mentions, viewer_has_last_activity};
pub use ci::{
    CiState, SignalOutcome, resolve_ci_state, summarise_check_runs, summarise_combined_status,
};
pub use flow::{
    FlowAssessment, FlowRule, FlowRuleError, FlowViolation, assess_flow, parse_flow_rules,
};
pub use review::{ReviewState, latest_submitted_review, resolve_review_state};
