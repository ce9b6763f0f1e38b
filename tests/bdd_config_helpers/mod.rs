//! Behavioural helpers for configuration scenarios.

mod state;
mod steps;

pub(crate) use state::{ConfigState, config_state};
#[expect(
    unused_imports,
    reason = "rstest-bdd discovers step functions via attributes, not runtime usage"
)]
pub(crate) use steps::*;
