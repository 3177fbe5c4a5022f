use common::*;
use metrics::{declare_cost_gauge, declare_gauge, set_cost_gauge, set_gauge};

use crate::balancer::BalanceReport;

declare_gauge!(
    BALANCER_COST_BEFORE,
    "balancer_cost_before",
    "Aggregate weighted cost at the start of a balance invocation"
);
declare_gauge!(
    BALANCER_COST_AFTER,
    "balancer_cost_after",
    "Aggregate weighted cost at the end of a balance invocation"
);
declare_cost_gauge!(
    BALANCER_COST_CONTRIBUTION,
    "balancer_cost_contribution",
    "Absolute contribution of a single cost function at the end of a balance invocation"
);
declare_gauge!(BALANCER_STEPS_RUN, "balancer_steps_run", "Search steps actually run");
declare_gauge!(
    BALANCER_ELAPSED_MS,
    "balancer_elapsed_ms",
    "Wall-clock milliseconds spent in the last balance invocation"
);

/// Mirrors a finished [`BalanceReport`] onto the process-wide gauges, so a scrape-based dashboard
/// sees the same numbers as the structured log line emitted alongside it.
pub fn publish(report: &BalanceReport) {
    set_gauge!(BALANCER_COST_BEFORE, report.cost_before);
    set_gauge!(BALANCER_COST_AFTER, report.cost_after);
    for (name, value) in &report.per_function {
        set_cost_gauge!(BALANCER_COST_CONTRIBUTION, name, *value);
    }
    set_gauge!(BALANCER_STEPS_RUN, report.steps_run);
    set_gauge!(BALANCER_ELAPSED_MS, report.elapsed.as_millis());
}
