use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

use balancer_cost::CostAggregate;
use cluster_model::{ClusterModel, LocalityOracle, ModelError, RackResolver, RegionSpec, MIN_SERVER_BALANCE};
use common::*;
use config::Search;
use unit::{LoadHistory, LoadSample};

use crate::driver::SearchDriver;
use crate::plan::{extract_plan, Move};

#[cfg(feature = "metrics")]
use crate::metrics_report;

/// Internal reasons the §4.4 pre-check can short-circuit a balance invocation before the search
/// loop runs. Never returned from [`Balancer::balance`] itself - both map to a `plan: None`
/// outcome at the public boundary, since "no plan" is a normal result, not a failure. Exists only
/// so the skip log line can say *why*.
#[derive(Debug, Error)]
pub enum BalanceError {
    #[error("fewer than {} active servers", MIN_SERVER_BALANCE)]
    DegenerateCluster,

    #[error("assignment has no regions")]
    EmptyAssignment,
}

/// §6.1 observability surface: every field is logged as a structured line at the end of `balance`
/// and mirrored onto the `metrics` gauges when the `metrics` feature is enabled.
#[derive(Debug, Clone)]
pub struct BalanceReport {
    pub cost_before: f64,
    pub cost_after: f64,
    pub per_function: Vec<(&'static str, f64)>,
    pub steps_run: u32,
    pub steps_budgeted: u32,
    pub elapsed: Duration,
    pub needed_balance: bool,
}

impl BalanceReport {
    fn skipped(cost_before: f64, per_function: Vec<(&'static str, f64)>, elapsed: Duration) -> Self {
        Self {
            cost_before,
            cost_after: cost_before,
            per_function,
            steps_run: 0,
            steps_budgeted: 0,
            elapsed,
            needed_balance: false,
        }
    }
}

pub struct BalanceOutcome {
    pub plan: Option<Vec<Move>>,
    pub report: BalanceReport,
}

/// Owns the cross-invocation state of §5: the rolling per-region load history, the injected
/// locality oracle and rack resolver, and the search RNG. A fresh [`Config`](config::Config)
/// snapshot is re-read at the start of every [`balance`](Balancer::balance) call, so a
/// hot-reloaded config takes effect on the next invocation without restarting the process.
/// `balance` takes `&mut self`, not `&self` - deliberately, so that two concurrent calls do not
/// compile against a shared `&Balancer`; the caller is responsible for serializing invocations
/// behind its own mutex (§5).
pub struct Balancer<'a> {
    load_history: HashMap<String, LoadHistory>,
    oracle: Option<&'a dyn LocalityOracle>,
    rack_resolver: &'a dyn RackResolver,
    rng: SmallRng,
}

impl<'a> Balancer<'a> {
    pub fn new(oracle: Option<&'a dyn LocalityOracle>, rack_resolver: &'a dyn RackResolver) -> Self {
        Self::with_seed(oracle, rack_resolver, None)
    }

    pub fn with_seed(
        oracle: Option<&'a dyn LocalityOracle>,
        rack_resolver: &'a dyn RackResolver,
        seed: Option<u64>,
    ) -> Self {
        Self {
            load_history: HashMap::new(),
            oracle,
            rack_resolver,
            rng: common::seeded_rng(seed),
        }
    }

    /// Replaces the load-history map wholesale: every region in `samples` keeps its existing
    /// bounded deque (or gets a fresh one) with `sample` pushed onto it; every region absent from
    /// `samples` is dropped.
    pub fn refresh_cluster_status(&mut self, samples: &HashMap<String, LoadSample>) {
        let capacity = config::get().search.num_region_loads_to_remember;
        let mut next = HashMap::with_capacity(samples.len());
        for (region, sample) in samples {
            let mut history = self
                .load_history
                .remove(region)
                .unwrap_or_else(|| LoadHistory::new(capacity));
            history.push(*sample);
            next.insert(region.clone(), history);
        }
        self.load_history = next;
    }

    /// The single entry point. Infallible at the public boundary: a degenerate cluster, an empty
    /// assignment, a cost already below `minCostNeedBalance`, or a `ClusterModel` construction
    /// failure all produce a `plan: None` outcome rather than an `Err` (§7).
    pub fn balance(&mut self, assignment: &BTreeMap<String, Vec<RegionSpec>>) -> BalanceOutcome {
        let start = Instant::now();
        let cfg = config::get().clone();

        let model = match ClusterModel::new(
            assignment,
            &self.load_history,
            cfg.search.num_region_loads_to_remember,
            self.oracle,
            self.rack_resolver,
        ) {
            Ok(model) => model,
            Err(e) => return self.model_error_outcome(e, start.elapsed()),
        };

        let mut cost = CostAggregate::new(balancer_cost::default_cost_functions(&cfg.weights, cfg.search.max_move_percent));
        cost.init(&model);
        let cost_before = cost.total_cost(&model, f64::INFINITY);

        if let Err(reason) = check_degenerate(&model) {
            let report = BalanceReport::skipped(cost_before, cost.contributions(&model), start.elapsed());
            my_info!("skipping balance"; "reason" => %reason);
            self.finish(report, None)
        } else if !needs_balance(&model, &cost, cfg.search.min_cost_need_balance, cost_before) {
            let report = BalanceReport::skipped(cost_before, cost.contributions(&model), start.elapsed());
            my_info!("skipping balance"; "reason" => "aggregate cost below threshold");
            self.finish(report, None)
        } else {
            self.run_search(model, cost, cost_before, &cfg.search, start)
        }
    }

    fn run_search(
        &mut self,
        mut model: ClusterModel,
        mut cost: CostAggregate,
        cost_before: f64,
        search_cfg: &Search,
        start: Instant,
    ) -> BalanceOutcome {
        let steps_budgeted = compute_step_budget(search_cfg, model.num_regions(), model.num_servers());
        let deadline = start + Duration::from_millis(search_cfg.max_running_time_ms);

        let driver = SearchDriver::new(SearchDriver::default_generators());
        let outcome = driver.run(&mut model, &mut cost, cost_before, steps_budgeted, deadline, &mut self.rng);

        let plan = if outcome.final_cost < outcome.initial_cost {
            let mut plan = extract_plan(&model);
            cap_plan(&mut plan, &mut self.rng, model.num_regions(), search_cfg.max_move_percent);
            Some(plan)
        } else {
            None
        };

        let report = BalanceReport {
            cost_before: outcome.initial_cost,
            cost_after: outcome.final_cost,
            per_function: cost.contributions(&model),
            steps_run: outcome.steps_run,
            steps_budgeted: outcome.steps_budgeted,
            elapsed: start.elapsed(),
            needed_balance: true,
        };
        self.finish(report, plan)
    }

    fn model_error_outcome(&self, error: ModelError, elapsed: Duration) -> BalanceOutcome {
        my_error!("failed to build cluster model, aborting balance"; "error" => %error);
        self.finish(
            BalanceReport {
                cost_before: 0.0,
                cost_after: 0.0,
                per_function: Vec::new(),
                steps_run: 0,
                steps_budgeted: 0,
                elapsed,
                needed_balance: false,
            },
            None,
        )
    }

    fn finish(&self, report: BalanceReport, plan: Option<Vec<Move>>) -> BalanceOutcome {
        my_info!(
            "balance invocation finished";
            "cost_before" => report.cost_before,
            "cost_after" => report.cost_after,
            "steps_run" => report.steps_run,
            "steps_budgeted" => report.steps_budgeted,
            "elapsed_ms" => report.elapsed.as_millis() as u64,
            "needed_balance" => report.needed_balance,
            "moves" => plan.as_ref().map(Vec::len).unwrap_or(0),
        );

        #[cfg(feature = "metrics")]
        metrics_report::publish(&report);

        BalanceOutcome { plan, report }
    }
}

fn check_degenerate(model: &ClusterModel) -> Result<(), BalanceError> {
    if model.num_regions() == 0 {
        return Err(BalanceError::EmptyAssignment);
    }
    if model.num_servers() < MIN_SERVER_BALANCE {
        return Err(BalanceError::DegenerateCluster);
    }
    Ok(())
}

/// §4.4 pre-check: replica-colocation pressure always forces a balance attempt, since the search
/// can shrink that cost even when the overall aggregate is otherwise unremarkable. Otherwise a
/// balance only runs if the weighted-average cost clears `min_cost_need_balance`.
fn needs_balance(model: &ClusterModel, cost: &CostAggregate, min_cost_need_balance: f64, cost_before: f64) -> bool {
    let colocation_pressure = cost
        .contributions(model)
        .into_iter()
        .any(|(name, value)| (name == "RegionReplicaHost" || name == "RegionReplicaRack") && value > 0.0);
    if colocation_pressure {
        return true;
    }

    let sum_of_weights = cost.sum_of_weights(model);
    if sum_of_weights <= 0.0 {
        return false;
    }
    cost_before / sum_of_weights >= min_cost_need_balance
}

fn compute_step_budget(search_cfg: &Search, num_regions: usize, num_servers: usize) -> u32 {
    let scaled = (num_regions as u64)
        .saturating_mul(search_cfg.steps_per_region)
        .saturating_mul(num_servers as u64);
    search_cfg.max_steps.min(scaled).min(u32::MAX as u64) as u32
}

/// Invariant 6: the emitted plan never exceeds `max(numRegions * maxMovePercent, 600)`. Shuffles
/// before truncating so every move is equally likely to survive the cap.
fn cap_plan(plan: &mut Vec<Move>, rng: &mut SmallRng, num_regions: usize, max_move_percent: f64) {
    let cap = ((num_regions as f64 * max_move_percent) as usize).max(600);
    if plan.len() > cap {
        plan.shuffle(rng);
        plan.truncate(cap);
    }
}
