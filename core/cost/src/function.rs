use cluster_model::{Action, ClusterModel};
use unit::{RegionIndex, ServerIndex};

/// One independent term of the weighted-sum cost (§4.2). Mirrors the teacher's
/// `Consideration`/`Dse` split: a pure `cost()` evaluation plus incremental bookkeeping that
/// keeps up with every accepted or undone [`Action`], instead of one deep inheritance hierarchy.
pub trait CostFunction {
    /// Display name, used as the `function` label in logs, metrics, and [`BalanceReport`].
    fn name(&self) -> &'static str;

    /// Called once per balance invocation before the search loop starts.
    fn init(&mut self, model: &ClusterModel);

    /// Called after every applied action, whether it is kept or immediately undone. Default
    /// implementation dispatches to [`region_moved`](Self::region_moved) and
    /// [`region_swapped`](Self::region_swapped); most functions only need to override those.
    fn post_action(&mut self, model: &ClusterModel, action: Action) {
        match action {
            Action::Null => {}
            Action::Assign(region, to) => self.region_moved(model, region, None, to),
            Action::Move(region, from, to) => self.region_moved(model, region, Some(from), to),
            Action::Swap(region_a, server_a, region_b, server_b) => {
                self.region_swapped(model, region_a, server_a, region_b, server_b)
            }
        }
    }

    /// A single region changed server. `from` is `None` only for the initial-assignment `Assign`
    /// action, which generators never produce (§3).
    #[allow(unused_variables)]
    fn region_moved(
        &mut self,
        model: &ClusterModel,
        region: RegionIndex,
        from: Option<ServerIndex>,
        to: ServerIndex,
    ) {
    }

    /// Two regions exchanged servers. Default treats it as two independent moves; functions with
    /// a cheaper combined update (e.g. [`TableSkew`](crate::TableSkew)) override this directly.
    fn region_swapped(
        &mut self,
        model: &ClusterModel,
        region_a: RegionIndex,
        server_a: ServerIndex,
        region_b: RegionIndex,
        server_b: ServerIndex,
    ) {
        self.region_moved(model, region_a, Some(server_a), server_b);
        self.region_moved(model, region_b, Some(server_b), server_a);
    }

    /// Current cost, `[0, 1]` for every reachable state with the sole documented exception of
    /// [`MoveCost`](crate::MoveCost)'s over-cap sentinel (§4.2).
    fn cost(&self, model: &ClusterModel) -> f64;

    /// Lets a function disable itself entirely, e.g. the replica-colocation functions on a
    /// cluster with no replicas. Disabled functions are skipped by the aggregator and contribute
    /// nothing to `cost_after` or the observability surface.
    fn is_needed(&self, model: &ClusterModel) -> bool {
        let _ = model;
        true
    }

    /// Weight in the aggregate weighted sum. A multiplier `<= 0` also skips the function.
    fn multiplier(&self) -> f64;
}
