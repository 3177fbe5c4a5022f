use cluster_model::{Action, ClusterModel};
use common::FloatOrd;

use crate::function::CostFunction;

/// Weighted sum of every [`CostFunction`], with the early-out described in §4.2: functions run in
/// registration order and stop as soon as the running sum exceeds `best_so_far`, since a plan
/// that's already worse than the incumbent can't win regardless of what's left to add. Mirrors
/// the teacher's `Dse::score` early-out over considerations (`game/ai/src/decision.rs`), just
/// summed instead of multiplied.
pub struct CostAggregate {
    functions: Vec<Box<dyn CostFunction>>,
}

impl CostAggregate {
    pub fn new(functions: Vec<Box<dyn CostFunction>>) -> Self {
        Self { functions }
    }

    pub fn init(&mut self, model: &ClusterModel) {
        for f in &mut self.functions {
            f.init(model);
        }
    }

    pub fn post_action(&mut self, model: &ClusterModel, action: Action) {
        for f in &mut self.functions {
            if f.multiplier() > 0.0 && f.is_needed(model) {
                f.post_action(model, action);
            }
        }
    }

    /// Weighted total, stopping early once the running sum exceeds `best_so_far`. Pass
    /// `f64::INFINITY` to force a full evaluation (used for the very first cost computation).
    pub fn total_cost(&self, model: &ClusterModel, best_so_far: f64) -> f64 {
        let mut sum = 0.0;
        for f in &self.functions {
            if f.multiplier() <= 0.0 || !f.is_needed(model) {
                continue;
            }

            sum += f.multiplier() * f.cost(model);
            if sum > best_so_far {
                return sum;
            }
        }
        sum
    }

    /// Every active function's absolute contribution (`multiplier * cost()`) at the current
    /// state, for the §6.1 observability surface. Unlike `total_cost`, always fully evaluated -
    /// this is only called once at the end of a balance invocation, not on every search step.
    pub fn contributions(&self, model: &ClusterModel) -> Vec<(&'static str, f64)> {
        let mut contributions: Vec<(&'static str, f64)> = self
            .functions
            .iter()
            .filter(|f| f.multiplier() > 0.0 && f.is_needed(model))
            .map(|f| (f.name(), f.multiplier() * f.cost(model)))
            .collect();
        contributions.sort_by_key(|&(_, contribution)| std::cmp::Reverse(FloatOrd(contribution)));
        contributions
    }

    pub fn sum_of_weights(&self, model: &ClusterModel) -> f64 {
        self.functions
            .iter()
            .filter(|f| f.multiplier() > 0.0 && f.is_needed(model))
            .map(|f| f.multiplier())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap};

    use cluster_model::{NoLocality, RackResolver, RegionSpec};

    use super::*;
    use crate::{MoveCost, RegionCountSkew};

    struct SingleRack;
    impl RackResolver for SingleRack {
        fn rack_of(&self, _server: &str) -> String {
            "rack0".to_owned()
        }
    }

    fn model() -> ClusterModel {
        let regions: Vec<RegionSpec> = (0..4)
            .map(|i| RegionSpec {
                name: format!("r{}", i),
                table: "t1".to_owned(),
                primary: format!("r{}", i),
            })
            .collect();
        let mut assignment = BTreeMap::new();
        assignment.insert("serverA:1:1".to_owned(), regions);
        assignment.insert("serverB:1:1".to_owned(), vec![]);
        ClusterModel::new(&assignment, &HashMap::new(), 15, Some(&NoLocality), &SingleRack).unwrap()
    }

    #[test]
    fn total_cost_sums_active_functions() {
        let model = model();
        let mut agg = CostAggregate::new(vec![
            Box::new(RegionCountSkew::new(500.0)),
            Box::new(MoveCost::new(7.0, 0.25)),
        ]);
        agg.init(&model);

        let total = agg.total_cost(&model, f64::INFINITY);
        // 4-and-0 split is maximally skewed (cost 1.0) and nothing has moved yet (cost 0.0)
        assert_eq!(total, 500.0);
    }

    #[test]
    fn early_out_stops_before_the_last_function() {
        let model = model();
        let agg = CostAggregate::new(vec![
            Box::new(RegionCountSkew::new(500.0)),
            Box::new(MoveCost::new(7.0, 0.25)),
        ]);

        // best_so_far of 100 is beaten by RegionCountSkew alone (500 > 100), so MoveCost never runs
        let total = agg.total_cost(&model, 100.0);
        assert_eq!(total, 500.0);
    }

    #[test]
    fn zero_multiplier_is_skipped() {
        let model = model();
        let mut agg = CostAggregate::new(vec![Box::new(RegionCountSkew::new(0.0))]);
        agg.init(&model);
        assert_eq!(agg.total_cost(&model, f64::INFINITY), 0.0);
        assert_eq!(agg.sum_of_weights(&model), 0.0);
    }
}
