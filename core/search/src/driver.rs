use std::time::Instant;

use balancer_cost::CostAggregate;
use cluster_model::{Action, ClusterModel};
use common::*;

use crate::generator::CandidateGenerator;
use crate::generators::{LoadSkewGenerator, LocalityGenerator, RandomGenerator, ReplicaRackGenerator};

/// Result of one [`SearchDriver::run`] call: the cost before and after, and how much of the step
/// budget actually got used before termination (acceptance or deadline).
pub struct SearchOutcome {
    pub initial_cost: f64,
    pub final_cost: f64,
    pub steps_run: u32,
    pub steps_budgeted: u32,
}

/// The stochastic hill-climb loop: pick a generator uniformly, apply its action, keep it if the
/// resulting cost is lower, otherwise undo it immediately. Mutates `model` and `cost` in place so
/// the caller can inspect the final state directly (e.g. to extract a plan).
pub struct SearchDriver {
    generators: Vec<Box<dyn CandidateGenerator>>,
}

impl SearchDriver {
    pub fn new(generators: Vec<Box<dyn CandidateGenerator>>) -> Self {
        assert!(!generators.is_empty(), "search driver needs at least one generator");
        Self { generators }
    }

    pub fn default_generators() -> Vec<Box<dyn CandidateGenerator>> {
        vec![
            Box::new(RandomGenerator),
            Box::new(LoadSkewGenerator),
            Box::new(LocalityGenerator),
            Box::new(ReplicaRackGenerator),
        ]
    }

    pub fn run(
        &self,
        model: &mut ClusterModel,
        cost: &mut CostAggregate,
        initial_cost: f64,
        steps_budgeted: u32,
        deadline: Instant,
        rng: &mut SmallRng,
    ) -> SearchOutcome {
        let initial = initial_cost;
        let mut best = initial;
        let mut steps_run = 0u32;

        for _ in 0..steps_budgeted {
            if Instant::now() >= deadline {
                break;
            }
            steps_run += 1;

            let generator = &self.generators[rng.gen_range(0..self.generators.len())];
            let action = generator.generate(model, rng);
            if action == Action::Null {
                continue;
            }

            model.apply(action);
            cost.post_action(model, action);

            let candidate = cost.total_cost(model, best);
            if candidate < best {
                best = candidate;
            } else {
                let inverse = action.inverse();
                model.apply(inverse);
                cost.post_action(model, inverse);
            }
        }

        SearchOutcome {
            initial_cost: initial,
            final_cost: best,
            steps_run,
            steps_budgeted,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap};
    use std::time::Duration;

    use balancer_cost::{MoveCost, RegionCountSkew};
    use cluster_model::{NoLocality, RackResolver, RegionSpec};

    use super::*;

    struct SingleRack;
    impl RackResolver for SingleRack {
        fn rack_of(&self, _server: &str) -> String {
            "rack0".to_owned()
        }
    }

    fn region(name: &str) -> RegionSpec {
        RegionSpec {
            name: name.to_owned(),
            table: "t1".to_owned(),
            primary: name.to_owned(),
        }
    }

    fn skewed_model() -> ClusterModel {
        let regions: Vec<RegionSpec> = (0..10).map(|i| region(&format!("r{}", i))).collect();
        let mut assignment = BTreeMap::new();
        assignment.insert("serverA:1:1".to_owned(), regions);
        assignment.insert("serverB:1:1".to_owned(), vec![]);
        ClusterModel::new(&assignment, &HashMap::new(), 15, Some(&NoLocality), &SingleRack).unwrap()
    }

    #[test]
    fn hill_climb_never_increases_cost() {
        let mut model = skewed_model();
        let mut cost = CostAggregate::new(vec![
            Box::new(RegionCountSkew::new(500.0)),
            Box::new(MoveCost::new(7.0, 0.25)),
        ]);
        cost.init(&model);

        let driver = SearchDriver::new(SearchDriver::default_generators());
        let mut rng = common::seeded_rng(Some(123));
        let deadline = Instant::now() + Duration::from_secs(5);
        let initial = cost.total_cost(&model, f64::INFINITY);

        let outcome = driver.run(&mut model, &mut cost, initial, 2000, deadline, &mut rng);
        assert!(outcome.final_cost <= outcome.initial_cost);
        assert_eq!(
            cost.total_cost(&model, f64::INFINITY),
            outcome.final_cost
        );
    }

    #[test]
    fn zero_step_budget_leaves_model_untouched() {
        let mut model = skewed_model();
        let mut cost = CostAggregate::new(vec![Box::new(RegionCountSkew::new(500.0))]);
        cost.init(&model);

        let driver = SearchDriver::new(SearchDriver::default_generators());
        let mut rng = common::seeded_rng(Some(1));
        let deadline = Instant::now() + Duration::from_secs(5);
        let initial = cost.total_cost(&model, f64::INFINITY);

        let outcome = driver.run(&mut model, &mut cost, initial, 0, deadline, &mut rng);
        assert_eq!(outcome.steps_run, 0);
        assert_eq!(outcome.final_cost, outcome.initial_cost);
    }

    #[test]
    fn past_deadline_runs_zero_steps() {
        let mut model = skewed_model();
        let mut cost = CostAggregate::new(vec![Box::new(RegionCountSkew::new(500.0))]);
        cost.init(&model);

        let driver = SearchDriver::new(SearchDriver::default_generators());
        let mut rng = common::seeded_rng(Some(1));
        let deadline = Instant::now() - Duration::from_secs(1);
        let initial = cost.total_cost(&model, f64::INFINITY);

        let outcome = driver.run(&mut model, &mut cost, initial, 1000, deadline, &mut rng);
        assert_eq!(outcome.steps_run, 0);
    }
}
