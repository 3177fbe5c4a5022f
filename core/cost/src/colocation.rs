use cluster_model::ClusterModel;
use unit::RegionIndex;

use crate::function::CostFunction;

/// Shared shape for `RegionReplicaHost`/`RegionReplicaRack` - the only difference between the two
/// is which group index the sorted primaries array is keyed by (§4.2). `max_colocation_cost` is
/// a fixed property of the replica topology (how many replicas each group has), independent of
/// where they currently sit, so it is computed once in `init` and never touched again; only the
/// numerator is recomputed from the model's own incrementally-maintained `primaries_per_*`
/// arrays.
pub struct ReplicaColocationCost {
    multiplier: f64,
    group: Group,
    max_colocation_cost: f64,
}

#[derive(Copy, Clone)]
pub enum Group {
    Host,
    Rack,
}

impl ReplicaColocationCost {
    pub fn new(multiplier: f64, group: Group) -> Self {
        Self {
            multiplier,
            group,
            max_colocation_cost: 0.0,
        }
    }

    fn total_colocation_cost(&self, model: &ClusterModel) -> f64 {
        let run_cost = |primaries: &[RegionIndex]| -> f64 {
            let mut cost = 0.0;
            let mut run_len = 0u32;
            let mut current: Option<RegionIndex> = None;
            for &p in primaries {
                match current {
                    Some(c) if c == p => run_len += 1,
                    _ => {
                        if run_len > 1 {
                            cost += ((run_len - 1) as f64).powi(2);
                        }
                        current = Some(p);
                        run_len = 1;
                    }
                }
            }
            if run_len > 1 {
                cost += ((run_len - 1) as f64).powi(2);
            }
            cost
        };

        match self.group {
            Group::Host => model
                .hosts()
                .map(|h| run_cost(model.primaries_per_host(h)))
                .sum(),
            Group::Rack => model
                .racks()
                .map(|k| run_cost(model.primaries_per_rack(k)))
                .sum(),
        }
    }
}

/// `max_colocation_cost`: the cost if every replica group were packed entirely onto a single
/// group (the worst case allowed by the fixed replica topology), computed from per-primary
/// replica-group sizes rather than current placement.
fn max_colocation_cost(model: &ClusterModel) -> f64 {
    let mut group_size: std::collections::HashMap<RegionIndex, u32> =
        std::collections::HashMap::new();
    for r in model.regions() {
        *group_size.entry(model.region_primary(r)).or_insert(0) += 1;
    }
    group_size
        .values()
        .map(|&size| if size > 1 { ((size - 1) as f64).powi(2) } else { 0.0 })
        .sum()
}

impl CostFunction for ReplicaColocationCost {
    fn name(&self) -> &'static str {
        match self.group {
            Group::Host => "RegionReplicaHost",
            Group::Rack => "RegionReplicaRack",
        }
    }

    fn init(&mut self, model: &ClusterModel) {
        self.max_colocation_cost = max_colocation_cost(model);
    }

    fn cost(&self, model: &ClusterModel) -> f64 {
        if self.max_colocation_cost <= 0.0 {
            return 0.0;
        }
        (self.total_colocation_cost(model) / self.max_colocation_cost)
            .sqrt()
            .clamp(0.0, 1.0)
    }

    fn is_needed(&self, _model: &ClusterModel) -> bool {
        self.max_colocation_cost > 0.0
    }

    fn multiplier(&self) -> f64 {
        self.multiplier
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap};

    use cluster_model::{Action, NoLocality, RackResolver, RegionSpec};
    use unit::ServerIndex;

    use super::*;

    struct TwoRacks;
    impl RackResolver for TwoRacks {
        fn rack_of(&self, server: &str) -> String {
            if server.starts_with("r1") {
                "rack1".to_owned()
            } else {
                "rack2".to_owned()
            }
        }
    }

    fn replica(name: &str, primary: &str) -> RegionSpec {
        RegionSpec {
            name: name.to_owned(),
            table: "t1".to_owned(),
            primary: primary.to_owned(),
        }
    }

    /// Four servers across two racks; one region with three replicas all on rack R1 (scenario 3).
    fn scenario_model() -> ClusterModel {
        let mut assignment = BTreeMap::new();
        assignment.insert(
            "r1sA:1:1".to_owned(),
            vec![replica("primary", "primary")],
        );
        assignment.insert("r1sB:1:1".to_owned(), vec![replica("sec1", "primary")]);
        assignment.insert("r1sC:1:1".to_owned(), vec![replica("sec2", "primary")]);
        assignment.insert("r2sD:1:1".to_owned(), vec![]);
        ClusterModel::new(&assignment, &HashMap::new(), 15, Some(&NoLocality), &TwoRacks).unwrap()
    }

    #[test]
    fn all_on_one_rack_costs_one() {
        let model = scenario_model();
        let mut cost = ReplicaColocationCost::new(10_000.0, Group::Rack);
        cost.init(&model);
        assert!((cost.cost(&model) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn spreading_to_second_rack_lowers_the_cost() {
        // with only 2 racks and 3 replicas a 2/1 split is the best reachable (pigeonhole), so
        // the cost drops from the fully-colocated 1.0 but can't reach 0 - moving a single replica
        // off rack1 is still a strict improvement, which is what the search loop rewards.
        let mut model = scenario_model();
        let mut cost = ReplicaColocationCost::new(10_000.0, Group::Rack);
        cost.init(&model);
        let before = cost.cost(&model);

        let sec2 = model.region_by_name("sec2").unwrap();
        let action = Action::Move(sec2, ServerIndex::new(2), ServerIndex::new(3));
        model.apply(action);
        cost.post_action(&model, action);

        let after = cost.cost(&model);
        assert!(after < before);
        assert!((after - 0.5).abs() < 1e-9);
    }

    #[test]
    fn no_replicas_disables_the_function() {
        let mut assignment = BTreeMap::new();
        assignment.insert(
            "r1sA:1:1".to_owned(),
            vec![replica("solo", "solo")],
        );
        assignment.insert("r2sD:1:1".to_owned(), vec![]);
        let model =
            ClusterModel::new(&assignment, &HashMap::new(), 15, Some(&NoLocality), &TwoRacks)
                .unwrap();

        let mut cost = ReplicaColocationCost::new(10_000.0, Group::Rack);
        cost.init(&model);
        assert!(!cost.is_needed(&model));
    }
}
