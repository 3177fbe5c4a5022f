use cluster_model::ClusterModel;

use crate::array::cost_from_array;
use crate::function::CostFunction;

/// Dispersion of total region count per server. Reads `num_regions_on_server` directly off the
/// model rather than keeping a private copy - the model already maintains it incrementally, so
/// there is nothing for this function to cache.
pub struct RegionCountSkew {
    multiplier: f64,
}

impl RegionCountSkew {
    pub fn new(multiplier: f64) -> Self {
        Self { multiplier }
    }
}

impl CostFunction for RegionCountSkew {
    fn name(&self) -> &'static str {
        "RegionCountSkew"
    }

    fn init(&mut self, _model: &ClusterModel) {}

    fn cost(&self, model: &ClusterModel) -> f64 {
        let stats: Vec<f64> = model
            .servers()
            .map(|s| model.num_regions_on_server(s) as f64)
            .collect();
        cost_from_array(&stats).value()
    }

    fn multiplier(&self) -> f64 {
        self.multiplier
    }
}

/// Same as [`RegionCountSkew`] but counting only primary regions per server - zero cost (and
/// disabled) on a cluster with no replicas, since every region is its own primary.
pub struct PrimaryRegionCountSkew {
    multiplier: f64,
    has_replicas: bool,
}

impl PrimaryRegionCountSkew {
    pub fn new(multiplier: f64) -> Self {
        Self {
            multiplier,
            has_replicas: false,
        }
    }
}

impl CostFunction for PrimaryRegionCountSkew {
    fn name(&self) -> &'static str {
        "PrimaryRegionCountSkew"
    }

    fn init(&mut self, model: &ClusterModel) {
        // static for the lifetime of one invocation - replica group membership never changes,
        // only placement does - so this is checked once rather than rescanned every step.
        self.has_replicas = model.has_replicas();
    }

    fn cost(&self, model: &ClusterModel) -> f64 {
        let stats: Vec<f64> = model
            .servers()
            .map(|s| {
                model
                    .regions_per_server(s)
                    .iter()
                    .filter(|&&r| model.is_primary(r))
                    .count() as f64
            })
            .collect();
        cost_from_array(&stats).value()
    }

    fn is_needed(&self, _model: &ClusterModel) -> bool {
        self.has_replicas
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

    fn model_with(a: Vec<&str>, b: Vec<&str>) -> ClusterModel {
        let mut assignment = BTreeMap::new();
        assignment.insert(
            "serverA:1:1".to_owned(),
            a.into_iter().map(region).collect(),
        );
        assignment.insert(
            "serverB:1:1".to_owned(),
            b.into_iter().map(region).collect(),
        );
        ClusterModel::new(&assignment, &HashMap::new(), 15, Some(&NoLocality), &SingleRack).unwrap()
    }

    #[test]
    fn ten_and_zero_costs_one() {
        let model = model_with(
            vec!["r1", "r2", "r3", "r4", "r5", "r6", "r7", "r8", "r9", "r10"],
            vec![],
        );
        let cost = RegionCountSkew::new(500.0);
        assert!((cost.cost(&model) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn balancing_reduces_skew_to_zero() {
        let mut model = model_with(
            vec!["r1", "r2", "r3", "r4", "r5", "r6", "r7", "r8", "r9", "r10"],
            vec![],
        );
        let cost = RegionCountSkew::new(500.0);
        assert!((cost.cost(&model) - 1.0).abs() < 1e-9);

        for i in 0..5 {
            let r = model.region_by_name(&format!("r{}", i + 1)).unwrap();
            model.apply(Action::Move(r, ServerIndex::new(0), ServerIndex::new(1)));
        }

        assert_eq!(cost.cost(&model), 0.0);
    }

    #[test]
    fn primary_skew_disabled_without_replicas() {
        let model = model_with(vec!["r1", "r2"], vec!["r3"]);
        let mut cost = PrimaryRegionCountSkew::new(500.0);
        cost.init(&model);
        assert!(!cost.is_needed(&model));
    }
}
