use cluster_model::{Action, ClusterModel};
use common::*;

use crate::generator::{action_from_picks, pick_random_region, CandidateGenerator};

/// Runs the same random-region dance as [`RandomGenerator`](crate::RandomGenerator), but targets
/// the heaviest and lightest server by region count instead of two uniformly-random ones - biases
/// the search toward moves that actually reduce `RegionCountSkew` rather than waiting for one to
/// turn up by chance.
pub struct LoadSkewGenerator;

impl CandidateGenerator for LoadSkewGenerator {
    fn name(&self) -> &'static str {
        "LoadSkew"
    }

    fn generate(&self, model: &ClusterModel, rng: &mut SmallRng) -> Action {
        let sorted = model.sorted_servers_by_region_count();
        if sorted.len() < 2 {
            return Action::Null;
        }

        let lightest = sorted[0];
        let heaviest = *sorted.last().unwrap();

        let region_heavy = pick_random_region(model, heaviest, rng, 0.5);
        let region_light = pick_random_region(model, lightest, rng, 0.5);
        action_from_picks(heaviest, region_heavy, lightest, region_light)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap};

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
        let mut assignment = BTreeMap::new();
        assignment.insert(
            "serverA:1:1".to_owned(),
            vec![region("r1"), region("r2"), region("r3")],
        );
        assignment.insert("serverB:1:1".to_owned(), vec![]);
        ClusterModel::new(&assignment, &HashMap::new(), 15, Some(&NoLocality), &SingleRack).unwrap()
    }

    #[test]
    fn targets_the_heaviest_and_lightest_server() {
        let model = skewed_model();
        let gen = LoadSkewGenerator;
        let mut rng = common::seeded_rng(Some(7));

        for _ in 0..50 {
            match gen.generate(&model, &mut rng) {
                Action::Null => {}
                Action::Move(r, from, to) => {
                    assert_eq!(from.as_usize(), 0);
                    assert_eq!(to.as_usize(), 1);
                    assert_eq!(model.current_server_of(r), from);
                }
                other => panic!("unexpected action with only one region source: {:?}", other),
            }
        }
    }

    #[test]
    fn already_balanced_cluster_still_yields_valid_actions() {
        let mut assignment = BTreeMap::new();
        assignment.insert("serverA:1:1".to_owned(), vec![region("r1")]);
        assignment.insert("serverB:1:1".to_owned(), vec![region("r2")]);
        let model =
            ClusterModel::new(&assignment, &HashMap::new(), 15, Some(&NoLocality), &SingleRack)
                .unwrap();

        let gen = LoadSkewGenerator;
        let mut rng = common::seeded_rng(Some(3));
        for _ in 0..20 {
            match gen.generate(&model, &mut rng) {
                Action::Null => {}
                Action::Move(r, from, to) => assert_eq!(model.current_server_of(r), from),
                Action::Swap(ra, sa, rb, sb) => {
                    assert_eq!(model.current_server_of(ra), sa);
                    assert_eq!(model.current_server_of(rb), sb);
                }
                Action::Assign(..) => panic!("generator should never emit Assign"),
            }
        }
    }
}
