use cluster_model::ClusterModel;
use unit::{RegionIndex, ServerIndex};

/// A single region reassignment: move `region` from `from` to `to`. Built by diffing a model's
/// current assignment against the one it started with, so a region touched during the search but
/// returned to its original server never shows up here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    pub region: RegionIndex,
    pub from: ServerIndex,
    pub to: ServerIndex,
}

/// Diffs `model`'s current assignment against its initial one and returns a [`Move`] for every
/// region that ended up somewhere else. Empty if the search never improved on the starting
/// placement.
pub fn extract_plan(model: &ClusterModel) -> Vec<Move> {
    model
        .regions()
        .filter_map(|r| {
            let from = model.initial_server_of(r);
            let to = model.current_server_of(r);
            if from == to {
                None
            } else {
                Some(Move { region: r, from, to })
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap};

    use cluster_model::{Action, NoLocality, RackResolver, RegionSpec};

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

    #[test]
    fn untouched_model_yields_an_empty_plan() {
        let mut assignment = BTreeMap::new();
        assignment.insert("serverA:1:1".to_owned(), vec![region("r1")]);
        assignment.insert("serverB:1:1".to_owned(), vec![]);
        let model =
            ClusterModel::new(&assignment, &HashMap::new(), 15, Some(&NoLocality), &SingleRack)
                .unwrap();

        assert!(extract_plan(&model).is_empty());
    }

    #[test]
    fn moved_region_shows_up_once() {
        let mut assignment = BTreeMap::new();
        assignment.insert("serverA:1:1".to_owned(), vec![region("r1")]);
        assignment.insert("serverB:1:1".to_owned(), vec![]);
        let mut model =
            ClusterModel::new(&assignment, &HashMap::new(), 15, Some(&NoLocality), &SingleRack)
                .unwrap();

        let r1 = model.region_by_name("r1").unwrap();
        let server_a = model.server_by_name("serverA:1:1").unwrap();
        let server_b = model.server_by_name("serverB:1:1").unwrap();
        model.apply(Action::Move(r1, server_a, server_b));

        let plan = extract_plan(&model);
        assert_eq!(
            plan,
            vec![Move {
                region: r1,
                from: server_a,
                to: server_b,
            }]
        );
    }

    #[test]
    fn region_moved_back_to_its_origin_is_not_in_the_plan() {
        let mut assignment = BTreeMap::new();
        assignment.insert("serverA:1:1".to_owned(), vec![region("r1")]);
        assignment.insert("serverB:1:1".to_owned(), vec![]);
        let mut model =
            ClusterModel::new(&assignment, &HashMap::new(), 15, Some(&NoLocality), &SingleRack)
                .unwrap();

        let r1 = model.region_by_name("r1").unwrap();
        let server_a = model.server_by_name("serverA:1:1").unwrap();
        let server_b = model.server_by_name("serverB:1:1").unwrap();
        model.apply(Action::Move(r1, server_a, server_b));
        model.apply(Action::Move(r1, server_b, server_a));

        assert!(extract_plan(&model).is_empty());
    }
}
