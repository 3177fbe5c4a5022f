use cluster_model::ClusterModel;
use unit::{RegionIndex, ServerIndex, TableIndex};

use crate::function::CostFunction;

/// The sole surviving `TableSkew` variant (§4.2.1, §9) - the source's second, deprecated
/// implementation with a decaying `numMaxRegionsPerTable` side channel is not carried over.
///
/// Maintains `numMoves(t)` per table incrementally: a single-server move recomputes only the
/// moved region's table; a same-table swap touches neither server's per-table count net, so it
/// is a no-op; a cross-table swap recomputes both tables.
pub struct TableSkew {
    multiplier: f64,
    max_table_skew_weight: f64,
    num_moves: Vec<u32>,
}

impl TableSkew {
    pub fn new(multiplier: f64, max_table_skew_weight: f64) -> Self {
        Self {
            multiplier,
            max_table_skew_weight,
            num_moves: Vec::new(),
        }
    }

    fn recompute_table(&mut self, model: &ClusterModel, table: TableIndex) {
        self.num_moves[table.as_usize()] = num_moves_for_table(model, table);
    }

    fn skew_of(&self, model: &ClusterModel, table: TableIndex) -> f64 {
        let r = model.num_regions_of_table(table);
        let max = model.max_regions_if_evenly_distributed(table);
        if r == max {
            return 0.0;
        }

        let moves = self.num_moves[table.as_usize()] as f64;
        (moves / (r - max) as f64).clamp(0.0, 1.0)
    }
}

/// Surplus-only move count to reach the ideal per-table distribution (§4.2.1).
fn num_moves_for_table(model: &ClusterModel, table: TableIndex) -> u32 {
    let max = model.max_regions_if_evenly_distributed(table);
    let min = model.min_regions_if_evenly_distributed(table);
    let mut num_max_remaining = model.num_servers_with_max_regions_if_evenly_distributed(table);

    let mut num_moves = 0u32;
    for s in model.servers() {
        let n = model.num_regions_on_server_of_table(s, table);
        if n >= max && num_max_remaining > 0 {
            num_moves += n - max;
            num_max_remaining -= 1;
        } else if n > min {
            num_moves += n - min;
        }
    }
    num_moves
}

impl CostFunction for TableSkew {
    fn name(&self) -> &'static str {
        "TableSkew"
    }

    fn init(&mut self, model: &ClusterModel) {
        self.num_moves = model
            .tables()
            .map(|t| num_moves_for_table(model, t))
            .collect();
    }

    fn region_moved(
        &mut self,
        model: &ClusterModel,
        region: RegionIndex,
        _from: Option<ServerIndex>,
        _to: ServerIndex,
    ) {
        let table = model.region_table(region);
        self.recompute_table(model, table);
    }

    fn region_swapped(
        &mut self,
        model: &ClusterModel,
        region_a: RegionIndex,
        _server_a: ServerIndex,
        region_b: RegionIndex,
        _server_b: ServerIndex,
    ) {
        let table_a = model.region_table(region_a);
        let table_b = model.region_table(region_b);
        if table_a == table_b {
            return;
        }
        self.recompute_table(model, table_a);
        self.recompute_table(model, table_b);
    }

    fn cost(&self, model: &ClusterModel) -> f64 {
        if model.num_tables() == 0 {
            return 0.0;
        }

        let skews: Vec<f64> = model.tables().map(|t| self.skew_of(model, t)).collect();
        let worst = skews.iter().cloned().fold(0.0_f64, f64::max);
        let mean = skews.iter().sum::<f64>() / skews.len() as f64;

        let w_max = self.max_table_skew_weight;
        let w_avg = 1.0 - w_max;
        (w_max * worst + w_avg * mean).max(0.0).sqrt().clamp(0.0, 1.0)
    }

    fn multiplier(&self) -> f64 {
        self.multiplier
    }
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

    fn region(name: &str, table: &str) -> RegionSpec {
        RegionSpec {
            name: name.to_owned(),
            table: table.to_owned(),
            primary: name.to_owned(),
        }
    }

    /// Three servers, three tables of 3 regions each, table T1 entirely on server A (scenario 2).
    fn scenario_model() -> ClusterModel {
        let mut assignment = BTreeMap::new();
        assignment.insert(
            "serverA:1:1".to_owned(),
            vec![
                region("t1-a", "t1"),
                region("t1-b", "t1"),
                region("t1-c", "t1"),
            ],
        );
        assignment.insert(
            "serverB:1:1".to_owned(),
            vec![
                region("t2-a", "t2"),
                region("t2-b", "t2"),
                region("t2-c", "t2"),
            ],
        );
        assignment.insert(
            "serverC:1:1".to_owned(),
            vec![
                region("t3-a", "t3"),
                region("t3-b", "t3"),
                region("t3-c", "t3"),
            ],
        );
        ClusterModel::new(&assignment, &HashMap::new(), 15, Some(&NoLocality), &SingleRack).unwrap()
    }

    #[test]
    fn concentrated_table_needs_two_moves() {
        let model = scenario_model();
        let t1 = model.region_table(model.region_by_name("t1-a").unwrap());
        assert_eq!(num_moves_for_table(&model, t1), 2);
    }

    #[test]
    fn every_table_in_the_scenario_is_equally_concentrated() {
        let model = scenario_model();
        let t2 = model.region_table(model.region_by_name("t2-a").unwrap());
        assert_eq!(num_moves_for_table(&model, t2), 2);
    }

    #[test]
    fn balancing_t1_reduces_its_num_moves_to_zero() {
        let mut model = scenario_model();
        let mut cost = TableSkew::new(35.0, 0.0);
        cost.init(&model);

        let t1b = model.region_by_name("t1-b").unwrap();
        let t1c = model.region_by_name("t1-c").unwrap();
        let sa = unit::ServerIndex::new(0);
        let sb = unit::ServerIndex::new(1);
        let sc = unit::ServerIndex::new(2);

        let move1 = Action::Move(t1b, sa, sb);
        model.apply(move1);
        cost.post_action(&model, move1);

        let move2 = Action::Move(t1c, sa, sc);
        model.apply(move2);
        cost.post_action(&model, move2);

        let t1 = model.region_table(model.region_by_name("t1-a").unwrap());
        assert_eq!(cost.num_moves[t1.as_usize()], 0);
    }

    #[test]
    fn same_table_swap_is_a_cost_function_no_op() {
        let mut assignment = BTreeMap::new();
        assignment.insert(
            "serverA:1:1".to_owned(),
            vec![region("t1-a", "t1"), region("t2-a", "t2")],
        );
        assignment.insert("serverB:1:1".to_owned(), vec![region("t1-b", "t1")]);
        let mut model =
            ClusterModel::new(&assignment, &HashMap::new(), 15, Some(&NoLocality), &SingleRack)
                .unwrap();

        let mut cost = TableSkew::new(35.0, 0.0);
        cost.init(&model);
        let before = cost.num_moves.clone();

        let t1a = model.region_by_name("t1-a").unwrap();
        let t1b = model.region_by_name("t1-b").unwrap();
        let sa = unit::ServerIndex::new(0);
        let sb = unit::ServerIndex::new(1);

        let swap = Action::Swap(t1a, sa, t1b, sb);
        model.apply(swap);
        cost.post_action(&model, swap);

        assert_eq!(before, cost.num_moves);
    }
}
