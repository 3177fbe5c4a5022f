use cluster_model::{Action, ClusterModel};
use unit::{RegionIndex, ServerIndex};

use crate::function::CostFunction;

/// Count of regions displaced from their initial server, with a hard sentinel above
/// `max(numRegions * max_move_percent, 600)` (§4.2, §8 invariant 6) - the one documented escape
/// from the `[0, 1]` contract, intentionally large enough to make the aggregate reject any plan
/// that would overshoot the move cap.
pub struct MoveCost {
    multiplier: f64,
    max_move_percent: f64,
    displaced: Vec<bool>,
    displaced_count: u32,
}

impl MoveCost {
    pub fn new(multiplier: f64, max_move_percent: f64) -> Self {
        Self {
            multiplier,
            max_move_percent,
            displaced: Vec::new(),
            displaced_count: 0,
        }
    }

    fn cap(&self, model: &ClusterModel) -> f64 {
        (model.num_regions() as f64 * self.max_move_percent).max(600.0)
    }

    fn set_displaced(&mut self, region: RegionIndex, is_displaced: bool) {
        let slot = &mut self.displaced[region.as_usize()];
        if *slot != is_displaced {
            *slot = is_displaced;
            if is_displaced {
                self.displaced_count += 1;
            } else {
                self.displaced_count -= 1;
            }
        }
    }
}

impl CostFunction for MoveCost {
    fn name(&self) -> &'static str {
        "MoveCost"
    }

    fn init(&mut self, model: &ClusterModel) {
        self.displaced = model
            .regions()
            .map(|r| model.current_server_of(r) != model.initial_server_of(r))
            .collect();
        self.displaced_count = self.displaced.iter().filter(|&&d| d).count() as u32;
    }

    fn region_moved(
        &mut self,
        model: &ClusterModel,
        region: RegionIndex,
        _from: Option<ServerIndex>,
        to: ServerIndex,
    ) {
        let is_displaced = to != model.initial_server_of(region);
        self.set_displaced(region, is_displaced);
    }

    fn cost(&self, model: &ClusterModel) -> f64 {
        if self.displaced_count as f64 > self.cap(model) {
            return 1e6;
        }

        let max_possible = model.num_regions() as f64;
        if max_possible == 0.0 {
            0.0
        } else {
            (self.displaced_count as f64 / max_possible).clamp(0.0, 1.0)
        }
    }

    fn multiplier(&self) -> f64 {
        self.multiplier
    }
}
