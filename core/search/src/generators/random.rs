use cluster_model::{Action, ClusterModel};
use common::*;
use unit::ServerIndex;

use crate::generator::{action_from_picks, pick_random_region, CandidateGenerator};

/// Picks two distinct servers uniformly at random and runs the random-region dance on both,
/// with no regard for current load or locality - the baseline generator that keeps the search
/// from getting stuck exploiting only the other three generators' biases.
pub struct RandomGenerator;

impl CandidateGenerator for RandomGenerator {
    fn name(&self) -> &'static str {
        "Random"
    }

    fn generate(&self, model: &ClusterModel, rng: &mut SmallRng) -> Action {
        let num_servers = model.num_servers();
        if num_servers < 2 {
            return Action::Null;
        }

        let a = rng.gen_range(0..num_servers);
        let mut b = rng.gen_range(0..num_servers - 1);
        if b >= a {
            b += 1;
        }
        let server_a = ServerIndex::new(a);
        let server_b = ServerIndex::new(b);

        let region_a = pick_random_region(model, server_a, rng, 0.5);
        let region_b = pick_random_region(model, server_b, rng, 0.5);
        action_from_picks(server_a, region_a, server_b, region_b)
    }
}
