use cluster_model::{Action, ClusterModel};
use common::*;

use crate::generator::CandidateGenerator;

/// Picks a random server, finds its worst-locality region, and tries to move that region onto
/// the least-loaded server that actually has locality for it. A no-op on a cluster with no
/// locality oracle wired up, since every region then resolves to unknown locality everywhere.
pub struct LocalityGenerator;

impl CandidateGenerator for LocalityGenerator {
    fn name(&self) -> &'static str {
        "Locality"
    }

    fn generate(&self, model: &ClusterModel, rng: &mut SmallRng) -> Action {
        let num_servers = model.num_servers();
        if num_servers == 0 {
            return Action::Null;
        }

        let server = unit::ServerIndex::new(rng.gen_range(0..num_servers));
        let region = match model.lowest_locality_region_on(server) {
            Some(r) => r,
            None => return Action::Null,
        };

        match model.least_loaded_server_with_locality_for(region, server) {
            Some(target) => Action::Move(region, server, target),
            None => Action::Null,
        }
    }
}
