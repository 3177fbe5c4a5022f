use cluster_model::{Action, ClusterModel};
use common::*;
use unit::{HostIndex, RackIndex, RegionIndex, ServerIndex};

use crate::generator::{reservoir_pick_colocated_primary, CandidateGenerator};
use crate::generators::random::RandomGenerator;

/// Targets replica colocation directly: finds a rack (falling back to a host) where two or more
/// replicas of the same region sit together, and moves one of the secondaries to a server outside
/// that group. Falls back to [`RandomGenerator`] when no colocation is found at either level, so
/// the step budget is never spent on an outright no-op once replicas exist anywhere.
pub struct ReplicaRackGenerator;

impl CandidateGenerator for ReplicaRackGenerator {
    fn name(&self) -> &'static str {
        "ReplicaRack"
    }

    fn generate(&self, model: &ClusterModel, rng: &mut SmallRng) -> Action {
        let num_racks = model.num_racks();
        if num_racks > 0 {
            let rack = RackIndex::new(rng.gen_range(0..num_racks));
            if let Some(action) = try_rack(model, rack, rng) {
                return action;
            }
        }

        let num_hosts = model.num_hosts();
        if num_hosts > 0 {
            let host = HostIndex::new(rng.gen_range(0..num_hosts));
            if let Some(action) = try_host(model, host, rng) {
                return action;
            }
        }

        RandomGenerator.generate(model, rng)
    }
}

fn try_rack(model: &ClusterModel, rack: RackIndex, rng: &mut SmallRng) -> Option<Action> {
    let primary = reservoir_pick_colocated_primary(model.primaries_per_rack(rack), rng)?;
    let secondary = find_secondary_in(model.regions_per_rack(rack), model, primary)?;
    let target = random_server_in_other_rack(model, rack, rng)?;
    let from = model.current_server_of(secondary);
    Some(Action::Move(secondary, from, target))
}

fn try_host(model: &ClusterModel, host: HostIndex, rng: &mut SmallRng) -> Option<Action> {
    let primary = reservoir_pick_colocated_primary(model.primaries_per_host(host), rng)?;
    let secondary = find_secondary_in(model.regions_per_host(host), model, primary)?;
    let target = random_server_in_other_host(model, host, rng)?;
    let from = model.current_server_of(secondary);
    Some(Action::Move(secondary, from, target))
}

/// First non-primary replica of `primary`'s group within `group`. Any match is equally valid
/// since the reservoir sampling above already made the group choice uniform.
fn find_secondary_in(
    group: &[RegionIndex],
    model: &ClusterModel,
    primary: RegionIndex,
) -> Option<RegionIndex> {
    group
        .iter()
        .copied()
        .find(|&r| r != primary && model.region_primary(r) == primary)
}

fn random_server_in_other_rack(
    model: &ClusterModel,
    rack: RackIndex,
    rng: &mut SmallRng,
) -> Option<ServerIndex> {
    let candidates: Vec<ServerIndex> = model
        .servers()
        .filter(|&s| model.server_rack(s) != rack)
        .collect();
    if candidates.is_empty() {
        None
    } else {
        Some(candidates[rng.gen_range(0..candidates.len())])
    }
}

fn random_server_in_other_host(
    model: &ClusterModel,
    host: HostIndex,
    rng: &mut SmallRng,
) -> Option<ServerIndex> {
    let candidates: Vec<ServerIndex> = model
        .servers()
        .filter(|&s| model.server_host(s) != host)
        .collect();
    if candidates.is_empty() {
        None
    } else {
        Some(candidates[rng.gen_range(0..candidates.len())])
    }
}
