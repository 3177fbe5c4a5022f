use cluster_model::{Action, ClusterModel};
use common::*;
use unit::{RegionIndex, ServerIndex};

/// A stateless `model -> Action` function. Implementations never mutate the model themselves;
/// the driver applies whatever they return and undoes it if the resulting cost doesn't improve.
pub trait CandidateGenerator {
    fn name(&self) -> &'static str;

    fn generate(&self, model: &ClusterModel, rng: &mut SmallRng) -> Action;
}

/// Picks a random region on `server`, or no region at all with probability `chance_of_none`.
/// Shared by the random and load-skew generators - the "random region dance" that turns a pair
/// of picks on two servers into a move, a swap, or nothing.
pub fn pick_random_region(
    model: &ClusterModel,
    server: ServerIndex,
    rng: &mut SmallRng,
    chance_of_none: f64,
) -> Option<RegionIndex> {
    let regions = model.regions_per_server(server);
    if regions.is_empty() || rng.gen::<f64>() < chance_of_none {
        return None;
    }
    Some(regions[rng.gen_range(0..regions.len())])
}

/// Turns two independent picks on `server_a`/`server_b` into the matching action: both empty is
/// a no-op, one empty is a move of the other's pick onto the empty side, both present is a swap.
pub fn action_from_picks(
    server_a: ServerIndex,
    region_a: Option<RegionIndex>,
    server_b: ServerIndex,
    region_b: Option<RegionIndex>,
) -> Action {
    match (region_a, region_b) {
        (None, None) => Action::Null,
        (Some(r), None) => Action::Move(r, server_a, server_b),
        (None, Some(r)) => Action::Move(r, server_b, server_a),
        (Some(ra), Some(rb)) => Action::Swap(ra, server_a, rb, server_b),
    }
}

/// Reservoir-samples one primary out of every colocated run (length > 1) in a sorted primaries
/// array, giving every colocated group equal selection probability regardless of its size.
pub fn reservoir_pick_colocated_primary(
    primaries: &[RegionIndex],
    rng: &mut SmallRng,
) -> Option<RegionIndex> {
    let mut chosen = None;
    let mut best = -1.0_f64;
    let mut run_start = 0;

    for i in 1..=primaries.len() {
        let run_ended = i == primaries.len() || primaries[i] != primaries[run_start];
        if run_ended {
            let run_len = i - run_start;
            if run_len > 1 {
                let draw: f64 = rng.gen();
                if draw > best {
                    best = draw;
                    chosen = Some(primaries[run_start]);
                }
            }
            run_start = i;
        }
    }

    chosen
}
