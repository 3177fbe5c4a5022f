//! The eleven independent cost terms of §4.2, plus the weighted-sum aggregator that ties them
//! together with the early-out bail described there. Each function subscribes to
//! [`ClusterModel`](cluster_model::ClusterModel) mutations via [`CostFunction::post_action`] and
//! keeps only as much private state as it needs - most lean entirely on the model's own
//! incrementally-maintained indices (§9).

mod aggregate;
mod array;
mod colocation;
mod function;
mod locality;
mod move_cost;
mod rate;
mod skew;
mod table_skew;

pub use aggregate::CostAggregate;
pub use array::cost_from_array;
pub use colocation::{Group, ReplicaColocationCost};
pub use function::CostFunction;
pub use locality::Locality;
pub use move_cost::MoveCost;
pub use rate::LoadSkewCost;
pub use skew::{PrimaryRegionCountSkew, RegionCountSkew};
pub use table_skew::TableSkew;

use config::Weights;

/// Builds the full, default set of cost functions from a [`Weights`] config section - the
/// registration order `CostAggregate` runs (and early-outs) in. `max_move_percent` lives on the
/// `Search` config section rather than `Weights` (§6), so it's threaded in separately for
/// `MoveCost`'s cap.
pub fn default_cost_functions(weights: &Weights, max_move_percent: f64) -> Vec<Box<dyn CostFunction>> {
    vec![
        Box::new(RegionCountSkew::new(weights.region_count_skew)),
        Box::new(PrimaryRegionCountSkew::new(weights.primary_region_count_skew)),
        Box::new(MoveCost::new(weights.move_cost, max_move_percent)),
        Box::new(Locality::new(weights.locality)),
        Box::new(TableSkew::new(weights.table_skew, weights.max_table_skew_weight)),
        Box::new(ReplicaColocationCost::new(
            weights.region_replica_host,
            Group::Host,
        )),
        Box::new(ReplicaColocationCost::new(
            weights.region_replica_rack,
            Group::Rack,
        )),
        Box::new(LoadSkewCost::read_requests(weights.read_request)),
        Box::new(LoadSkewCost::write_requests(weights.write_request)),
        Box::new(LoadSkewCost::memstore_size(weights.memstore_size)),
        Box::new(LoadSkewCost::storefile_size(weights.store_file_size)),
    ]
}
