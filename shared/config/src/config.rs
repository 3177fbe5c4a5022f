use serde::Deserialize;

/// Tunables for a single balancing invocation, hot-reloaded from a RON file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub search: Search,
    pub weights: Weights,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Search {
    /// Hard ceiling on search steps, regardless of cluster size.
    pub max_steps: u64,
    /// Scales the per-cluster step budget: `steps = numRegions * steps_per_region * numServers`.
    pub steps_per_region: u64,
    /// Wall-clock deadline in milliseconds, checked cooperatively each step.
    pub max_running_time_ms: u64,
    /// Capacity of each region's rolling load history deque.
    pub num_region_loads_to_remember: usize,
    /// Below this normalised aggregate cost, `needsBalance` reports false.
    pub min_cost_need_balance: f64,
    /// Caps the emitted plan to `max(numRegions * max_move_percent, 600)`.
    pub max_move_percent: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Weights {
    pub region_count_skew: f64,
    pub primary_region_count_skew: f64,
    pub move_cost: f64,
    pub locality: f64,
    pub table_skew: f64,
    /// Blend between worst-table and mean-table skew in the `TableSkew` aggregate; `0` disables
    /// the worst-table term entirely.
    pub max_table_skew_weight: f64,
    pub region_replica_host: f64,
    pub region_replica_rack: f64,
    pub read_request: f64,
    pub write_request: f64,
    pub memstore_size: f64,
    pub store_file_size: f64,
}

impl Default for Search {
    fn default() -> Self {
        Self {
            max_steps: 1_000_000,
            steps_per_region: 800,
            max_running_time_ms: 30_000,
            num_region_loads_to_remember: 15,
            min_cost_need_balance: 0.05,
            max_move_percent: 0.25,
        }
    }
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            region_count_skew: 500.0,
            primary_region_count_skew: 500.0,
            move_cost: 7.0,
            locality: 25.0,
            table_skew: 35.0,
            max_table_skew_weight: 0.0,
            region_replica_host: 100_000.0,
            region_replica_rack: 10_000.0,
            read_request: 5.0,
            write_request: 5.0,
            memstore_size: 5.0,
            store_file_size: 5.0,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            search: Search::default(),
            weights: Weights::default(),
        }
    }
}
