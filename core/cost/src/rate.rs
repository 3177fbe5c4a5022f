use cluster_model::ClusterModel;
use unit::{LoadSample, RegionIndex, ServerIndex};

use crate::array::cost_from_array;
use crate::function::CostFunction;

/// Shared shape for the four load-based skew functions (§4.2): a per-region statistic computed
/// once at `init` from the (static, during a balance invocation) load history, then maintained as
/// a per-server running sum that's adjusted on every region move rather than recomputed from
/// scratch - the same incremental-state idiom as [`TableSkew`](crate::TableSkew)'s `num_moves`.
pub struct LoadSkewCost {
    name: &'static str,
    multiplier: f64,
    extract: fn(&LoadSample) -> i64,
    is_rate: bool,
    per_region: Vec<f64>,
    per_server: Vec<f64>,
}

impl LoadSkewCost {
    fn new(
        name: &'static str,
        multiplier: f64,
        extract: fn(&LoadSample) -> i64,
        is_rate: bool,
    ) -> Self {
        Self {
            name,
            multiplier,
            extract,
            is_rate,
            per_region: Vec::new(),
            per_server: Vec::new(),
        }
    }

    pub fn read_requests(multiplier: f64) -> Self {
        Self::new("ReadRequest", multiplier, |s| s.read_requests_count, true)
    }

    pub fn write_requests(multiplier: f64) -> Self {
        Self::new("WriteRequest", multiplier, |s| s.write_requests_count, true)
    }

    pub fn memstore_size(multiplier: f64) -> Self {
        Self::new("MemstoreSize", multiplier, |s| s.mem_store_size_mb as i64, true)
    }

    pub fn storefile_size(multiplier: f64) -> Self {
        Self::new(
            "StoreFileSize",
            multiplier,
            |s| s.storefile_size_mb as i64,
            false,
        )
    }
}

impl CostFunction for LoadSkewCost {
    fn name(&self) -> &'static str {
        self.name
    }

    fn init(&mut self, model: &ClusterModel) {
        self.per_region = model
            .regions()
            .map(|r| {
                let history = model.load_history(r);
                if self.is_rate {
                    history.mean_rate(self.extract)
                } else {
                    history.latest(self.extract) as f64
                }
            })
            .collect();

        self.per_server = vec![0.0; model.num_servers()];
        for r in model.regions() {
            self.per_server[model.current_server_of(r).as_usize()] += self.per_region[r.as_usize()];
        }
    }

    fn region_moved(
        &mut self,
        _model: &ClusterModel,
        region: RegionIndex,
        from: Option<ServerIndex>,
        to: ServerIndex,
    ) {
        let value = self.per_region[region.as_usize()];
        if let Some(from) = from {
            self.per_server[from.as_usize()] -= value;
        }
        self.per_server[to.as_usize()] += value;
    }

    fn cost(&self, _model: &ClusterModel) -> f64 {
        cost_from_array(&self.per_server).value()
    }

    fn multiplier(&self) -> f64 {
        self.multiplier
    }
}
