use cluster_model::ClusterModel;

use crate::function::CostFunction;

/// Sum of `1 - locality(r, currentServer(r))` across regions, scaled to `[0, maxRegions]`. A
/// region with no location data resolves to locality `0` already in
/// `ClusterModel::locality_of_region`, so it naturally contributes `1` here without special
/// casing (§4.2).
pub struct Locality {
    multiplier: f64,
}

impl Locality {
    pub fn new(multiplier: f64) -> Self {
        Self { multiplier }
    }
}

impl CostFunction for Locality {
    fn name(&self) -> &'static str {
        "Locality"
    }

    fn init(&mut self, _model: &ClusterModel) {}

    fn cost(&self, model: &ClusterModel) -> f64 {
        if model.num_regions() == 0 {
            return 0.0;
        }

        let total: f64 = model
            .regions()
            .map(|r| 1.0 - model.locality_of_region(r, model.current_server_of(r)))
            .sum();

        (total / model.num_regions() as f64).clamp(0.0, 1.0)
    }

    fn multiplier(&self) -> f64 {
        self.multiplier
    }
}
