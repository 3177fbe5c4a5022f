/// External block-locality discovery service. Deliberately out of scope for this crate (§1) -
/// callers supply an implementation, typically backed by a cached snapshot, since it may block
/// on I/O. Results returned here are cached per `(region, server)` for the lifetime of the model.
pub trait LocalityOracle {
    /// Returns `(server, fraction)` pairs ranked by descending locality fraction. Servers not
    /// present are treated as having unknown locality (contributes the documented fallback cost).
    fn locality(&self, region: &str) -> Vec<(String, f64)>;
}

/// Resolves a server identifier to its rack identifier. Stateless and assumed cheap/non-blocking.
pub trait RackResolver {
    fn rack_of(&self, server: &str) -> String;
}

/// A [`LocalityOracle`] that always reports no location data, for callers with no locality
/// discovery service wired up yet.
pub struct NoLocality;

impl LocalityOracle for NoLocality {
    fn locality(&self, _region: &str) -> Vec<(String, f64)> {
        Vec::new()
    }
}
