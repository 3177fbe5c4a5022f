pub mod load_skew;
pub mod locality;
pub mod random;
pub mod replica_rack;

pub use load_skew::LoadSkewGenerator;
pub use locality::LocalityGenerator;
pub use random::RandomGenerator;
pub use replica_rack::ReplicaRackGenerator;
