pub use index::{HostIndex, RackIndex, RegionIndex, ServerIndex, TableIndex};
pub use load::{LoadHistory, LoadSample};

mod index;
mod load;
