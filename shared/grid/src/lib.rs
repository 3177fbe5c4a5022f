mod grid_impl;

pub use grid_impl::{CoordRange, DynamicGrid, GridCoord};
