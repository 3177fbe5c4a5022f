use common::{ArrayVec, Itertools};
use serde::{Deserialize, Serialize};
use std::ops::{Deref, DerefMut, Index, IndexMut};

/// Dense row-major array over up to 3 dimensions, heap-allocated since its size is only known
/// at runtime (cluster shape varies between invocations, unlike a fixed-size world chunk).
#[derive(Serialize, Deserialize)]
pub struct DynamicGrid<T> {
    dims: [usize; 3],
    data: Box<[T]>,
}

pub trait GridCoord<T: Default> {
    fn into_index(self, grid: &DynamicGrid<T>) -> usize;
    fn into_coord(self, grid: &DynamicGrid<T>) -> [usize; 3];
}

pub enum CoordRange {
    All,
    Single(usize),
    /// [from..to)
    Range(usize, usize),
}

impl<T: Default> DynamicGrid<T> {
    pub fn new(dims: [usize; 3]) -> Self {
        let len = dims[0] * dims[1] * dims[2];
        assert_ne!(len, 0);

        let data = {
            let mut vec = Vec::with_capacity(len);
            vec.resize_with(len, T::default);
            vec.into_boxed_slice()
        };

        DynamicGrid { dims, data }
    }

    pub fn flatten_coords(&self, [x, y, z]: [usize; 3]) -> usize {
        let [xs, ys, _zs] = self.dims;
        x + xs * (y + ys * z)
    }

    pub fn unflatten_index(&self, index: usize) -> [usize; 3] {
        let [xs, ys, _zs] = self.dims;
        [index % xs, (index / xs) % ys, index / (ys * xs)]
    }

    #[inline]
    pub fn is_coord_in_range(&self, [x, y, z]: [usize; 3]) -> bool {
        x < self.dims[0] && y < self.dims[1] && z < self.dims[2]
    }

    #[inline]
    pub fn is_in_range(&self, idx: usize) -> bool {
        idx < self.data.len()
    }

    pub fn dimensions(&self) -> [usize; 3] {
        self.dims
    }

    pub fn dimensions_xy(&self) -> [usize; 2] {
        [self.dims[0], self.dims[1]]
    }

    pub fn iter_coords(&self) -> impl Iterator<Item = ([usize; 3], &T)> + '_ {
        self.iter_coords_with_z_range(CoordRange::All)
    }

    pub fn iter_coords_mut(&mut self) -> impl Iterator<Item = ([usize; 3], &mut T)> + '_ {
        self.iter_coords_with_z_range_mut(CoordRange::All)
    }

    pub fn iter_coords_with_z_range(
        &self,
        z_range: CoordRange,
    ) -> impl Iterator<Item = ([usize; 3], &T)> + '_ {
        let (iter, start) = self.iter_coords_alone(z_range);
        iter.zip(self.data.iter().skip(start))
    }

    pub fn iter_coords_with_z_range_mut(
        &mut self,
        z_range: CoordRange,
    ) -> impl Iterator<Item = ([usize; 3], &mut T)> + '_ {
        let (iter, start) = self.iter_coords_alone(z_range);
        iter.zip(self.data.iter_mut().skip(start))
    }

    #[inline]
    fn iter_coords_alone(&self, z_range: CoordRange) -> (impl Iterator<Item = [usize; 3]>, usize) {
        Self::iter_coords_alone_static(z_range, self.dims)
    }

    pub fn iter_coords_alone_static(
        z_range: CoordRange,
        dims: [usize; 3],
    ) -> (impl Iterator<Item = [usize; 3]>, usize) {
        let (min_z, max_z) = match z_range {
            CoordRange::All => (0, dims[2]),
            CoordRange::Single(i) => (i, i + 1),
            CoordRange::Range(i, j) => (i, j),
        };

        let z_start = min_z * dims[0] * dims[1];
        let iter = (min_z..max_z)
            .cartesian_product(0..dims[1])
            .cartesian_product(0..dims[0])
            .map(move |((z, y), x)| [x, y, z]);
        (iter, z_start)
    }
}

impl<T: Default> GridCoord<T> for usize {
    fn into_index(self, _: &DynamicGrid<T>) -> usize {
        self
    }

    fn into_coord(self, grid: &DynamicGrid<T>) -> [usize; 3] {
        grid.unflatten_index(self)
    }
}

impl<T: Default> GridCoord<T> for [usize; 3] {
    fn into_index(self, grid: &DynamicGrid<T>) -> usize {
        grid.flatten_coords(self)
    }

    fn into_coord(self, _: &DynamicGrid<T>) -> [usize; 3] {
        self
    }
}

impl<T: Default> GridCoord<T> for [usize; 2] {
    fn into_index(self, grid: &DynamicGrid<T>) -> usize {
        grid.flatten_coords([self[0], self[1], 0])
    }

    fn into_coord(self, _: &DynamicGrid<T>) -> [usize; 3] {
        [self[0], self[1], 0]
    }
}

impl<T> Index<usize> for DynamicGrid<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        &self.data[index]
    }
}

impl<T> IndexMut<usize> for DynamicGrid<T> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.data[index]
    }
}

impl<T: Default> Index<[usize; 3]> for DynamicGrid<T> {
    type Output = T;

    fn index(&self, coords: [usize; 3]) -> &Self::Output {
        self.index(self.flatten_coords(coords))
    }
}

impl<T: Default> IndexMut<[usize; 3]> for DynamicGrid<T> {
    fn index_mut(&mut self, coords: [usize; 3]) -> &mut Self::Output {
        self.index_mut(self.flatten_coords(coords))
    }
}

impl<T: Default> Index<[usize; 2]> for DynamicGrid<T> {
    type Output = T;

    fn index(&self, coords: [usize; 2]) -> &Self::Output {
        self.index([coords[0], coords[1], 0])
    }
}

impl<T: Default> IndexMut<[usize; 2]> for DynamicGrid<T> {
    fn index_mut(&mut self, coords: [usize; 2]) -> &mut Self::Output {
        self.index_mut([coords[0], coords[1], 0])
    }
}

impl<T> AsRef<[T]> for DynamicGrid<T> {
    fn as_ref(&self) -> &[T] {
        &self.data
    }
}

impl<T> Deref for DynamicGrid<T> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl<T> DerefMut for DynamicGrid<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.data
    }
}
