use common::*;

/// Declares a dense, zero-based array index newtype with the usual small arithmetic and logging
/// impls. Mirrors the `SlabIndex`-style newtypes this workspace already uses for coordinate
/// indices, just over `usize` instead of `i32` since these never go negative.
macro_rules! declare_index {
    ($name:ident, $doc:expr, $key:expr) => {
        #[doc = $doc]
        #[derive(
            Debug,
            Default,
            Copy,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            derive_more::Into,
            derive_more::From,
        )]
        pub struct $name(pub usize);

        impl $name {
            pub const fn new(i: usize) -> Self {
                Self(i)
            }

            pub const fn as_usize(self) -> usize {
                self.0
            }
        }

        slog_value_debug!($name);
        slog_kv_debug!($name, $key);
    };
}

declare_index!(RegionIndex, "Dense index of a region, assigned once at model construction", "region");
declare_index!(ServerIndex, "Dense index of a server, assigned once at model construction", "server");
declare_index!(HostIndex, "Dense index of a host, one or more servers per host", "host");
declare_index!(RackIndex, "Dense index of a rack, one or more hosts per rack", "rack");
declare_index!(TableIndex, "Dense index of a table, one or more regions per table", "table");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_and_equality_are_by_value() {
        assert!(RegionIndex(1) < RegionIndex(2));
        assert_eq!(RegionIndex(4), RegionIndex(4));
        assert_ne!(ServerIndex(1).as_usize(), ServerIndex(2).as_usize());
    }

    #[test]
    fn distinct_types_cannot_be_compared() {
        // this is a compile-time guarantee, not a runtime one: RegionIndex and ServerIndex are
        // different types, so `RegionIndex(0) == ServerIndex(0)` would fail to compile if
        // attempted. documented here rather than asserted.
        let region = RegionIndex::new(0);
        let server = ServerIndex::new(0);
        assert_eq!(region.as_usize(), server.as_usize());
    }
}
