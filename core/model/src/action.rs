use unit::{RegionIndex, ServerIndex};

/// A mutation to a [`ClusterModel`](crate::ClusterModel). Every variant has a deterministic
/// [`inverse`](Action::inverse) that undoes it, used by the search driver to roll back rejected
/// steps without rebuilding the model from scratch.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Action {
    /// Does nothing. The normal result of a generator finding nothing useful to do this step.
    Null,
    /// Assigns a previously-unassigned region to a server. Only used during initial assignment;
    /// never produced by a generator, since every region is assigned at model construction.
    Assign(RegionIndex, ServerIndex),
    /// Moves a region from one server to another.
    Move(RegionIndex, ServerIndex, ServerIndex),
    /// Exchanges the servers of two regions.
    Swap(RegionIndex, ServerIndex, RegionIndex, ServerIndex),
}

impl Action {
    pub fn inverse(self) -> Action {
        match self {
            Action::Null => Action::Null,
            Action::Assign(_, _) => Action::Null,
            Action::Move(region, from, to) => Action::Move(region, to, from),
            Action::Swap(region_a, server_a, region_b, server_b) => {
                Action::Swap(region_a, server_b, region_b, server_a)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_inverse_swaps_direction() {
        let a = Action::Move(RegionIndex::new(1), ServerIndex::new(0), ServerIndex::new(2));
        assert_eq!(
            a.inverse(),
            Action::Move(RegionIndex::new(1), ServerIndex::new(2), ServerIndex::new(0))
        );
        assert_eq!(a.inverse().inverse(), a);
    }

    #[test]
    fn swap_inverse_swaps_destinations() {
        let a = Action::Swap(
            RegionIndex::new(1),
            ServerIndex::new(0),
            RegionIndex::new(2),
            ServerIndex::new(3),
        );
        assert_eq!(
            a.inverse(),
            Action::Swap(
                RegionIndex::new(1),
                ServerIndex::new(3),
                RegionIndex::new(2),
                ServerIndex::new(0)
            )
        );
    }

    #[test]
    fn null_is_its_own_inverse() {
        assert_eq!(Action::Null.inverse(), Action::Null);
    }
}
