use std::cell::RefCell;
use std::collections::BTreeMap;
use std::collections::HashMap;

use grid::DynamicGrid;
use unit::{HostIndex, LoadHistory, RackIndex, RegionIndex, ServerIndex, TableIndex};

use crate::action::Action;
use crate::error::ModelError;
use crate::locality::{LocalityOracle, RackResolver};

/// A region as handed to [`ClusterModel::new`]: its stable name, its table, and the name of its
/// replica group's primary region (its own name if it is itself the primary).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RegionSpec {
    pub name: String,
    pub table: String,
    pub primary: String,
}

/// Below this many active servers, balancing is refused outright (§4.4 pre-check, §7 degenerate
/// cluster).
pub const MIN_SERVER_BALANCE: usize = 2;

/// Mutable in-memory snapshot of a cluster assignment, plus every incrementally-maintained index
/// the cost functions and candidate generators read. Owns everything it references; cost
/// functions only ever hold a shared borrow of it. Created fresh for one balance invocation and
/// discarded afterwards - never shared across invocations (§3 invariant 5).
pub struct ClusterModel {
    region_names: Vec<Box<str>>,
    region_lookup: HashMap<Box<str>, RegionIndex>,
    server_names: Vec<Box<str>>,
    server_lookup: HashMap<Box<str>, ServerIndex>,
    host_names: Vec<Box<str>>,
    rack_names: Vec<Box<str>>,
    table_names: Vec<Box<str>>,

    region_table: Vec<TableIndex>,
    region_primary: Vec<RegionIndex>,
    region_to_server: Vec<ServerIndex>,
    initial_region_to_server: Vec<ServerIndex>,

    server_host: Vec<HostIndex>,
    server_rack: Vec<RackIndex>,

    regions_per_server: Vec<Vec<RegionIndex>>,
    regions_per_host: Vec<Vec<RegionIndex>>,
    regions_per_rack: Vec<Vec<RegionIndex>>,

    primaries_per_server: Vec<Vec<RegionIndex>>,
    primaries_per_host: Vec<Vec<RegionIndex>>,
    primaries_per_rack: Vec<Vec<RegionIndex>>,

    region_count_per_server_per_table: DynamicGrid<u32>,
    region_count_per_table: Vec<u32>,

    region_locations: Vec<Vec<(ServerIndex, f64)>>,

    region_load_history: Vec<LoadHistory>,

    sorted_servers_cache: RefCell<Option<Vec<ServerIndex>>>,
}

impl ClusterModel {
    pub fn new(
        assignment: &BTreeMap<String, Vec<RegionSpec>>,
        load_history: &HashMap<String, LoadHistory>,
        num_region_loads_to_remember: usize,
        oracle: Option<&dyn LocalityOracle>,
        rack_resolver: &dyn RackResolver,
    ) -> Result<Self, ModelError> {
        let num_servers = assignment.len();

        let mut server_names = Vec::with_capacity(num_servers);
        let mut server_lookup = HashMap::with_capacity(num_servers);
        let mut host_lookup: HashMap<Box<str>, HostIndex> = HashMap::new();
        let mut rack_lookup: HashMap<Box<str>, RackIndex> = HashMap::new();
        let mut host_names = Vec::new();
        let mut rack_names = Vec::new();
        let mut server_host = Vec::with_capacity(num_servers);
        let mut server_rack = Vec::with_capacity(num_servers);

        for server in assignment.keys() {
            let server_idx = ServerIndex::new(server_names.len());
            if server_lookup
                .insert(server.as_str().into(), server_idx)
                .is_some()
            {
                return Err(ModelError::DuplicateServer(server.clone()));
            }
            server_names.push(server.as_str().into());

            let host = host_of_server(server);
            let host_idx = *host_lookup.entry(host.into()).or_insert_with(|| {
                let idx = HostIndex::new(host_names.len());
                host_names.push(host.into());
                idx
            });
            server_host.push(host_idx);

            let rack = rack_resolver.rack_of(server);
            let rack_idx = *rack_lookup.entry(rack.as_str().into()).or_insert_with(|| {
                let idx = RackIndex::new(rack_names.len());
                rack_names.push(rack.as_str().into());
                idx
            });
            server_rack.push(rack_idx);
        }

        // pass 1: intern every region and table, recording each region's server and the name of
        // its primary for later resolution (the primary may live on a server visited later).
        let mut region_names = Vec::new();
        let mut region_lookup = HashMap::new();
        let mut table_lookup: HashMap<Box<str>, TableIndex> = HashMap::new();
        let mut table_names = Vec::new();
        let mut region_table = Vec::new();
        let mut region_to_server = Vec::new();
        let mut primary_names = Vec::new();

        for (server, regions) in assignment {
            let server_idx = server_lookup[server.as_str()];
            for region in regions {
                let region_idx = RegionIndex::new(region_names.len());
                if region_lookup
                    .insert(region.name.as_str().into(), region_idx)
                    .is_some()
                {
                    return Err(ModelError::DuplicateRegion(region.name.clone()));
                }
                region_names.push(region.name.as_str().into());

                let table_idx = *table_lookup
                    .entry(region.table.as_str().into())
                    .or_insert_with(|| {
                        let idx = TableIndex::new(table_names.len());
                        table_names.push(region.table.as_str().into());
                        idx
                    });
                region_table.push(table_idx);
                region_to_server.push(server_idx);
                primary_names.push(region.primary.clone());
            }
        }

        let num_regions = region_names.len();
        let num_hosts = host_names.len();
        let num_racks = rack_names.len();
        let num_tables = table_names.len();

        // pass 2: resolve primary names now that every region is interned. `primary_names[r]`
        // was pushed alongside `region_names[r]` in pass 1, so the two line up by index.
        let mut region_primary = Vec::with_capacity(num_regions);
        for (r, name) in primary_names.iter().enumerate() {
            let idx = region_lookup.get(name.as_str()).copied().ok_or_else(|| {
                ModelError::UnknownPrimary(region_names[r].to_string(), name.clone())
            })?;
            region_primary.push(idx);
        }

        let initial_region_to_server = region_to_server.clone();

        let mut regions_per_server = vec![Vec::new(); num_servers];
        let mut regions_per_host = vec![Vec::new(); num_hosts];
        let mut regions_per_rack = vec![Vec::new(); num_racks];
        let mut primaries_per_server = vec![Vec::new(); num_servers];
        let mut primaries_per_host = vec![Vec::new(); num_hosts];
        let mut primaries_per_rack = vec![Vec::new(); num_racks];
        let mut region_count_per_server_per_table =
            DynamicGrid::<u32>::new([num_servers.max(1), num_tables.max(1), 1]);
        let mut region_count_per_table = vec![0u32; num_tables];

        for r in 0..num_regions {
            let region = RegionIndex::new(r);
            let server = region_to_server[r];
            let host = server_host[server.as_usize()];
            let rack = server_rack[server.as_usize()];
            let table = region_table[r];
            let primary = region_primary[r];

            regions_per_server[server.as_usize()].push(region);
            regions_per_host[host.as_usize()].push(region);
            regions_per_rack[rack.as_usize()].push(region);
            primaries_per_server[server.as_usize()].push(primary);
            primaries_per_host[host.as_usize()].push(primary);
            primaries_per_rack[rack.as_usize()].push(primary);
            region_count_per_server_per_table[[server.as_usize(), table.as_usize()]] += 1;
            region_count_per_table[table.as_usize()] += 1;
        }

        // bulk sort once at construction rather than binary-inserting one at a time (§4.1.1).
        for v in regions_per_server
            .iter_mut()
            .chain(regions_per_host.iter_mut())
            .chain(regions_per_rack.iter_mut())
        {
            v.sort_unstable();
        }
        for v in primaries_per_server
            .iter_mut()
            .chain(primaries_per_host.iter_mut())
            .chain(primaries_per_rack.iter_mut())
        {
            v.sort_unstable();
        }

        let mut region_locations = vec![Vec::new(); num_regions];
        if let Some(oracle) = oracle {
            for r in 0..num_regions {
                let ranked = oracle.locality(&region_names[r]);
                let servers: Vec<(ServerIndex, f64)> = ranked
                    .into_iter()
                    .filter_map(|(name, frac)| {
                        server_lookup.get(name.as_str()).copied().map(|s| (s, frac))
                    })
                    .collect();
                region_locations[r] = servers;
            }
        }

        let mut region_load_history = Vec::with_capacity(num_regions);
        for name in &region_names {
            let history = load_history
                .get(name.as_ref())
                .cloned()
                .unwrap_or_else(|| LoadHistory::new(num_region_loads_to_remember.max(1)));
            region_load_history.push(history);
        }

        Ok(Self {
            region_names,
            region_lookup,
            server_names,
            server_lookup,
            host_names,
            rack_names,
            table_names,
            region_table,
            region_primary,
            region_to_server,
            initial_region_to_server,
            server_host,
            server_rack,
            regions_per_server,
            regions_per_host,
            regions_per_rack,
            primaries_per_server,
            primaries_per_host,
            primaries_per_rack,
            region_count_per_server_per_table,
            region_count_per_table,
            region_locations,
            region_load_history,
            sorted_servers_cache: RefCell::new(None),
        })
    }

    // -- basic counts --------------------------------------------------

    pub fn num_regions(&self) -> usize {
        self.region_names.len()
    }

    pub fn num_servers(&self) -> usize {
        self.server_names.len()
    }

    pub fn num_hosts(&self) -> usize {
        self.host_names.len()
    }

    pub fn num_racks(&self) -> usize {
        self.rack_names.len()
    }

    pub fn num_tables(&self) -> usize {
        self.table_names.len()
    }

    pub fn one_server_per_host(&self) -> bool {
        self.host_names.len() == self.server_names.len()
    }

    pub fn regions(&self) -> impl Iterator<Item = RegionIndex> {
        (0..self.num_regions()).map(RegionIndex::new)
    }

    pub fn servers(&self) -> impl Iterator<Item = ServerIndex> {
        (0..self.num_servers()).map(ServerIndex::new)
    }

    pub fn tables(&self) -> impl Iterator<Item = TableIndex> {
        (0..self.num_tables()).map(TableIndex::new)
    }

    pub fn hosts(&self) -> impl Iterator<Item = HostIndex> {
        (0..self.num_hosts()).map(HostIndex::new)
    }

    pub fn racks(&self) -> impl Iterator<Item = RackIndex> {
        (0..self.num_racks()).map(RackIndex::new)
    }

    /// True if any region has one or more secondary replicas - cheap enough to recompute on
    /// demand since it's only consulted by `is_needed` at the start of a balance invocation.
    pub fn has_replicas(&self) -> bool {
        self.regions().any(|r| !self.is_primary(r))
    }

    pub fn region_name(&self, r: RegionIndex) -> &str {
        &self.region_names[r.as_usize()]
    }

    pub fn server_name(&self, s: ServerIndex) -> &str {
        &self.server_names[s.as_usize()]
    }

    pub fn region_by_name(&self, name: &str) -> Option<RegionIndex> {
        self.region_lookup.get(name).copied()
    }

    pub fn server_by_name(&self, name: &str) -> Option<ServerIndex> {
        self.server_lookup.get(name).copied()
    }

    pub fn region_table(&self, r: RegionIndex) -> TableIndex {
        self.region_table[r.as_usize()]
    }

    pub fn region_primary(&self, r: RegionIndex) -> RegionIndex {
        self.region_primary[r.as_usize()]
    }

    pub fn is_primary(&self, r: RegionIndex) -> bool {
        self.region_primary(r) == r
    }

    pub fn server_host(&self, s: ServerIndex) -> HostIndex {
        self.server_host[s.as_usize()]
    }

    pub fn server_rack(&self, s: ServerIndex) -> RackIndex {
        self.server_rack[s.as_usize()]
    }

    pub fn current_server_of(&self, r: RegionIndex) -> ServerIndex {
        self.region_to_server[r.as_usize()]
    }

    pub fn initial_server_of(&self, r: RegionIndex) -> ServerIndex {
        self.initial_region_to_server[r.as_usize()]
    }

    pub fn regions_per_server(&self, s: ServerIndex) -> &[RegionIndex] {
        &self.regions_per_server[s.as_usize()]
    }

    pub fn regions_per_host(&self, h: HostIndex) -> &[RegionIndex] {
        &self.regions_per_host[h.as_usize()]
    }

    pub fn regions_per_rack(&self, k: RackIndex) -> &[RegionIndex] {
        &self.regions_per_rack[k.as_usize()]
    }

    pub fn primaries_per_server(&self, s: ServerIndex) -> &[RegionIndex] {
        &self.primaries_per_server[s.as_usize()]
    }

    pub fn primaries_per_host(&self, h: HostIndex) -> &[RegionIndex] {
        &self.primaries_per_host[h.as_usize()]
    }

    pub fn primaries_per_rack(&self, k: RackIndex) -> &[RegionIndex] {
        &self.primaries_per_rack[k.as_usize()]
    }

    pub fn num_regions_on_server(&self, s: ServerIndex) -> u32 {
        self.regions_per_server[s.as_usize()].len() as u32
    }

    pub fn num_regions_on_server_of_table(&self, s: ServerIndex, t: TableIndex) -> u32 {
        self.region_count_per_server_per_table[[s.as_usize(), t.as_usize()]]
    }

    pub fn num_regions_of_table(&self, t: TableIndex) -> u32 {
        self.region_count_per_table[t.as_usize()]
    }

    pub fn load_history(&self, r: RegionIndex) -> &LoadHistory {
        &self.region_load_history[r.as_usize()]
    }

    /// floor(numRegionsOfTable(t) / numServers)
    pub fn min_regions_if_evenly_distributed(&self, t: TableIndex) -> u32 {
        self.num_regions_of_table(t) / self.num_servers() as u32
    }

    /// ceil(numRegionsOfTable(t) / numServers)
    pub fn max_regions_if_evenly_distributed(&self, t: TableIndex) -> u32 {
        let r = self.num_regions_of_table(t);
        let s = self.num_servers() as u32;
        (r + s - 1) / s
    }

    /// numRegionsOfTable(t) mod numServers, or numServers if that is 0
    pub fn num_servers_with_max_regions_if_evenly_distributed(&self, t: TableIndex) -> u32 {
        let rem = self.num_regions_of_table(t) % self.num_servers() as u32;
        if rem == 0 {
            self.num_servers() as u32
        } else {
            rem
        }
    }

    /// Snapshotted from the oracle at construction (§4.1); the fraction returned here never
    /// changes across the lifetime of the model regardless of where `r` is currently assigned.
    pub fn locality_of_region(&self, r: RegionIndex, s: ServerIndex) -> f64 {
        self.region_locations[r.as_usize()]
            .iter()
            .find(|&&(ranked, _)| ranked == s)
            .map(|&(_, frac)| frac)
            .unwrap_or(0.0)
    }

    pub fn region_locations(&self, r: RegionIndex) -> impl Iterator<Item = ServerIndex> + '_ {
        self.region_locations[r.as_usize()].iter().map(|&(s, _)| s)
    }

    /// Scans `regionLocations[r]` in rank order, returns the first server (other than `excluding`)
    /// whose region count is below the cluster mean.
    pub fn least_loaded_server_with_locality_for(
        &self,
        r: RegionIndex,
        excluding: ServerIndex,
    ) -> Option<ServerIndex> {
        let mean = self.num_regions() as f64 / self.num_servers() as f64;
        self.region_locations[r.as_usize()]
            .iter()
            .map(|&(s, _)| s)
            .find(|&s| s != excluding && (self.num_regions_on_server(s) as f64) < mean)
    }

    /// argmin over s's regions of localityOfRegion(r, s)
    pub fn lowest_locality_region_on(&self, s: ServerIndex) -> Option<RegionIndex> {
        self.regions_per_server[s.as_usize()]
            .iter()
            .copied()
            .min_by(|&a, &b| {
                self.locality_of_region(a, s)
                    .partial_cmp(&self.locality_of_region(b, s))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    }

    /// Lazily-computed, invalidated by every `apply`.
    pub fn sorted_servers_by_region_count(&self) -> Vec<ServerIndex> {
        if let Some(cached) = self.sorted_servers_cache.borrow().as_ref() {
            return cached.clone();
        }

        let mut servers: Vec<ServerIndex> = self.servers().collect();
        servers.sort_by_key(|&s| self.num_regions_on_server(s));
        *self.sorted_servers_cache.borrow_mut() = Some(servers.clone());
        servers
    }

    /// Mutates every index for `action`. Preconditions (the region is on the claimed source
    /// server) are asserted, not recoverable - a generator is only ever supposed to emit actions
    /// derived from current model state (§4.1).
    pub fn apply(&mut self, action: Action) {
        match action {
            Action::Null => {}
            Action::Assign(r, to) => {
                let from = self.region_to_server[r.as_usize()];
                self.move_region(r, from, to);
            }
            Action::Move(r, from, to) => self.move_region(r, from, to),
            Action::Swap(ra, sa, rb, sb) => {
                self.move_region(ra, sa, sb);
                self.move_region(rb, sb, sa);
            }
        }
    }

    fn move_region(&mut self, r: RegionIndex, from: ServerIndex, to: ServerIndex) {
        assert_eq!(
            self.region_to_server[r.as_usize()],
            from,
            "precondition violated: region {:?} is not on server {:?}",
            self.region_name(r),
            self.server_name(from)
        );

        if from == to {
            return;
        }

        let table = self.region_table[r.as_usize()];
        let primary = self.region_primary[r.as_usize()];
        let from_host = self.server_host[from.as_usize()];
        let from_rack = self.server_rack[from.as_usize()];
        let to_host = self.server_host[to.as_usize()];
        let to_rack = self.server_rack[to.as_usize()];

        sorted_remove(&mut self.regions_per_server[from.as_usize()], r);
        sorted_remove(&mut self.primaries_per_server[from.as_usize()], primary);
        self.region_count_per_server_per_table[[from.as_usize(), table.as_usize()]] -= 1;

        sorted_insert(&mut self.regions_per_server[to.as_usize()], r);
        sorted_insert(&mut self.primaries_per_server[to.as_usize()], primary);
        self.region_count_per_server_per_table[[to.as_usize(), table.as_usize()]] += 1;

        if from_host != to_host {
            sorted_remove(&mut self.regions_per_host[from_host.as_usize()], r);
            sorted_remove(&mut self.primaries_per_host[from_host.as_usize()], primary);
            sorted_insert(&mut self.regions_per_host[to_host.as_usize()], r);
            sorted_insert(&mut self.primaries_per_host[to_host.as_usize()], primary);
        }

        if from_rack != to_rack {
            sorted_remove(&mut self.regions_per_rack[from_rack.as_usize()], r);
            sorted_remove(&mut self.primaries_per_rack[from_rack.as_usize()], primary);
            sorted_insert(&mut self.regions_per_rack[to_rack.as_usize()], r);
            sorted_insert(&mut self.primaries_per_rack[to_rack.as_usize()], primary);
        }

        self.region_to_server[r.as_usize()] = to;
        *self.sorted_servers_cache.borrow_mut() = None;
    }
}

fn host_of_server(server_id: &str) -> &str {
    let mut parts = server_id.rsplitn(3, ':');
    let _startcode = parts.next();
    let _port = parts.next();
    parts.next().unwrap_or(server_id)
}

/// O(log n) lookup, O(n) shift - appropriate for the small (tens to low thousands) per-server
/// arrays this indexes (§9); sortedness is a precondition of the replica-colocation trick.
fn sorted_insert(vec: &mut Vec<RegionIndex>, value: RegionIndex) {
    let idx = vec.binary_search(&value).unwrap_or_else(|e| e);
    vec.insert(idx, value);
}

fn sorted_remove(vec: &mut Vec<RegionIndex>, value: RegionIndex) {
    let idx = vec
        .binary_search(&value)
        .expect("value must be present to remove");
    vec.remove(idx);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locality::NoLocality;

    struct SingleRack;
    impl RackResolver for SingleRack {
        fn rack_of(&self, _server: &str) -> String {
            "rack0".to_owned()
        }
    }

    fn region(name: &str, table: &str) -> RegionSpec {
        RegionSpec {
            name: name.to_owned(),
            table: table.to_owned(),
            primary: name.to_owned(),
        }
    }

    fn two_server_model() -> ClusterModel {
        let mut assignment = BTreeMap::new();
        assignment.insert(
            "serverA:1000:1".to_owned(),
            vec![region("r1", "t1"), region("r2", "t1")],
        );
        assignment.insert("serverB:1000:1".to_owned(), vec![region("r3", "t1")]);

        ClusterModel::new(
            &assignment,
            &HashMap::new(),
            15,
            Some(&NoLocality),
            &SingleRack,
        )
        .unwrap()
    }

    #[test]
    fn construction_populates_sorted_indices() {
        let model = two_server_model();
        assert_eq!(model.num_regions(), 3);
        assert_eq!(model.num_servers(), 2);
        assert_eq!(model.num_regions_on_server(ServerIndex::new(0)), 2);
        assert_eq!(model.num_regions_on_server(ServerIndex::new(1)), 1);

        let regions = model.regions_per_server(ServerIndex::new(0));
        assert!(regions.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn apply_move_updates_both_servers() {
        let mut model = two_server_model();
        let r1 = model.region_by_name("r1").unwrap();
        model.apply(Action::Move(r1, ServerIndex::new(0), ServerIndex::new(1)));

        assert_eq!(model.current_server_of(r1), ServerIndex::new(1));
        assert_eq!(model.num_regions_on_server(ServerIndex::new(0)), 1);
        assert_eq!(model.num_regions_on_server(ServerIndex::new(1)), 2);
        assert!(model
            .regions_per_server(ServerIndex::new(1))
            .contains(&r1));
    }

    #[test]
    fn apply_then_inverse_restores_state() {
        let mut model = two_server_model();
        let r1 = model.region_by_name("r1").unwrap();
        let action = Action::Move(r1, ServerIndex::new(0), ServerIndex::new(1));

        let before = model.regions_per_server(ServerIndex::new(0)).to_vec();
        model.apply(action);
        model.apply(action.inverse());
        let after = model.regions_per_server(ServerIndex::new(0)).to_vec();

        assert_eq!(before, after);
        assert_eq!(model.current_server_of(r1), ServerIndex::new(0));
    }

    #[test]
    fn swap_exchanges_both_regions() {
        let mut model = two_server_model();
        let r1 = model.region_by_name("r1").unwrap();
        let r3 = model.region_by_name("r3").unwrap();

        model.apply(Action::Swap(
            r1,
            ServerIndex::new(0),
            r3,
            ServerIndex::new(1),
        ));

        assert_eq!(model.current_server_of(r1), ServerIndex::new(1));
        assert_eq!(model.current_server_of(r3), ServerIndex::new(0));
    }

    #[test]
    #[should_panic(expected = "precondition violated")]
    fn apply_with_wrong_source_server_panics() {
        let mut model = two_server_model();
        let r1 = model.region_by_name("r1").unwrap();
        model.apply(Action::Move(r1, ServerIndex::new(1), ServerIndex::new(0)));
    }

    #[test]
    fn table_distribution_helpers() {
        let model = two_server_model();
        let t1 = model.region_table(model.region_by_name("r1").unwrap());

        assert_eq!(model.num_regions_of_table(t1), 3);
        assert_eq!(model.min_regions_if_evenly_distributed(t1), 1);
        assert_eq!(model.max_regions_if_evenly_distributed(t1), 2);
        assert_eq!(model.num_servers_with_max_regions_if_evenly_distributed(t1), 1);
    }

    #[test]
    fn replica_colocation_detected_via_sorted_primaries() {
        let mut assignment = BTreeMap::new();
        assignment.insert(
            "serverA:1000:1".to_owned(),
            vec![
                RegionSpec {
                    name: "primary".to_owned(),
                    table: "t1".to_owned(),
                    primary: "primary".to_owned(),
                },
                RegionSpec {
                    name: "secondary".to_owned(),
                    table: "t1".to_owned(),
                    primary: "primary".to_owned(),
                },
            ],
        );

        let model = ClusterModel::new(
            &assignment,
            &HashMap::new(),
            15,
            Some(&NoLocality),
            &SingleRack,
        )
        .unwrap();

        let primaries = model.primaries_per_server(ServerIndex::new(0));
        assert_eq!(primaries.len(), 2);
        assert_eq!(primaries[0], primaries[1]);
    }

    #[test]
    fn host_derived_from_server_id() {
        assert_eq!(host_of_server("host1:60020:12345"), "host1");
        assert_eq!(host_of_server("justahost"), "justahost");
    }
}
