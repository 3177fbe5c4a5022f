use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::PathBuf;

use cluster_model::{LocalityOracle, RackResolver, RegionSpec};
use common::*;
use unit::LoadSample;

/// Runs a single balance invocation against a cluster snapshot read from disk.
#[derive(argh::FromArgs)]
struct Args {
    /// path to the cluster snapshot to balance
    #[argh(positional)]
    snapshot: PathBuf,

    /// path to the balancer config (weights and search parameters)
    #[argh(option, default = "PathBuf::from(\"balancer.ron\")")]
    config: PathBuf,

    /// seed for the search RNG, for reproducible runs
    #[argh(option)]
    seed: Option<u64>,

    /// serve prometheus metrics on 127.0.0.1:9898 for the duration of the run
    #[cfg(feature = "metrics")]
    #[argh(switch)]
    metrics: bool,
}

/// On-disk input: an assignment plus whatever side data the caller has to hand. A real deployment
/// would source these from the storage master and a locality service instead of a flat file.
#[derive(Debug, serde::Deserialize)]
struct Snapshot {
    assignment: BTreeMap<String, Vec<RegionSpec>>,
    #[serde(default)]
    load_history: HashMap<String, Vec<LoadSample>>,
    #[serde(default)]
    racks: HashMap<String, String>,
    #[serde(default)]
    locality: HashMap<String, Vec<(String, f64)>>,
}

struct MapRackResolver(HashMap<String, String>);

impl RackResolver for MapRackResolver {
    fn rack_of(&self, server: &str) -> String {
        self.0.get(server).cloned().unwrap_or_else(|| "default".to_owned())
    }
}

struct MapLocalityOracle(HashMap<String, Vec<(String, f64)>>);

impl LocalityOracle for MapLocalityOracle {
    fn locality(&self, region: &str) -> Vec<(String, f64)> {
        self.0.get(region).cloned().unwrap_or_default()
    }
}

// TODO actually log the time
fn log_time(out: &mut dyn Write) -> std::io::Result<()> {
    write!(out, "the time")
}

fn main() {
    let args: Args = argh::from_env();

    let _logging = logging::LoggerBuilder::with_env()
        .and_then(|builder| builder.init(log_time))
        .expect("logging failed");
    my_info!("initialized logging"; "level" => ?_logging.level());

    if let Err(e) = run(&args) {
        my_error!("balance run failed"; "error" => %e);
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> BoxedResult<()> {
    config::init(&args.config)?;

    #[cfg(feature = "metrics")]
    let _metrics_server = if args.metrics {
        let server = metrics::start_serving()?;
        my_info!("serving metrics"; "port" => server.port);
        Some(server)
    } else {
        None
    };

    let bytes = std::fs::read_to_string(&args.snapshot)?;
    let snapshot: Snapshot = ron::de::from_str(&bytes)?;

    let rack_resolver = MapRackResolver(snapshot.racks);
    let oracle = MapLocalityOracle(snapshot.locality);

    let mut balancer = balancer_search::Balancer::with_seed(Some(&oracle), &rack_resolver, args.seed);

    for samples in transpose_load_history(&snapshot.load_history) {
        balancer.refresh_cluster_status(&samples);
    }

    let outcome = balancer.balance(&snapshot.assignment);

    print_report(&outcome.report);
    match outcome.plan {
        Some(plan) if !plan.is_empty() => print_plan(&snapshot.assignment, &plan),
        _ => println!("no moves needed"),
    }

    Ok(())
}

/// Turns `region -> [oldest .. newest]` into a chronological sequence of `region -> sample`
/// snapshots, one per timestep, so each can be fed through [`Balancer::refresh_cluster_status`]
/// in order and build up the same rolling history a long-running process would accumulate.
fn transpose_load_history(history: &HashMap<String, Vec<LoadSample>>) -> Vec<HashMap<String, LoadSample>> {
    let max_len = history.values().map(Vec::len).max().unwrap_or(0);
    (0..max_len)
        .map(|i| {
            history
                .iter()
                .filter_map(|(region, samples)| samples.get(i).map(|s| (region.clone(), *s)))
                .collect()
        })
        .collect()
}

fn print_report(report: &balancer_search::BalanceReport) {
    println!(
        "cost {:.4} -> {:.4} ({} of {} steps, {:?}, balanced={})",
        report.cost_before, report.cost_after, report.steps_run, report.steps_budgeted, report.elapsed, report.needed_balance
    );
    for (name, value) in &report.per_function {
        println!("  {:<24} {:.4}", name, value);
    }
}

fn print_plan(assignment: &BTreeMap<String, Vec<RegionSpec>>, plan: &[balancer_search::Move]) {
    let servers: Vec<&str> = assignment.keys().map(String::as_str).collect();
    let regions: Vec<&str> = assignment.values().flatten().map(|r| r.name.as_str()).collect();

    for mv in plan {
        let region = regions.get(mv.region.as_usize()).copied().unwrap_or("?");
        let from = servers.get(mv.from.as_usize()).copied().unwrap_or("?");
        let to = servers.get(mv.to.as_usize()).copied().unwrap_or("?");
        println!("move {} from {} to {}", region, from, to);
    }
}
