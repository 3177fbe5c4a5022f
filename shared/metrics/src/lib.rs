use std::error::Error;
use std::net::SocketAddr;
use std::sync::mpsc::sync_channel;
use std::thread::JoinHandle;

pub use prometheus_exporter::prometheus;

/// Declares a single plain gauge, e.g. `balancer_cost_before`.
#[macro_export]
macro_rules! declare_gauge {
    ($name:ident, $metric:expr, $help:expr) => {
        lazy_static! {
            static ref $name: $crate::prometheus::Gauge =
                $crate::prometheus::register_gauge!($metric, $help)
                    .expect("metric registration failed");
        }
    };
}

/// Declares a gauge labelled by cost function name, e.g. `balancer_cost_contribution{function="Locality"}`.
#[macro_export]
macro_rules! declare_cost_gauge {
    ($name:ident, $metric:expr, $help:expr) => {
        lazy_static! {
            static ref $name: $crate::prometheus::GaugeVec =
                $crate::prometheus::register_gauge_vec!($metric, $help, &["function"])
                    .expect("metric registration failed");
        }
    };
}

#[macro_export]
macro_rules! set_gauge {
    ($name:ident, $value:expr) => {
        $name.set($value as f64);
    };
}

#[macro_export]
macro_rules! set_cost_gauge {
    ($name:ident, $function:expr, $value:expr) => {
        $name.with_label_values(&[$function]).set($value as f64);
    };
}

pub struct MetricsServer {
    pub port: u16,
    pub thread: JoinHandle<()>,
}

pub fn start_serving() -> Result<MetricsServer, Box<dyn Error>> {
    let ip = "127.0.0.1".parse()?;
    const PORT: u16 = 9898;

    let (result_tx, result_rx) = sync_channel(1);
    let thread = std::thread::spawn(move || {
        let addr = SocketAddr::new(ip, PORT);
        let res = prometheus_exporter::start(addr);
        result_tx
            .send(res)
            .expect("failed to send result from thread")
    });

    match result_rx.recv()? {
        Ok(_) => Ok(MetricsServer { thread, port: PORT }),
        Err(err) => Err(err.into()),
    }
}
