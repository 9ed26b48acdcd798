//! Synthetic workload driver for the property index layer.
//!
//! Builds a vertex registry over seeded random data, runs point lookups,
//! removes a share of the vertices and prints timings together with the
//! CompactSet tier histogram of the indexed values.
#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;
use sombra_compact::{
    index::scan::lookup_or_scan, logging::init_logging, metrics::CounterMetrics,
    options::RegistryOptions, IndexError, IndexRegistry, PropValue, Tier, Vertex,
};

#[derive(Parser, Debug)]
#[command(
    name = "index-bench",
    version,
    about = "Benchmark property index build, lookup and removal"
)]
struct Cli {
    #[arg(long, value_name = "FILE", help = "TOML file with workload settings")]
    config: Option<PathBuf>,

    #[arg(long, help = "Number of vertices to generate")]
    vertices: Option<usize>,

    #[arg(long, help = "Number of distinct values of the indexed property")]
    distinct: Option<u64>,

    #[arg(long, help = "Number of random point lookups")]
    lookups: Option<usize>,

    #[arg(long, help = "Fraction of vertices removed after the lookups")]
    remove_fraction: Option<f64>,

    #[arg(long, help = "RNG seed")]
    seed: Option<u64>,

    #[arg(
        long,
        env = "SOMBRA_LOG",
        default_value = "warn",
        help = "Log filter directive"
    )]
    log: String,
}

/// Workload settings; command-line flags override the file.
#[derive(Debug, Deserialize)]
#[serde(default)]
struct BenchConfig {
    vertices: usize,
    distinct: u64,
    lookups: usize,
    remove_fraction: f64,
    seed: u64,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            vertices: 100_000,
            distinct: 5_000,
            lookups: 50_000,
            remove_fraction: 0.5,
            seed: 0xC0FFEE,
        }
    }
}

impl BenchConfig {
    fn load(cli: &Cli) -> Result<Self, IndexError> {
        let mut config = match &cli.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)?;
                toml::from_str(&text).map_err(|e| IndexError::Config(e.to_string()))?
            }
            None => BenchConfig::default(),
        };
        if let Some(vertices) = cli.vertices {
            config.vertices = vertices;
        }
        if let Some(distinct) = cli.distinct {
            config.distinct = distinct;
        }
        if let Some(lookups) = cli.lookups {
            config.lookups = lookups;
        }
        if let Some(fraction) = cli.remove_fraction {
            config.remove_fraction = fraction;
        }
        if let Some(seed) = cli.seed {
            config.seed = seed;
        }
        if config.distinct == 0 {
            return Err(IndexError::Invalid("distinct must be positive"));
        }
        if !(0.0..=1.0).contains(&config.remove_fraction) {
            return Err(IndexError::Invalid("remove_fraction must be in [0, 1]"));
        }
        Ok(config)
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(&cli.log)?;
    let config = BenchConfig::load(&cli)?;

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let vertices: Vec<Vertex> = (0..config.vertices as u64)
        .map(|id| {
            Vertex::new(id, "item")
                .with_property("bucket", rng.gen_range(0..config.distinct) as i64)
                .with_property("name", format!("item-{id}"))
        })
        .collect();

    let metrics = Arc::new(CounterMetrics::default());
    let registry =
        IndexRegistry::<Vertex>::with_options(RegistryOptions::default().metrics(metrics.clone()));

    let (build, built) = timed(|| {
        let mut writer = registry.write();
        writer.create_index("bucket", &vertices)
    });
    built?;
    report("build", config.vertices, build);
    print_histogram(&registry);

    let (lookup, hits) = timed(|| {
        let mut hits = 0usize;
        for _ in 0..config.lookups {
            let value = PropValue::Int(rng.gen_range(0..config.distinct) as i64);
            hits += registry.get("bucket", &value).map_or(0, |found| found.len());
        }
        hits
    });
    report("lookup", config.lookups, lookup);
    println!("  matched {hits} vertices");

    let (scan, scanned) = timed(|| {
        lookup_or_scan(&registry, &vertices, "name", &PropValue::from("item-1")).len()
    });
    report("scan", config.vertices, scan);
    println!("  matched {scanned} vertices");

    let removals = (config.vertices as f64 * config.remove_fraction) as usize;
    let (remove, removed) = timed(|| {
        let writer = registry.write();
        vertices[..removals].iter().try_for_each(|v| writer.remove(v))
    });
    removed?;
    report("remove", removals, remove);
    print_histogram(&registry);

    let snapshot = metrics.snapshot();
    println!(
        "\nindex hits {} / misses {} / scans {} ({} elements)",
        snapshot.index_hits, snapshot.index_misses, snapshot.scans, snapshot.scanned_elements
    );
    Ok(())
}

fn timed<R>(f: impl FnOnce() -> R) -> (Duration, R) {
    let start = Instant::now();
    let result = f();
    (start.elapsed(), result)
}

fn report(name: &str, ops: usize, elapsed: Duration) {
    let per_op = if ops == 0 {
        0.0
    } else {
        elapsed.as_nanos() as f64 / ops as f64
    };
    println!(
        "{:<10} {:>10} ops {:>12.2?} {:>10.1} ns/op",
        name, ops, elapsed, per_op
    );
}

fn print_histogram(registry: &IndexRegistry<Vertex>) {
    let Some(index) = registry.index("bucket") else {
        return;
    };
    let mut histogram: BTreeMap<usize, (Tier, usize)> = BTreeMap::new();
    for set in index.sets() {
        let tier = set.tier();
        let rank = tier.capacity().unwrap_or(usize::MAX);
        histogram.entry(rank).or_insert((tier, 0)).1 += 1;
    }
    println!("  tier histogram ({} values):", index.distinct_values());
    for (tier, count) in histogram.values() {
        println!("    {:<12} {:>8}", tier.to_string(), count);
    }
}
