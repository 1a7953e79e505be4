use clap::Parser;
use rand::{SeedableRng, rngs::StdRng};
use serde::Serialize;
use std::{
    hint::black_box,
    process::ExitCode,
    sync::{Arc, atomic::AtomicUsize},
    thread,
};
use thiserror::Error;
use tqdm::tqdm;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tripreach::{
    numerics::{FixedWidthVector, U8x16, U16x16, lanes::BACKEND_NAME},
    schedule::{FlatSchedule, Schedule, SyntheticScheduleError, SyntheticScheduleParams, generate_schedule},
    statistics::Stats,
    workload::{ProfileScan, ProfileScanError, ProfileScanParams},
};

/// Benchmark of the reached index under synthetic profile scans
#[derive(Parser, Debug)]
#[command(name = "tripreach")]
#[command(about = "Benchmarks the SIMD reached index on synthetic schedules", long_about = None)]
struct Args {
    /// Number of routes in the synthetic schedule
    #[arg(long, default_value_t = 1_000)]
    routes: usize,

    /// Mean number of trips per route beyond the first
    #[arg(long, default_value_t = 20.0)]
    mean_extra_trips: f64,

    /// Smallest number of stops of a route
    #[arg(long, default_value_t = 5)]
    min_stops: usize,

    /// Largest number of stops of a route
    #[arg(long, default_value_t = 60)]
    max_stops: usize,

    /// Number of profile queries per job
    #[arg(short, long, default_value_t = 100_000)]
    queries: usize,

    /// Trips boarded in the first round of every query
    #[arg(long, default_value_t = 8)]
    seeds: usize,

    /// Follow-up trips spawned by every label update
    #[arg(long, default_value_t = 3)]
    fanout: usize,

    /// Seed for the schedule and the queries
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Number of threads to use (comma-separated list, e.g., "1,2,4,8")
    #[arg(short, long, value_delimiter = ',', default_value = "1")]
    threads: Vec<usize>,

    /// Round limits to sweep (comma-separated list, e.g., "2,4,8")
    #[arg(short, long, value_delimiter = ',', default_value = "6")]
    round_limits: Vec<u8>,

    /// Use 16-bit labels, needed for routes with more than 255 stops
    #[arg(long)]
    wide: bool,

    /// Print the reports as JSON on stdout
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Error)]
enum BenchError {
    #[error("could not generate schedule: {0}")]
    Schedule(#[from] SyntheticScheduleError),

    #[error(transparent)]
    Scan(#[from] ProfileScanError),

    #[error("a worker thread panicked")]
    WorkerPanicked,

    #[error("could not serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Serialize)]
struct JobReport {
    threads: usize,
    round_limit: u8,
    queries: usize,
    seconds: f64,
    qps: f64,
    checksum: u64,
    stats: Stats,
}

fn run_scan_job<V: FixedWidthVector + 'static>(
    schedule: Arc<FlatSchedule>,
    params: ProfileScanParams,
    num_threads: usize,
    num_queries: usize,
    seed: u64,
) -> Result<JobReport, BenchError> {
    info!(
        threads = num_threads,
        round_limit = params.round_limit,
        "running job"
    );

    let start_time = std::time::Instant::now();

    let batch_size = 1024;
    let next_batch = Arc::new(AtomicUsize::new(0));
    let handles: Vec<_> = (0..num_threads)
        .map(|_thread_id| {
            let schedule = Arc::clone(&schedule);
            let next_batch = Arc::clone(&next_batch);

            thread::spawn(move || -> Result<(u64, Stats), ProfileScanError> {
                let mut scan = ProfileScan::<_, V>::new(&*schedule, params)?;
                let mut local_checksum = 0u64;
                let mut local_stats = Stats::new();

                loop {
                    // Atomically grab the next batch of work
                    let batch_start =
                        next_batch.fetch_add(batch_size, std::sync::atomic::Ordering::Relaxed);

                    if batch_start >= num_queries {
                        break;
                    }

                    let batch_end = std::cmp::min(batch_start + batch_size, num_queries);

                    for query in batch_start..batch_end {
                        // seeded per query so results do not depend on the thread count
                        let mut rng = StdRng::seed_from_u64(seed.wrapping_add(query as u64));
                        let checksum = black_box(scan.run_query(&mut rng, &mut local_stats));
                        local_checksum = local_checksum.wrapping_add(checksum);
                    }
                }

                Ok((local_checksum, local_stats))
            })
        })
        .collect();

    let mut checksum = 0u64;
    let mut combined_stats = Stats::new();
    for handle in handles {
        let (local_checksum, local_stats) =
            handle.join().map_err(|_| BenchError::WorkerPanicked)??;
        checksum = checksum.wrapping_add(local_checksum);
        combined_stats = combined_stats.merge(&local_stats);
    }

    let seconds = start_time.elapsed().as_secs_f64();
    Ok(JobReport {
        threads: num_threads,
        round_limit: params.round_limit,
        queries: num_queries,
        seconds,
        qps: num_queries as f64 / seconds,
        checksum,
        stats: combined_stats,
    })
}

fn print_report(report: &JobReport) {
    let queries = report.queries.max(1) as f64;
    println!("\n==========");
    println!(
        "threads={}, round_limit={}",
        report.threads, report.round_limit
    );
    println!("==========");
    println!(
        "Avg per query: {:.2} reach checks, {:.2} updates ({:.2}% pruned)",
        report.stats.get_reach_checks() as f64 / queries,
        report.stats.get_updates() as f64 / queries,
        report.stats.pruning_ratio() * 100.0,
    );
    println!("Checksum: {}", report.checksum);
    println!(
        "Completed {} queries in {:.2}s ({:.2} QPS)",
        report.queries, report.seconds, report.qps
    );
}

fn run(args: Args) -> Result<(), BenchError> {
    let schedule_params = SyntheticScheduleParams {
        routes: args.routes,
        mean_extra_trips: args.mean_extra_trips,
        min_stops: args.min_stops,
        max_stops: args.max_stops,
    };
    let schedule = generate_schedule(&schedule_params, &mut StdRng::seed_from_u64(args.seed))?;
    info!(
        routes = schedule.number_of_routes(),
        trips = schedule.number_of_trips(),
        max_stops = schedule.max_stops(),
        backend = BACKEND_NAME,
        "schedule ready"
    );
    if !args.wide && schedule.max_stops() > usize::from(u8::MAX) {
        warn!("routes have more than 255 stops, rerun with --wide");
    }
    let schedule = Arc::new(schedule);

    let jobs: Vec<(usize, u8)> = args
        .threads
        .iter()
        .flat_map(|&threads| args.round_limits.iter().map(move |&round_limit| (threads, round_limit)))
        .collect();
    info!(total_jobs = jobs.len(), "starting sweep");

    let mut reports = Vec::with_capacity(jobs.len());
    for (num_threads, round_limit) in tqdm(jobs.into_iter()) {
        let params = ProfileScanParams {
            seeds: args.seeds,
            fanout: args.fanout,
            round_limit,
        };
        let job = if args.wide {
            run_scan_job::<U16x16>
        } else {
            run_scan_job::<U8x16>
        };
        let report = job(
            Arc::clone(&schedule),
            params,
            num_threads,
            args.queries,
            args.seed,
        )?;
        if !args.json {
            print_report(&report);
        }
        reports.push(report);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        println!("\n==========");
        println!("All jobs completed!");
        println!("==========");
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
