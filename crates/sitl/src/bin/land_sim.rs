//! Land detector simulation.
//!
//! Flies a scripted take-off, hover and landing through the land detector
//! and prints every published record followed by the accumulated flight time.
//!
//! Usage:
//!   cargo run -p land_detector_sitl --bin land_sim -- [OPTIONS]
//!
//! Options:
//!   --altitude <M>       Hover altitude (default: 5)
//!   --climb-rate <M/S>   Climb and descent speed (default: 1.5)
//!   --hover <S>          Hover time (default: 5)
//!   --sensor-rate <HZ>   Position estimate rate (default: 50)
//!   --alt-max <M>        LND_ALT_MAX, non-positive disables (default: -1)

use std::env;
use std::process;
use std::time::Duration;

use land_detector_core::detector::LandDetectorTask;
use land_detector_core::parameters::land_detector::ALT_MAX;
use land_detector_core::parameters::{LandDetectorParams, ParamValue, ParameterStore};
use land_detector_core::traits::TimeSource;
use land_detector_sitl::{
    FlightProfile, LandDetectorRunner, RunnerConfig, RunnerError, ScriptedPredicates, SensorBus,
    TokioTime, WatchSink,
};
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing_subscriber::EnvFilter;

struct Args {
    altitude: f32,
    climb_rate: f32,
    hover_s: f32,
    sensor_rate_hz: f32,
    alt_max: f32,
}

fn parse_args() -> Args {
    let mut args = Args {
        altitude: 5.0,
        climb_rate: 1.5,
        hover_s: 5.0,
        sensor_rate_hz: 50.0,
        alt_max: -1.0,
    };

    let raw: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < raw.len() {
        match raw[i].as_str() {
            "--altitude" => {
                i += 1;
                args.altitude = parse_f32_arg(&raw, i, "altitude");
            }
            "--climb-rate" => {
                i += 1;
                args.climb_rate = parse_f32_arg(&raw, i, "climb-rate");
            }
            "--hover" => {
                i += 1;
                args.hover_s = parse_f32_arg(&raw, i, "hover");
            }
            "--sensor-rate" => {
                i += 1;
                args.sensor_rate_hz = parse_f32_arg(&raw, i, "sensor-rate");
            }
            "--alt-max" => {
                i += 1;
                args.alt_max = parse_f32_arg(&raw, i, "alt-max");
            }
            "-h" | "--help" => {
                print_usage();
                process::exit(0);
            }
            other => {
                eprintln!("Unknown option: {other}");
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }

    let finite =
        args.altitude.is_finite() && args.climb_rate.is_finite() && args.hover_s.is_finite();
    if !finite || args.altitude <= 0.0 || args.climb_rate <= 0.0 || args.hover_s < 0.0 {
        eprintln!("Error: altitude and climb-rate must be positive, hover non-negative");
        process::exit(1);
    }
    if !args.sensor_rate_hz.is_finite() || args.sensor_rate_hz <= 0.0 {
        eprintln!("Error: sensor-rate must be positive");
        process::exit(1);
    }

    args
}

fn parse_f32_arg(raw: &[String], i: usize, name: &str) -> f32 {
    raw.get(i)
        .unwrap_or_else(|| {
            eprintln!("Error: --{name} requires a value");
            process::exit(1);
        })
        .parse()
        .unwrap_or_else(|_| {
            eprintln!("Error: invalid value for --{name}");
            process::exit(1);
        })
}

fn print_usage() {
    eprintln!(
        "Usage: land_sim [OPTIONS]\n\
         \n\
         Options:\n\
         \x20 --altitude <M>       Hover altitude (default: 5)\n\
         \x20 --climb-rate <M/S>   Climb and descent speed (default: 1.5)\n\
         \x20 --hover <S>          Hover time (default: 5)\n\
         \x20 --sensor-rate <HZ>   Position estimate rate (default: 50)\n\
         \x20 --alt-max <M>        LND_ALT_MAX, non-positive disables (default: -1)\n\
         \x20 -h, --help           Show this help"
    );
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = parse_args();
    if let Err(e) = run(args).await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), RunnerError> {
    let profile = FlightProfile {
        altitude: args.altitude,
        climb_rate: args.climb_rate,
        hover: Duration::from_secs_f32(args.hover_s),
        ..Default::default()
    };

    let mut store = ParameterStore::new();
    LandDetectorParams::register_defaults(&mut store)?;
    store.set(ALT_MAX, ParamValue::Float(args.alt_max))?;

    let (sink, mut records) = WatchSink::channel();
    let task = LandDetectorTask::new(ScriptedPredicates::default(), sink, store)?;
    let bus = SensorBus::new();
    let time = TokioTime::new();
    let handle = LandDetectorRunner::new(task, bus.clone(), RunnerConfig::default())
        .with_time(time)
        .start();

    println!("=== Land Detector Simulation ===");
    println!(
        "Profile: {:.1} m hover for {:.1} s, {:.1} s armed",
        profile.altitude,
        profile.hover.as_secs_f32(),
        profile.duration().as_secs_f32()
    );
    println!();

    let printer = tokio::spawn(async move {
        while records.changed().await.is_ok() {
            let record = *records.borrow_and_update();
            if let Some(r) = record {
                println!(
                    "[{:>8.3} s] landed={} maybe_landed={} ground_contact={} freefall={} ground_effect={} alt_max={}",
                    r.timestamp_us as f64 / 1e6,
                    r.landed as u8,
                    r.maybe_landed as u8,
                    r.ground_contact as u8,
                    r.freefall as u8,
                    r.in_ground_effect as u8,
                    r.alt_max
                );
            }
        }
    });

    let mut ticker = interval(Duration::from_secs_f32(1.0 / args.sensor_rate_hz));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let end = profile.duration() + Duration::from_secs(1);
    let start = Instant::now();
    loop {
        ticker.tick().await;
        let elapsed = start.elapsed();
        if elapsed > end {
            break;
        }

        let sample = profile.sample(elapsed, time.now_us());
        bus.publish_armed(sample.armed)?;
        bus.publish_acceleration(sample.acceleration)?;
        bus.publish_local_position(sample.local_position)?;
    }

    let task = handle.shutdown().await?;
    let total_s = task.detector().flight_time().total_us() as f64 / 1e6;
    let stats = *task.stats();
    drop(task);
    printer.await?;

    println!();
    println!(
        "Flight time: {:.2} s (profile {:.2} s)",
        total_s,
        profile.flight_time().as_secs_f64()
    );
    println!(
        "Cycles: {} (avg {} us, max {} us, jitter {} us)",
        stats.cycle_count, stats.avg_execution_us, stats.max_execution_us, stats.avg_jitter_us
    );

    Ok(())
}
