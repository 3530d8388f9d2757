use std::path::PathBuf;

use anyhow::{bail, Context};

use squid::env_config::{init_rayon_threads_lenient, init_tracing};
use squid::simulation::simulate_batch;
use squid::types::Format;
use squid::{solve, validate_config};

struct Args {
    num_games: usize,
    seed: u64,
    config: Option<PathBuf>,
}

fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    let mut num_games = 100_000usize;
    let mut seed = 42u64;
    let mut config: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--games" => {
                i += 1;
                if i < args.len() {
                    num_games = args[i].parse().unwrap_or_else(|_| {
                        eprintln!("Invalid --games value: {}", args[i]);
                        std::process::exit(1);
                    });
                }
            }
            "--seed" => {
                i += 1;
                if i < args.len() {
                    seed = args[i].parse().unwrap_or_else(|_| {
                        eprintln!("Invalid --seed value: {}", args[i]);
                        std::process::exit(1);
                    });
                }
            }
            "--help" | "-h" => {
                println!("Usage: squid-simulate [--games N] [--seed S] CONFIG.json");
                println!();
                println!("Plays a single-format configuration by sampling and compares");
                println!("the sample means with the exact solution.");
                println!();
                println!("Options:");
                println!("  --games N   Number of games to simulate (default: 100000)");
                println!("  --seed S    RNG seed (default: 42)");
                std::process::exit(0);
            }
            other if other.starts_with("--") => {
                eprintln!("Unknown argument: {}", other);
                eprintln!("Usage: squid-simulate [--games N] [--seed S] CONFIG.json");
                std::process::exit(1);
            }
            path => config = Some(PathBuf::from(path)),
        }
        i += 1;
    }

    Args {
        num_games,
        seed,
        config,
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = parse_args();
    let Some(path) = args.config else {
        bail!("missing CONFIG.json argument (see --help)");
    };

    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let body: serde_json::Value = serde_json::from_str(&raw).context("config is not JSON")?;
    let cfg = validate_config(&body)?;
    if cfg.format != Format::Single {
        bail!("only the single format can be simulated");
    }

    let num_threads = init_rayon_threads_lenient();
    println!(
        "Squid simulation ({} games, seed {}, {} threads)",
        args.num_games, args.seed, num_threads
    );

    let exact = solve(&cfg)?;
    let sim = simulate_batch(&cfg, args.num_games, args.seed);

    let z = |observed: f64, expected: f64, se: f64| {
        if se > 0.0 {
            (observed - expected) / se
        } else {
            0.0
        }
    };
    let loss_se = (exact.p_lose * (1.0 - exact.p_lose) / args.num_games.max(1) as f64).sqrt();

    println!();
    println!("  {:<10} {:>12} {:>12} {:>8}", "", "exact", "simulated", "z");
    println!(
        "  {:<10} {:>12.5} {:>12.5} {:>8.2}",
        "EV",
        exact.ev,
        sim.mean_payoff,
        z(sim.mean_payoff, exact.ev, sim.payoff_std_error)
    );
    println!(
        "  {:<10} {:>12.5} {:>12.5} {:>8.2}",
        "P(lose)",
        exact.p_lose,
        sim.loss_rate,
        z(sim.loss_rate, exact.p_lose, loss_se)
    );
    println!(
        "  {:<10} {:>12.5} {:>12.5} {:>8.2}",
        "hands",
        exact.expected_hands,
        sim.mean_hands,
        z(sim.mean_hands, exact.expected_hands, sim.hands_std_error)
    );
    println!(
        "  {:<10} {:>12.2} {:>12.2}",
        "min", exact.mn, sim.min_payoff
    );
    println!(
        "  {:<10} {:>12.2} {:>12.2}",
        "max", exact.mx, sim.max_payoff
    );
    println!();
    println!(
        "  {:.2}s ({:.0} games/s)",
        sim.elapsed.as_secs_f64(),
        args.num_games as f64 / sim.elapsed.as_secs_f64().max(1e-9)
    );
    Ok(())
}
