use std::io::Read;

use anyhow::Context;

use squid::env_config::init_tracing;
use squid::{solve, validate_config};

fn parse_args() -> (Option<String>, bool) {
    let args: Vec<String> = std::env::args().collect();
    let mut path: Option<String> = None;
    let mut pretty = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--pretty" => pretty = true,
            "--help" | "-h" => {
                println!("Usage: squid-solve [--pretty] [CONFIG.json]");
                println!();
                println!("Reads a game configuration (file, or stdin when omitted or '-')");
                println!("and prints the solve result as JSON.");
                std::process::exit(0);
            }
            other if other.starts_with("--") => {
                eprintln!("Unknown argument: {}", other);
                eprintln!("Usage: squid-solve [--pretty] [CONFIG.json]");
                std::process::exit(1);
            }
            other => path = Some(other.to_string()),
        }
        i += 1;
    }
    (path, pretty)
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let (path, pretty) = parse_args();

    let raw = match path.as_deref() {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            buf
        }
        Some(p) => std::fs::read_to_string(p).with_context(|| format!("failed to read {p}"))?,
    };

    let body: serde_json::Value = serde_json::from_str(&raw).context("config is not JSON")?;
    let cfg = validate_config(&body)?;
    tracing::debug!(format = cfg.format.as_str(), n = cfg.n, "solving");
    let result = solve(&cfg)?;

    let out = if pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    println!("{out}");
    Ok(())
}
