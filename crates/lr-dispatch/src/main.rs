#![forbid(unsafe_code)]

use lr_dispatch::serve;
use lr_prims::{Prng, Registry};
use std::io;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    // Responses own stdout; everything diagnostic goes to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), String> {
    let mut prng = match seed_from_args_or_env()? {
        Some(seed) => Prng::from_seed(seed),
        None => Prng::from_entropy(),
    };

    let stdin = io::stdin();
    let stdout = io::stdout();
    serve(Registry::global(), stdin.lock(), stdout.lock(), &mut prng)
        .map_err(|err| err.to_string())
}

fn seed_from_args_or_env() -> Result<Option<u64>, String> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--seed" => {
                let raw = args.next().ok_or_else(usage)?;
                return parse_seed(&raw).map(Some);
            }
            _ => return Err(usage()),
        }
    }

    match std::env::var("LR_SEED") {
        Ok(raw) => parse_seed(&raw).map(Some),
        Err(_) => Ok(None),
    }
}

fn parse_seed(raw: &str) -> Result<u64, String> {
    raw.parse()
        .map_err(|_| format!("seed must be a u64, got `{raw}`"))
}

fn usage() -> String {
    "usage: lr-dispatch [--seed <u64>]".to_owned()
}
