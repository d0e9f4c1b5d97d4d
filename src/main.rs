// A small imperative toy-language toolchain -- CLI front end.
//
// This binary is the thin host around the library: it reads a source
// file, picks a back end, times the run, and reports the result. All
// of the actual language semantics live in the library crate.
//
// Usage: wisplang <file> [--interpret|--bytecode] [--debug]

use std::process::ExitCode;
use std::time::Instant;

use wisplang::{compile_and_run, interpret};

enum Mode {
    Interpret,
    Bytecode,
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let mut path = None;
    let mut mode = Mode::Interpret;
    let mut debug = false;

    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "--interpret" => mode = Mode::Interpret,
            "--bytecode" => mode = Mode::Bytecode,
            "--debug" => debug = true,
            other if path.is_none() => path = Some(other.to_string()),
            other => {
                eprintln!("error: unexpected argument '{other}'");
                print_usage(&args[0]);
                return ExitCode::FAILURE;
            }
        }
    }

    let Some(path) = path else {
        print_usage(&args[0]);
        return ExitCode::FAILURE;
    };

    init_tracing(debug);

    let source = match std::fs::read_to_string(&path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("error: could not read '{path}': {e}");
            return ExitCode::FAILURE;
        }
    };

    let started = Instant::now();
    let result = match mode {
        Mode::Interpret => interpret(&source),
        Mode::Bytecode => compile_and_run(&source),
    };
    let elapsed = started.elapsed();

    match result {
        Ok(()) => {
            tracing::info!(?elapsed, "run completed");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Installs a `tracing` subscriber filtered by `RUST_LOG`, defaulting to
/// `info` or, with `--debug`, to `trace` so every lexer/compiler/VM
/// event shows up. Only the binary does this -- the library never
/// installs a subscriber of its own, so embedding it elsewhere never
/// hijacks the host's logging.
fn init_tracing(debug: bool) {
    use tracing_subscriber::EnvFilter;

    let default_level = if debug { "trace" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();
}

fn print_usage(program: &str) {
    eprintln!("usage: {program} <file> [--interpret|--bytecode] [--debug]");
}
