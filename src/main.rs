use std::env;

use anyhow::{Context, Result, bail};
use iniconf::{Config, LookupErrorKind, Section, Value};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const USAGE: &str = "usage: iniconf <path> [section [key]]";

fn main() -> Result<()> {
    init_tracing()?;

    let mut args = env::args().skip(1);
    let Some(path) = args.next() else {
        bail!(USAGE);
    };
    let section = args.next();
    let key = args.next();
    if args.next().is_some() {
        bail!(USAGE);
    }

    let config = Config::from_path(&path).with_context(|| format!("failed to load {path}"))?;

    match (section, key) {
        (None, _) => {
            let mut sections = config.sections().collect::<Vec<_>>();
            sections.sort_unstable_by_key(|&section| section.name());

            for section in sections {
                println!("[{}]", section.name());
                print_entries(section);
                println!();
            }
        }
        (Some(section), None) => {
            let entries = config
                .section(&section)
                .with_context(|| format!("section '{section}' does not exist"))?;
            print_entries(entries);
        }
        (Some(section), Some(key)) => match config.string(&section, &key) {
            Ok(value) => println!("{value}"),
            Err(err) if matches!(err.kind(), LookupErrorKind::WrongShape { .. }) => {
                for value in config.array_string(&section, &key)? {
                    println!("{value}");
                }
            }
            Err(err) => return Err(err.into()),
        },
    }

    Ok(())
}

fn print_entries(section: &Section) {
    let mut entries = section.iter().collect::<Vec<_>>();
    entries.sort_unstable_by_key(|&(key, _)| key);

    for (key, value) in entries {
        match value {
            Value::Scalar(value) => println!("{key} = {value}"),
            Value::Sequence(values) => {
                for value in values {
                    println!("{key}[] = {value}");
                }
            }
        }
    }
}

/// Diagnostics go to stderr, filtered by `RUST_LOG` and defaulting to warnings.
fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init()
        .context("failed to initialize tracing subscriber")?;

    Ok(())
}
