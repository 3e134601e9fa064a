//! CLI for Warden scoped resource handling.
//!
//! Every command runs inside a scoped block; a failed block is reported with
//! its primary failure and everything suppressed behind it.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use warden_core::Failure;
use warden_scope::sink::json_stream::JsonStreamSink;
use warden_scope::{FailureReport, Properties, Scenario};

#[derive(Parser, Debug)]
#[command(name = "warden", version, about = "Scoped multi-resource handling")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Print failure reports as JSON.
    #[arg(long, global = true, env = "WARDEN_JSON", default_value_t = false)]
    json: bool,

    /// Sink output: "ndjson" writes failure rows to stdout,
    /// "ndjson:/path/to/file" writes to file.
    #[arg(long, global = true)]
    sink: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the first line of a file.
    FirstLine { path: PathBuf },

    /// Copy the first line of one file into another.
    Transfer { from: PathBuf, to: PathBuf },

    /// Print a properties file, or one integer-valued key from it.
    Properties {
        path: PathBuf,

        #[arg(short, long)]
        key: Option<String>,
    },

    /// Replay scripted probe scenarios.
    Demo {
        /// Run a single scenario instead of all of them.
        #[arg(short, long)]
        scenario: Option<Scenario>,
    },
}

/// Where failure reports go.
struct Output {
    json: bool,
    sink: Option<String>,
}

impl Output {
    fn report(&self, scope: &str, failure: &Failure) -> Result<(), Box<dyn std::error::Error>> {
        let report = FailureReport::from_failure(failure);

        if let Some(ref sink_spec) = self.sink {
            let rows = report.to_rows(scope);
            if sink_spec == "ndjson" {
                let mut s = JsonStreamSink::stdout();
                s.write_rows(&rows)?;
                let n = s.finish()?;
                tracing::info!(rows = n, "ndjson sink: wrote to stdout");
            } else if let Some(path) = sink_spec.strip_prefix("ndjson:") {
                let file = std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)?;
                let mut s = JsonStreamSink::new(file);
                s.write_rows(&rows)?;
                let n = s.finish()?;
                tracing::info!(rows = n, path, "ndjson sink: wrote to file");
            } else {
                eprintln!("Unknown sink: {}. Use 'ndjson' or 'ndjson:/path'", sink_spec);
            }

            // Still print report to stderr so it's visible.
            eprint!("{}", report.render());
        } else if self.json {
            eprintln!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            eprint!("{}", report.render());
        }
        Ok(())
    }

    /// Reports a failed block, then hands the failure back so `main` exits
    /// non-zero.
    fn finish<T>(
        &self,
        scope: &str,
        result: Result<T, Failure>,
    ) -> Result<T, Box<dyn std::error::Error>> {
        match result {
            Ok(value) => Ok(value),
            Err(failure) => {
                self.report(scope, &failure)?;
                Err(failure.into())
            }
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let out = Output {
        json: cli.json,
        sink: cli.sink,
    };

    match cli.command {
        Commands::FirstLine { path } => {
            tracing::info!(path = %path.display(), "reading first line");
            match out.finish("first_line", warden_scope::first_line(&path))? {
                Some(line) => println!("{line}"),
                None => tracing::info!(path = %path.display(), "file is empty"),
            }
        }
        Commands::Transfer { from, to } => {
            out.finish("transfer_first_line", warden_scope::transfer_first_line(&from, &to))?;
            println!("{} -> {}", from.display(), to.display());
        }
        Commands::Properties { path, key } => {
            let props = out.finish("properties", Properties::load(&path))?;
            match key {
                Some(key) => println!("{}", props.get_int(&key)?),
                None if out.json => println!("{}", serde_json::to_string_pretty(&props)?),
                None => {
                    for (k, v) in props.iter() {
                        println!("{k}={v}");
                    }
                }
            }
        }
        Commands::Demo { scenario } => {
            let scenarios = match scenario {
                Some(sc) => vec![sc],
                None => Scenario::ALL.to_vec(),
            };

            for sc in scenarios {
                let outcome = sc.run();
                match &outcome.result {
                    Ok(value) => println!("{sc}: ok ({value})"),
                    Err(failure) => {
                        println!("{sc}: {failure}");
                        // Demo failures are expected; report them without
                        // aborting the run.
                        out.report(sc.as_str(), failure)?;
                    }
                }
                for (name, state) in &outcome.resources {
                    println!(
                        "    {name}: acquired={} used={} released={}x",
                        state.acquired, state.used, state.release_count
                    );
                }
            }
        }
    }

    Ok(())
}
