//! Search executable.

use std::io::{self, Write};
use std::process;
use std::time::Instant;

use clap::error::ErrorKind;
use clap::Parser;
use log::{info, warn};

use antiband::options::{CliOptions, SearchOptions, TraceLevel};
use antiband::{width, Graph, GraphError};

fn main() {
    let options = match CliOptions::try_parse() {
        Ok(options) => options,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = err.print();
            return;
        }
        Err(err) => {
            let _ = err.print();
            process::exit(1);
        }
    };
    if let Err(error) = initialize_logging(options.trace) {
        let _ = writeln!(io::stderr(), "Error: {}", error);
    }
    if let Err(error) = search_main(&options) {
        let _ = writeln!(io::stderr(), "Error: {}", error);
        process::exit(1);
    }
}

/// Initialize the logging framework with the given trace level.
///
/// # Errors
///
/// Returns an error if the logging framework has already been initialized.
fn initialize_logging(level: TraceLevel) -> io::Result<()> {
    env_logger::builder()
        .filter(None, level.into())
        .format_timestamp_millis()
        .try_init()
        .map_err(|e| io::Error::new(io::ErrorKind::AlreadyExists, e))
}

/// Loads the instance, dispatches to the requested mode and prints the
/// result.
///
/// # Errors
///
/// Returns an error on malformed instances or failing output writes; an
/// unreadable instance file only logs a warning and continues on the empty
/// graph.
fn search_main(options: &CliOptions) -> Result<(), Box<dyn std::error::Error>> {
    let graph = match Graph::load(&options.graph) {
        Ok(graph) => graph,
        Err(GraphError::Io(err)) => {
            warn!(
                "could not open {}, continuing with an empty graph: {}",
                options.graph.display(),
                err
            );
            let name = options
                .graph
                .file_name()
                .map_or_else(String::new, |f| f.to_string_lossy().into_owned());
            Graph::empty(name)
        }
        Err(err) => return Err(err.into()),
    };
    info!("loaded {}", graph);

    let mut search_options = SearchOptions::from(options);
    search_options.graph_file = Some(options.graph.clone());

    if let Some(w) = options.print_w {
        info!("printing the formula for width {}", w);
        let stdout = io::stdout();
        let mut out = stdout.lock();
        width::print_dimacs(&graph, w as usize, &search_options, &mut out)?;
        return Ok(());
    }

    if let Some(w) = options.solve_w {
        let verdict = width::solve_width(&graph, w as usize, &search_options);
        println!("width {}: {}", w, verdict);
        process::exit(verdict.exit_code());
    }

    let start = Instant::now();
    let outcome = antiband::solve_with(&graph, &search_options);
    println!("{}", outcome);
    println!("total real time: {} ms", start.elapsed().as_millis());
    Ok(())
}
