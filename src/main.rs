mod report;

use std::error::Error;
use std::path::PathBuf;

use report::render_report;
use trusscut::Truss;

/// Command-line usage shown when the input path is missing.
const USAGE: &str = "usage: trusscut <input.json> [output.json]";

fn main() -> Result<(), Box<dyn Error>> {
    // Default: WARN for everything, INFO for trusscut. Override with RUST_LOG.
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into())
        .add_directive("trusscut=info".parse()?);
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args_os().skip(1);
    let input = args.next().map(PathBuf::from).ok_or(USAGE)?;
    let output = args.next().map(PathBuf::from);

    // Loading validates the whole document, so a bad file never yields a
    // half-built truss.
    let mut truss = Truss::load(&input)?;

    // Recompute every joint from scratch. Fabricated beams keep their profiles.
    let cut = truss.cut_all_beams();
    println!("{}", render_report(&truss, &cut)?);

    if let Some(output) = output {
        truss.save(&output)?;
        println!("Wrote {}", output.display());
    }

    if !cut.is_complete() {
        return Err(format!("{} joint errors; cut profiles are incomplete", cut.errors.len()).into());
    }
    Ok(())
}
