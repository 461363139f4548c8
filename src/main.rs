use std::fs;
use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use inkjoin::InkConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "inkjoin", about = "Join handwritten letters into a thickened cursive word")]
struct Cli {
    /// Letter manifest (JSON)
    #[arg(short, long)]
    letters: PathBuf,

    /// Text to write
    #[arg(short, long)]
    word: String,

    /// Pen width
    #[arg(short, long, default_value = "10")]
    thickness: f64,

    /// Ligature search stride (derived per letter pair if omitted)
    #[arg(long)]
    stride: Option<f64>,

    /// Directory for stored ligatures (in-memory if omitted)
    #[arg(long)]
    cache: Option<PathBuf>,

    /// Output JSON path (stdout if omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = InkConfig {
        thickness: cli.thickness,
        stride: cli.stride,
        cache_dir: cli.cache.clone(),
        ..InkConfig::default()
    };

    eprintln!();
    eprintln!("  inkjoin \u{00b7} {}", cli.word);
    eprintln!();

    let letters = inkjoin::source::load_letters(&cli.letters)?;
    let inked = inkjoin::write_word(&letters, &cli.word, &config)?;

    for outcome in &inked.outcomes {
        let mark = if outcome.is_ligated() { '\u{2713}' } else { '\u{2717}' };
        eprintln!("  {} {}", mark, outcome);
    }

    let json = serde_json::to_string(&inked)?;
    match &cli.output {
        Some(path) => {
            fs::write(path, json)?;
            eprintln!();
            eprintln!("  \u{2713} {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(json.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }
    eprintln!();

    Ok(())
}
