//! Markup SSR CLI
//!
//! Usage:
//!   markup-ssr [OPTIONS] [FILE]
//!
//! Options:
//!   -p, --props <FILE>      Props for the render (.json or .toml)
//!   -c, --config <FILE>     Engine config file (TOML format)
//!   -t, --templates <DIR>   Register every *.html file as a component
//!   --no-escape             Do not escape expression output
//!   -d, --diagnostics       Print diagnostics to stderr
//!   -h, --help              Print help

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use markup_ssr::config::load_props;
use markup_ssr::{Engine, EngineConfig, Options, Props};

#[derive(Parser)]
#[command(name = "markup-ssr")]
#[command(about = "Server-side renderer for HTML templates")]
struct Cli {
    /// Input file (reads from stdin if not provided)
    input: Option<PathBuf>,

    /// Props for the render (.json or .toml)
    #[arg(short, long)]
    props: Option<PathBuf>,

    /// Engine config file (TOML format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory of component templates, named by file stem
    #[arg(short, long)]
    templates: Option<PathBuf>,

    /// Do not escape expression output
    #[arg(long)]
    no_escape: bool,

    /// Print diagnostics to stderr
    #[arg(short, long)]
    diagnostics: bool,
}

fn fail(context: &str, error: impl std::fmt::Display) -> ! {
    eprintln!("Error {}: {}", context, error);
    std::process::exit(1);
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let mut engine = match &cli.config {
        Some(path) => match EngineConfig::from_file(path).map(Engine::from_config) {
            Ok(Ok(engine)) => engine,
            Ok(Err(e)) => fail(&format!("loading config '{}'", path.display()), e),
            Err(e) => fail(&format!("loading config '{}'", path.display()), e),
        },
        None => Engine::new(),
    };

    if let Some(dir) = &cli.templates {
        if let Err(e) = engine.load_templates_dir(dir) {
            fail(&format!("loading templates from '{}'", dir.display()), e);
        }
    }

    if cli.no_escape {
        if let Err(e) = engine.set_options(Options::new().with_auto_escape(false)) {
            fail("applying options", e);
        }
    }

    let props = match &cli.props {
        Some(path) => match load_props(path) {
            Ok(props) => props,
            Err(e) => fail(&format!("loading props '{}'", path.display()), e),
        },
        None => Props::new(),
    };

    // Read input
    let source = match &cli.input {
        Some(path) => match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => fail(&format!("reading file '{}'", path.display()), e),
        },
        None => {
            let mut buffer = String::new();
            match io::stdin().read_to_string(&mut buffer) {
                Ok(_) => buffer,
                Err(e) => fail("reading from stdin", e),
            }
        }
    };

    match engine.render_with_diagnostics(&source, &props) {
        Ok((html, diagnostics)) => {
            if cli.diagnostics {
                for diagnostic in &diagnostics {
                    eprintln!("{}", diagnostic);
                }
            }
            println!("{}", html);
        }
        Err(e) => {
            eprintln!("Error: {}", e.report());
            std::process::exit(1);
        }
    }
}
