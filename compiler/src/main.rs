use clap::Parser;
use std::path::PathBuf;

use orbc::filer::DirFiler;
use orbc::pipeline::{self, CompilerOptions, EmitTarget};
use orbc::render::default_renderer;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum EmitStage {
    /// Generated sources and discovery manifests
    All,
    /// Interface descriptors as JSON
    Decls,
    /// Generation plans as JSON
    Plan,
    /// Compiler version, id hash algorithm and input hashes as JSON
    BuildInfo,
}

impl From<EmitStage> for EmitTarget {
    fn from(stage: EmitStage) -> Self {
        match stage {
            EmitStage::All => EmitTarget::All,
            EmitStage::Decls => EmitTarget::Decls,
            EmitStage::Plan => EmitTarget::Plan,
            EmitStage::BuildInfo => EmitTarget::BuildInfo,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "orbc",
    version,
    about = "Orbit actor interface compiler: validates .orbit interfaces and generates proxies, dispatchers and registrars"
)]
struct Cli {
    /// Input .orbit files or directories (searched recursively)
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output directory (`src/` for sources, `resources/` for manifests)
    #[arg(short, long, default_value = "orbc-out")]
    out_dir: PathBuf,

    /// Output stage
    #[arg(long, value_enum, default_value_t = EmitStage::All)]
    emit: EmitStage,

    /// Print informational diagnostics and pass timing
    #[arg(long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("ORBC_LOG").unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if cli.verbose {
        eprintln!("orbc: inputs  = {:?}", cli.inputs);
        eprintln!("orbc: out-dir = {}", cli.out_dir.display());
        eprintln!("orbc: emit    = {:?}", cli.emit);
    }

    let options = CompilerOptions {
        inputs: cli.inputs.clone(),
        out_dir: cli.out_dir.clone(),
        emit: cli.emit.into(),
    };
    let filer = DirFiler::new(&cli.out_dir);
    let compilation = match pipeline::compile(&options, &filer, &default_renderer()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("orbc: error: {}", e);
            std::process::exit(2);
        }
    };

    for diag in &compilation.diagnostics {
        if diag.is_error() || cli.verbose {
            eprintln!("orbc: {}", compilation.sources.render(diag));
        }
    }

    // ── Emit ──
    let json = match options.emit {
        EmitTarget::All => None,
        EmitTarget::Decls => Some(serde_json::to_string_pretty(&compilation.descriptors)),
        EmitTarget::Plan => Some(serde_json::to_string_pretty(&compilation.plans)),
        EmitTarget::BuildInfo => {
            let inputs = compilation
                .inputs
                .iter()
                .map(|&id| compilation.sources.file(id));
            Some(Ok(pipeline::compute_provenance(inputs).to_json()))
        }
    };
    if let Some(json) = json {
        match json {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("orbc: error: cannot serialize output: {}", e);
                std::process::exit(1);
            }
        }
    }

    if cli.verbose {
        eprintln!(
            "orbc: {} rounds, {} interfaces, {} files generated, {} manifests",
            compilation.rounds,
            compilation.plans.len(),
            compilation.generated.len(),
            compilation.manifests.len()
        );
    }

    if compilation.has_errors() {
        let n = compilation
            .diagnostics
            .iter()
            .filter(|d| d.is_error())
            .count();
        eprintln!("orbc: {} error(s)", n);
        std::process::exit(1);
    }
}
