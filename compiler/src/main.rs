// main.rs — aiecad CLI driver (spec §6.1)
//
// Thin shell over `aiecad::pipeline`: parses flags, reads the source
// file, runs the pipeline to whatever stage `--emit` names, prints
// diagnostics in the requested format, and exits with a code from the
// fixed {0, 1, child-exit-code} set spec §6.1 specifies.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use aiecad::config::{Config, DiagnosticFormat, EmitStage};
use aiecad::diag::Diagnostic;

const EXIT_OK: u8 = 0;
const EXIT_COMPILE_ERROR: u8 = 1;

#[derive(Parser, Debug)]
#[command(
    name = "aiecad",
    version,
    about = "Compiles AIE dataflow program descriptions to IRON/NPU host code"
)]
struct Cli {
    /// GUI XML / Complete XML source file.
    source: PathBuf,

    /// Run the generated Python host program after compiling it.
    #[arg(long)]
    run: bool,

    /// How far to carry the pipeline: complete-xml, graphml, py, or run.
    #[arg(long, default_value = "run")]
    emit: String,

    /// Emit verbose diagnostics (info-level included).
    #[arg(short, long)]
    verbose: bool,

    /// Diagnostic rendering format.
    #[arg(long, default_value = "human")]
    diagnostic_format: String,

    /// Directory to write emitted artifacts into (defaults to the
    /// source file's directory).
    #[arg(short, long)]
    output: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let Some(emit) = EmitStage::parse(&cli.emit) else {
        eprintln!("error: unknown --emit stage '{}' (expected complete-xml, graphml, py, or run)", cli.emit);
        return ExitCode::from(EXIT_COMPILE_ERROR);
    };
    let Some(diagnostic_format) = DiagnosticFormat::parse(&cli.diagnostic_format) else {
        eprintln!("error: unknown --diagnostic-format '{}' (expected human or json)", cli.diagnostic_format);
        return ExitCode::from(EXIT_COMPILE_ERROR);
    };

    let config = Config {
        run: cli.run,
        emit,
        verbose: cli.verbose,
        diagnostic_format,
        output: cli.output.clone(),
        ..Config::default()
    }
    .with_env_defaults();

    let source = match std::fs::read_to_string(&cli.source) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: cannot read {}: {e}", cli.source.display());
            return ExitCode::from(EXIT_COMPILE_ERROR);
        }
    };

    let output_dir = config.output.as_ref().map(PathBuf::from).or_else(|| cli.source.parent().map(PathBuf::from));

    match aiecad::pipeline::run_pipeline(&source, &config, output_dir.as_deref()) {
        Ok(result) => {
            if let Some(code) = result.run_exit_code {
                if code != 0 {
                    return ExitCode::from(EXIT_COMPILE_ERROR);
                }
            }
            ExitCode::from(EXIT_OK)
        }
        Err(diags) => {
            report(&diags, &config);
            ExitCode::from(EXIT_COMPILE_ERROR)
        }
    }
}

fn report(diags: &[Diagnostic], config: &Config) {
    match config.diagnostic_format {
        DiagnosticFormat::Human => {
            for d in diags {
                if d.level == aiecad::diag::DiagLevel::Info && !config.verbose {
                    continue;
                }
                eprintln!("{d}");
            }
        }
        DiagnosticFormat::Json => {
            let entries: Vec<serde_json::Value> = diags
                .iter()
                .filter(|d| config.verbose || d.level != aiecad::diag::DiagLevel::Info)
                .map(|d| {
                    serde_json::json!({
                        "level": d.level.to_string(),
                        "code": d.code.map(|c| c.0),
                        "message": d.message,
                        "timestamp": d.timestamp_iso8601(),
                    })
                })
                .collect();
            eprintln!("{}", serde_json::Value::Array(entries));
        }
    }
}
