//! Thin Compiler Driver
//!
//! Reads a script (or a serialized IR module), runs it through the
//! pipeline and writes exactly one artifact. Nothing is written when any
//! stage fails.

use clap::{Parser, Subcommand, ValueEnum};
use log::{debug, info};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use thin_backend::{build_runner, compile_js, compile_wasm, BinaryOptions, MemoryModel, TextOptions};
use thin_common::{CompilerError, Diagnostic, ErrorReporter};
use thin_frontend::lower::{DEFAULT_IMPORT_LOCATION, DEFAULT_MEMORY_SIZE};
use thin_frontend::{Frontend, LoweringOptions};
use thin_ir::{validate, Module};

#[derive(Parser)]
#[command(name = "thinc")]
#[command(about = "Thin script compiler targeting JavaScript and WebAssembly")]
#[command(version = "0.1.0")]
struct Cli {
    /// Log every pipeline stage (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile script source
    Compile {
        /// Input script (stdin when omitted)
        input: Option<PathBuf>,

        /// Artifact to produce
        #[arg(short, long, value_enum, default_value_t = Target::Js)]
        target: Target,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Minimum size of the initial memory in bytes
        #[arg(long, default_value_t = DEFAULT_MEMORY_SIZE)]
        memory_size: usize,

        /// Namespace for host functions inferred from unbound calls
        #[arg(long, default_value = DEFAULT_IMPORT_LOCATION)]
        import_location: String,

        /// Export an `alloc` function and let memory grow
        #[arg(long)]
        growable: bool,

        /// Print the IR listing to stderr
        #[arg(long)]
        print_ir: bool,
    },

    /// Compile a JSON-serialized IR module
    Emit {
        /// Input IR file (stdin when omitted)
        input: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value_t = Backend::Js)]
        target: Backend,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Export an `alloc` function and let memory grow
        #[arg(long)]
        growable: bool,
    },

    /// Dump the token stream of a script
    Tokens {
        /// Input script (stdin when omitted)
        input: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Target {
    /// JavaScript factory function
    Js,
    /// WebAssembly binary module
    Wasm,
    /// Node.js script bundling both
    Runner,
    /// Validated IR as JSON
    Ir,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    Js,
    Wasm,
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    let mut reporter = ErrorReporter::new();
    let result = match cli.command {
        Commands::Compile {
            input,
            target,
            output,
            memory_size,
            import_location,
            growable,
            print_ir,
        } => {
            let options = LoweringOptions {
                memory_size,
                import_location,
            };
            let memory = memory_model(growable);
            compile_command(input.as_deref(), target, output.as_deref(), &options, memory, print_ir, &mut reporter)
        }
        Commands::Emit {
            input,
            target,
            output,
            growable,
        } => emit_command(input.as_deref(), target, output.as_deref(), memory_model(growable)),
        Commands::Tokens { input } => tokens_command(input.as_deref()),
    };

    if let Err(err) = result {
        reporter.report(&err);
    }
    reporter.print_diagnostics();
    if reporter.has_errors() {
        std::process::exit(1);
    }
}

fn memory_model(growable: bool) -> MemoryModel {
    if growable {
        MemoryModel::growable()
    } else {
        MemoryModel::Fixed
    }
}

fn compile_command(
    input: Option<&Path>,
    target: Target,
    output: Option<&Path>,
    options: &LoweringOptions,
    memory: MemoryModel,
    print_ir: bool,
    reporter: &mut ErrorReporter,
) -> Result<(), CompilerError> {
    let source = read_input(input)?;
    let module = Frontend::compile_to_ir(&source, options)?;
    validate(&module)?;
    info!(
        "Lowered {} functions and {} imports",
        module.functions.len(),
        module.imports.len()
    );

    if print_ir {
        eprintln!("{module}");
    }

    let artifact = match target {
        Target::Js => compile_js(&module, &TextOptions { memory })?.into_bytes(),
        Target::Wasm => compile_wasm(&module, &BinaryOptions { memory })?,
        Target::Runner => {
            check_runner_entry(&module, reporter);
            let js = compile_js(&module, &TextOptions { memory })?;
            let wasm = compile_wasm(&module, &BinaryOptions { memory })?;
            build_runner(&js, &wasm).into_bytes()
        }
        Target::Ir => ir_to_json(&module)?.into_bytes(),
    };

    write_output(output, &artifact)
}

/// The runner script calls `main` with no arguments
fn check_runner_entry(module: &Module, reporter: &mut ErrorReporter) {
    match module.get_function("main") {
        Some(main) if main.is_exported && main.arg_types.is_empty() => {}
        Some(_) => reporter.push(Diagnostic::warning(
            "The runner calls main() with no arguments; main takes parameters".to_string(),
            None,
        )),
        None => reporter.push(Diagnostic::warning(
            "The runner calls main(), which this program does not define".to_string(),
            None,
        )),
    }
}

fn emit_command(
    input: Option<&Path>,
    target: Backend,
    output: Option<&Path>,
    memory: MemoryModel,
) -> Result<(), CompilerError> {
    let text = read_input(input)?;
    let module: Module = serde_json::from_str(&text).map_err(|e| CompilerError::IoError {
        message: format!("Invalid IR module: {e}"),
    })?;
    debug!("Read IR module with {} functions", module.functions.len());

    let artifact = match target {
        Backend::Js => compile_js(&module, &TextOptions { memory })?.into_bytes(),
        Backend::Wasm => compile_wasm(&module, &BinaryOptions { memory })?,
    };

    write_output(output, &artifact)
}

fn tokens_command(input: Option<&Path>) -> Result<(), CompilerError> {
    let source = read_input(input)?;
    let tokens = Frontend::tokenize_source(&source)?;

    let mut listing = String::new();
    for token in &tokens {
        let start = &token.span.start;
        listing.push_str(&format!("{}:{}\t{}\n", start.line, start.column, token.token_type));
    }

    write_output(None, listing.as_bytes())
}

fn ir_to_json(module: &Module) -> Result<String, CompilerError> {
    let mut json = serde_json::to_string_pretty(module).map_err(|e| CompilerError::InternalError {
        message: format!("Cannot serialize IR: {e}"),
    })?;
    json.push('\n');
    Ok(json)
}

fn read_input(path: Option<&Path>) -> Result<String, CompilerError> {
    match path {
        Some(path) => {
            debug!("Reading {}", path.display());
            Ok(fs::read_to_string(path)?)
        }
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

fn write_output(path: Option<&Path>, bytes: &[u8]) -> Result<(), CompilerError> {
    match path {
        Some(path) => {
            fs::write(path, bytes)?;
            info!("Wrote {} bytes to {}", bytes.len(), path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(bytes)?;
            stdout.flush()?;
        }
    }
    Ok(())
}
