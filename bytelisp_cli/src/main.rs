use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use bytelisp::{CompileError, Compiler, GeneratorOptions};
use clap::Parser;
use codesnake::{Block, CodeWidth, Label, LineIndex};
use tracing::info;
use yansi::Paint;

/// Compile a bytelisp program into stack machine bytecode
#[derive(Parser, Debug)]
#[command(name = "bytelisp")]
struct Args {
    /// Source program, one form per line
    source: PathBuf,

    /// Where to write the bytecode, one instruction per line
    dest: PathBuf,

    /// Leave out the `true<N>:` label at the start of every then-branch
    #[arg(long)]
    no_then_labels: bool,

    /// Log every compiled form (RUST_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,
}

fn make_block<'a>(idx: &'a LineIndex, err: &CompileError) -> Option<Block<&'a str, String>> {
    let message = err.kind.to_string();
    Block::new(
        idx,
        [Label::new(err.span())
            .with_text(message.red().to_string())
            .with_style(|s| s.red().to_string())],
    )
}

fn report(path: &Path, err: &CompileError) {
    if err.span().is_empty() {
        return;
    }
    let idx = LineIndex::new(&err.text);
    let Some(block) = make_block(&idx, err) else {
        return;
    };
    let block = block.map_code(|c| CodeWidth::new(c, c.len()));
    eprintln!("{}[{}:{}]", block.prologue(), path.display(), err.line);
    eprint!("{block}");
    eprintln!("{}", block.epilogue());
}

fn init_logging(verbose: bool) -> anyhow::Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default))?;

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose)?;

    let source = fs::read_to_string(&args.source)
        .with_context(|| format!("failed to read {}", args.source.display()))?;

    let mut compiler = Compiler::with_options(GeneratorOptions {
        emit_then_labels: !args.no_then_labels,
    });
    // Nothing is written unless the whole program compiles
    let bytecode = match compiler.compile_source(&source) {
        Ok(bytecode) => bytecode,
        Err(err) => {
            report(&args.source, &err);
            return Err(err)
                .with_context(|| format!("failed to compile {}", args.source.display()));
        }
    };

    fs::write(&args.dest, bytecode.to_string())
        .with_context(|| format!("failed to write {}", args.dest.display()))?;
    info!(
        dest = %args.dest.display(),
        instructions = bytecode.len(),
        "wrote bytecode"
    );

    Ok(())
}
