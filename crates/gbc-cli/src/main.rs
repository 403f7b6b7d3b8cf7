use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use gbc_canvas::{Canvas, CanvasConfig, Color};
use gbc_lang::{CompiledProgram, Limits, Program, Recorder, Surface, Value};
use tracing::level_filters::LevelFilter;

#[derive(Parser, Debug)]
#[command(name = "gbc", version, about = "Run single-character turtle graphics programs")]
struct Cli {
    /// Raise log verbosity (-v debug, -vv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a program onto a canvas and print its value.
    Run(RunArgs),
    /// Print every surface call a program makes.
    Trace(TraceArgs),
    /// Print the parsed tree.
    Ast(AstArgs),
    /// Print the generated bytecode.
    Disasm(SourceArgs),
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct SourceArgs {
    /// Program file.
    file: Option<PathBuf>,

    /// Program text given inline.
    #[arg(short = 'e', long = "eval", value_name = "PROGRAM")]
    program: Option<String>,
}

impl SourceArgs {
    fn read(&self) -> anyhow::Result<String> {
        match (&self.program, &self.file) {
            (Some(program), _) => Ok(program.clone()),
            (None, Some(path)) => {
                std::fs::read_to_string(path).with_context(|| format!("read program '{}'", path.display()))
            }
            (None, None) => anyhow::bail!("no program given"),
        }
    }
}

#[derive(Args, Debug)]
struct ExecArgs {
    /// Run through the optimizer and bytecode VM instead of the tree walker.
    #[arg(long)]
    compiled: bool,

    /// Maximum nested function calls.
    #[arg(long, default_value_t = Limits::default().max_call_depth)]
    max_depth: usize,
}

impl ExecArgs {
    fn limits(&self) -> Limits { Limits { max_call_depth: self.max_depth } }
}

#[derive(Args, Debug)]
struct RunArgs {
    #[command(flatten)]
    source: SourceArgs,

    #[command(flatten)]
    exec: ExecArgs,

    /// Run the program this many times onto the same canvas.
    #[arg(long, default_value_t = 1)]
    repeat: u32,

    /// Output PNG path.
    #[arg(short, long)]
    out: Option<PathBuf>,

    #[arg(long, default_value_t = CanvasConfig::default().width)]
    width: u32,

    #[arg(long, default_value_t = CanvasConfig::default().height)]
    height: u32,

    /// Background as RRGGBB or RRGGBBAA; transparent when omitted.
    #[arg(long)]
    background: Option<String>,
}

#[derive(Args, Debug)]
struct TraceArgs {
    #[command(flatten)]
    source: SourceArgs,

    #[command(flatten)]
    exec: ExecArgs,
}

#[derive(Args, Debug)]
struct AstArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Print the tree after constant folding and rewrites.
    #[arg(long)]
    optimize: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Run(args) => cmd_run(args),
        Command::Trace(args) => cmd_trace(args),
        Command::Ast(args) => cmd_ast(args),
        Command::Disasm(args) => cmd_disasm(args),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt().with_max_level(level).with_writer(std::io::stderr).init();
}

// ─── Commands ─────────────────────────────────────────────────────────────────

fn cmd_run(args: RunArgs) -> anyhow::Result<()> {
    let src = args.source.read()?;
    let background = match &args.background {
        Some(hex) => hex.parse::<Color>().context("parse --background")?,
        None => CanvasConfig::default().background,
    };
    let mut canvas = Canvas::new(CanvasConfig { width: args.width, height: args.height, background })?;

    let program = Executable::prepare(&src, &args.exec)?;
    let mut value = Value::ZERO;
    for _ in 0..args.repeat {
        value = program.run(&mut canvas, args.exec.limits())?;
    }
    println!("{value}");

    if let Some(out) = &args.out {
        canvas.save_png(out).with_context(|| format!("write png '{}'", out.display()))?;
        tracing::info!(path = %out.display(), "wrote canvas");
    }
    Ok(())
}

fn cmd_trace(args: TraceArgs) -> anyhow::Result<()> {
    let src = args.source.read()?;
    let mut rec = Recorder::new();
    let value = Executable::prepare(&src, &args.exec)?.run(&mut rec, args.exec.limits())?;
    for call in rec.calls() {
        println!("{call}");
    }
    println!("=> {value}");
    Ok(())
}

fn cmd_ast(args: AstArgs) -> anyhow::Result<()> {
    let src = args.source.read()?;
    let program = gbc_lang::parse(&src).context("parse program")?;
    let program = if args.optimize { program.optimize() } else { program };
    println!("{program}");
    Ok(())
}

fn cmd_disasm(args: SourceArgs) -> anyhow::Result<()> {
    let src = args.read()?;
    let compiled = gbc_lang::compile(&src).context("compile program")?;
    print!("{}", compiled.disassemble());
    Ok(())
}

// ─── Execution ────────────────────────────────────────────────────────────────

/// A program ready to run through one of the two back ends.
enum Executable {
    Tree(Program),
    Bytecode(CompiledProgram),
}

impl Executable {
    fn prepare(src: &str, exec: &ExecArgs) -> anyhow::Result<Self> {
        let program = gbc_lang::parse(src).context("parse program")?;
        Ok(if exec.compiled { Self::Bytecode(program.compile()) } else { Self::Tree(program) })
    }

    /// Each run starts from a fresh context; only the surface carries over.
    fn run(&self, surface: &mut dyn Surface, limits: Limits) -> anyhow::Result<Value> {
        let value = match self {
            Self::Tree(program) => program.run_on(surface, limits),
            Self::Bytecode(program) => program.invoke_with(surface, limits),
        };
        value.context("run program")
    }
}
