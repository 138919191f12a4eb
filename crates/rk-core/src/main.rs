//! ramkit command-line interface.
//!
//! Each subcommand reads one JSON document (a path, or `-` for stdin) and
//! writes one JSON result to stdout. Logs go to stderr.

use clap::{Args, Parser, Subcommand};
use rk_common::error::{format_error_human, StructuredError};
use rk_common::{Error, NodeId, Result};
use rk_config::{load_config, ConfigSource, LoadedConfig};
use rk_core::allocation::{allocate, nodes_from_tree, AllocationMethod, AllocationNode, AllocationRequest, Goal};
use rk_core::exit_codes::ExitCode;
use rk_core::fmea::{analyze_fmea, Fmea, FmeaOptions};
use rk_core::hardware::{rollup, similar_item, HardwareTree, SimilarItemInputs};
use rk_core::log_event;
use rk_core::logging::{event_names, init_logging, LogConfig, LogFormat, LogLevel, Stage};
use rk_core::survival::planning::{GrowthPhase, IdealizedPlan};
use rk_core::survival::{analyze, Dataset};
use rk_core::CalculationContext;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::{IsTerminal, Read};
use std::path::{Path, PathBuf};

/// ramkit - reliability, availability and maintainability calculations
#[derive(Parser)]
#[command(name = "rk")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Configuration file (overrides RAMKIT_CONFIG and the XDG location)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log format on stderr: human or jsonl
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit a survival or growth model to a dataset
    Survival(InputArgs),

    /// Predict part hazard rates and roll them up a hardware tree
    Predict(InputArgs),

    /// Allocate a reliability goal to the children of one assembly
    Allocate(InputArgs),

    /// Calculate FMEA criticality and risk priority numbers
    Fmea(FmeaArgs),

    /// Solve an idealized or phased reliability-growth plan
    GrowthPlan(GrowthPlanArgs),

    /// Evaluate similar-item user functions
    SimilarItem(InputArgs),

    /// Configuration management
    Config(ConfigArgs),
}

// ============================================================================
// Command argument structs
// ============================================================================

#[derive(Args, Debug)]
struct InputArgs {
    /// Input JSON document, or `-` for stdin
    input: PathBuf,
}

#[derive(Args, Debug)]
struct FmeaArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Skip the criticality calculation
    #[arg(long)]
    skip_criticality: bool,

    /// Skip the RPN calculation
    #[arg(long)]
    skip_rpn: bool,
}

#[derive(Args, Debug)]
struct GrowthPlanArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Points on the idealized MTBF curve
    #[arg(long, default_value_t = 20)]
    points: usize,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show the effective configuration
    Show,

    /// Validate a configuration file
    Validate {
        /// File to validate (defaults to the resolved configuration)
        path: Option<PathBuf>,
    },
}

// ============================================================================
// Input documents
// ============================================================================

/// Allocation input: explicit nodes, or a hardware tree plus the assembly
/// whose children are allocated.
#[derive(Debug, Deserialize)]
struct AllocationInput {
    #[serde(default)]
    method: AllocationMethod,
    operating_time: f64,
    goal: Goal,
    #[serde(default)]
    nodes: Option<Vec<AllocationNode>>,
    #[serde(default)]
    tree: Option<HardwareTree>,
    #[serde(default)]
    parent: Option<NodeId>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PlanInput {
    Phases { phases: Vec<GrowthPhase> },
    Idealized(IdealizedPlan),
}

#[derive(Serialize)]
struct ConfigReport<'a, T: Serialize> {
    source: String,
    path: Option<String>,
    #[serde(flatten)]
    body: &'a T,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if e.use_stderr() => {
            let _ = e.print();
            std::process::exit(ExitCode::ArgsError.as_i32());
        }
        Err(e) => e.exit(),
    };

    let level = if cli.global.quiet {
        Some(LogLevel::Error)
    } else {
        match cli.global.verbose {
            0 => None,
            1 => Some(LogLevel::Debug),
            _ => Some(LogLevel::Trace),
        }
    };
    let log_config = LogConfig::from_env(level, cli.global.log_format);
    init_logging(&log_config);
    install_panic_hook();

    let exit_code = match run(&cli) {
        Ok(()) => ExitCode::Clean,
        Err(err) => report_error(&err, log_config.format),
    };
    std::process::exit(exit_code.as_i32());
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Config(args) => run_config(&cli.global, args),
        command => {
            let ctx = context(&cli.global)?;
            match command {
                Commands::Survival(args) => run_survival(&ctx, args),
                Commands::Predict(args) => run_predict(&ctx, args),
                Commands::Allocate(args) => run_allocate(&ctx, args),
                Commands::Fmea(args) => run_fmea(&ctx, args),
                Commands::GrowthPlan(args) => run_growth_plan(args),
                Commands::SimilarItem(args) => run_similar_item(&ctx, args),
                Commands::Config(_) => Ok(()),
            }
        }
    }
}

fn report_error(err: &Error, format: LogFormat) -> ExitCode {
    let code = ExitCode::from(err);
    match format {
        LogFormat::Jsonl => eprintln!("{}", StructuredError::from(err).to_json()),
        LogFormat::Human => eprintln!("{}", format_error_human(err, std::io::stderr().is_terminal())),
    }
    code
}

// ============================================================================
// Helpers
// ============================================================================

/// A panic is a bug: report it and exit with the internal-error code.
fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        tracing::error!(event = event_names::INTERNAL_ERROR, panic = %info, "internal error");
        eprintln!("rk: internal error: {info}");
        std::process::exit(ExitCode::InternalError.as_i32());
    }));
}

fn load(global: &GlobalOpts) -> Result<LoadedConfig> {
    load_config(global.config.as_deref()).map_err(|e| {
        tracing::error!(event = event_names::CONFIG_ERROR, error = %e, "configuration rejected");
        Error::from(e)
    })
}

fn context(global: &GlobalOpts) -> Result<CalculationContext> {
    let loaded = load(global)?;
    let ctx = CalculationContext::new(loaded.config);
    if loaded.source == ConfigSource::BuiltinDefault {
        log_event!(
            ctx.log,
            DEBUG,
            event_names::CONFIG_DEFAULT_USED,
            Stage::Init,
            "using built-in configuration"
        );
    } else {
        let path = loaded.path.as_ref().map(|p| p.display().to_string()).unwrap_or_default();
        log_event!(
            ctx.log,
            INFO,
            event_names::CONFIG_LOADED,
            Stage::Init,
            "configuration loaded",
            source = loaded.source.to_string().as_str(),
            path = path.as_str()
        );
    }
    Ok(ctx)
}

fn read_input<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(path)?
    };
    Ok(serde_json::from_str(&text)?)
}

fn emit<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ============================================================================
// Command implementations
// ============================================================================

fn run_survival(ctx: &CalculationContext, args: &InputArgs) -> Result<()> {
    let dataset: Dataset = read_input(&args.input)?;
    emit(&analyze(&dataset, ctx)?)
}

fn run_predict(ctx: &CalculationContext, args: &InputArgs) -> Result<()> {
    let mut tree: HardwareTree = read_input(&args.input)?;
    let summary = rollup(&mut tree, ctx)?;
    emit(&serde_json::json!({
        "summary": summary,
        "nodes": tree,
    }))
}

fn run_allocate(ctx: &CalculationContext, args: &InputArgs) -> Result<()> {
    let input: AllocationInput = read_input(&args.input)?;
    let nodes = match (input.nodes, input.tree) {
        (Some(nodes), _) => nodes,
        (None, Some(mut tree)) => {
            rollup(&mut tree, ctx)?;
            let parent = input.parent.unwrap_or(tree.root());
            nodes_from_tree(&tree, parent)?
        }
        (None, None) => {
            return Err(Error::invalid("nodes", "give either `nodes` or a hardware `tree`"));
        }
    };
    let request = AllocationRequest {
        method: input.method,
        operating_time: input.operating_time,
        goal: input.goal,
        nodes,
    };
    emit(&allocate(request, ctx)?)
}

fn run_fmea(ctx: &CalculationContext, args: &FmeaArgs) -> Result<()> {
    let mut fmea: Fmea = read_input(&args.input.input)?;
    let options = FmeaOptions {
        criticality: !args.skip_criticality,
        rpn: !args.skip_rpn,
    };
    let summary = analyze_fmea(&mut fmea, options, ctx)?;
    emit(&serde_json::json!({
        "summary": summary,
        "item_criticality_text": fmea.item_criticality_lines(),
        "fmea": fmea,
    }))
}

fn run_growth_plan(args: &GrowthPlanArgs) -> Result<()> {
    match read_input::<PlanInput>(&args.input.input)? {
        PlanInput::Phases { phases } => {
            let solved = phases.iter().map(GrowthPhase::solve).collect::<Result<Vec<_>>>()?;
            emit(&serde_json::json!({ "phases": solved }))
        }
        PlanInput::Idealized(plan) => {
            let solution = plan.solve()?;
            let curve = solution.curve(args.points);
            emit(&serde_json::json!({
                "plan": solution,
                "curve": {
                    "time": curve.iter().map(|(t, _)| *t).collect::<Vec<_>>(),
                    "mtbf": curve.iter().map(|(_, m)| *m).collect::<Vec<_>>(),
                },
            }))
        }
    }
}

fn run_similar_item(ctx: &CalculationContext, args: &InputArgs) -> Result<()> {
    let inputs: SimilarItemInputs = read_input(&args.input)?;
    emit(&similar_item(&inputs, ctx)?)
}

fn run_config(global: &GlobalOpts, args: &ConfigArgs) -> Result<()> {
    match &args.command {
        ConfigCommands::Show => {
            let loaded = load(global)?;
            emit(&ConfigReport {
                source: loaded.source.to_string(),
                path: loaded.path.as_ref().map(|p| p.display().to_string()),
                body: &serde_json::json!({ "config": loaded.config }),
            })
        }
        ConfigCommands::Validate { path } => {
            let loaded = load_config(path.as_deref().or(global.config.as_deref()))?;
            emit(&ConfigReport {
                source: loaded.source.to_string(),
                path: loaded.path.as_ref().map(|p| p.display().to_string()),
                body: &serde_json::json!({
                    "status": "valid",
                    "schema_version": loaded.config.schema_version,
                }),
            })
        }
    }
}
