mod terminal;

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use drill_core::kanji::{KanjiEntry, KanjiOrder};
use drill_core::model::{AppId, Difficulty, NumberRange, Operator, SessionOrder};
use drill_core::{GenerationPolicy, ProblemGenerator, multiplication_facts};
use serde_json::{Map, json};
use services::history::DEFAULT_LATEST_COUNT;
use services::{
    Clock, DrillConfig, DrillRun, HistoryStore, HttpSyncSink, KanjiDrillService, ProblemSource,
    SessionOptions, StorageBackend,
};
use tokio::runtime::Handle;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "drill")]
#[command(author, version, about = "Arithmetic and kanji drills in the terminal", long_about = None)]
struct Cli {
    /// Path to config.toml (defaults to the platform config directory)
    #[arg(long, global = true, env = "DRILL_CONFIG")]
    config: Option<PathBuf>,

    /// Storage backend, overriding the config file
    #[arg(long, global = true)]
    storage: Option<Backend>,

    /// Questions per arithmetic session, overriding the config file
    #[arg(long, global = true)]
    length: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Backend {
    File,
    Sqlite,
    Memory,
}

impl From<Backend> for StorageBackend {
    fn from(backend: Backend) -> Self {
        match backend {
            Backend::File => StorageBackend::File,
            Backend::Sqlite => StorageBackend::Sqlite,
            Backend::Memory => StorageBackend::Memory,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Multiplication tables
    Kuku {
        /// Table levels to practise, e.g. 2,3,7
        #[arg(short, long, value_delimiter = ',', default_value = "1,2,3,4,5,6,7,8,9")]
        levels: Vec<u32>,
        /// sequential or random
        #[arg(short, long)]
        order: Option<SessionOrder>,
    },
    /// One operator with operands of a given digit count
    Calc {
        /// add, sub, mul or div
        #[arg(short = 'p', long, default_value = "add")]
        operator: Operator,
        /// Operand digit count
        #[arg(short, long, default_value_t = 1, conflicts_with_all = ["min", "max"])]
        digits: u32,
        /// Custom lower bound (with --max)
        #[arg(long, requires = "max", allow_hyphen_values = true)]
        min: Option<i64>,
        /// Custom upper bound (with --min)
        #[arg(long, requires = "min", allow_hyphen_values = true)]
        max: Option<i64>,
    },
    /// Mixed operators from 0 up to a limit
    Shisoku {
        /// Operators to draw from, e.g. add,mul
        #[arg(short = 'p', long, value_delimiter = ',', default_value = "add,sub,mul,div")]
        operators: Vec<Operator>,
        /// easy or hard (hard division asks for a remainder)
        #[arg(short, long, default_value = "easy")]
        difficulty: Difficulty,
        /// Largest operand, 10 to 9999; single digits (0-9) when omitted
        #[arg(short, long, value_parser = clap::value_parser!(i64).range(10..=9999))]
        max: Option<i64>,
    },
    /// Kanji reading batches
    Kanji {
        /// JSON array of kanji entries
        #[arg(short, long)]
        file: PathBuf,
        /// School grade
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=6))]
        grade: u8,
        /// stroke or random
        #[arg(short, long, default_value = "stroke")]
        order: KanjiOrder,
        /// Forget which kanji of this grade were already shown
        #[arg(long)]
        reset: bool,
    },
    /// Inspect or manage study history
    History {
        #[command(subcommand)]
        command: HistoryCommand,
    },
}

#[derive(Subcommand)]
enum HistoryCommand {
    /// Most recent records of one app
    Latest {
        app: AppId,
        #[arg(short = 'n', long, default_value_t = DEFAULT_LATEST_COUNT)]
        count: usize,
    },
    /// Today's totals for one app, or every app
    Today { app: Option<AppId> },
    /// Records between two dates (YYYY-MM-DD), newest first
    Range {
        app: AppId,
        start: String,
        end: String,
    },
    /// Clear one app's history, or everything
    Clear { app: Option<AppId> },
    /// Write the whole history as JSON
    Export {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replace the whole history with a JSON export
    Import { path: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match cli.config.clone().or_else(DrillConfig::default_path) {
        Some(path) => DrillConfig::load(&path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => DrillConfig::default(),
    };
    if let Some(backend) = cli.storage {
        config.storage.backend = backend.into();
    }
    if let Some(length) = cli.length {
        config.session.length = length;
    }
    config.validate()?;

    // Logs go to stderr so they never interleave with prompts.
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str())),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();

    let handle = Handle::current();
    tokio::task::spawn_blocking(move || run(cli.command, &config, handle)).await?
}

fn run(command: Commands, config: &DrillConfig, handle: Handle) -> Result<()> {
    let storage = config.open_storage().context("opening storage")?;
    let mut history = HistoryStore::new(storage.kv.clone(), Clock::default_clock())
        .with_max_records_per_app(config.history.max_records_per_app)
        .with_utc_offset(config.utc_offset()?);
    if let Some(endpoint) = &config.sync.endpoint {
        history = history.with_sync_sink(Arc::new(HttpSyncSink::new(endpoint.clone(), handle)));
    }

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut out = io::stdout().lock();
    let options = config.session_options();

    match command {
        Commands::Kuku { levels, order } => {
            let facts = multiplication_facts(&levels)?;
            let order = order.unwrap_or(options.order);
            let mut extra = Map::new();
            extra.insert("levels".into(), json!(levels));
            extra.insert("mode".into(), json!(order.as_str()));
            let mut run = start_run(
                AppId::kuku(),
                ProblemSource::Precomputed(facts),
                options.with_order(order),
            )?;
            terminal::drill_loop(&mut run, &history, &extra, &mut input, &mut out)
        }
        Commands::Calc {
            operator,
            digits,
            min,
            max,
        } => {
            let mut extra = Map::new();
            extra.insert("operator".into(), json!(operator.as_str()));
            let range = match (min, max) {
                (Some(min), Some(max)) => {
                    extra.insert("range".into(), json!([min, max]));
                    NumberRange::new(min, max)?
                }
                _ => {
                    extra.insert("digits".into(), json!(digits));
                    NumberRange::from_digits(digits)?
                }
            };
            let policy = GenerationPolicy::single(operator, Difficulty::Easy, range);
            let mut run = start_run(AppId::calc(), ProblemSource::Policy(policy), options)?;
            terminal::drill_loop(&mut run, &history, &extra, &mut input, &mut out)
        }
        Commands::Shisoku {
            operators,
            difficulty,
            max,
        } => {
            let (policy, extra) = shisoku_plan(operators, difficulty, max)?;
            let mut run = start_run(AppId::shisoku(), ProblemSource::Policy(policy), options)?;
            terminal::drill_loop(&mut run, &history, &extra, &mut input, &mut out)
        }
        Commands::Kanji {
            file,
            grade,
            order,
            reset,
        } => {
            let entries = load_kanji(&file, grade)?;
            let service = KanjiDrillService::new(storage.kv.clone());
            if reset {
                service.reset_progress(grade)?;
            }
            let mut rng = rand::rng();
            terminal::kanji_loop(
                &service, &entries, grade, order, &history, &mut rng, &mut input, &mut out,
            )
        }
        Commands::History { command } => history_command(command, &history, &mut out),
    }
}

fn start_run(app_id: AppId, source: ProblemSource, options: SessionOptions) -> Result<DrillRun> {
    Ok(DrillRun::start(
        app_id,
        source,
        options,
        ProblemGenerator::from_os_rng(),
        Clock::default_clock(),
    )?)
}

/// Shisoku's operand ceiling when no custom `--max` is given.
const SINGLE_DIGIT_MAX: i64 = 9;

/// Policy and history fields for a shisoku run.
fn shisoku_plan(
    operators: Vec<Operator>,
    difficulty: Difficulty,
    max: Option<i64>,
) -> Result<(GenerationPolicy, Map<String, serde_json::Value>)> {
    let max = max.unwrap_or(SINGLE_DIGIT_MAX);
    let policy = GenerationPolicy::new(operators, difficulty, NumberRange::up_to(max)?)?;
    let mut extra = Map::new();
    extra.insert("operator".into(), json!(history_operator_name(&policy)));
    extra.insert("difficulty".into(), json!(difficulty.as_str()));
    extra.insert("range".into(), json!(max));
    Ok((policy, extra))
}

/// Shisoku records the first selected operator under its display name.
fn history_operator_name(policy: &GenerationPolicy) -> &'static str {
    match policy.operators().first() {
        Some(Operator::Sub) => "minus",
        Some(Operator::Mul) => "multiply",
        Some(Operator::Div) => "divide",
        _ => "plus",
    }
}

fn load_kanji(path: &std::path::Path, grade: u8) -> Result<Vec<KanjiEntry>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading kanji file {}", path.display()))?;
    let entries: Vec<KanjiEntry> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing kanji file {}", path.display()))?;
    Ok(entries.into_iter().filter(|e| e.grade == grade).collect())
}

fn history_command(
    command: HistoryCommand,
    history: &HistoryStore,
    out: &mut impl Write,
) -> Result<()> {
    match command {
        HistoryCommand::Latest { app, count } => {
            for record in history.latest(&app, count)? {
                writeln!(out, "{}", terminal::format_record(&record))?;
            }
        }
        HistoryCommand::Today { app: Some(app) } => match history.stats_for_today(&app)? {
            Some(stats) => writeln!(out, "{}", terminal::format_stats(&stats))?,
            None => writeln!(out, "{app}: nothing today")?,
        },
        HistoryCommand::Today { app: None } => {
            for (app, stats) in history.all_today_stats()? {
                match stats {
                    Some(stats) => writeln!(out, "{app}: {}", terminal::format_stats(&stats))?,
                    None => writeln!(out, "{app}: nothing today")?,
                }
            }
        }
        HistoryCommand::Range { app, start, end } => {
            for record in history.stats_for_range(&app, &start, &end)? {
                writeln!(out, "{}", terminal::format_record(&record))?;
            }
        }
        HistoryCommand::Clear { app } => {
            history.clear(app.as_ref())?;
            tracing::info!(app = app.as_ref().map(AppId::as_str), "history cleared");
        }
        HistoryCommand::Export { output: Some(path) } => {
            std::fs::write(&path, history.export()?)
                .with_context(|| format!("writing {}", path.display()))?;
        }
        HistoryCommand::Export { output: None } => writeln!(out, "{}", history.export()?)?,
        HistoryCommand::Import { path } => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            history.import(&raw)?;
        }
    }
    Ok(())
}
