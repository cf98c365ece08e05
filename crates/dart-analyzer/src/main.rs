use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    process::ExitCode,
    sync::Arc,
    time::Duration,
};

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use dart_analyzer::{
    AnalysisContext, AnalysisScheduler, AnalysisSettings, ChangeSet, MemoryIndexStore, SourceFactory, TokenStream,
    index::read_summary, report::ProjectReport, vfs::collect_dart_sources,
};

const IDLE_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Parser, Debug)]
#[command(name = "dart-analyzer", version, about)]
struct Args {
    #[arg(long, short, global = true)]
    verbose: bool,

    #[arg(long, global = true)]
    log_file: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the token stream of one file.
    Tokens { file: PathBuf },
    /// Analyse every `.dart` file below a directory and print a JSON report.
    Scan {
        dir: PathBuf,
        /// Also persist the relationship index to this file.
        #[arg(long)]
        write_index: Option<PathBuf>,
    },
    /// Print the key and location counts of a persisted index.
    IndexInfo { file: PathBuf },
}

impl Command {
    fn target(&self) -> &Path {
        match self {
            Command::Tokens {
                file,
            }
            | Command::IndexInfo {
                file,
            } => file,
            Command::Scan {
                dir, ..
            } => dir,
        }
    }
}

fn default_log_path() -> PathBuf {
    let dir = dirs_or_tmp();
    dir.join("dart-analyzer.log")
}

fn dirs_or_tmp() -> PathBuf {
    if let Some(home) = std::env::var_os("HOME") {
        let dir = PathBuf::from(home).join(".dart-analyzer");
        if std::fs::create_dir_all(&dir).is_ok() {
            return dir;
        }
    }
    std::env::temp_dir()
}

fn init_logging(
    args: &Args,
    settings: &AnalysisSettings,
) -> PathBuf {
    let default_directive =
        if args.verbose { "dart_analyzer=debug".to_string() } else { settings.logging.level.filter_directive() };
    let stderr_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&default_directive));
    let file_filter = EnvFilter::new(&default_directive);

    let log_path = args
        .log_file
        .clone()
        .or_else(|| settings.logging.file.clone())
        .map(PathBuf::from)
        .unwrap_or_else(default_log_path);

    let file_appender = tracing_appender::rolling::never(
        log_path.parent().unwrap_or(Path::new(".")),
        log_path.file_name().unwrap_or(std::ffi::OsStr::new("dart-analyzer.log")),
    );

    let file_layer = fmt::layer().with_writer(file_appender).with_ansi(false).with_target(false).with_filter(file_filter);

    let stderr_layer =
        fmt::layer().with_writer(std::io::stderr).with_ansi(false).with_target(false).with_filter(stderr_filter);

    tracing_subscriber::registry().with(file_layer).with(stderr_layer).init();
    log_path
}

fn main() -> ExitCode {
    let args = Args::parse();
    let settings = AnalysisSettings::discover(args.command.target());
    let log_path = init_logging(&args, &settings);
    info!("dart-analyzer v{}", env!("CARGO_PKG_VERSION"));
    info!("Log file: {}", log_path.display());

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(settings.thread_pool.resolved_worker_threads())
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            error!("cannot start runtime: {}", err);
            return ExitCode::FAILURE;
        },
    };

    let outcome = match &args.command {
        Command::Tokens {
            file,
        } => tokens(file),
        Command::Scan {
            dir,
            write_index,
        } => runtime.block_on(scan(dir, write_index.as_deref(), &settings)),
        Command::IndexInfo {
            file,
        } => index_info(file),
    };
    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("{}", message);
            ExitCode::FAILURE
        },
    }
}

fn tokens(file: &Path) -> Result<(), String> {
    let text = std::fs::read_to_string(file).map_err(|err| format!("cannot read {}: {}", file.display(), err))?;
    print!("{}", TokenStream::scan(text).dump());
    Ok(())
}

async fn scan(
    dir: &Path,
    write_index: Option<&Path>,
    settings: &AnalysisSettings,
) -> Result<(), String> {
    let max_size = settings.scanner.max_file_size_bytes();
    let sources: Vec<_> = collect_dart_sources(dir, &settings.indexing.exclude_paths)
        .into_iter()
        .filter(|source| {
            let size = source.to_file_path().and_then(|path| std::fs::metadata(path).ok()).map_or(0, |meta| meta.len());
            if size > max_size {
                warn!("[scan] skipping {} ({} bytes)", source.short_name(), size);
            }
            size <= max_size
        })
        .collect();
    info!("[scan] {} sources under {}", sources.len(), dir.display());

    let context = Arc::new(
        AnalysisContext::new(SourceFactory::with_file_system(), Arc::new(MemoryIndexStore::new())).with_settings(settings),
    );
    context.changed(sources.iter().cloned().fold(ChangeSet::new(), ChangeSet::added));

    let scheduler = AnalysisScheduler::start(context.clone(), settings.indexing.concurrency);
    scheduler.schedule(sources);
    if !scheduler.wait_for_idle(IDLE_TIMEOUT).await {
        scheduler.cancel();
        warn!("[scan] analysis did not finish within {:?}", IDLE_TIMEOUT);
    }
    let status = scheduler.status();
    info!("[scan] {} analysed, {} failed", status.completed, status.failed);
    scheduler.shutdown().await;

    let report = ProjectReport::build(&context);
    let json = serde_json::to_string_pretty(&report).map_err(|err| format!("cannot encode report: {err}"))?;
    println!("{json}");

    if let Some(path) = write_index {
        let mut file = File::create(path).map_err(|err| format!("cannot create {}: {}", path.display(), err))?;
        context.index().write_index(&*context, &mut file).map_err(|err| err.to_string())?;
        info!("[scan] index written to {}", path.display());
    }
    Ok(())
}

fn index_info(file: &Path) -> Result<(), String> {
    let handle = File::open(file).map_err(|err| format!("cannot open {}: {}", file.display(), err))?;
    let summary = read_summary(&mut BufReader::new(handle)).map_err(|err| err.to_string())?;
    let json = serde_json::to_string_pretty(&summary).map_err(|err| format!("cannot encode summary: {err}"))?;
    println!("{json}");
    Ok(())
}
