use crate::{
    config::Config,
    engine::{python::PythonEngine, Engine},
    pipeline::Pipeline,
    report::summary_lines,
    sample::select_inputs,
    util::ensure_dir,
};
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Parser, Debug)]
#[command(name = "pdf-harvest")]
#[command(about = "Convert a random sample of PDFs to markdown and build a training example")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Path to config TOML. If omitted, uses ./pdf-harvest.toml if present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check the python runner and pymupdf4llm.
    Doctor {},
    /// Show which files a run would pick, without converting.
    Sample {
        #[arg(long, short = 'i')]
        input_folder: PathBuf,
        #[arg(long)]
        sample_size: Option<usize>,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Convert a random sample and write the combined artifacts.
    Run {
        #[arg(long, short = 'i')]
        input_folder: PathBuf,
        /// Defaults to `paths.out_dir` (markdown_output).
        #[arg(long, short = 'o')]
        output_folder: Option<PathBuf>,
        /// Worker threads; 0 picks min(32, available cores).
        #[arg(long, short = 'n')]
        max_workers: Option<usize>,
        #[arg(long)]
        sample_size: Option<usize>,
        #[arg(long)]
        seed: Option<u64>,
    },
}

pub fn dispatch(args: Args) -> Result<()> {
    let mut cfg = Config::resolve(args.config.as_deref())?;

    match &args.cmd {
        Command::Doctor {} => {
            let _guard = init_logging(&args, &cfg, None)?;
            doctor(&cfg)
        }
        Command::Sample {
            input_folder,
            sample_size,
            seed,
        } => {
            apply_overrides(&mut cfg, None, *sample_size, *seed);
            let _guard = init_logging(&args, &cfg, None)?;
            sample(&cfg, input_folder)
        }
        Command::Run {
            input_folder,
            output_folder,
            max_workers,
            sample_size,
            seed,
        } => {
            apply_overrides(&mut cfg, *max_workers, *sample_size, *seed);
            let out_dir = output_folder
                .clone()
                .unwrap_or_else(|| PathBuf::from(&cfg.paths.out_dir));
            ensure_dir(&out_dir)?;
            let log_path = resolve_log_path(&cfg, &out_dir);
            let _guard = init_logging(&args, &cfg, log_path.as_deref())?;
            run(&cfg, input_folder, &out_dir)
        }
    }
}

fn apply_overrides(
    cfg: &mut Config,
    max_workers: Option<usize>,
    sample_size: Option<usize>,
    seed: Option<u64>,
) {
    if let Some(n) = max_workers {
        cfg.batch.max_workers = n;
    }
    if let Some(n) = sample_size {
        cfg.batch.sample_size = n;
    }
    if seed.is_some() {
        cfg.batch.seed = seed;
    }
}

fn init_logging(
    args: &Args,
    cfg: &Config,
    file_path: Option<&Path>,
) -> Result<Option<WorkerGuard>> {
    let level = args
        .log_level
        .as_deref()
        .unwrap_or(cfg.logging.level.as_str());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stdout_layer = if cfg.logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_names(true)
            .boxed()
    };

    let (file_layer, guard) = if let Some(path) = file_path {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        ensure_dir(parent)?;
        let file = std::fs::File::create(path)
            .with_context(|| format!("create log file: {}", path.display()))?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .with_thread_names(true)
            .boxed();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(guard)
}

fn doctor(cfg: &Config) -> Result<()> {
    let engine = PythonEngine::new(cfg)?;
    let diag = engine.doctor()?;
    println!("{}", serde_json::to_string_pretty(&diag)?);
    Ok(())
}

fn sample(cfg: &Config, input: &Path) -> Result<()> {
    let (total, selected) = select_inputs(cfg, input)?;
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "input_folder": input,
            "total": total,
            "sample_size": cfg.batch.sample_size,
            "selected": selected,
        }))?
    );
    Ok(())
}

fn run(cfg: &Config, input: &Path, out_dir: &Path) -> Result<()> {
    info!("input folder: {}", input.display());
    info!("output folder: {}", out_dir.display());

    if cfg.output.dump_effective_config {
        let raw = toml::to_string(cfg).unwrap_or_default();
        std::fs::write(out_dir.join("effective-config.toml"), raw)?;
    }

    let engine = PythonEngine::new(cfg)?;
    let pipeline = Pipeline::new(cfg, engine)?;
    let batch = pipeline.run(input, out_dir)?;

    if cfg.batch.print_summary {
        println!("{}", "=".repeat(50));
        for line in summary_lines(&batch.result) {
            println!("{line}");
        }
        println!("{}", "=".repeat(50));
        println!("Detailed results saved to: {}", batch.results_path.display());
    }

    Ok(())
}

fn resolve_log_path(cfg: &Config, out_dir: &Path) -> Option<PathBuf> {
    if !cfg.logging.write_to_file {
        return None;
    }

    if !cfg.logging.file_path.is_empty() {
        return Some(PathBuf::from(&cfg.logging.file_path));
    }

    Some(out_dir.join("pdf-harvest.log"))
}
