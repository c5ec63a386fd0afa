//! libros-cover: print the detected cover of one or more EPUB files

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::error::Elapsed;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use libros_cover::package::load_package;
use libros_cover::{
    record_attempt, ArchiveError, CoverConfig, CoverPipeline, CoverResult, DetectionMethod,
    EpubArchive, HrefResolution, LocatedPackage, MemoryStatsSink,
};

#[derive(Debug, Parser)]
#[command(name = "libros-cover", version, about = "Detect the cover image of EPUB files")]
struct Cli {
    /// EPUB files to inspect
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Emit one JSON object per file
    #[arg(long)]
    json: bool,

    /// Base directory rule for manifest hrefs (package or legacy)
    #[arg(long)]
    resolution: Option<HrefResolution>,

    /// Give up on a file after this many seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Fuzzy search candidates decoded before giving up
    #[arg(long)]
    fuzzy_candidates: Option<usize>,

    /// Files inspected at once (defaults to the available parallelism)
    #[arg(long)]
    jobs: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Report {
    file: PathBuf,
    found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    method: Option<DetectionMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cover: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<(u32, u32)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    creators: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

type Outcome = Result<CoverResult, ArchiveError>;

type Joined<T> = Result<Result<T, JoinError>, Elapsed>;

fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// Run `work` for every path on the blocking pool, at most `jobs` at a time
///
/// Each file's timeout starts once it holds a worker slot, so queued files
/// are never charged for time spent waiting.
fn spawn_all<T, F>(
    paths: Vec<PathBuf>,
    limit: Duration,
    jobs: usize,
    work: F,
) -> Vec<JoinHandle<(PathBuf, Joined<T>, Duration)>>
where
    T: Send + 'static,
    F: Fn(&Path) -> T + Send + Sync + 'static,
{
    let work = Arc::new(work);
    let slots = Arc::new(Semaphore::new(jobs.max(1)));

    paths
        .into_iter()
        .map(|path| {
            let work = Arc::clone(&work);
            let slots = Arc::clone(&slots);
            tokio::spawn(async move {
                // The semaphore is never closed
                let permit = slots.acquire_owned().await.ok();
                let started = Instant::now();
                let blocking = tokio::task::spawn_blocking({
                    let path = path.clone();
                    // A timed-out file keeps its slot until the work really ends
                    move || {
                        let _permit = permit;
                        work(&path)
                    }
                });
                let joined = tokio::time::timeout(limit, blocking).await;
                (path, joined, started.elapsed())
            })
        })
        .collect()
}

/// Open, parse and run the pipeline, keeping the package for reporting
fn inspect(pipeline: &CoverPipeline, path: &Path) -> (Outcome, Option<LocatedPackage>) {
    let mut archive = match EpubArchive::open(path) {
        Ok(archive) => archive,
        Err(e) => return (Err(e), None),
    };
    let package = load_package(&mut archive, pipeline.config().max_entry_bytes);
    let result = pipeline.run(&mut archive, package.as_ref());
    (Ok(result), package)
}

fn report(file: PathBuf, outcome: &Outcome, package: Option<LocatedPackage>) -> Report {
    let (title, creators) = package
        .map(|p| (p.document.title, p.document.creators))
        .unwrap_or_default();

    let mut report = Report {
        file,
        found: false,
        method: None,
        cover: None,
        dimensions: None,
        title,
        creators,
        error: None,
    };

    match outcome {
        Ok(CoverResult::Success {
            path,
            image,
            method,
        }) => {
            report.found = true;
            report.method = Some(*method);
            report.cover = Some(path.clone());
            report.dimensions = Some((image.width(), image.height()));
        }
        Ok(CoverResult::Failure { reason }) => report.error = Some(reason.clone()),
        Err(e) => report.error = Some(e.to_string()),
    }

    report
}

fn print_report(report: &Report, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(report)?);
        return Ok(());
    }

    match (&report.method, &report.cover, report.dimensions) {
        (Some(method), Some(cover), Some((w, h))) => {
            println!("{}\t{}\t{}\t{}x{}", report.file.display(), method, cover, w, h)
        }
        _ => println!(
            "{}\t-\t{}",
            report.file.display(),
            report.error.as_deref().unwrap_or("unknown error")
        ),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "libros_cover=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = CoverConfig::from_env().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config from env: {}, using defaults", e);
        CoverConfig::default()
    });
    if let Some(rule) = cli.resolution {
        config = config.with_href_resolution(rule);
    }
    if let Some(count) = cli.fuzzy_candidates {
        config = config.with_fuzzy_candidates(count);
    }

    tracing::debug!("Cover config: {:?}", config);

    let pipeline = Arc::new(CoverPipeline::new(config));
    let sink = MemoryStatsSink::new();
    let limit = Duration::from_secs(cli.timeout_secs);

    let jobs = cli.jobs.unwrap_or_else(default_jobs);
    let tasks = spawn_all(cli.paths.clone(), limit, jobs, move |path: &Path| {
        inspect(&pipeline, path)
    });

    for task in tasks {
        let (path, joined, elapsed) = task.await?;

        let (outcome, package) = match joined {
            Ok(Ok(done)) => done,
            Ok(Err(e)) => {
                tracing::error!("Extraction task for {} failed: {}", path.display(), e);
                (Ok(CoverResult::failure(format!("extraction task failed: {}", e))), None)
            }
            Err(_) => {
                tracing::warn!("{} timed out after {}s", path.display(), limit.as_secs());
                (Ok(CoverResult::failure("timed out")), None)
            }
        };

        record_attempt(Some(&sink), &outcome, elapsed);
        print_report(&report(path, &outcome, package), cli.json)?;
    }

    let summary = sink.summary();
    tracing::info!(
        "Processed {} file(s): {} with cover, {}ms total, by method {:?}",
        summary.total,
        summary.succeeded,
        summary.total_duration_ms,
        summary.by_method
    );

    Ok(())
}
