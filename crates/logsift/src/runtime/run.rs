//! Run — drive one pipeline per target folder and write the reports.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::conf::SiftConfig;
use crate::discovery;
use crate::error::SiftError;
use crate::pipeline::{Pipeline, RunSummary};
use crate::progress::LogProgress;
use crate::sink::{self, JsonLinesSink, ResultSink};

/// Progress is logged every 10%.
const PROGRESS_STEP: u32 = 10;

/// Process the configured root, or each of its immediate subfolders when
/// `output.per_folder` is set, writing result files for every run.
pub async fn run(config: SiftConfig, cancel: CancellationToken) -> Result<Vec<RunSummary>, SiftError> {
    let mut sink = JsonLinesSink::new(&config.output.directory, &config.output.file_prefix);
    run_with_sink(config, &mut sink, cancel).await
}

pub async fn run_with_sink(
    config: SiftConfig,
    sink: &mut dyn ResultSink,
    cancel: CancellationToken,
) -> Result<Vec<RunSummary>, SiftError> {
    let targets = if config.output.per_folder {
        discovery::subfolders(&config.discovery.root)?
    } else {
        vec![config.discovery.root.clone()]
    };
    info!(targets = targets.len(), "starting");

    let mut summaries = Vec::with_capacity(targets.len());
    for target in targets {
        if cancel.is_cancelled() {
            warn!(folder = %target.display(), "cancelled, skipping remaining folders");
            break;
        }

        let mut run_config = config.clone();
        run_config.discovery.root = target;
        summaries.push(run_folder(run_config, sink, cancel.clone()).await?);
    }

    let failed: usize = summaries.iter().map(|s| s.failures.len()).sum();
    info!(runs = summaries.len(), failed_files = failed, "All done");
    Ok(summaries)
}

async fn run_folder(
    config: SiftConfig,
    sink: &mut dyn ResultSink,
    cancel: CancellationToken,
) -> Result<RunSummary, SiftError> {
    let name = report_name(&config.discovery.root);
    let min_members = config.grouping.min_group_members;
    let pipeline = Pipeline::new(config)?;

    let summary = pipeline
        .run(Arc::new(LogProgress::new(PROGRESS_STEP)), cancel)
        .await?;
    if summary.is_cancelled() {
        warn!(folder = %name, "run cancelled, writing partial results");
    }
    if let Some((scanned, matched)) = pipeline.filter_stats() {
        info!(folder = %name, scanned, matched, "prefix filter");
    }
    for failure in &summary.failures {
        warn!(path = %failure.path.display(), error = %failure.error, "file was skipped");
    }

    sink.write_counts(&name, &pipeline.results())?;
    if let Some(groups) = pipeline.groups() {
        info!(folder = %name, groups = groups.len(), min_members, "grouped lines");
        sink.write_groups(&name, &groups)?;
    }

    Ok(summary)
}

fn report_name(root: &Path) -> String {
    let resolved = std::fs::canonicalize(root).unwrap_or_else(|_| PathBuf::from(root));
    sink::folder_name(&resolved)
}
