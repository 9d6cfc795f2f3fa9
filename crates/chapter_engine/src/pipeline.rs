use std::path::PathBuf;
use std::sync::mpsc;

use futures_util::stream::{self, StreamExt};
use thiserror::Error;

use crate::archive::{write_cbz, ArchiveError, ArchiveSettings};
use crate::fetch::{FetchContext, FetchSettings, ImageFetcher};
use crate::filter::AcceptancePolicy;
use crate::naming::page_filename;
use crate::staging::{StagingArea, StagingError};
use crate::{AcceptedPage, ChapterInput, FetchError, FetchedImage, PageStatus, RunEvent, RunSummary};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("no image locations provided")]
    EmptyInput,
    #[error("no images accepted for archiving")]
    NoImagesAccepted,
    #[error(transparent)]
    Staging(#[from] StagingError),
    #[error(transparent)]
    Archive(#[from] ArchiveError),
}

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub fetch: FetchSettings,
    pub filter: AcceptancePolicy,
    pub archive: ArchiveSettings,
    /// Bound on concurrent fetches against the origin server.
    pub concurrency: usize,
    /// Parent directory for the per-run staging area. System temp when
    /// unset.
    pub staging_root: Option<PathBuf>,
    /// User-Agent pool for fetches. The built-in browser pool applies
    /// when empty.
    pub user_agents: Vec<String>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            fetch: FetchSettings::default(),
            filter: AcceptancePolicy::default(),
            archive: ArchiveSettings::default(),
            concurrency: 1,
            staging_root: None,
            user_agents: Vec::new(),
        }
    }
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: RunEvent);
}

pub struct ChannelProgressSink {
    tx: mpsc::Sender<RunEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: mpsc::Sender<RunEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: RunEvent) {
        let _ = self.tx.send(event);
    }
}

/// Sink for callers that do not observe progress.
pub struct NullProgressSink;

impl ProgressSink for NullProgressSink {
    fn emit(&self, _event: RunEvent) {}
}

/// Drive one chapter end to end: fetch every location, filter by height,
/// assign sequence filenames, stage, and write the archive.
///
/// Per-item fetch and decode failures are logged and skipped; only empty
/// input, an empty accepted set, and archive/staging failures surface as
/// errors. The staging area is removed on every path, including archive
/// failure; an unwind drops the `StagingArea` handle which removes it too.
pub async fn run_chapter(
    fetcher: &dyn ImageFetcher,
    input: &ChapterInput,
    settings: &PipelineSettings,
    sink: &dyn ProgressSink,
) -> Result<RunSummary, RunError> {
    if input.locations.is_empty() {
        log::warn!(
            "no image locations for '{}' chapter {}",
            input.title,
            input.chapter_tag
        );
        return Err(RunError::EmptyInput);
    }

    let staging = StagingArea::new(settings.staging_root.as_deref())?;
    let result = assemble(fetcher, input, settings, sink, &staging).await;
    if let Err(err) = staging.close() {
        log::warn!("staging cleanup failed: {err}");
    }
    result
}

async fn assemble(
    fetcher: &dyn ImageFetcher,
    input: &ChapterInput,
    settings: &PipelineSettings,
    sink: &dyn ProgressSink,
    staging: &StagingArea,
) -> Result<RunSummary, RunError> {
    let context = FetchContext::new(&input.referer, input.cookies.clone())
        .with_user_agents(settings.user_agents.clone());
    sink.emit(RunEvent::Started {
        total: input.locations.len(),
    });

    let concurrency = settings.concurrency.max(1);
    let context_ref = &context;
    // Owned locations: the spawned run future must not capture stream
    // items by reference.
    let mut outcomes: Vec<(usize, Result<Option<FetchedImage>, FetchError>)> =
        stream::iter(input.locations.iter().cloned().enumerate())
            .map(|(index, location)| async move {
                let outcome = fetcher.fetch(&location, context_ref).await;
                (index, outcome)
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;
    // Sequence numbers follow original list order, never completion order.
    outcomes.sort_by_key(|(index, _)| *index);

    let mut accepted: Vec<AcceptedPage> = Vec::new();
    let mut rejected = 0;
    let mut skipped = 0;
    let mut failed = 0;

    for (index, outcome) in outcomes {
        let location = &input.locations[index];
        match outcome {
            Ok(None) => {
                skipped += 1;
                log::debug!("skipping branding asset {location}");
                emit_page(sink, index, location, PageStatus::Skipped);
            }
            Err(error) => {
                failed += 1;
                log::warn!("failed to fetch {location}: {error}");
                emit_page(
                    sink,
                    index,
                    location,
                    PageStatus::Failed {
                        reason: error.to_string(),
                    },
                );
            }
            Ok(Some(fetched)) => {
                if !settings.filter.accepts(&fetched) {
                    rejected += 1;
                    log::debug!("rejected {location} (height {}px)", fetched.height);
                    emit_page(
                        sink,
                        index,
                        location,
                        PageStatus::Rejected {
                            height: fetched.height,
                        },
                    );
                    continue;
                }
                let sequence = accepted.len() + 1;
                let filename = page_filename(&input.chapter_tag, sequence);
                match staging.store(&filename, &fetched.image) {
                    Ok(staged_path) => {
                        emit_page(
                            sink,
                            index,
                            location,
                            PageStatus::Accepted {
                                sequence,
                                height: fetched.height,
                            },
                        );
                        accepted.push(AcceptedPage {
                            sequence,
                            filename,
                            staged_path,
                        });
                    }
                    Err(error) => {
                        failed += 1;
                        log::error!("failed to stage {location}: {error}");
                        emit_page(
                            sink,
                            index,
                            location,
                            PageStatus::Failed {
                                reason: error.to_string(),
                            },
                        );
                    }
                }
            }
        }
    }

    if accepted.is_empty() {
        log::warn!(
            "no pages accepted for '{}' chapter {}, nothing to save",
            input.title,
            input.chapter_tag
        );
        return Err(RunError::NoImagesAccepted);
    }

    sink.emit(RunEvent::Archiving {
        pages: accepted.len(),
    });
    let archive_path = write_cbz(&settings.archive, &input.title, &input.chapter_tag, &accepted)?;
    log::info!(
        "saved {} pages into {}",
        accepted.len(),
        archive_path.display()
    );

    Ok(RunSummary {
        archive_path,
        accepted: accepted.len(),
        rejected,
        skipped,
        failed,
    })
}

fn emit_page(sink: &dyn ProgressSink, index: usize, location: &str, status: PageStatus) {
    sink.emit(RunEvent::Page {
        index,
        location: location.to_string(),
        status,
    });
}
