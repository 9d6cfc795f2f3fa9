//! Chapter packaging engine: fetch page images, filter by height, assign
//! deterministic names, stage, and assemble one CBZ per chapter.
mod archive;
mod engine;
mod fetch;
mod filter;
mod naming;
mod pipeline;
mod staging;
mod types;

pub use archive::{ensure_output_dir, write_cbz, ArchiveError, ArchiveSettings};
pub use engine::PipelineHandle;
pub use fetch::{
    is_branding_asset, FetchContext, FetchSettings, ImageFetcher, ReqwestImageFetcher,
    DEFAULT_USER_AGENTS,
};
pub use filter::AcceptancePolicy;
pub use naming::{normalize_chapter_tag, page_filename, sanitize_title};
pub use pipeline::{
    run_chapter, ChannelProgressSink, NullProgressSink, PipelineSettings, ProgressSink, RunError,
};
pub use staging::{StagingArea, StagingError};
pub use types::{
    AcceptedPage, ChapterInput, FailureKind, FetchError, FetchedImage, PageStatus, RunEvent,
    RunSummary,
};
