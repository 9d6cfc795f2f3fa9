use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use image::DynamicImage;

/// Input contract from the upstream page-automation layer: everything a
/// single chapter run needs, already resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterInput {
    pub title: String,
    /// Normalized chapter label, digits and hyphens only.
    pub chapter_tag: String,
    /// The chapter page URL the images were discovered on.
    pub referer: String,
    pub cookies: BTreeMap<String, String>,
    /// Image URLs in reading order.
    pub locations: Vec<String>,
}

/// One retrieved and decoded page image, before filtering.
#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub location: String,
    pub image: DynamicImage,
    pub width: u32,
    pub height: u32,
}

/// A page that passed the filter and was written to the staging area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedPage {
    /// 1-based, in acceptance order.
    pub sequence: usize,
    pub filename: String,
    pub staged_path: PathBuf,
}

/// Totals for one completed chapter run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub archive_path: PathBuf,
    pub accepted: usize,
    pub rejected: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Per-item outcome reported through the progress sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageStatus {
    Skipped,
    Accepted { sequence: usize, height: u32 },
    Rejected { height: u32 },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    Started {
        total: usize,
    },
    Page {
        /// Position in the original location list, 0-based.
        index: usize,
        location: String,
        status: PageStatus,
    },
    Archiving {
        pages: usize,
    },
    Completed {
        result: Result<RunSummary, String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for FetchError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
    /// Payload retrieved but not decodable as an image.
    Decode,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Decode => write!(f, "image decode error"),
        }
    }
}
