use crate::FetchedImage;

/// Minimum-height rule separating genuine content pages from
/// low-resolution decorative assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcceptancePolicy {
    pub min_height: u32,
}

impl Default for AcceptancePolicy {
    fn default() -> Self {
        Self { min_height: 840 }
    }
}

impl AcceptancePolicy {
    pub fn new(min_height: u32) -> Self {
        Self { min_height }
    }

    /// Accept iff the decoded height reaches the threshold. Height is the
    /// sole criterion; width, format and content are never inspected.
    pub fn accepts(&self, image: &FetchedImage) -> bool {
        image.height >= self.min_height
    }
}
