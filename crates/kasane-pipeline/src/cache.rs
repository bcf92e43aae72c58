//! Per-stage result cache.
//!
//! Maps pipeline positions to the raster produced by executing the
//! prefix of the operation list ending at that position. The session
//! maintains the invariant that every cached entry reflects the current
//! list: each list mutation drops every entry at or beyond its first
//! invalidated position, so a hit is always safe to reuse.
//!
//! Positions are sparse. A walk back from a requested position finds
//! the nearest cached stage at or before it, which bounds recomputation
//! to the edited suffix.

use std::collections::BTreeMap;
use std::hash::Hasher;

use siphasher::sip::SipHasher13;

use crate::types::RgbaImage;

/// Sparse map from pipeline position to that stage's output raster.
#[derive(Debug, Clone, Default)]
pub struct StageCache {
    stages: BTreeMap<usize, RgbaImage>,
}

impl StageCache {
    /// Create an empty cache.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            stages: BTreeMap::new(),
        }
    }

    /// The cached output of stage `position`, if present.
    #[must_use]
    pub fn get(&self, position: usize) -> Option<&RgbaImage> {
        self.stages.get(&position)
    }

    /// Store the output of stage `position`, replacing any previous
    /// entry.
    pub fn put(&mut self, position: usize, image: RgbaImage) {
        self.stages.insert(position, image);
    }

    /// The highest cached position at or before `position`, with its
    /// raster.
    #[must_use]
    pub fn nearest_at_or_before(&self, position: usize) -> Option<(usize, &RgbaImage)> {
        self.stages
            .range(..=position)
            .next_back()
            .map(|(&p, image)| (p, image))
    }

    /// Drop every entry at or beyond the first invalidated position.
    /// `None` leaves the cache untouched.
    pub fn invalidate_from(&mut self, first_invalid: Option<usize>) {
        if let Some(position) = first_invalid {
            self.stages.retain(|&p, _| p < position);
        }
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.stages.clear();
    }

    /// Number of cached stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Whether no stage is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Fingerprint of the cached raster at `position`, if present.
    ///
    /// Lets tests assert that a stage was reused rather than recomputed
    /// without cloning whole rasters.
    #[must_use]
    pub fn fingerprint(&self, position: usize) -> Option<u64> {
        self.stages.get(&position).map(fingerprint_image)
    }
}

/// SipHash-1-3 digest of an image's dimensions and raw RGBA bytes.
#[must_use]
pub fn fingerprint_image(image: &RgbaImage) -> u64 {
    let mut hasher = SipHasher13::new();
    hasher.write_u32(image.width());
    hasher.write_u32(image.height());
    hasher.write(image.as_raw());
    hasher.finish()
}
