// FormatSelector - turns a raw catalog into the quality ladder
//
// Rules:
// - only video and combined descriptors are offered
// - anything taller than the cap (1080 by default) is dropped
// - one option per height, first descriptor in catalog order wins
// - ladder keeps catalog order, it is not sorted by height

use std::collections::HashSet;

use super::models::{MediaKind, QualityOption, StreamDescriptor};

/// Default ladder cap in pixels
pub const DEFAULT_MAX_HEIGHT: u32 = 1080;

/// Format selector for the interactive ladder
pub struct FormatSelector;

impl FormatSelector {
    /// Build the ladder, dropping every descriptor taller than `max_height`
    pub fn build_quality_options(
        streams: &[StreamDescriptor],
        max_height: u32,
    ) -> Vec<QualityOption> {
        let mut seen_heights = HashSet::new();

        streams
            .iter()
            .filter(|s| matches!(s.kind, MediaKind::Video | MediaKind::Combined))
            .filter(|s| s.height <= max_height)
            .filter(|s| seen_heights.insert(s.height))
            .map(|s| QualityOption {
                label: format!("{}p", s.height),
                descriptor: s.clone(),
            })
            .collect()
    }

    /// Highest-bitrate audio-only descriptor; ties go to the first one seen.
    pub fn find_best_audio(streams: &[StreamDescriptor]) -> Option<&StreamDescriptor> {
        // max_by_key returns the last maximum, so fold keeps the first instead
        streams
            .iter()
            .filter(|s| s.is_audio_only())
            .fold(None, |best: Option<&StreamDescriptor>, s| match best {
                Some(b) if b.bitrate >= s.bitrate => Some(b),
                _ => Some(s),
            })
    }
}
