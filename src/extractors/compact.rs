use super::{markup, read_blocks, Block, LayoutDetector};
use crate::models::reading::SensorReading;
use once_cell::sync::Lazy;
use regex::Regex;

// "ID <hex>" followed somewhere later by the "Zeitpunkt" label.
static MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bID\s*:?\s*[0-9A-Fa-f]{6,16}\b(?s:.*?)\b(?i:Zeitpunkt|Timestamp)\b").unwrap()
});

/// Single-sensor page without any per-sensor grouping; the whole page is
/// one reading.
pub struct CompactPage;

impl LayoutDetector for CompactPage {
    fn name(&self) -> &'static str {
        "compact"
    }

    fn matches(&self, markup: &str) -> bool {
        MARKER.is_match(&markup::to_text(markup))
    }

    fn extract(&self, markup: &str) -> Vec<SensorReading> {
        let block = Block {
            heading: None,
            id_hint: None,
            text: markup::to_text(markup),
        };
        read_blocks(self.name(), &[block])
    }
}
