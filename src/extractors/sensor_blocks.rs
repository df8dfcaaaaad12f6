use super::{markup, read_blocks, Block, LayoutDetector};
use crate::models::reading::SensorReading;
use once_cell::sync::Lazy;
use regex::Regex;

// Opening tag of an element whose class list contains exactly `sensor`
// (not `sensor-header` or `sensor-component`).
static BLOCK_START: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<(?:div|section|article|li|tr)\b[^>]*\bclass\s*=\s*["'](?:[^"']*\s)?sensor(?:\s[^"']*)?["'][^>]*>"#)
        .unwrap()
});

/// Current overview page: one element per sensor tagged `class="sensor"`.
pub struct SensorBlocks;

impl LayoutDetector for SensorBlocks {
    fn name(&self) -> &'static str {
        "sensor-blocks"
    }

    fn matches(&self, markup: &str) -> bool {
        BLOCK_START.is_match(markup)
    }

    fn extract(&self, markup: &str) -> Vec<SensorReading> {
        let starts: Vec<usize> = BLOCK_START.find_iter(markup).map(|m| m.start()).collect();

        let blocks: Vec<Block> = starts
            .iter()
            .enumerate()
            .map(|(i, &start)| {
                let end = starts.get(i + 1).copied().unwrap_or(markup.len());
                let fragment = &markup[start..end];
                let (heading, body) = markup::split_heading(fragment);
                Block {
                    heading,
                    id_hint: markup::device_id(fragment),
                    text: markup::to_text(&body),
                }
            })
            .collect();

        read_blocks(self.name(), &blocks)
    }
}
