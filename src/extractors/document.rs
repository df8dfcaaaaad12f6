use super::{fields, markup, read_blocks, Block, LayoutDetector};
use crate::models::reading::SensorReading;
use log::debug;

/// Last resort: scan the whole document for known labels.
pub struct DocumentScan;

impl LayoutDetector for DocumentScan {
    fn name(&self) -> &'static str {
        "document-scan"
    }

    fn matches(&self, _markup: &str) -> bool {
        true
    }

    fn extract(&self, markup: &str) -> Vec<SensorReading> {
        let text = markup::to_text(markup);

        // A lone id somewhere on an unknown page is not a reading.
        if fields::scan(&text).fields.is_empty() {
            debug!("Document scan found no field labels");
            return Vec::new();
        }

        let block = Block {
            heading: None,
            id_hint: None,
            text,
        };
        read_blocks(self.name(), &[block])
    }
}
