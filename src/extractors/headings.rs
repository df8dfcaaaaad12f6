use super::{markup, read_blocks, Block, LayoutDetector};
use crate::models::reading::SensorReading;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<h5\b[^>]*>.*?</h5>\s*<h4\b").unwrap());
static TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?is)<a\b(?P<attrs>[^>]*)>(?P<link>.*?)</a>|<h5\b[^>]*>(?P<label>.*?)</h5>|<h4\b[^>]*>(?P<value>.*?)</h4>",
    )
    .unwrap()
});

/// Older flat page: `<h5>label</h5><h4>value</h4>` pairs with sensors
/// introduced by a `deviceid` link or by an `ID` pair.
pub struct HeadingSequence;

#[derive(Default)]
struct PendingBlock {
    block: Block,
    has_id: bool,
}

impl PendingBlock {
    fn is_blank(&self) -> bool {
        self.block.text.is_empty()
    }
}

impl LayoutDetector for HeadingSequence {
    fn name(&self) -> &'static str {
        "heading-sequence"
    }

    fn matches(&self, markup: &str) -> bool {
        MARKER.is_match(markup)
    }

    fn extract(&self, markup: &str) -> Vec<SensorReading> {
        let mut names: HashMap<String, String> = HashMap::new();
        let mut blocks = Vec::new();
        let mut current: Option<PendingBlock> = None;
        let mut label: Option<String> = None;

        for caps in TOKEN.captures_iter(markup) {
            if let Some(link) = caps.name("link") {
                let attrs = caps.name("attrs").map_or("", |m| m.as_str());
                let Some(device_id) = markup::device_id(attrs) else {
                    continue;
                };
                let name = markup::inner_text(link.as_str());
                names.insert(device_id.clone(), name.clone());
                finish(&mut blocks, current.take());
                current = Some(PendingBlock {
                    block: Block {
                        heading: Some(name),
                        id_hint: Some(device_id),
                        text: String::new(),
                    },
                    has_id: false,
                });
            } else if let Some(text) = caps.name("label") {
                label = Some(markup::inner_text(text.as_str()));
            } else if let Some(text) = caps.name("value") {
                let Some(label) = label.take() else {
                    continue;
                };
                let value = markup::inner_text(text.as_str());

                // An `ID` pair opens a new sensor unless the current one was
                // just opened by the link of that same device.
                if label.eq_ignore_ascii_case("ID") {
                    let device_id = value.to_uppercase();
                    let reuse = current.as_ref().is_some_and(|pending| {
                        !pending.has_id
                            && pending.is_blank()
                            && pending.block.id_hint.as_ref().map_or(true, |hint| *hint == device_id)
                    });
                    if !reuse {
                        finish(&mut blocks, current.take());
                        current = Some(PendingBlock {
                            block: Block {
                                heading: names.get(&device_id).cloned(),
                                id_hint: Some(device_id),
                                text: String::new(),
                            },
                            has_id: false,
                        });
                    }
                    if let Some(pending) = current.as_mut() {
                        pending.has_id = true;
                    }
                }

                let pending = current.get_or_insert_with(PendingBlock::default);
                pending.block.text.push_str(&label);
                pending.block.text.push(' ');
                pending.block.text.push_str(&value);
                pending.block.text.push('\n');
            }
        }
        finish(&mut blocks, current.take());

        read_blocks(self.name(), &blocks)
    }
}

// Links that were never followed by any pair are dropped here.
fn finish(blocks: &mut Vec<Block>, pending: Option<PendingBlock>) {
    if let Some(pending) = pending {
        if !pending.is_blank() {
            blocks.push(pending.block);
        }
    }
}
