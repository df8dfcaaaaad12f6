use crate::models::field::FieldKey;
use crate::models::reading::FieldValue;
use crate::normalizer::{self, FieldCoercionError, ValueShape};
use indexmap::IndexMap;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::ops::Range;

// Numbers must not run straight into a letter, so "Regen 1h" is never read
// as rain_total = 1.
const NUMBER_VALUE: &str = r"(?P<value>[-+]?[\d.,]*\d|-{2,}(?:[.,]-+)?|(?:OFL|OL)\b|n/a)(?:[^\p{L}\p{N}]|$)";
const NUMBER_SEPARATOR: &str = r"\s*:?\s*";
const WORD_VALUE: &str = r"(?P<value>\p{L}[\p{L}-]*)";
const WORD_SEPARATOR: &str = r"(?:\s*:\s*|\s+)";

static DEVICE_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?P<phone>(?i:phone)\s*)?\bID\s*:?\s*(?P<value>[0-9A-Fa-f]{6,16})\b").unwrap());
static TIMESTAMP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:Zeitpunkt|Timestamp)\s*:?\s*(?P<value>\d{1,2}[./-]\d{1,2}[./-]\d{2,4}(?:,?\s+\d{1,2}:\d{2}(?::\d{2})?(?:\s*[ap]m)?)?)",
    )
    .unwrap()
});

/// Labels sharing a family compete: a generic label only applies when no
/// qualified label of its family matched in the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Family {
    Temperature,
    Humidity,
}

struct LabelRule {
    key: FieldKey,
    family: Option<Family>,
    qualified: bool,
    pattern: Regex,
}

fn rule(key: FieldKey, family: Option<Family>, qualified: bool, label: &str) -> LabelRule {
    let (separator, value) = match key.shape() {
        ValueShape::Number => (NUMBER_SEPARATOR, NUMBER_VALUE),
        ValueShape::State | ValueShape::Text => (WORD_SEPARATOR, WORD_VALUE),
    };
    let pattern = format!(r"(?i)\b(?:{label}){separator}{value}");
    LabelRule {
        key,
        family,
        qualified,
        pattern: Regex::new(&pattern).unwrap(),
    }
}

// Qualified labels come first; matching order is table order.
static RULES: Lazy<Vec<LabelRule>> = Lazy::new(|| {
    use FieldKey::*;
    let temperature = Some(Family::Temperature);
    let humidity = Some(Family::Humidity);

    let mut rules = vec![
        rule(TemperatureIn, temperature, true, r"Temperatur\s+Innen|Temperature\s+in(?:side)?"),
        rule(TemperatureOut, temperature, true, r"Temperatur\s+Au(?:ß|ss)en|Temperature\s+out(?:side)?"),
        rule(TemperatureCable, temperature, true, r"Temperatur\s+Kabel(?:sensor)?|Temperature\s+cable(?:\s+sensor)?"),
    ];
    for probe in 1..=8u8 {
        rules.push(rule(
            TemperatureProbe(probe),
            None,
            true,
            &format!(r"Temperatur(?:e)?\s+(?:Sensor|Fühler|Probe)\s*{probe}\b"),
        ));
    }
    rules.extend([
        rule(HumidityIn, humidity, true, r"Luftfeuchte\s+Innen|Humidity\s+in(?:side)?"),
        rule(HumidityOut, humidity, true, r"Luftfeuchte\s+Au(?:ß|ss)en|Humidity\s+out(?:side)?"),
        rule(HumidityAvg3h, None, true, r"Durchschn(?:itt|\.)?\s*Luftf(?:euchte|\.)?\s*3\s*h|Avg\.?\s*humidity\s*3\s*h"),
        rule(HumidityAvg24h, None, true, r"Durchschn(?:itt|\.)?\s*Luftf(?:euchte|\.)?\s*24\s*h|Avg\.?\s*humidity\s*24\s*h"),
        rule(HumidityAvg7d, None, true, r"Durchschn(?:itt|\.)?\s*Luftf(?:euchte|\.)?\s*7\s*d|Avg\.?\s*humidity\s*7\s*d"),
        rule(HumidityAvg30d, None, true, r"Durchschn(?:itt|\.)?\s*Luftf(?:euchte|\.)?\s*30\s*d|Avg\.?\s*humidity\s*30\s*d"),
        rule(Rain1h, None, true, r"Regen\s+(?:1\s*h|letzte\s+Stunde)|Rain\s+1\s*h"),
        rule(Rain24h, None, true, r"Regen\s+24\s*h|Rain\s+24\s*h"),
        rule(Temperature, temperature, false, r"Temperatur|Temperature"),
        rule(Humidity, humidity, false, r"Luftfeuchte|Luftfeuchtigkeit|Humidity"),
        rule(RainTotal, None, false, r"Regen(?:\s+gesamt)?|Rain(?:\s+total)?"),
        rule(WindSpeed, None, false, r"Windgeschwindigkeit|Wind\s*speed"),
        rule(WindGust, None, false, r"Windb(?:ö|oe)e|B(?:ö|oe)en?|Wind\s*gust|Gust"),
        rule(WindDirection, None, false, r"Windrichtung|Wind\s*direction"),
        rule(Battery, None, false, r"Batterie(?:status)?|Battery(?:\s+status)?"),
        rule(Contact, None, false, r"Fensterkontakt|Türkontakt|Kontaktsensor|Kontakt|Contact\s+sensor|Contact"),
        rule(Wet, None, false, r"Wassersensor|Wassermelder|Feuchtesensor|Nässesensor|Water\s+sensor|Moisture"),
    ]);
    rules
});

/// Everything found in one block of text.
#[derive(Debug, Default, PartialEq)]
pub struct BlockScan {
    pub id: Option<String>,
    pub timestamp: Option<String>,
    /// Fields in document order.
    pub fields: IndexMap<FieldKey, FieldValue>,
    /// Labels that matched but whose value could not be coerced.
    pub rejected: Vec<(FieldKey, FieldCoercionError)>,
    /// Byte offset of the earliest matched label.
    pub first_label: Option<usize>,
}

impl BlockScan {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.id.is_none()
    }

    fn note_label(&mut self, start: usize) {
        self.first_label = Some(self.first_label.map_or(start, |first| first.min(start)));
    }
}

fn overlaps(claimed: &[Range<usize>], span: &Range<usize>) -> bool {
    claimed
        .iter()
        .any(|other| span.start < other.end && other.start < span.end)
}

/// Runs the label table over `text`.
///
/// Each key takes its first unclaimed match. A match claims its span so
/// later (less specific) labels cannot re-read the same text.
pub fn scan(text: &str) -> BlockScan {
    let mut result = BlockScan::default();
    let mut claimed: Vec<Range<usize>> = Vec::new();

    if let Some(caps) = DEVICE_ID.captures_iter(text).find(|caps| caps.name("phone").is_none()) {
        if let (Some(whole), Some(value)) = (caps.get(0), caps.name("value")) {
            result.id = Some(value.as_str().to_uppercase());
            result.note_label(whole.start());
            claimed.push(whole.range());
        }
    }

    if let Some(caps) = TIMESTAMP.captures(text) {
        if let (Some(whole), Some(value)) = (caps.get(0), caps.name("value")) {
            result.timestamp = Some(value.as_str().to_string());
            result.note_label(whole.start());
            claimed.push(whole.range());
        }
    }

    let mut matched_families: HashSet<Family> = HashSet::new();
    let mut found: Vec<(usize, FieldKey, FieldValue)> = Vec::new();

    for rule in RULES.iter() {
        if let Some(family) = rule.family {
            if !rule.qualified && matched_families.contains(&family) {
                debug!("Skipping generic {} label, a qualified one matched", rule.key);
                continue;
            }
        }

        for caps in rule.pattern.captures_iter(text) {
            let (Some(whole), Some(value)) = (caps.get(0), caps.name("value")) else {
                continue;
            };
            let span = whole.start()..value.end();
            if overlaps(&claimed, &span) {
                continue;
            }

            // A value that does not coerce leaves the text unclaimed and the
            // rule keeps looking further down the block.
            let field = match normalizer::coerce(rule.key, value.as_str()) {
                Ok(field) => field,
                Err(e) => {
                    debug!("Dropping {} match {:?}: {}", rule.key, whole.as_str(), e);
                    result.rejected.push((rule.key, e));
                    continue;
                }
            };

            claimed.push(span);
            result.note_label(whole.start());
            if rule.qualified {
                if let Some(family) = rule.family {
                    matched_families.insert(family);
                }
            }
            found.push((whole.start(), rule.key, field));
            break;
        }
    }

    found.sort_by_key(|(start, _, _)| *start);
    result.fields = found.into_iter().map(|(_, key, value)| (key, value)).collect();
    result
}
