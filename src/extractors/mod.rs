//! Sensor extraction from portal status pages.
//!
//! The portal has served several page layouts over time. Each one gets a
//! [`LayoutDetector`]; the [`Extractor`] probes them in priority order and
//! the first one that recognises the page (and yields readings) wins. Every
//! layout reduces the page to text [`Block`]s that go through the same label
//! table in [`fields`].

use crate::models::reading::SensorReading;
use crate::normalizer::naming;
use log::{debug, warn};
use std::time::Instant;
use thiserror::Error;

pub mod compact;
pub mod document;
pub mod fields;
pub mod headings;
pub mod markup;
pub mod sensor_blocks;

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("no sensor structure found in page")]
    NoStructure,

    #[error("block {index} holds neither fields nor an id")]
    EmptyBlock { index: usize },
}

/// One page layout the portal is known to serve.
pub trait LayoutDetector: Send + Sync {
    fn name(&self) -> &'static str;

    fn matches(&self, markup: &str) -> bool;

    fn extract(&self, markup: &str) -> Vec<SensorReading>;
}

/// Text of one sensor block plus whatever the layout knows about it.
#[derive(Debug, Clone, Default)]
pub struct Block {
    pub heading: Option<String>,
    pub id_hint: Option<String>,
    pub text: String,
}

/// Builds the reading for a block; `index` is its 1-based document position.
pub fn read_block(block: &Block, index: usize) -> Result<SensorReading, ParseError> {
    let scan = fields::scan(&block.text);
    if scan.is_empty() {
        return Err(ParseError::EmptyBlock { index });
    }

    let name = block
        .heading
        .as_deref()
        .map(str::trim)
        .filter(|heading| !heading.is_empty())
        .map(str::to_string)
        .or_else(|| {
            scan.first_label
                .and_then(|offset| markup::line_before(&block.text, offset))
        })
        .unwrap_or_else(|| naming::fallback_name(index));

    Ok(SensorReading {
        name,
        id: scan.id.or_else(|| block.id_hint.clone()),
        timestamp: scan.timestamp,
        fields: scan.fields,
    })
}

/// Reads every block, skipping (and logging) the ones that fail.
pub fn read_blocks(layout: &str, blocks: &[Block]) -> Vec<SensorReading> {
    let mut readings = Vec::with_capacity(blocks.len());
    for (i, block) in blocks.iter().enumerate() {
        match read_block(block, i + 1) {
            Ok(reading) => readings.push(reading),
            Err(e) => warn!("{} layout: skipping block: {}", layout, e),
        }
    }
    readings
}

pub struct Extractor {
    detectors: Vec<Box<dyn LayoutDetector>>,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::with_detectors(vec![
            Box::new(sensor_blocks::SensorBlocks),
            Box::new(headings::HeadingSequence),
            Box::new(compact::CompactPage),
            Box::new(document::DocumentScan),
        ])
    }
}

impl Extractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_detectors(detectors: Vec<Box<dyn LayoutDetector>>) -> Self {
        Self { detectors }
    }

    /// Extracts all sensor readings from a status page.
    pub fn extract(&self, markup: &str) -> Result<Vec<SensorReading>, ParseError> {
        let start = Instant::now();

        for detector in &self.detectors {
            if !detector.matches(markup) {
                continue;
            }

            let readings = detector.extract(markup);
            if readings.is_empty() {
                debug!("{} layout matched but yielded no readings", detector.name());
                continue;
            }

            debug!(
                "{} layout yielded {} readings in {} ms",
                detector.name(),
                readings.len(),
                start.elapsed().as_millis()
            );
            return Ok(readings);
        }

        Err(ParseError::NoStructure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::field::FieldKey;
    use crate::models::reading::FieldValue;

    const SENSOR_BLOCKS_PAGE: &str = r#"
        <html><body>
        <div class="sensor">
          <div class="sensor-header"><h3><a href="/Home/MeasurementDetails?deviceid=0301546EB8D5&amp;vendorid=1">Küche</a></h3></div>
          <div class="sensor-component"><h5>ID</h5><h4>0301546EB8D5</h4></div>
          <div class="sensor-component"><h5>Zeitpunkt</h5><h4>01.01.2024 12:00:00</h4></div>
          <div class="sensor-component"><h5>Temperatur</h5><h4>21,3 C</h4></div>
          <div class="sensor-component"><h5>Luftfeuchte</h5><h4>55%</h4></div>
        </div>
        <div class="sensor">
          <div class="sensor-header"><h3><a href="/Home/MeasurementDetails?deviceid=0B1122334455">Garten</a></h3></div>
          <div class="sensor-component"><h5>ID</h5><h4>0B1122334455</h4></div>
          <div class="sensor-component"><h5>Temperatur Außen</h5><h4>-2,5 C</h4></div>
        </div>
        </body></html>"#;

    #[test]
    fn test_compact_scenario() {
        let markup = "<div>Küche ID 1A2B3C Zeitpunkt 01.01.2024 12:00 Temperatur 21,3 C Luftfeuchte 55%</div>";
        let readings = Extractor::new().extract(markup).unwrap();

        assert_eq!(readings.len(), 1);
        let reading = &readings[0];
        assert_eq!(reading.name, "Küche");
        assert_eq!(reading.id.as_deref(), Some("1A2B3C"));
        assert_eq!(reading.timestamp.as_deref(), Some("01.01.2024 12:00"));
        assert_eq!(reading.number(FieldKey::Temperature), Some(21.3));
        assert_eq!(reading.number(FieldKey::Humidity), Some(55.0));
    }

    #[test]
    fn test_outside_temperature_only() {
        let markup = "<p>Balkon</p><p>Temperatur Außen -2,5 C</p>";
        let readings = Extractor::new().extract(markup).unwrap();

        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].number(FieldKey::TemperatureOut), Some(-2.5));
        assert_eq!(readings[0].field(FieldKey::Temperature), None);
    }

    #[test]
    fn test_fallback_document_scan() {
        let markup = r#"<html><body><table><tr><td>Werte: Temperatur 10,0 C</td></tr></table></body></html>"#;
        let extractor = Extractor::new();
        assert!(!sensor_blocks::SensorBlocks.matches(markup));
        assert!(!headings::HeadingSequence.matches(markup));
        assert!(!compact::CompactPage.matches(markup));

        let readings = extractor.extract(markup).unwrap();
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].number(FieldKey::Temperature), Some(10.0));
    }

    #[test]
    fn test_sensor_blocks_page() {
        let readings = Extractor::new().extract(SENSOR_BLOCKS_PAGE).unwrap();

        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0].name, "Küche");
        assert_eq!(readings[0].id.as_deref(), Some("0301546EB8D5"));
        assert_eq!(readings[0].timestamp.as_deref(), Some("01.01.2024 12:00:00"));
        assert_eq!(readings[0].number(FieldKey::Humidity), Some(55.0));
        assert_eq!(readings[1].name, "Garten");
        assert_eq!(readings[1].number(FieldKey::TemperatureOut), Some(-2.5));
        assert_eq!(readings[1].field(FieldKey::Temperature), None);
    }

    #[test]
    fn test_idempotent() {
        let extractor = Extractor::new();
        let first = extractor.extract(SENSOR_BLOCKS_PAGE).unwrap();
        let second = extractor.extract(SENSOR_BLOCKS_PAGE).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_no_structure() {
        let markup = "<html><body><h1>Wartungsarbeiten</h1></body></html>";
        assert_eq!(Extractor::new().extract(markup), Err(ParseError::NoStructure));
    }

    #[test]
    fn test_bad_block_does_not_stop_others() {
        let blocks = vec![
            Block {
                heading: Some("Leer".to_string()),
                id_hint: None,
                text: "Nichts zu sehen".to_string(),
            },
            Block {
                heading: None,
                id_hint: None,
                text: "Kontaktsensor geschlossen".to_string(),
            },
        ];
        let readings = read_blocks("test", &blocks);

        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].name, "Sensor_2");
        assert_eq!(readings[0].field(FieldKey::Contact), Some(&FieldValue::Boolean(false)));
    }

    #[test]
    fn test_id_hint_used_when_block_has_no_id() {
        let block = Block {
            heading: Some("Flur".to_string()),
            id_hint: Some("0A0B0C0D0E0F".to_string()),
            text: "Temperatur 19,5 C".to_string(),
        };
        let reading = read_block(&block, 1).unwrap();
        assert_eq!(reading.id.as_deref(), Some("0A0B0C0D0E0F"));
        assert_eq!(reading.name, "Flur");
    }
}
