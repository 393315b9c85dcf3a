//! Stage 4: Extraction & Canonicalization (spec §4.4). Parses raw retrieval
//! blobs, validates each object against the canonical schema, normalizes
//! synonyms, and computes completeness. Failure here is per-object: invalid
//! objects are discarded with a logged reason, never aborting the stage.

use plasticos_core::EdgeType;
use plasticos_schema::SynonymTable;
use tracing::debug;

use crate::context::{ExtractedRecord, RawRetrievalResult};

pub struct ExtractionStage<'a> {
    pub synonyms: &'a SynonymTable,
}

impl<'a> ExtractionStage<'a> {
    pub fn new(synonyms: &'a SynonymTable) -> Self {
        Self { synonyms }
    }

    /// Parses every raw blob as a JSON array of BCP-shaped objects,
    /// validates each element, and normalizes synonym terms in place.
    /// Returns the records that survived plus a warning per object that did
    /// not (unparseable blobs, or objects failing required-field
    /// validation).
    pub fn run(&self, raw_results: &[RawRetrievalResult]) -> (Vec<ExtractedRecord>, Vec<String>) {
        let mut records = Vec::new();
        let mut warnings = Vec::new();

        for result in raw_results {
            let parsed: Result<Vec<serde_json::Value>, _> = serde_json::from_str(&result.raw_text)
                .or_else(|_| serde_json::from_str::<serde_json::Value>(&result.raw_text).map(|v| vec![v]));

            let objects = match parsed {
                Ok(objects) => objects,
                Err(e) => {
                    warnings.push(format!(
                        "extraction: query {} returned unparseable blob: {e}",
                        result.query_id
                    ));
                    continue;
                }
            };

            for raw in objects {
                match plasticos_schema::validate(raw, EdgeType::Bcp) {
                    Ok(mut payload) => {
                        if let plasticos_schema::CanonicalPayload::Bcp(bcp) = &mut payload {
                            plasticos_schema::normalize_synonyms(bcp, self.synonyms);
                        }
                        let completeness = plasticos_schema::completeness(&payload);
                        if completeness < plasticos_schema::LOW_COMPLETENESS_THRESHOLD {
                            debug!(
                                query_id = %result.query_id,
                                completeness,
                                "extraction: below low-completeness threshold, flagging but keeping"
                            );
                        }
                        records.push(ExtractedRecord {
                            query_id: result.query_id,
                            payload,
                            completeness,
                        });
                    }
                    Err(e) => {
                        warnings.push(format!(
                            "extraction: query {} discarded an object: {e}",
                            result.query_id
                        ));
                    }
                }
            }
        }

        (records, warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plasticos_core::{EntityIdType, QueryId};

    fn raw(query_id: QueryId, text: &str) -> RawRetrievalResult {
        RawRetrievalResult { query_id, batch_index: 0, raw_text: text.to_string() }
    }

    fn sample_bcp_json() -> serde_json::Value {
        serde_json::json!({
            "company_name": "Globex",
            "buyer_location": "Houston, TX",
            "segments": [],
            "external_ids": [],
            "material": { "polymer": "HDPE", "forms": [], "colors": [], "applications": [], "process": [] },
            "specification": { "mfi_min": 1.0, "mfi_max": 5.0, "density_min": null, "density_max": null, "ash_max": null, "filler_types": [] },
            "contamination": { "max_ppm": 500.0, "banned": [] },
            "certifications": [],
            "pricing_band": { "min": null, "max": null, "currency": null, "incoterm": null },
            "geography": { "countries": ["US"], "states": [], "regions": [], "ports": [] },
            "logistics": { "min_load_lbs": null, "max_lane_distance_miles": null },
            "metadata": { "version": 1, "source": "test", "completeness_score": 0.0 }
        })
    }

    #[test]
    fn parses_a_json_array_of_bcps() {
        let synonyms = SynonymTable::default();
        let stage = ExtractionStage::new(&synonyms);
        let text = serde_json::to_string(&vec![sample_bcp_json()]).unwrap();
        let (records, warnings) = stage.run(&[raw(QueryId::now_v7(), &text)]);
        assert_eq!(records.len(), 1);
        assert!(warnings.is_empty());
    }

    #[test]
    fn unparseable_blob_produces_a_warning_and_no_records() {
        let synonyms = SynonymTable::default();
        let stage = ExtractionStage::new(&synonyms);
        let (records, warnings) = stage.run(&[raw(QueryId::now_v7(), "not json at all {{")]);
        assert!(records.is_empty());
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn invalid_object_is_discarded_but_others_survive() {
        let synonyms = SynonymTable::default();
        let stage = ExtractionStage::new(&synonyms);
        let mut bad = sample_bcp_json();
        bad["company_name"] = serde_json::Value::String(String::new());
        let text = serde_json::to_string(&vec![bad, sample_bcp_json()]).unwrap();
        let (records, warnings) = stage.run(&[raw(QueryId::now_v7(), &text)]);
        assert_eq!(records.len(), 1);
        assert_eq!(warnings.len(), 1);
    }
}
