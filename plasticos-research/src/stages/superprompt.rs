//! Stage 2: Superprompt (spec §4.4). For each planned query, emits one or
//! more schema-constrained prompts requesting a JSON array of BCP-shaped
//! objects. Failure here is fatal only for the offending planned query;
//! other queries proceed (spec's per-query failure semantics).

use crate::context::{PlannedQuery, SchemaPrompt};

/// Fields the superprompt text enumerates as required/optional, mirroring
/// `BuyerCriteriaProfile`'s shape (spec §3).
const REQUIRED_FIELDS: &[&str] = &["company_name", "buyer_location", "material.polymer"];
const OPTIONAL_FIELDS: &[&str] = &[
    "segments",
    "specification.mfi_min",
    "specification.mfi_max",
    "specification.density_min",
    "specification.density_max",
    "contamination.max_ppm",
    "certifications",
    "pricing_band.min",
    "pricing_band.max",
    "geography.countries",
    "geography.regions",
];

pub struct SuperpromptStage;

impl SuperpromptStage {
    /// Builds one schema-constrained prompt per planned query. Returns the
    /// prompts that could be built plus a warning per query that could not
    /// (an empty `scope` is the only failure mode today).
    pub fn run(&self, planned_queries: &[PlannedQuery]) -> (Vec<SchemaPrompt>, Vec<String>) {
        let mut prompts = Vec::with_capacity(planned_queries.len());
        let mut warnings = Vec::new();

        for query in planned_queries {
            if query.scope.trim().is_empty() {
                warnings.push(format!(
                    "superprompt: skipping query {} with empty scope",
                    query.query_id
                ));
                continue;
            }
            prompts.push(SchemaPrompt {
                query_id: query.query_id,
                text: render_prompt(query),
            });
        }

        (prompts, warnings)
    }
}

fn render_prompt(query: &PlannedQuery) -> String {
    format!(
        "Research goal: {}\n\
         Return a JSON array of objects shaped like a Buyer Criteria Profile.\n\
         Required fields: {}.\n\
         Optional fields (include when known): {}.\n\
         Respond with structured JSON only, no prose.",
        query.scope,
        REQUIRED_FIELDS.join(", "),
        OPTIONAL_FIELDS.join(", "),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use plasticos_core::{EntityIdType, QueryId};

    fn sample_query(scope: &str) -> PlannedQuery {
        PlannedQuery {
            query_id: QueryId::now_v7(),
            polymer: "HDPE".into(),
            region: None,
            scope: scope.into(),
            depth: 1,
            retrieval_params: crate::context::RetrievalParams { max_results: 20 },
        }
    }

    #[test]
    fn builds_one_prompt_per_query() {
        let stage = SuperpromptStage;
        let (prompts, warnings) = stage.run(&[sample_query("a"), sample_query("b")]);
        assert_eq!(prompts.len(), 2);
        assert!(warnings.is_empty());
    }

    #[test]
    fn empty_scope_is_skipped_with_a_warning() {
        let stage = SuperpromptStage;
        let (prompts, warnings) = stage.run(&[sample_query("")]);
        assert!(prompts.is_empty());
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn prompt_text_carries_the_schema_hint() {
        let stage = SuperpromptStage;
        let (prompts, _) = stage.run(&[sample_query("HDPE buyers")]);
        assert!(prompts[0].text.contains("company_name"));
        assert!(prompts[0].text.contains("JSON array"));
    }
}
