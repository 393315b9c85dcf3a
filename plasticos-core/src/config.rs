//! Master configuration (spec §6 "Configuration").
//!
//! Every option spec.md §6 enumerates is a field here. `PlasticConfig::from_env`
//! loads from environment variables; `validate()` runs a fatal-at-startup
//! pass (spec §7 `ConfigurationError`). All values are required except where
//! a documented default applies.

use crate::{ConfigurationError, MatchWeights, PlasticError, ResearchClientKind, VectorIndexType};
use serde::{Deserialize, Serialize};

/// Master configuration struct. Mirrors spec.md §6's enumerated option list
/// one-for-one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PlasticConfig {
    pub postgres_dsn: String,

    pub graph_uri: String,
    pub graph_user: String,
    pub graph_password: String,

    pub research_client_type: ResearchClientKind,
    pub research_client_api_key: Option<String>,

    pub embedding_model: String,
    pub embedding_dim: i32,
    pub vector_index_type: VectorIndexType,

    pub top_k_default: usize,
    pub match_weights: MatchWeights,

    pub job_timeout_seconds: u64,
    pub retrieval_timeout_seconds: u64,
    pub llm_timeout_seconds: u64,

    pub reconciliation_interval_seconds: u64,

    /// Hard cap on `max_results` a research job may request; requests above
    /// this are capped with a warning (spec §8 boundary behavior).
    pub max_results_cap: u32,

    /// How many events (or, if zero, rely purely on the time interval) the
    /// World Model batches before recomputing smoothed scores (spec §4.3).
    pub world_model_recompute_every_n_events: u64,
    pub world_model_recompute_interval_seconds: u64,
}

impl PlasticConfig {
    /// Load from environment variables, falling back to documented defaults
    /// for optional-with-default fields. Required fields with no sane
    /// default (`postgres_dsn`, `graph_uri`) must be present or `validate()`
    /// will reject the config.
    pub fn from_env() -> Result<Self, PlasticError> {
        fn env(key: &str) -> Option<String> {
            std::env::var(key).ok().filter(|v| !v.is_empty())
        }
        fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
            env(key).and_then(|v| v.parse().ok()).unwrap_or(default)
        }

        let research_client_type = env("PLASTICOS_RESEARCH_CLIENT_TYPE")
            .map(|v| {
                v.parse::<ResearchClientKind>()
                    .map_err(|_| ConfigurationError::UnknownResearchClient { kind: v.clone() })
            })
            .transpose()?
            .unwrap_or(ResearchClientKind::Stub);

        let vector_index_type = env("PLASTICOS_VECTOR_INDEX_TYPE")
            .map(|v| {
                v.parse::<VectorIndexType>().map_err(|_| {
                    ConfigurationError::InvalidValue {
                        field: "vector_index_type".into(),
                        value: v.clone(),
                        reason: "expected hnsw|ivfflat".into(),
                    }
                })
            })
            .transpose()?
            .unwrap_or(VectorIndexType::Hnsw);

        let config = Self {
            postgres_dsn: env("PLASTICOS_POSTGRES_DSN").unwrap_or_default(),
            graph_uri: env("PLASTICOS_GRAPH_URI").unwrap_or_default(),
            graph_user: env("PLASTICOS_GRAPH_USER").unwrap_or_default(),
            graph_password: env("PLASTICOS_GRAPH_PASSWORD").unwrap_or_default(),
            research_client_type,
            research_client_api_key: env("PLASTICOS_RESEARCH_CLIENT_API_KEY"),
            embedding_model: env("PLASTICOS_EMBEDDING_MODEL")
                .unwrap_or_else(|| "stub-embedding-v1".to_string()),
            embedding_dim: env_or("PLASTICOS_EMBEDDING_DIM", 384),
            vector_index_type,
            top_k_default: env_or("PLASTICOS_TOP_K_DEFAULT", 20usize),
            match_weights: MatchWeights::default(),
            job_timeout_seconds: env_or("PLASTICOS_JOB_TIMEOUT_SECONDS", 300u64),
            retrieval_timeout_seconds: env_or("PLASTICOS_RETRIEVAL_TIMEOUT_SECONDS", 30u64),
            llm_timeout_seconds: env_or("PLASTICOS_LLM_TIMEOUT_SECONDS", 30u64),
            reconciliation_interval_seconds: env_or(
                "PLASTICOS_RECONCILIATION_INTERVAL_SECONDS",
                60u64,
            ),
            max_results_cap: env_or("PLASTICOS_MAX_RESULTS_CAP", 500u32),
            world_model_recompute_every_n_events: env_or(
                "PLASTICOS_WORLD_MODEL_RECOMPUTE_EVERY_N_EVENTS",
                100u64,
            ),
            world_model_recompute_interval_seconds: env_or(
                "PLASTICOS_WORLD_MODEL_RECOMPUTE_INTERVAL_SECONDS",
                60u64,
            ),
        };

        config.validate()?;
        Ok(config)
    }

    /// Fatal-at-startup validation pass (spec §7 `ConfigurationError`).
    pub fn validate(&self) -> Result<(), PlasticError> {
        if self.postgres_dsn.trim().is_empty() {
            return Err(ConfigurationError::MissingRequired {
                field: "postgres_dsn".into(),
            }
            .into());
        }
        if self.graph_uri.trim().is_empty() {
            return Err(ConfigurationError::MissingRequired {
                field: "graph_uri".into(),
            }
            .into());
        }
        if self.embedding_dim <= 0 {
            return Err(ConfigurationError::InvalidValue {
                field: "embedding_dim".into(),
                value: self.embedding_dim.to_string(),
                reason: "must be positive".into(),
            }
            .into());
        }
        if self.top_k_default == 0 {
            return Err(ConfigurationError::InvalidValue {
                field: "top_k_default".into(),
                value: self.top_k_default.to_string(),
                reason: "must be positive".into(),
            }
            .into());
        }
        if matches!(
            self.research_client_type,
            ResearchClientKind::Perplexity | ResearchClientKind::Gemini | ResearchClientKind::Openai
        ) && self.research_client_api_key.is_none()
        {
            return Err(ConfigurationError::MissingRequired {
                field: "research_client_api_key".into(),
            }
            .into());
        }
        self.match_weights.validate()?;
        for (field, value) in [
            ("job_timeout_seconds", self.job_timeout_seconds),
            ("retrieval_timeout_seconds", self.retrieval_timeout_seconds),
            ("llm_timeout_seconds", self.llm_timeout_seconds),
            (
                "reconciliation_interval_seconds",
                self.reconciliation_interval_seconds,
            ),
        ] {
            if value == 0 {
                return Err(ConfigurationError::InvalidValue {
                    field: field.into(),
                    value: "0".into(),
                    reason: "must be positive".into(),
                }
                .into());
            }
        }
        Ok(())
    }
}

/// Weights for the Matching Engine's composite ranker (spec §4.5). Stored
/// here (rather than hardcoded in `plasticos-matching`) so they are part of
/// the configuration surface named in spec §6.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MatchWeights {
    pub vector_similarity: f32,
    pub rule_fit: f32,
    pub repeat_business: f32,
    pub world_model_buyer_score: f32,
    pub lane_risk_penalty: f32,
}

impl Default for MatchWeights {
    /// Defaults documented alongside the Reasoning Block Registry (spec
    /// §4.5): semantic fit and rule-fit dominate, repeat-business and world
    /// model signals provide a meaningful but secondary boost, lane risk is
    /// a penalty.
    fn default() -> Self {
        Self {
            vector_similarity: 0.35,
            rule_fit: 0.30,
            repeat_business: 0.15,
            world_model_buyer_score: 0.15,
            lane_risk_penalty: 0.05,
        }
    }
}

impl MatchWeights {
    pub fn validate(&self) -> Result<(), PlasticError> {
        for (field, value) in [
            ("vector_similarity", self.vector_similarity),
            ("rule_fit", self.rule_fit),
            ("repeat_business", self.repeat_business),
            ("world_model_buyer_score", self.world_model_buyer_score),
            ("lane_risk_penalty", self.lane_risk_penalty),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigurationError::InvalidValue {
                    field: format!("match_weights.{field}"),
                    value: value.to_string(),
                    reason: "must be within [0, 1]".into(),
                }
                .into());
            }
        }
        Ok(())
    }
}
