// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Prometheus metrics for the validation pipeline.
//!
//! The registry is owned by application state rather than a process-wide
//! static, so tests can construct isolated instances.

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

/// Terminal request classifications, used as the `outcome` label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    RateLimited,
    MalformedJson,
    SchemaViolation,
    Valid,
    Invalid,
    InternalError,
}

impl Outcome {
    fn as_str(self) -> &'static str {
        match self {
            Self::RateLimited => "rate_limited",
            Self::MalformedJson => "malformed_json",
            Self::SchemaViolation => "schema_violation",
            Self::Valid => "valid",
            Self::Invalid => "invalid",
            Self::InternalError => "internal_error",
        }
    }
}

/// Registry-owning metrics handle shared through application state.
pub struct Metrics {
    registry: Registry,
    requests_total: IntCounter,
    outcomes_total: IntCounterVec,
}

impl Metrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let requests_total = IntCounter::new(
            "cpf_validation_requests_total",
            "Total validation requests received",
        )?;
        let outcomes_total = IntCounterVec::new(
            Opts::new(
                "cpf_validation_outcomes_total",
                "Terminal request outcomes by classification",
            ),
            &["outcome"],
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(outcomes_total.clone()))?;

        Ok(Self {
            registry,
            requests_total,
            outcomes_total,
        })
    }

    /// Count a request at pipeline entry.
    pub fn record_request(&self) {
        self.requests_total.inc();
    }

    /// Count a terminal outcome.
    pub fn record_outcome(&self, outcome: Outcome) {
        self.outcomes_total
            .with_label_values(&[outcome.as_str()])
            .inc();
    }

    /// Encode the registry in Prometheus text format.
    pub fn encode(&self) -> prometheus::Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer).unwrap_or_default())
    }
}
