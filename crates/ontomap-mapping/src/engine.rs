//! Mapping pipeline.
//!
//! [`MappingEngine`] drives a session through extraction, classification,
//! resolution and validation. Extraction and classification fan out over
//! the configured parallelism with order preserved; resolution and
//! validation run inline. The cancellation signal is checked between
//! stages and a cancelled run leaves the session open and unresolved.

use std::sync::Arc;

use futures::stream::{self, StreamExt};

use ontomap_core::{
    DynScoringModel, FeatureVector, HistorySource, MappingConfig, OntologySchema, PointRecord,
    PointSource, TimeWindow,
};

use crate::cancel::CancelSignal;
use crate::classifier::{Candidate, CandidateClassifier};
use crate::error::{MappingError, Result};
use crate::features::FeatureExtractor;
use crate::report::{DiagnosticKind, PointDiagnostic, ValidationReport};
use crate::resolver::RelationshipResolver;
use crate::session::MappingSession;
use crate::validator::OntologyValidator;

/// Runs mapping sessions against one schema and scoring model.
#[derive(Debug)]
pub struct MappingEngine {
    schema: Arc<OntologySchema>,
    extractor: FeatureExtractor,
    classifier: Arc<CandidateClassifier>,
    resolver: RelationshipResolver,
    validator: OntologyValidator,
    config: MappingConfig,
}

impl MappingEngine {
    /// Engine with default configuration.
    pub fn new(schema: Arc<OntologySchema>, model: DynScoringModel) -> Self {
        Self::with_config(schema, model, MappingConfig::default())
    }

    pub fn with_config(
        schema: Arc<OntologySchema>,
        model: DynScoringModel,
        config: MappingConfig,
    ) -> Self {
        Self {
            extractor: FeatureExtractor::new(),
            classifier: Arc::new(CandidateClassifier::from_config(model, &config)),
            resolver: RelationshipResolver::from_config(&config),
            validator: OntologyValidator::new(Arc::clone(&schema)),
            schema,
            config,
        }
    }

    pub fn with_extractor(mut self, extractor: FeatureExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn schema(&self) -> &Arc<OntologySchema> {
        &self.schema
    }

    pub fn config(&self) -> &MappingConfig {
        &self.config
    }

    pub fn validator(&self) -> &OntologyValidator {
        &self.validator
    }

    pub fn classifier(&self) -> &CandidateClassifier {
        &self.classifier
    }

    /// Open a session over an ingested point set.
    pub fn open_session(
        &self,
        site: impl Into<String>,
        records: Vec<PointRecord>,
    ) -> Result<MappingSession> {
        MappingSession::new(site, Arc::clone(&self.schema), records)
    }

    /// Open a session from the BAS boundary.
    pub async fn open_from_source(
        &self,
        site: impl Into<String>,
        points: &dyn PointSource,
        history: Option<(&dyn HistorySource, TimeWindow)>,
    ) -> Result<MappingSession> {
        MappingSession::from_source(site, Arc::clone(&self.schema), points, history).await
    }

    /// Run the full pipeline and validate the session.
    ///
    /// Model failures degrade single points to the `unknown` floor and are
    /// listed as diagnostics. On cancellation or any other failure the
    /// working set is rolled back and the session stays open.
    pub async fn run(
        &self,
        session: &mut MappingSession,
        cancel: &CancelSignal,
    ) -> Result<ValidationReport> {
        session.ensure_open()?;
        tracing::info!(
            category = "mapping",
            stage = "ingest",
            session = %session.id(),
            site = %session.site(),
            points = session.records().len(),
            model = %self.classifier.model_name(),
            "Mapping run started"
        );

        match self.run_stages(session, cancel).await {
            Ok(report) => Ok(report),
            Err(e) => {
                if session.ensure_open().is_ok() {
                    session.rollback()?;
                }
                match &e {
                    MappingError::Cancelled => tracing::info!(
                        category = "mapping",
                        stage = "cancel",
                        session = %session.id(),
                        "Mapping run cancelled; session rolled back"
                    ),
                    other => tracing::warn!(
                        category = "mapping",
                        session = %session.id(),
                        error = %other,
                        "Mapping run failed; session rolled back"
                    ),
                }
                Err(e)
            }
        }
    }

    async fn run_stages(
        &self,
        session: &mut MappingSession,
        cancel: &CancelSignal,
    ) -> Result<ValidationReport> {
        check_cancel(cancel)?;
        let features = self.extract_all(session.records()).await?;
        for fv in &features {
            session.set_features(fv.clone())?;
        }
        tracing::info!(
            category = "mapping",
            stage = "extract",
            vectors = features.len(),
            "Features extracted"
        );

        check_cancel(cancel)?;
        let degraded = self.classify_all(session, features).await?;
        tracing::info!(
            category = "mapping",
            stage = "classify",
            degraded,
            "Points classified"
        );

        check_cancel(cancel)?;
        self.resolver.resolve(session)?;

        check_cancel(cancel)?;
        let report = session.validate(&self.validator)?.clone();
        tracing::info!(
            category = "mapping",
            stage = "validate",
            session = %session.id(),
            violations = report.summary.violations,
            unresolved = report.summary.unresolved,
            equipment = report.summary.equipment,
            "Mapping run complete"
        );
        Ok(report)
    }

    /// Extract every record's features on the blocking pool, in ingest order.
    pub async fn extract_all(&self, records: &[PointRecord]) -> Result<Vec<FeatureVector>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }
        let parallelism = self.config.parallelism.max(1);
        let chunk_size = records.len().div_ceil(parallelism);

        let chunks: Vec<Vec<PointRecord>> = records.chunks(chunk_size).map(<[_]>::to_vec).collect();
        let results = stream::iter(chunks)
            .map(|chunk| {
                let extractor = self.extractor.clone();
                tokio::task::spawn_blocking(move || {
                    chunk.iter().map(|r| extractor.extract(r)).collect::<Vec<_>>()
                })
            })
            .buffered(parallelism)
            .collect::<Vec<_>>()
            .await;

        let mut features = Vec::with_capacity(records.len());
        for joined in results {
            features.extend(joined?);
        }
        Ok(features)
    }

    /// Classify every vector and store the rankings. Returns the number of
    /// points degraded to the floor.
    async fn classify_all(
        &self,
        session: &mut MappingSession,
        features: Vec<FeatureVector>,
    ) -> Result<usize> {
        let timeout = self.config.classification_timeout();
        let results = stream::iter(features)
            .map(|fv| {
                let classifier = Arc::clone(&self.classifier);
                async move {
                    let point_id = fv.point_id.clone();
                    let result = classifier.classify_with_timeout(fv, timeout).await;
                    (point_id, result)
                }
            })
            .buffered(self.config.parallelism.max(1))
            .collect::<Vec<_>>()
            .await;

        let mut degraded = 0;
        for (point_id, result) in results {
            match result {
                Ok(candidates) => session.set_candidates(&point_id, candidates)?,
                Err(e) if e.is_degradable() => {
                    tracing::warn!(
                        category = "mapping",
                        point = %point_id,
                        error = %e,
                        "Classification degraded to unknown"
                    );
                    session.set_candidates(&point_id, vec![Candidate::unknown(point_id.clone())])?;
                    session.record_diagnostic(PointDiagnostic {
                        point_id,
                        kind: diagnostic_kind(e),
                    })?;
                    degraded += 1;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(degraded)
    }
}

fn check_cancel(cancel: &CancelSignal) -> Result<()> {
    if cancel.is_cancelled() {
        Err(MappingError::Cancelled)
    } else {
        Ok(())
    }
}

fn diagnostic_kind(err: MappingError) -> DiagnosticKind {
    match err {
        MappingError::ModelUnavailable(message) => DiagnosticKind::ModelUnavailable { message },
        MappingError::ClassificationTimeout { timeout_ms, .. } => {
            DiagnosticKind::ClassificationTimeout { timeout_ms }
        }
        other => DiagnosticKind::ModelError {
            message: other.to_string(),
        },
    }
}
