use std::sync::Arc;

use tokio::sync::mpsc;

use crate::engine::filters;
use crate::engine::sanitize::sanitize;
use crate::engine::scoring::ScoringEngine;
use crate::engine::similarity::SimilarityIndex;
use crate::error::EngineError;
use crate::models::{
    Dataset, GenerationRequest, GenerationSummary, ProgressEvent, Stage, TraineeResult,
};
use crate::services::enrichment;
use crate::services::providers::AiProvider;

/// Share of the progress scale reserved for setup and analysis
const SETUP_PROGRESS: u8 = 20;
/// Share of the progress scale that tracks processed trainees
const SCORING_PROGRESS_SPAN: f64 = 70.0;

/// Writer side of the progress stream.
///
/// A failed send means the consumer dropped the receiver; the run treats
/// that as cancellation, not as an application error.
pub struct ProgressSink {
    tx: mpsc::Sender<ProgressEvent>,
}

impl ProgressSink {
    pub fn new(tx: mpsc::Sender<ProgressEvent>) -> Self {
        Self { tx }
    }

    pub async fn emit(&self, event: ProgressEvent) -> Result<(), EngineError> {
        self.tx
            .send(event)
            .await
            .map_err(|_| EngineError::StreamAborted)
    }
}

/// Drives scoring over the filtered working set in fixed-size chunks,
/// emitting progress events between every trainee and chunk.
///
/// Chunks run sequentially and trainees within a chunk run sequentially;
/// the only suspension points are the event sends, which also serve as the
/// cooperative cancellation check. A scoring error anywhere fails the
/// whole run fast with an `error` event; events already emitted remain
/// valid partial output.
pub struct ChunkedExecutor {
    request: GenerationRequest,
    provider: Option<Arc<dyn AiProvider>>,
}

impl ChunkedExecutor {
    pub fn new(request: GenerationRequest, provider: Option<Arc<dyn AiProvider>>) -> Self {
        Self { request, provider }
    }

    /// Runs the full pipeline, consuming the dataset snapshot.
    ///
    /// Terminal outcomes: a `complete` event carrying the summary, an
    /// `error` event carrying the failure message, or silent termination
    /// when the consumer stopped listening.
    pub async fn run(self, dataset: Dataset, sink: ProgressSink) {
        match self.drive(dataset, &sink).await {
            Ok(()) => {}
            Err(EngineError::StreamAborted) => {
                tracing::debug!("Consumer went away, recommendation run cancelled");
            }
            Err(e) => {
                tracing::error!(error = %e, "Recommendation run failed");
                // Best effort; the consumer may already be gone.
                let _ = sink.emit(ProgressEvent::failed(e.to_string(), 0, 0)).await;
            }
        }
    }

    async fn drive(&self, dataset: Dataset, sink: &ProgressSink) -> Result<(), EngineError> {
        sink.emit(ProgressEvent::at_stage(
            Stage::Initializing,
            "sanitizing dataset",
            5,
            0,
            0,
        ))
        .await?;
        let dataset = sanitize(&dataset);

        sink.emit(ProgressEvent::at_stage(
            Stage::CourseAnalysis,
            format!("analyzing {} courses", dataset.courses.len()),
            10,
            0,
            0,
        ))
        .await?;
        let similarity = SimilarityIndex::build(&dataset.courses);

        let mut working_set = filters::apply(&dataset, &self.request.trainee_filters)?;
        // Hard cap regardless of which filter path produced the list.
        working_set.truncate(self.request.max_trainees);
        let total = working_set.len();

        sink.emit(ProgressEvent::at_stage(
            Stage::ChunkingSetup,
            format!(
                "processing {} trainees in chunks of {}",
                total, self.request.chunk_size
            ),
            SETUP_PROGRESS,
            0,
            total,
        ))
        .await?;

        let engine = ScoringEngine::new(
            &dataset,
            &similarity,
            self.request.max_recommendations,
            self.request.min_probability,
        );

        let mut results: Vec<TraineeResult> = Vec::with_capacity(total);
        let mut processed = 0usize;

        for (chunk_index, chunk) in working_set.chunks(self.request.chunk_size).enumerate() {
            sink.emit(ProgressEvent::at_stage(
                Stage::ChunkStart,
                format!("starting chunk {} ({} trainees)", chunk_index + 1, chunk.len()),
                progress_for(processed, total),
                processed,
                total,
            ))
            .await?;

            for trainee in chunk {
                sink.emit(ProgressEvent::at_stage(
                    Stage::TraineeStart,
                    format!("scoring {}", trainee.name),
                    progress_for(processed, total),
                    processed,
                    total,
                ))
                .await?;

                let mut result = engine.score_trainee(trainee)?;

                if self.request.use_ai {
                    if let Some(provider) = &self.provider {
                        enrichment::enrich_explanations(provider.as_ref(), &mut result).await;
                    }
                }

                processed += 1;
                sink.emit(ProgressEvent::at_stage(
                    Stage::TraineeComplete,
                    format!(
                        "{} scored, {} recommendations",
                        trainee.name,
                        result.recommendations.len()
                    ),
                    progress_for(processed, total),
                    processed,
                    total,
                ))
                .await?;

                results.push(result);
            }

            sink.emit(ProgressEvent::at_stage(
                Stage::ChunkComplete,
                format!("chunk {} complete", chunk_index + 1),
                progress_for(processed, total),
                processed,
                total,
            ))
            .await?;
        }

        let summary = GenerationSummary {
            success: true,
            total_trainees: total,
            total_courses: dataset.courses.len(),
            recommendations_generated: results.iter().map(|r| r.recommendations.len()).sum(),
            data: results,
        };

        tracing::info!(
            trainees = summary.total_trainees,
            recommendations = summary.recommendations_generated,
            "Recommendation run complete"
        );

        sink.emit(ProgressEvent::completed(summary)).await?;
        Ok(())
    }
}

/// 20 points of setup, 70 scaled by processed trainees, 10 reserved for
/// the `complete` event.
fn progress_for(processed: usize, total: usize) -> u8 {
    if total == 0 {
        return SETUP_PROGRESS;
    }
    SETUP_PROGRESS + ((processed as f64 / total as f64) * SCORING_PROGRESS_SPAN).round() as u8
}
