use std::collections::{HashMap, HashSet};
use std::convert::Infallible;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio_stream::{wrappers::ReceiverStream, Stream, StreamExt};

use crate::cached;
use crate::db::cache::{CacheKey, SEARCH_CACHE_TTL, STATS_CACHE_TTL};
use crate::engine::{filters, ChunkedExecutor, ProgressSink};
use crate::error::{AppError, AppResult};
use crate::models::{
    CoursePopularity, Dataset, DatasetStats, GenerationRequest, ImportRequest, Trainee,
};

use super::AppState;

/// Size of the progress-event channel between the executor and the SSE
/// stream; a slow consumer backpressures the run instead of buffering it.
const PROGRESS_CHANNEL_CAPACITY: usize = 32;

const TOP_COURSES_LIMIT: usize = 5;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub courses_imported: usize,
    pub trainees_imported: usize,
    pub enrollments_imported: usize,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Replaces the entire dataset with the imported payload.
///
/// Stop-the-world by construction: the write lock excludes every in-flight
/// recommendation snapshot and query, and the result cache is cleared so
/// stale aggregates cannot outlive the data they summarized.
pub async fn import_dataset(
    State(state): State<AppState>,
    Json(request): Json<ImportRequest>,
) -> AppResult<(StatusCode, Json<ImportSummary>)> {
    let dataset = request.into_dataset()?;

    let summary = ImportSummary {
        courses_imported: dataset.courses.len(),
        trainees_imported: dataset.trainees.len(),
        enrollments_imported: dataset.enrollments.len(),
    };

    {
        let mut current = state.dataset.write().await;
        *current = dataset;
    }
    state.cache.clear().await;

    tracing::info!(
        courses = summary.courses_imported,
        trainees = summary.trainees_imported,
        enrollments = summary.enrollments_imported,
        "Dataset imported"
    );

    Ok((StatusCode::CREATED, Json(summary)))
}

/// Aggregate dataset statistics, cached for five minutes.
pub async fn dataset_stats(State(state): State<AppState>) -> AppResult<Json<DatasetStats>> {
    let key = CacheKey::Statistics;
    let stats: DatasetStats = cached!(state.cache, key, STATS_CACHE_TTL, async {
        let dataset = state.dataset.read().await;
        Ok::<_, AppError>(compute_stats(&dataset))
    })?;
    Ok(Json(stats))
}

/// Trainee listing filtered by a name/email substring, cached for two
/// minutes per query.
pub async fn search_trainees(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<Vec<Trainee>>> {
    let key = CacheKey::TraineeSearch(params.q.clone());
    let trainees: Vec<Trainee> = cached!(state.cache, key, SEARCH_CACHE_TTL, async {
        let dataset = state.dataset.read().await;
        Ok::<_, AppError>(search_dataset(&dataset, &params.q))
    })?;
    Ok(Json(trainees))
}

/// Starts a recommendation run and streams its progress events as SSE.
///
/// Validation failures reject the request with a 400 before the stream
/// opens; anything after that arrives as in-band `error` events. Dropping
/// the connection drops the channel receiver, which cancels the run at its
/// next suspension point.
pub async fn generate_recommendations(
    State(state): State<AppState>,
    Json(request): Json<GenerationRequest>,
) -> AppResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    request.validate().map_err(AppError::InvalidInput)?;
    filters::validate(&request.trainee_filters)?;

    let snapshot = state.dataset.read().await.clone();
    let provider = if request.use_ai {
        state.ai_provider.clone()
    } else {
        None
    };

    tracing::info!(
        trainee_cap = request.max_trainees,
        chunk_size = request.chunk_size,
        use_ai = request.use_ai,
        "Starting recommendation run"
    );

    let (tx, rx) = mpsc::channel(PROGRESS_CHANNEL_CAPACITY);
    let executor = ChunkedExecutor::new(request, provider);
    tokio::spawn(executor.run(snapshot, ProgressSink::new(tx)));

    let stream = ReceiverStream::new(rx).map(|event| {
        let sse = Event::default().event(event.stage.as_str());
        match sse.json_data(&event) {
            Ok(e) => Ok(e),
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize progress event");
                Ok(Event::default()
                    .event("error")
                    .data("progress event serialization failed"))
            }
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

fn compute_stats(dataset: &Dataset) -> DatasetStats {
    let mut counts: HashMap<u64, usize> = HashMap::new();
    let mut enrolled_trainees: HashSet<u64> = HashSet::new();
    for enrollment in &dataset.enrollments {
        *counts.entry(enrollment.course_id).or_insert(0) += 1;
        enrolled_trainees.insert(enrollment.trainee_id);
    }

    let mut top_courses: Vec<CoursePopularity> = dataset
        .courses
        .iter()
        .map(|c| CoursePopularity {
            course_id: c.id,
            course_name: c.name.clone(),
            enrollment_count: counts.get(&c.id).copied().unwrap_or(0),
        })
        .collect();
    top_courses.sort_by(|a, b| {
        b.enrollment_count
            .cmp(&a.enrollment_count)
            .then(a.course_id.cmp(&b.course_id))
    });
    top_courses.truncate(TOP_COURSES_LIMIT);

    let avg_enrollments_per_trainee = if dataset.trainees.is_empty() {
        0.0
    } else {
        dataset.enrollments.len() as f64 / dataset.trainees.len() as f64
    };

    DatasetStats {
        total_courses: dataset.courses.len(),
        total_trainees: dataset.trainees.len(),
        total_enrollments: dataset.enrollments.len(),
        trainees_with_enrollments: enrolled_trainees.len(),
        avg_enrollments_per_trainee,
        top_courses,
    }
}

fn search_dataset(dataset: &Dataset, query: &str) -> Vec<Trainee> {
    let needle = query.to_lowercase();
    dataset
        .trainees
        .iter()
        .filter(|t| {
            t.name.to_lowercase().contains(&needle) || t.email.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}
