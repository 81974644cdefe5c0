use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Course status value meaning "created" (newly added to the catalog).
///
/// Statuses range over 1..=5; only 1 carries a scoring bonus.
pub const COURSE_STATUS_CREATED: u8 = 1;

/// A course in the training catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: u64,
    pub name: String,
    pub status: u8,
}

impl Course {
    /// True when the course is in the "created" state, which earns a
    /// recommendation bonus.
    pub fn is_newly_created(&self) -> bool {
        self.status == COURSE_STATUS_CREATED
    }
}

/// A trainee who may receive course recommendations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trainee {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

/// A trainee's enrollment in a course
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub trainee_id: u64,
    pub course_id: u64,
    pub enrollment_date: NaiveDate,
}

/// The full in-memory dataset the engine operates on
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    pub courses: Vec<Course>,
    pub trainees: Vec<Trainee>,
    pub enrollments: Vec<Enrollment>,
}

/// Bulk import payload from the ingestion collaborator.
///
/// All three collections are required; a missing collection is rejected
/// before any data is touched.
#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub courses: Option<Vec<Course>>,
    pub trainees: Option<Vec<Trainee>>,
    pub enrollments: Option<Vec<Enrollment>>,
}

impl ImportRequest {
    /// Validates that every required collection is present and converts the
    /// payload into a [`Dataset`].
    pub fn into_dataset(self) -> Result<Dataset, EngineError> {
        let courses = self
            .courses
            .ok_or_else(|| EngineError::InvalidDataset("missing 'courses' collection".into()))?;
        let trainees = self
            .trainees
            .ok_or_else(|| EngineError::InvalidDataset("missing 'trainees' collection".into()))?;
        let enrollments = self.enrollments.ok_or_else(|| {
            EngineError::InvalidDataset("missing 'enrollments' collection".into())
        })?;

        Ok(Dataset {
            courses,
            trainees,
            enrollments,
        })
    }
}

/// An enrolled course that contributed to a recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarCourse {
    pub course_id: u64,
    pub course_name: String,
    pub similarity: f64,
}

/// A single course recommendation for a trainee
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub course_id: u64,
    pub course_name: String,
    pub course_status: u8,
    pub probability: f64,
    pub explanation: String,
    pub similar_courses: Vec<SimilarCourse>,
}

/// Per-trainee recommendation output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraineeResult {
    pub trainee_id: u64,
    pub trainee_name: String,
    pub trainee_email: String,
    pub current_courses: Vec<String>,
    pub recommendations: Vec<Recommendation>,
}

/// Final aggregate carried by the terminating `complete` event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationSummary {
    pub success: bool,
    pub total_trainees: usize,
    pub total_courses: usize,
    pub recommendations_generated: usize,
    pub data: Vec<TraineeResult>,
}

/// Execution stage carried by every progress event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Initializing,
    CourseAnalysis,
    ChunkingSetup,
    ChunkStart,
    TraineeStart,
    TraineeComplete,
    ChunkComplete,
    Complete,
    Error,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Initializing => "initializing",
            Stage::CourseAnalysis => "course_analysis",
            Stage::ChunkingSetup => "chunking_setup",
            Stage::ChunkStart => "chunk_start",
            Stage::TraineeStart => "trainee_start",
            Stage::TraineeComplete => "trainee_complete",
            Stage::ChunkComplete => "chunk_complete",
            Stage::Complete => "complete",
            Stage::Error => "error",
        }
    }
}

/// Transient progress event streamed to the consumer; never persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub stage: Stage,
    pub message: String,
    /// 0..=100; the first 20 points cover setup, the next 70 scale with
    /// processed trainees, the final 10 are reserved for completion.
    pub progress: u8,
    pub processed_trainees: usize,
    pub total_trainees: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<GenerationSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProgressEvent {
    /// An intermediate event with no payload.
    pub fn at_stage(
        stage: Stage,
        message: impl Into<String>,
        progress: u8,
        processed_trainees: usize,
        total_trainees: usize,
    ) -> Self {
        Self {
            stage,
            message: message.into(),
            progress,
            processed_trainees,
            total_trainees,
            result: None,
            error: None,
        }
    }

    /// The terminating `complete` event carrying the full result.
    pub fn completed(summary: GenerationSummary) -> Self {
        let total = summary.total_trainees;
        Self {
            stage: Stage::Complete,
            message: format!("generated recommendations for {} trainees", total),
            progress: 100,
            processed_trainees: total,
            total_trainees: total,
            result: Some(summary),
            error: None,
        }
    }

    /// The terminating `error` event.
    pub fn failed(
        message: impl Into<String>,
        processed_trainees: usize,
        total_trainees: usize,
    ) -> Self {
        let message = message.into();
        Self {
            stage: Stage::Error,
            message: message.clone(),
            progress: 0,
            processed_trainees,
            total_trainees,
            result: None,
            error: Some(message),
        }
    }
}

/// Optional trainee filters applied before scoring.
///
/// Predicates apply in declaration order; sampling runs last and takes
/// precedence over `max_results`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TraineeFilters {
    pub name_search: Option<String>,
    pub email_search: Option<String>,
    pub phone_search: Option<String>,
    pub has_enrollments: Option<bool>,
    pub min_enrollments: Option<usize>,
    pub max_enrollments: Option<usize>,
    pub enrolled_in_course: Option<Vec<u64>>,
    pub random_sample: bool,
    pub random_sample_size: Option<usize>,
    /// Fixed RNG seed so sampled runs can be reproduced.
    pub random_sample_seed: Option<u64>,
    /// Plain cap on the filtered list; ignored when sampling is requested.
    pub max_results: Option<usize>,
}

fn default_max_recommendations() -> usize {
    5
}

fn default_min_probability() -> f64 {
    0.3
}

fn default_max_trainees() -> usize {
    100
}

fn default_chunk_size() -> usize {
    20
}

/// A recommendation generation request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GenerationRequest {
    pub max_recommendations: usize,
    pub min_probability: f64,
    pub max_trainees: usize,
    pub chunk_size: usize,
    /// Request AI explanation enrichment when a provider is configured.
    /// Results are complete and correct without it.
    pub use_ai: bool,
    pub trainee_filters: TraineeFilters,
}

impl Default for GenerationRequest {
    fn default() -> Self {
        Self {
            max_recommendations: default_max_recommendations(),
            min_probability: default_min_probability(),
            max_trainees: default_max_trainees(),
            chunk_size: default_chunk_size(),
            use_ai: false,
            trainee_filters: TraineeFilters::default(),
        }
    }
}

impl GenerationRequest {
    /// Rejects structurally invalid requests before any processing starts.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_recommendations < 1 {
            return Err("maxRecommendations must be at least 1".into());
        }
        if !(0.0..=1.0).contains(&self.min_probability) {
            return Err("minProbability must be between 0 and 1".into());
        }
        if self.max_trainees < 1 {
            return Err("maxTrainees must be at least 1".into());
        }
        if self.chunk_size < 1 {
            return Err("chunkSize must be at least 1".into());
        }
        Ok(())
    }
}

/// Aggregate statistics over the current dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetStats {
    pub total_courses: usize,
    pub total_trainees: usize,
    pub total_enrollments: usize,
    pub trainees_with_enrollments: usize,
    pub avg_enrollments_per_trainee: f64,
    pub top_courses: Vec<CoursePopularity>,
}

/// Enrollment count for a single course, used in statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoursePopularity {
    pub course_id: u64,
    pub course_name: String,
    pub enrollment_count: usize,
}
