use std::collections::{HashMap, HashSet};

use crate::engine::similarity::SimilarityIndex;
use crate::error::EngineError;
use crate::models::{Dataset, Recommendation, SimilarCourse, Trainee, TraineeResult};

// Canonical weighting scheme. Popularity is normalized by a fixed
// constant, not the observed maximum.
const BASE_PROBABILITY: f64 = 0.1;
const POPULARITY_DIVISOR: f64 = 100.0;
const POPULARITY_CAP: f64 = 0.3;
const SIMILARITY_WEIGHT: f64 = 0.5;
const STATUS_BONUS: f64 = 0.2;

/// Similarity floor for listing an enrolled course as "similar"
const SIMILAR_COURSE_MIN: f64 = 0.1;
const MAX_SIMILAR_COURSES: usize = 2;

/// Scores candidate courses for one trainee at a time.
///
/// Holds the per-request lookup tables (enrollment counts, enrolled sets,
/// similarity index); all of it is discarded when the request completes.
pub struct ScoringEngine<'a> {
    dataset: &'a Dataset,
    similarity: &'a SimilarityIndex,
    enrollment_counts: HashMap<u64, usize>,
    enrolled_by_trainee: HashMap<u64, HashSet<u64>>,
    max_recommendations: usize,
    min_probability: f64,
}

impl<'a> ScoringEngine<'a> {
    pub fn new(
        dataset: &'a Dataset,
        similarity: &'a SimilarityIndex,
        max_recommendations: usize,
        min_probability: f64,
    ) -> Self {
        let mut enrollment_counts: HashMap<u64, usize> = HashMap::new();
        let mut enrolled_by_trainee: HashMap<u64, HashSet<u64>> = HashMap::new();
        for enrollment in &dataset.enrollments {
            *enrollment_counts.entry(enrollment.course_id).or_insert(0) += 1;
            enrolled_by_trainee
                .entry(enrollment.trainee_id)
                .or_default()
                .insert(enrollment.course_id);
        }

        Self {
            dataset,
            similarity,
            enrollment_counts,
            enrolled_by_trainee,
            max_recommendations,
            min_probability,
        }
    }

    /// Scores every candidate course for the trainee and returns the ranked,
    /// truncated recommendation list.
    pub fn score_trainee(&self, trainee: &Trainee) -> Result<TraineeResult, EngineError> {
        let enrolled = self
            .enrolled_by_trainee
            .get(&trainee.id)
            .cloned()
            .unwrap_or_default();

        let mut recommendations = Vec::new();
        for course in &self.dataset.courses {
            if enrolled.contains(&course.id) {
                continue;
            }

            let probability = self.probability_for(course.id, &enrolled, course.is_newly_created())?;
            if probability < self.min_probability {
                continue;
            }

            recommendations.push(Recommendation {
                course_id: course.id,
                course_name: course.name.clone(),
                course_status: course.status,
                probability,
                explanation: explanation_for(&course.name, probability),
                similar_courses: self.similar_enrolled_courses(course.id, &enrolled),
            });
        }

        // Descending probability; ties broken by course id so identical
        // inputs always rank identically.
        recommendations.sort_by(|a, b| {
            b.probability
                .partial_cmp(&a.probability)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.course_id.cmp(&b.course_id))
        });
        recommendations.truncate(self.max_recommendations);

        let current_courses = self
            .dataset
            .courses
            .iter()
            .filter(|c| enrolled.contains(&c.id))
            .map(|c| c.name.clone())
            .collect();

        Ok(TraineeResult {
            trainee_id: trainee.id,
            trainee_name: trainee.name.clone(),
            trainee_email: trainee.email.clone(),
            current_courses,
            recommendations,
        })
    }

    fn probability_for(
        &self,
        course_id: u64,
        enrolled: &HashSet<u64>,
        status_bonus: bool,
    ) -> Result<f64, EngineError> {
        let count = self.enrollment_counts.get(&course_id).copied().unwrap_or(0);
        let popularity = (count as f64 / POPULARITY_DIVISOR).min(POPULARITY_CAP);

        let best_similarity = enrolled
            .iter()
            .map(|e| self.similarity.get_similarity(course_id, *e))
            .fold(0.0_f64, f64::max);

        let mut probability = BASE_PROBABILITY + popularity + SIMILARITY_WEIGHT * best_similarity;
        if status_bonus {
            probability += STATUS_BONUS;
        }
        let probability = probability.clamp(0.0, 1.0);

        if !probability.is_finite() {
            return Err(EngineError::Scoring(format!(
                "non-finite probability for course {}",
                course_id
            )));
        }
        Ok(probability)
    }

    /// Up to two enrolled courses with similarity above the floor, most
    /// similar first.
    fn similar_enrolled_courses(&self, candidate: u64, enrolled: &HashSet<u64>) -> Vec<SimilarCourse> {
        let mut similar: Vec<SimilarCourse> = self
            .dataset
            .courses
            .iter()
            .filter(|c| enrolled.contains(&c.id))
            .filter_map(|c| {
                let similarity = self.similarity.get_similarity(candidate, c.id);
                (similarity > SIMILAR_COURSE_MIN).then(|| SimilarCourse {
                    course_id: c.id,
                    course_name: c.name.clone(),
                    similarity,
                })
            })
            .collect();

        similar.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.course_id.cmp(&b.course_id))
        });
        similar.truncate(MAX_SIMILAR_COURSES);
        similar
    }
}

fn explanation_for(course_name: &str, probability: f64) -> String {
    format!(
        "{} matches your enrollment history with {}% confidence",
        course_name,
        (probability * 100.0).round() as i64
    )
}
