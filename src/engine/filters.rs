use std::collections::{HashMap, HashSet};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::EngineError;
use crate::models::{Dataset, Trainee, TraineeFilters};

/// Rejects contradictory filter combinations before any scoring begins.
pub fn validate(filters: &TraineeFilters) -> Result<(), EngineError> {
    if let (Some(min), Some(max)) = (filters.min_enrollments, filters.max_enrollments) {
        if min > max {
            return Err(EngineError::InvalidFilter(format!(
                "minEnrollments ({}) exceeds maxEnrollments ({})",
                min, max
            )));
        }
    }
    if filters.random_sample {
        match filters.random_sample_size {
            Some(0) | None => {
                return Err(EngineError::InvalidFilter(
                    "randomSample requires a randomSampleSize of at least 1".to_string(),
                ));
            }
            Some(_) => {}
        }
    }
    Ok(())
}

/// Applies every active predicate in order, then sampling or the plain
/// result cap.
///
/// Sampling is the final step and takes precedence over `max_results`,
/// which only applies when no sample was requested.
pub fn apply(dataset: &Dataset, filters: &TraineeFilters) -> Result<Vec<Trainee>, EngineError> {
    validate(filters)?;

    let mut enrollment_counts: HashMap<u64, usize> = HashMap::new();
    let mut enrolled_courses: HashMap<u64, HashSet<u64>> = HashMap::new();
    for enrollment in &dataset.enrollments {
        *enrollment_counts.entry(enrollment.trainee_id).or_insert(0) += 1;
        enrolled_courses
            .entry(enrollment.trainee_id)
            .or_default()
            .insert(enrollment.course_id);
    }

    let mut filtered: Vec<Trainee> = dataset
        .trainees
        .iter()
        .filter(|t| matches_predicates(t, filters, &enrollment_counts, &enrolled_courses))
        .cloned()
        .collect();

    if filters.random_sample {
        // validated above
        let size = filters.random_sample_size.unwrap_or(0).min(filtered.len());
        let mut rng = match filters.random_sample_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        filtered = filtered
            .choose_multiple(&mut rng, size)
            .cloned()
            .collect();
    } else if let Some(max) = filters.max_results {
        filtered.truncate(max);
    }

    Ok(filtered)
}

fn matches_predicates(
    trainee: &Trainee,
    filters: &TraineeFilters,
    enrollment_counts: &HashMap<u64, usize>,
    enrolled_courses: &HashMap<u64, HashSet<u64>>,
) -> bool {
    if let Some(needle) = &filters.name_search {
        if !contains_ignore_case(&trainee.name, needle) {
            return false;
        }
    }
    if let Some(needle) = &filters.email_search {
        if !contains_ignore_case(&trainee.email, needle) {
            return false;
        }
    }
    if let Some(needle) = &filters.phone_search {
        if !trainee.phone.contains(needle.as_str()) {
            return false;
        }
    }

    let count = enrollment_counts.get(&trainee.id).copied().unwrap_or(0);

    if let Some(wants_enrolled) = filters.has_enrollments {
        if wants_enrolled != (count > 0) {
            return false;
        }
    }
    if let Some(min) = filters.min_enrollments {
        if count < min {
            return false;
        }
    }
    if let Some(max) = filters.max_enrollments {
        if count > max {
            return false;
        }
    }

    if let Some(course_ids) = &filters.enrolled_in_course {
        let enrolled = enrolled_courses.get(&trainee.id);
        let any_match = course_ids
            .iter()
            .any(|id| enrolled.is_some_and(|set| set.contains(id)));
        if !any_match {
            return false;
        }
    }

    true
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Course, Enrollment};
    use chrono::NaiveDate;

    fn trainee(id: u64, name: &str, email: &str, phone: &str) -> Trainee {
        Trainee {
            id,
            name: name.to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
        }
    }

    fn enrollment(trainee_id: u64, course_id: u64) -> Enrollment {
        Enrollment {
            trainee_id,
            course_id,
            enrollment_date: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
        }
    }

    fn fixture() -> Dataset {
        Dataset {
            courses: vec![
                Course {
                    id: 1,
                    name: "Rust Basics".to_string(),
                    status: 1,
                },
                Course {
                    id: 2,
                    name: "Async Rust".to_string(),
                    status: 2,
                },
            ],
            trainees: vec![
                trainee(100, "Ada Lovelace", "ada@example.com", "+1555100"),
                trainee(101, "Grace Hopper", "grace@example.org", "+1555101"),
                trainee(102, "Alan Turing", "alan@example.com", "+4455102"),
                trainee(103, "Edsger Dijkstra", "edsger@example.nl", "+3155103"),
            ],
            enrollments: vec![
                enrollment(100, 1),
                enrollment(100, 2),
                enrollment(101, 1),
                enrollment(102, 2),
            ],
        }
    }

    #[test]
    fn test_no_filters_returns_everyone() {
        let dataset = fixture();
        let result = apply(&dataset, &TraineeFilters::default()).unwrap();
        assert_eq!(result.len(), 4);
    }

    #[test]
    fn test_name_search_is_case_insensitive() {
        let dataset = fixture();
        let filters = TraineeFilters {
            name_search: Some("LOVE".to_string()),
            ..Default::default()
        };
        let result = apply(&dataset, &filters).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, 100);
    }

    #[test]
    fn test_email_and_phone_search() {
        let dataset = fixture();
        let filters = TraineeFilters {
            email_search: Some("example.com".to_string()),
            phone_search: Some("+1555".to_string()),
            ..Default::default()
        };
        let result = apply(&dataset, &filters).unwrap();
        // alan matches the email but not the phone prefix
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, 100);
    }

    #[test]
    fn test_has_enrollments_both_polarities() {
        let dataset = fixture();

        let with = apply(
            &dataset,
            &TraineeFilters {
                has_enrollments: Some(true),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(with.iter().map(|t| t.id).collect::<Vec<_>>(), vec![100, 101, 102]);

        let without = apply(
            &dataset,
            &TraineeFilters {
                has_enrollments: Some(false),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(without.iter().map(|t| t.id).collect::<Vec<_>>(), vec![103]);
    }

    #[test]
    fn test_enrollment_count_bounds_are_inclusive() {
        let dataset = fixture();
        let filters = TraineeFilters {
            min_enrollments: Some(1),
            max_enrollments: Some(1),
            ..Default::default()
        };
        let result = apply(&dataset, &filters).unwrap();
        assert_eq!(result.iter().map(|t| t.id).collect::<Vec<_>>(), vec![101, 102]);
    }

    #[test]
    fn test_contradictory_bounds_rejected() {
        let dataset = fixture();
        let filters = TraineeFilters {
            min_enrollments: Some(3),
            max_enrollments: Some(1),
            ..Default::default()
        };
        let err = apply(&dataset, &filters).unwrap_err();
        assert!(matches!(err, EngineError::InvalidFilter(_)));
    }

    #[test]
    fn test_enrolled_in_any_of_course_set() {
        let dataset = fixture();
        let filters = TraineeFilters {
            enrolled_in_course: Some(vec![2, 999]),
            ..Default::default()
        };
        let result = apply(&dataset, &filters).unwrap();
        assert_eq!(result.iter().map(|t| t.id).collect::<Vec<_>>(), vec![100, 102]);
    }

    #[test]
    fn test_filtered_set_equals_brute_force_subset() {
        let dataset = fixture();
        let filters = TraineeFilters {
            email_search: Some(".com".to_string()),
            has_enrollments: Some(true),
            min_enrollments: Some(1),
            max_enrollments: Some(2),
            enrolled_in_course: Some(vec![1, 2]),
            ..Default::default()
        };

        let result = apply(&dataset, &filters).unwrap();

        // brute-force re-evaluation of every predicate
        let expected: Vec<u64> = dataset
            .trainees
            .iter()
            .filter(|t| t.email.to_lowercase().contains(".com"))
            .filter(|t| {
                let count = dataset
                    .enrollments
                    .iter()
                    .filter(|e| e.trainee_id == t.id)
                    .count();
                count >= 1 && count <= 2
            })
            .filter(|t| {
                dataset
                    .enrollments
                    .iter()
                    .any(|e| e.trainee_id == t.id && (e.course_id == 1 || e.course_id == 2))
            })
            .map(|t| t.id)
            .collect();

        assert_eq!(result.iter().map(|t| t.id).collect::<Vec<_>>(), expected);
    }

    #[test]
    fn test_sample_returns_distinct_members_of_filtered_set() {
        let dataset = fixture();
        let filters = TraineeFilters {
            random_sample: true,
            random_sample_size: Some(2),
            random_sample_seed: Some(7),
            ..Default::default()
        };
        let result = apply(&dataset, &filters).unwrap();

        assert_eq!(result.len(), 2);
        let ids: HashSet<u64> = result.iter().map(|t| t.id).collect();
        assert_eq!(ids.len(), 2);
        let universe: HashSet<u64> = dataset.trainees.iter().map(|t| t.id).collect();
        assert!(ids.is_subset(&universe));
    }

    #[test]
    fn test_sample_is_deterministic_with_seed() {
        let dataset = fixture();
        let filters = TraineeFilters {
            random_sample: true,
            random_sample_size: Some(3),
            random_sample_seed: Some(42),
            ..Default::default()
        };
        let first = apply(&dataset, &filters).unwrap();
        let second = apply(&dataset, &filters).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_sample_overrides_max_results() {
        let dataset = fixture();
        let filters = TraineeFilters {
            random_sample: true,
            random_sample_size: Some(3),
            random_sample_seed: Some(1),
            max_results: Some(1),
            ..Default::default()
        };
        let result = apply(&dataset, &filters).unwrap();
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn test_max_results_caps_without_sampling() {
        let dataset = fixture();
        let filters = TraineeFilters {
            max_results: Some(2),
            ..Default::default()
        };
        let result = apply(&dataset, &filters).unwrap();
        assert_eq!(result.iter().map(|t| t.id).collect::<Vec<_>>(), vec![100, 101]);
    }

    #[test]
    fn test_sample_without_size_rejected() {
        let filters = TraineeFilters {
            random_sample: true,
            ..Default::default()
        };
        assert!(matches!(
            validate(&filters),
            Err(EngineError::InvalidFilter(_))
        ));
    }
}
