use std::collections::HashSet;

use crate::models::Dataset;

/// Removes enrollments that reference a course missing from the catalog.
///
/// Courses and trainees pass through unchanged; the input is not mutated.
/// With an empty course list every enrollment is dropped.
pub fn sanitize(dataset: &Dataset) -> Dataset {
    let known_courses: HashSet<u64> = dataset.courses.iter().map(|c| c.id).collect();

    let enrollments = dataset
        .enrollments
        .iter()
        .filter(|e| known_courses.contains(&e.course_id))
        .cloned()
        .collect();

    Dataset {
        courses: dataset.courses.clone(),
        trainees: dataset.trainees.clone(),
        enrollments,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Course, Enrollment, Trainee};
    use chrono::NaiveDate;

    fn enrollment(trainee_id: u64, course_id: u64) -> Enrollment {
        Enrollment {
            trainee_id,
            course_id,
            enrollment_date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
        }
    }

    fn course(id: u64, name: &str) -> Course {
        Course {
            id,
            name: name.to_string(),
            status: 2,
        }
    }

    #[test]
    fn test_drops_enrollments_for_unknown_courses() {
        let dataset = Dataset {
            courses: vec![course(1, "Rust Basics"), course(2, "Async Rust")],
            trainees: vec![Trainee {
                id: 100,
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                phone: String::new(),
            }],
            enrollments: vec![enrollment(100, 1), enrollment(100, 99), enrollment(100, 2)],
        };

        let sanitized = sanitize(&dataset);

        assert_eq!(sanitized.enrollments.len(), 2);
        let known: std::collections::HashSet<u64> =
            sanitized.courses.iter().map(|c| c.id).collect();
        assert!(sanitized
            .enrollments
            .iter()
            .all(|e| known.contains(&e.course_id)));
        // courses and trainees pass through unchanged
        assert_eq!(sanitized.courses, dataset.courses);
        assert_eq!(sanitized.trainees, dataset.trainees);
        // input untouched
        assert_eq!(dataset.enrollments.len(), 3);
    }

    #[test]
    fn test_empty_course_list_drops_everything() {
        let dataset = Dataset {
            courses: vec![],
            trainees: vec![],
            enrollments: vec![enrollment(100, 1)],
        };

        let sanitized = sanitize(&dataset);
        assert!(sanitized.enrollments.is_empty());
    }
}
