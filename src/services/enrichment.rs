use crate::models::TraineeResult;
use crate::services::providers::AiProvider;

/// Rewrites the templated explanations for one trainee through the AI
/// provider.
///
/// Strictly best-effort: the templated text is already a complete answer,
/// so any provider failure keeps it and stops further calls for this
/// trainee rather than failing the run.
pub async fn enrich_explanations(provider: &dyn AiProvider, result: &mut TraineeResult) {
    for recommendation in &mut result.recommendations {
        let prompt = build_prompt(
            &result.trainee_name,
            &result.current_courses,
            &recommendation.course_name,
            recommendation.probability,
        );

        match provider.generate(&prompt).await {
            Ok(text) if !text.trim().is_empty() => {
                recommendation.explanation = text.trim().to_string();
            }
            Ok(_) => {
                tracing::debug!(
                    provider = provider.name(),
                    course = %recommendation.course_name,
                    "Provider returned empty text, keeping template"
                );
            }
            Err(e) => {
                tracing::warn!(
                    provider = provider.name(),
                    error = %e,
                    "Explanation enrichment failed, keeping templates"
                );
                return;
            }
        }
    }
}

fn build_prompt(
    trainee_name: &str,
    current_courses: &[String],
    course_name: &str,
    probability: f64,
) -> String {
    format!(
        "In one sentence, explain to {} why the course \"{}\" is a good next step. \
         They are currently enrolled in: {}. Our model rates the match at {}%. \
         Do not mention the percentage.",
        trainee_name,
        course_name,
        if current_courses.is_empty() {
            "no courses yet".to_string()
        } else {
            current_courses.join(", ")
        },
        (probability * 100.0).round() as i64
    )
}
