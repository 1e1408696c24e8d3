//! Recommend command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::pipeline::{ComprehensionPoint, RecommendationPipeline};
use anyhow::{Context, Result};

/// Comprehension score given to timestamps passed with `--at`.
const FULLY_CONFUSED: f64 = -1.0;

/// Run the recommend command.
pub async fn run_recommend(
    video: &str,
    points: Option<String>,
    at: &[f64],
    settings: Settings,
) -> Result<()> {
    let points = load_points(points.as_deref(), at)?;
    if points.is_empty() {
        Output::error("No comprehension points given. Use --points FILE or --at T...");
        anyhow::bail!("no comprehension points");
    }

    if let Err(e) = preflight::check(Operation::Recommend, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'personalearn doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let pipeline = RecommendationPipeline::new(&settings)?;

    let spinner = Output::spinner(&format!("Finding recommendations for {}...", video));
    let result = pipeline.recommend(video, &points).await;
    spinner.finish_and_clear();

    let recommendations = result?;
    if recommendations.is_empty() {
        Output::warning("No recommendations: no confusing moments or every segment failed.");
    } else {
        Output::success(&format!("{} recommendation(s)", recommendations.len()));
    }

    println!("{}", serde_json::to_string_pretty(&recommendations)?);
    Ok(())
}

/// Comprehension points from a JSON file, or fully confused samples at the given times.
fn load_points(path: Option<&str>, at: &[f64]) -> Result<Vec<ComprehensionPoint>> {
    match path {
        Some(path) => {
            let path = Settings::expand_path(path);
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Invalid comprehension points in {}", path.display()))
        }
        None => Ok(at
            .iter()
            .map(|&timestamp| ComprehensionPoint {
                timestamp,
                comprehension: FULLY_CONFUSED,
            })
            .collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{extract_confusion_timestamps, CONFUSION_THRESHOLD};

    #[test]
    fn test_at_timestamps_are_confused() {
        let points = load_points(None, &[12.0, 30.5]).unwrap();
        assert_eq!(
            extract_confusion_timestamps(&points, CONFUSION_THRESHOLD),
            vec![12.0, 30.5]
        );
    }

    #[test]
    fn test_points_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("points.json");
        std::fs::write(
            &path,
            r#"[{"timestamp": 5.0, "comprehension": 0.3}, {"timestamp": 9.0, "comprehension": -0.7}]"#,
        )
        .unwrap();

        let points = load_points(path.to_str(), &[]).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[1].comprehension, -0.7);
    }

    #[test]
    fn test_malformed_points_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("points.json");
        std::fs::write(&path, "[{\"timestamp\": \"soon\"}]").unwrap();

        assert!(load_points(path.to_str(), &[]).is_err());
    }
}
