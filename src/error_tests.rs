//! Tests for error types

#[cfg(test)]
mod tests {
    use super::super::error::*;
    use std::path::PathBuf;

    #[test]
    fn test_not_found_message_points_at_training() {
        let err = ModelError::ArtifactNotFound(PathBuf::from("out/pa_outcome_rates.json"));
        let msg = err.to_string();
        assert!(msg.contains("out/pa_outcome_rates.json"));
        assert!(msg.contains("pa-model train"));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_other_errors_are_not_not_found() {
        assert!(!ModelError::NoData("empty".into()).is_not_found());
        assert!(!ModelError::InvalidArtifact("bad".into()).is_not_found());
    }

    #[test]
    fn test_io_error_converts() {
        fn read() -> Result<String> {
            Ok(std::fs::read_to_string("/nonexistent/pa_outcome_model.json")?)
        }
        let err = read().unwrap_err();
        assert!(matches!(err, ModelError::Io(_)));
        assert!(err.to_string().starts_with("IO error"));
    }

    #[test]
    fn test_json_error_converts() {
        fn parse() -> Result<serde_json::Value> {
            Ok(serde_json::from_str("{")?)
        }
        assert!(matches!(parse(), Err(ModelError::Json(_))));
    }
}
