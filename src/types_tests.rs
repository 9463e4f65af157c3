//! Tests for core types

#[cfg(test)]
mod tests {
    use super::super::types::*;

    #[test]
    fn test_outcome_order_and_names() {
        let names: Vec<&str> = Outcome::ALL.iter().map(|o| o.name()).collect();
        assert_eq!(
            names,
            vec!["Walk", "HBP", "Single", "Double", "Triple", "HR", "Strikeout", "Out"]
        );
        for (i, outcome) in Outcome::ALL.iter().enumerate() {
            assert_eq!(outcome.index(), i);
        }
    }

    #[test]
    fn test_outcome_serialization() {
        assert_eq!(serde_json::to_string(&Outcome::HitByPitch).unwrap(), "\"HBP\"");
        assert_eq!(serde_json::to_string(&Outcome::HomeRun).unwrap(), "\"HR\"");
        let parsed: Outcome = serde_json::from_str("\"Strikeout\"").unwrap();
        assert_eq!(parsed, Outcome::Strikeout);
    }

    #[test]
    fn test_outcome_from_str_is_exact() {
        assert_eq!("HR".parse::<Outcome>().unwrap(), Outcome::HomeRun);
        assert!("home_run".parse::<Outcome>().is_err());
        assert!("walk".parse::<Outcome>().is_err());
    }

    #[test]
    fn test_platoon_from_hands() {
        assert_eq!(PlatoonMatchup::from_hands(Some("R"), Some("r")), Some(PlatoonMatchup::Same));
        assert_eq!(PlatoonMatchup::from_hands(Some("L"), Some("R")), Some(PlatoonMatchup::Opposite));
        assert_eq!(PlatoonMatchup::from_hands(None, Some("R")), None);
        assert_eq!(PlatoonMatchup::from_hands(Some(" "), Some("R")), None);
    }

    #[test]
    fn test_platoon_parse_and_display() {
        assert_eq!("Same".parse::<PlatoonMatchup>().unwrap(), PlatoonMatchup::Same);
        assert_eq!(PlatoonMatchup::Opposite.to_string(), "opposite");
        assert!("switch".parse::<PlatoonMatchup>().is_err());
    }

    #[test]
    fn test_outcome_probs_serializes_in_fixed_order() {
        let mut probs = OutcomeProbs::zeros();
        probs.set(Outcome::Out, 0.5);
        probs.set(Outcome::Walk, 0.5);
        let json = serde_json::to_string(&probs).unwrap();
        assert_eq!(
            json,
            r#"{"Walk":0.5,"HBP":0.0,"Single":0.0,"Double":0.0,"Triple":0.0,"HR":0.0,"Strikeout":0.0,"Out":0.5}"#
        );
    }

    #[test]
    fn test_outcome_probs_rejects_unknown_key() {
        let result: Result<OutcomeProbs, _> = serde_json::from_str(r#"{"Walk":0.1,"Bunt":0.9}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_outcome_probs_rejects_missing_categories() {
        let result: Result<OutcomeProbs, _> = serde_json::from_str(r#"{"Walk":1.0}"#);
        let err = result.unwrap_err().to_string();
        assert!(err.contains("missing categories"));
        assert!(err.contains("HBP"));
        assert!(!err.contains("Walk"));
    }

    #[test]
    fn test_outcome_probs_rejects_out_of_range() {
        let result: Result<OutcomeProbs, _> = serde_json::from_str(r#"{"Walk":1.5}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_most_likely() {
        let probs = OutcomeProbs::from_values([0.1, 0.0, 0.2, 0.0, 0.0, 0.0, 0.2, 0.5]);
        assert_eq!(probs.most_likely(), Some(Outcome::Out));
        assert_eq!(OutcomeProbs::zeros().most_likely(), None);
    }

    #[test]
    fn test_plate_appearance_matchup() {
        let pa = PlateAppearance {
            stand: Some("L".to_string()),
            p_throws: Some("L".to_string()),
            ..Default::default()
        };
        assert_eq!(pa.platoon_matchup(), Some(PlatoonMatchup::Same));
        assert_eq!(PlateAppearance::default().platoon_matchup(), None);
    }
}
