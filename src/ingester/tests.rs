//! Tests for event classification and dataset loading

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::client::{RawPitch, RawPitchTable};
    use crate::types::{Outcome, PlatoonMatchup};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn pitch(events: Option<&str>, balls: &str, strikes: &str, stand: &str, p_throws: &str) -> RawPitch {
        RawPitch {
            game_date: Some("2024-05-01".to_string()),
            events: events.map(str::to_string),
            outcome: None,
            balls: Some(balls.to_string()),
            strikes: Some(strikes.to_string()),
            stand: Some(stand.to_string()),
            p_throws: Some(p_throws.to_string()),
            inning: Some("3".to_string()),
            outs_when_up: Some("1".to_string()),
        }
    }

    fn statcast_columns() -> Vec<String> {
        ["game_date", "events", "balls", "strikes", "stand", "p_throws", "inning", "outs_when_up"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    // ==================== Classifier ====================

    #[test]
    fn test_classify_basic_events() {
        assert_eq!(classify_event(Some("walk")), Outcome::Walk);
        assert_eq!(classify_event(Some("hit_by_pitch")), Outcome::HitByPitch);
        assert_eq!(classify_event(Some("single")), Outcome::Single);
        assert_eq!(classify_event(Some("double")), Outcome::Double);
        assert_eq!(classify_event(Some("triple")), Outcome::Triple);
        assert_eq!(classify_event(Some("home_run")), Outcome::HomeRun);
        assert_eq!(classify_event(Some("strikeout")), Outcome::Strikeout);
        assert_eq!(classify_event(Some("field_out")), Outcome::Out);
    }

    #[test]
    fn test_classify_precedence_and_fallback() {
        // double_play is checked before strikeout
        assert_eq!(classify_event(Some("strikeout_double_play")), Outcome::Out);
        assert_eq!(classify_event(Some("field_error")), Outcome::Out);
        assert_eq!(classify_event(Some("sac_fly")), Outcome::Out);
        assert_eq!(classify_event(Some("grounded_into_double_play")), Outcome::Out);
    }

    #[test]
    fn test_classify_double_play_before_double() {
        assert_eq!(classify_event(Some("double_play")), Outcome::Out);
        assert_eq!(classify_event(Some("sac_fly_double_play")), Outcome::Out);
        assert_eq!(classify_event(Some("triple_play")), Outcome::Out);
    }

    #[test]
    fn test_classify_missing_and_case() {
        assert_eq!(classify_event(None), Outcome::Out);
        assert_eq!(classify_event(Some("WALK")), Outcome::Walk);
        assert_eq!(classify_event(Some("  Home_Run ")), Outcome::HomeRun);
        assert_eq!(classify_event(Some("")), Outcome::Out);
    }

    #[test]
    fn test_classify_unseen_event_is_out() {
        assert_eq!(classify_event(Some("catcher_interf")), Outcome::Out);
        assert_eq!(classify_event(Some("brand_new_event")), Outcome::Out);
    }

    #[test]
    fn test_rule_list_orders_plays_before_hits() {
        let pos = |p: EventPattern| EVENT_RULES.iter().position(|r| r.pattern == p).unwrap();
        assert!(pos(EventPattern::Contains("double_play")) < pos(EventPattern::Exact("double")));
        assert!(pos(EventPattern::Contains("triple_play")) < pos(EventPattern::Exact("triple")));
    }

    // ==================== Coercion ====================

    #[test]
    fn test_coerce_count() {
        assert_eq!(coerce_count(Some("3")), 3);
        assert_eq!(coerce_count(Some("2.0")), 2);
        assert_eq!(coerce_count(Some("abc")), 0);
        assert_eq!(coerce_count(Some("-1")), 0);
        assert_eq!(coerce_count(Some("NaN")), 0);
        assert_eq!(coerce_count(Some("")), 0);
        assert_eq!(coerce_count(None), 0);
        assert_eq!(coerce_count(Some("99999999999")), u32::MAX);
    }

    #[test]
    fn test_coerce_numeric() {
        assert_eq!(coerce_numeric("7"), 7.0);
        assert_eq!(coerce_numeric("x"), 0.0);
        assert_eq!(coerce_numeric("inf"), 0.0);
    }

    // ==================== Dataset ====================

    #[test]
    fn test_from_raw_keeps_only_final_pitches() {
        let table = RawPitchTable {
            columns: statcast_columns(),
            rows: vec![
                pitch(None, "0", "0", "R", "R"),
                pitch(Some("walk"), "3", "1", "R", "R"),
                pitch(Some(""), "1", "1", "L", "R"),
                pitch(Some("grounded_into_double_play"), "1", "1", "L", "R"),
            ],
        };
        let dataset = PaDataset::from_raw(table);
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.records[0].outcome, Some(Outcome::Walk));
        assert_eq!(dataset.records[0].balls, 3);
        assert_eq!(dataset.records[0].game_date, Some(date(2024, 5, 1)));
        assert_eq!(dataset.records[1].outcome, Some(Outcome::Out));
        assert!(dataset.has_inning);
        assert!(dataset.has_outs_when_up);
    }

    #[test]
    fn test_from_raw_coerces_bad_counts() {
        let table = RawPitchTable {
            columns: statcast_columns(),
            rows: vec![pitch(Some("single"), "x", "2.0", "R", "L")],
        };
        let dataset = PaDataset::from_raw(table);
        assert_eq!(dataset.records[0].balls, 0);
        assert_eq!(dataset.records[0].strikes, 2);
    }

    #[test]
    fn test_from_raw_without_optional_columns() {
        let mut row = pitch(Some("single"), "0", "0", "R", "L");
        row.inning = None;
        row.outs_when_up = None;
        let table = RawPitchTable {
            columns: vec!["events".into(), "balls".into(), "strikes".into()],
            rows: vec![row],
        };
        let dataset = PaDataset::from_raw(table);
        assert!(!dataset.has_inning);
        assert!(!dataset.has_outs_when_up);
    }

    #[test]
    fn test_from_raw_prelabeled_unknown_label() {
        let mut good = pitch(Some("single"), "0", "0", "R", "L");
        good.outcome = Some("Single".to_string());
        let mut bad = pitch(Some("field_out"), "0", "0", "R", "L");
        bad.outcome = Some("Sacrifice".to_string());
        let mut columns = statcast_columns();
        columns.push("outcome".to_string());

        let dataset = PaDataset::from_raw(RawPitchTable {
            columns,
            rows: vec![good, bad],
        });
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.records[0].outcome, Some(Outcome::Single));
        assert_eq!(dataset.records[1].outcome, None);
    }

    #[test]
    fn test_platoon_counts_and_filter() {
        let table = RawPitchTable {
            columns: statcast_columns(),
            rows: vec![
                pitch(Some("walk"), "0", "0", "R", "R"),
                pitch(Some("single"), "0", "0", "L", "R"),
                pitch(Some("double"), "0", "0", "L", "R"),
            ],
        };
        let dataset = PaDataset::from_raw(table);
        assert_eq!(
            dataset.platoon_counts(),
            vec![(PlatoonMatchup::Same, 1), (PlatoonMatchup::Opposite, 2)]
        );
        let opposite = dataset.filter_matchup(PlatoonMatchup::Opposite);
        assert_eq!(opposite.len(), 2);
        assert!(opposite.has_inning);
    }

    #[tokio::test]
    async fn test_load_pa_dataset_empty_source() {
        let mut source = MockPitchSource::new();
        source
            .expect_fetch()
            .times(1)
            .returning(|_, _| Ok(RawPitchTable::default()));

        let dataset = load_pa_dataset(&source, date(2024, 4, 1), date(2024, 4, 2))
            .await
            .unwrap();
        assert!(dataset.is_empty());
    }

    #[tokio::test]
    async fn test_load_pa_dataset_passes_range() {
        let mut source = MockPitchSource::new();
        source
            .expect_fetch()
            .withf(|start, end| {
                *start == NaiveDate::from_ymd_opt(2024, 4, 1).unwrap()
                    && *end == NaiveDate::from_ymd_opt(2024, 4, 30).unwrap()
            })
            .returning(|_, _| {
                Ok(RawPitchTable {
                    columns: statcast_columns(),
                    rows: vec![pitch(Some("home_run"), "1", "0", "R", "L")],
                })
            });

        let dataset = load_pa_dataset(&source, date(2024, 4, 1), date(2024, 4, 30))
            .await
            .unwrap();
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.records[0].outcome, Some(Outcome::HomeRun));
    }

    #[tokio::test]
    async fn test_load_pa_dataset_rejects_reversed_range() {
        let source = MockPitchSource::new();
        let result = load_pa_dataset(&source, date(2024, 5, 1), date(2024, 4, 1)).await;
        assert!(matches!(result, Err(crate::error::ModelError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_csv_file_source_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = CsvFileSource::new(dir.path().join("none.csv"));
        let result = source.fetch(date(2024, 4, 1), date(2024, 4, 2)).await;
        assert!(result.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_csv_file_source_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pas.csv");
        std::fs::write(
            &path,
            "events,balls,strikes,stand,p_throws\nwalk,3,0,R,R\n,0,0,R,R\nsingle,1,1,L,R\n",
        )
        .unwrap();

        let source = CsvFileSource::new(&path);
        let dataset = load_pa_dataset(&source, date(2024, 4, 1), date(2024, 4, 2))
            .await
            .unwrap();
        assert_eq!(dataset.len(), 2);
        assert!(!dataset.has_inning);
    }
}
