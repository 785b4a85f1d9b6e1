use dragrace_api::ladder::build_bracket;
use dragrace_api::wire::RoundRecord;
use dragrace_api::RoundLabel;
use proptest::prelude::*;
use serde_json::{Value, json};

fn round_record(label: u8, drivers: usize) -> RoundRecord {
    let results: Vec<Value> = (0..drivers)
        .map(|i| json!({ "driver_name": format!("D{label}-{i}"), "et": "9.5" }))
        .collect();
    RoundRecord {
        round: Some(json!(label.to_string())),
        results: Some(Value::Array(results)),
        ..Default::default()
    }
}

fn labels() -> impl Strategy<Value = u8> {
    prop_oneof![1u8..=12, Just(100u8)]
}

proptest! {
    #[test]
    fn regular_rounds_hold_half_the_drivers_rounded_up(drivers in 1usize..40) {
        let bracket = build_bracket(&[round_record(1, drivers)]).unwrap();
        prop_assert_eq!(bracket.len(), 1);
        let matches = &bracket[0].matches;
        prop_assert_eq!(matches.len(), drivers.div_ceil(2));
        let byes = matches.iter().filter(|m| m.player2.is_bye()).count();
        prop_assert_eq!(byes, drivers % 2);
        if drivers % 2 == 1 {
            prop_assert!(matches.last().unwrap().player2.is_bye());
        }
    }

    #[test]
    fn rounds_come_out_sorted_with_the_final_last(
        layout in prop::collection::vec((labels(), 0usize..6), 0..8)
    ) {
        let raw: Vec<RoundRecord> = layout.iter().map(|(l, n)| round_record(*l, *n)).collect();
        let bracket = build_bracket(&raw).unwrap();

        let expected = layout.iter().filter(|(_, n)| *n > 0).count();
        prop_assert_eq!(bracket.len(), expected);
        prop_assert!(bracket.windows(2).all(|w| w[0].label <= w[1].label));
        for (i, round) in bracket.iter().enumerate() {
            prop_assert!(!round.matches.is_empty());
            if round.label == RoundLabel::Final {
                prop_assert_eq!(round.matches.len(), 1);
                prop_assert_eq!(round.matches[0].player2.name.as_str(), "WINNER");
                prop_assert!(bracket[i..].iter().all(|r| r.label.is_final()));
            }
        }
    }
}
