use partfinder_core::{extract, IdentifierExtractor, ModelRule};
use proptest::prelude::*;

#[test]
fn compatibility_question_yields_part_and_model() {
    let ids = extract("Is PS10065979 compatible with 66512762K314?");
    assert_eq!(ids.part_numbers, vec!["PS10065979"]);
    assert_eq!(ids.model_numbers, vec!["66512762K314"]);
}

#[test]
fn lower_case_input_is_normalized() {
    let ids = extract("how can i install part number ps11752991 on my wdt780saem1");
    assert_eq!(ids.part_numbers, vec!["PS11752991"]);
    assert_eq!(ids.model_numbers, vec!["WDT780SAEM1"]);
}

#[test]
fn every_default_model_shape_is_recognized() {
    let ids = extract("models: KDTM354DSS5, 66512762K314, 13263K112 and 2213N414.");
    assert_eq!(
        ids.model_numbers,
        vec!["KDTM354DSS5", "66512762K314", "13263K112", "2213N414"]
    );
    assert!(ids.part_numbers.is_empty());
}

#[test]
fn models_are_reported_in_text_order_not_rule_order() {
    // digits4 rule is last in priority but its token comes first in the text
    let ids = extract("2213N414 or WDT780SAEM1");
    assert_eq!(ids.model_numbers, vec!["2213N414", "WDT780SAEM1"]);
}

#[test]
fn duplicates_collapse_to_first_occurrence() {
    let ids = extract("PS11752991 vs PS10065979 vs ps11752991");
    assert_eq!(ids.part_numbers, vec!["PS11752991", "PS10065979"]);
}

#[test]
fn part_numbers_need_four_digits() {
    let ids = extract("PS123 is too short, PS1234 is fine");
    assert_eq!(ids.part_numbers, vec!["PS1234"]);
}

#[test]
fn plain_text_has_no_identifiers() {
    let ids = extract("My dishwasher is leaking from the door");
    assert!(ids.is_empty());
}

#[test]
fn earlier_rule_claims_the_span() {
    let extractor = IdentifierExtractor::new().with_model_rules(vec![
        ModelRule::new("digits4-letter", r"\b\d{4}[A-Z]").unwrap(),
        ModelRule::new("digits4-letter-digits3", r"\b\d{4}[A-Z]\d{3}\b").unwrap(),
    ]);
    let ids = extractor.extract("2213N414");
    assert_eq!(ids.model_numbers, vec!["2213N"]);
}

#[test]
fn model_rules_never_capture_a_part_span() {
    let extractor = IdentifierExtractor::new()
        .with_model_rules(vec![ModelRule::new("anything-ps", r"PS\d+").unwrap()]);
    let ids = extractor.extract("PS10065979");
    assert_eq!(ids.part_numbers, vec!["PS10065979"]);
    assert!(ids.model_numbers.is_empty());
}

#[test]
fn invalid_rule_is_a_config_error() {
    let err = ModelRule::new("broken", r"([A-Z").unwrap_err();
    assert!(err.to_string().contains("broken"));
}

#[test]
fn default_rules_are_named_in_priority_order() {
    let extractor = IdentifierExtractor::default();
    let names: Vec<&str> = extractor.model_rules().iter().map(ModelRule::name).collect();
    assert_eq!(
        names,
        vec![
            "letters-digits-letters",
            "digits8-letter-digits3",
            "digits5-letter-digits3",
            "digits4-letter-digits3"
        ]
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn part_numbers_come_back_deduped_in_order(
        digits in prop::collection::vec("[0-9]{4,9}", 1..8),
        lower in prop::collection::vec(any::<bool>(), 8),
    ) {
        let tokens: Vec<String> = digits
            .iter()
            .enumerate()
            .map(|(i, d)| if lower[i] { format!("ps{d}") } else { format!("PS{d}") })
            .collect();
        let query = format!("check {} please", tokens.join(" and "));

        let mut expected: Vec<String> = Vec::new();
        for d in &digits {
            let part = format!("PS{d}");
            if !expected.contains(&part) {
                expected.push(part);
            }
        }

        let ids = extract(&query);
        prop_assert_eq!(ids.part_numbers, expected);
        prop_assert!(ids.model_numbers.is_empty());
    }

    #[test]
    fn extraction_is_deterministic(query in "[ -~]{0,80}") {
        prop_assert_eq!(extract(&query), extract(&query));
    }
}
