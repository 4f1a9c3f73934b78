use std::fs;

use partfinder_index::{CompatibilityRecord, InstallationRecord, MapBuilder, StructuredIndex};
use proptest::prelude::*;
use tempfile::TempDir;

fn install(part: &str, text: &str) -> InstallationRecord {
    InstallationRecord {
        part_number: part.to_string(),
        title: "Door Gasket".to_string(),
        text: text.to_string(),
        url: "https://www.partselect.com/PS1.htm".to_string(),
    }
}

#[test]
fn compatibility_rows_fill_both_directions() {
    let mut builder = MapBuilder::new();
    builder.add_compatibility(&CompatibilityRecord::new(" ps10065979 ", &["wdt780saem1", "66512762K314"]));
    builder.add_compatibility(&CompatibilityRecord::new("PS11752991", &["WDT780SAEM1"]));

    let index = builder.build();
    assert_eq!(index.lookup_part("PS10065979"), ["66512762K314", "WDT780SAEM1"]);
    assert_eq!(index.lookup_model("WDT780SAEM1"), ["PS10065979", "PS11752991"]);
}

#[test]
fn noisy_models_and_empty_parts_are_skipped() {
    let mut builder = MapBuilder::new();
    builder.add_compatibility(&CompatibilityRecord::new("", &["WDT780SAEM1"]));
    builder.add_compatibility(&CompatibilityRecord::new("PS1234", &["A1", "BRAND", "123456"]));

    let stats = builder.build().stats();
    assert_eq!(stats.parts, 0);
    assert_eq!(stats.models, 0);
}

#[test]
fn short_installation_text_is_skipped() {
    let mut builder = MapBuilder::new();
    builder.add_installation(&install("PS1", "too short"));
    builder.add_installation(&install("", "This text is certainly long enough."));
    builder.add_installation(&install("ps2", "  Remove the two screws and lift the panel.  "));

    assert_eq!(builder.skipped_installation(), 2);
    let index = builder.build();
    assert!(index.lookup_manual("PS1").is_none());
    let entry = index.lookup_manual("PS2").unwrap();
    assert_eq!(entry.installation_text, "Remove the two screws and lift the panel.");
}

#[test]
fn written_maps_load_back() {
    let mut builder = MapBuilder::new();
    builder.add_compatibility(&CompatibilityRecord::new("PS10065979", &["66512762K314"]));
    builder.add_installation(&install("PS10065979", "Pull the rack out and swap the adjusters."));

    let tmp = TempDir::new().unwrap();
    let paths = builder.write_to(&tmp.path().join("maps")).unwrap();
    let index = StructuredIndex::load(&paths).unwrap();

    assert_eq!(index.lookup_part("PS10065979"), ["66512762K314"]);
    assert_eq!(index.lookup_model("66512762K314"), ["PS10065979"]);
    assert!(index.lookup_manual("PS10065979").is_some());
}

#[test]
fn reads_scraped_record_files() {
    let tmp = TempDir::new().unwrap();
    let compat = tmp.path().join("compatibility.json");
    let installation = tmp.path().join("installation.json");
    fs::write(
        &compat,
        r#"[{"part_number": "PS11752991", "models": ["2213N414", 7], "brands": ["Whirlpool"]}]"#,
    )
    .unwrap();
    fs::write(
        &installation,
        r#"[{"part_number": "PS11752991", "title": "Bin", "text": "Lift the old bin out and drop in the new one.", "url": "u", "id": "x"}]"#,
    )
    .unwrap();

    let mut builder = MapBuilder::new();
    builder.extend_compatibility(&MapBuilder::read_compatibility(&compat).unwrap());
    builder.extend_installation(&MapBuilder::read_installation(&installation).unwrap());

    let index = builder.build();
    assert_eq!(index.lookup_part("PS11752991"), ["2213N414"]);
    assert_eq!(index.lookup_manual("PS11752991").unwrap().title, "Bin");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn every_source_pair_is_reachable_both_ways(
        rows in prop::collection::vec(
            ("PS[0-9]{4,8}", prop::collection::vec("[A-Z]{2,4}[0-9]{3,4}[A-Z]{0,2}", 1..5)),
            1..12,
        )
    ) {
        let records: Vec<CompatibilityRecord> = rows
            .iter()
            .map(|(part, models)| CompatibilityRecord {
                part_number: part.clone(),
                models: models.clone(),
            })
            .collect();
        let mut builder = MapBuilder::new();
        builder.extend_compatibility(&records);
        let index = builder.build();

        for (part, models) in &rows {
            for model in models {
                prop_assert!(index.lookup_part(part).contains(model));
                prop_assert!(index.lookup_model(model).contains(part));
            }
        }
    }
}
