use figment::{
    providers::{Format, Serialized, Toml},
    Figment,
};
use partfinder_core::config::{Config, Settings, DEFAULT_TABLE};
use partfinder_core::SourceFilter;

fn with_toml(toml: &str) -> Figment {
    Figment::from(Serialized::defaults(Settings::default())).merge(Toml::string(toml))
}

#[test]
fn toml_overrides_nested_keys() {
    let cfg = Config::from_figment(with_toml(
        r#"
        [retrieval]
        semantic_timeout_ms = 250

        [retrieval.k]
        general = 8

        [data]
        lancedb_dir = "/var/lib/partfinder/lancedb"
        "#,
    ))
    .unwrap();

    let s = cfg.settings();
    assert_eq!(s.retrieval.semantic_timeout_ms, 250);
    assert_eq!(s.retrieval.k.for_source(SourceFilter::General), 8);
    assert_eq!(s.retrieval.k.compatibility, 3);
    assert_eq!(s.data.lancedb_dir, "/var/lib/partfinder/lancedb");
    assert_eq!(s.data.table, DEFAULT_TABLE);
    assert!(s.retrieval.semantic_enabled);
}

#[test]
fn get_reads_single_keys() {
    let cfg = Config::from_figment(with_toml("[embed]\nuse_fake = true\n")).unwrap();
    let use_fake: bool = cfg.get("embed.use_fake").unwrap();
    assert!(use_fake);
    assert!(cfg.get::<u64>("retrieval.nope").is_err());
}

#[test]
fn zero_timeout_is_fatal() {
    let err = match Config::from_figment(with_toml("[retrieval]\nsemantic_timeout_ms = 0\n")) {
        Ok(_) => panic!("zero timeout accepted"),
        Err(e) => e,
    };
    assert!(err.is_fatal());
}

#[test]
fn wrong_type_is_rejected() {
    assert!(Config::from_figment(with_toml("[retrieval]\nsemantic_enabled = \"maybe\"\n")).is_err());
}
