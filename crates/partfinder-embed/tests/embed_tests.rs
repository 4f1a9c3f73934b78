use partfinder_core::config::EmbedSettings;
use partfinder_core::traits::Embedder;
use partfinder_embed::{load_embedder, HashEmbedder, BGE_M3_DIM};

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[test]
fn fake_embedder_shapes_and_determinism() {
    let settings = EmbedSettings { model_dir: None, use_fake: true };
    let embedder = load_embedder(&settings).expect("embedder");
    let texts = vec!["door gasket".to_string(), "door gasket".to_string()];
    let embs = embedder.embed_batch(&texts).expect("embed_batch");

    assert_eq!(embs[0].len(), BGE_M3_DIM);
    let norm: f32 = embs[0].iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");
    for (a, b) in embs[0].iter().zip(&embs[1]) {
        assert!((a - b).abs() <= 1e-6);
    }
}

#[test]
fn shared_words_score_closer() {
    let e = HashEmbedder::new(256);
    let q = e.embed_text("Dishwasher is leaking water");
    let near = e.embed_text("dishwasher leaking from the door, water on floor");
    let far = e.embed_text("ice maker not making ice");
    assert!(cosine(&q, &near) > cosine(&q, &far));
}

#[test]
fn case_and_punctuation_do_not_matter() {
    let e = HashEmbedder::new(64);
    assert_eq!(e.embed_text("Water Inlet Valve!"), e.embed_text("water inlet valve"));
}

#[test]
fn missing_model_dir_is_a_fatal_credential_error() {
    let settings = EmbedSettings {
        model_dir: Some("/definitely/not/here/bge-m3".to_string()),
        use_fake: false,
    };
    if partfinder_embed::fake_requested_by_env() {
        return;
    }
    let err = match load_embedder(&settings) {
        Ok(_) => panic!("loaded an embedder from a missing directory"),
        Err(e) => e,
    };
    assert!(err.is_fatal());
}
