use soma_core::pipeline::config::{MotionConfig, PipelineConfig, SeparationConfig, SweepConfig};
use soma_core::pipeline::PipelineStage;
use soma_core::separate::{Method, NmfInit, NmfOptions};

// ---------------------------------------------------------------------------
// Method Display and slug
// ---------------------------------------------------------------------------

#[test]
fn test_method_display() {
    assert_eq!(format!("{}", Method::Pca), "PCA");
    assert_eq!(format!("{}", Method::Ica), "ICA");
    assert_eq!(format!("{}", Method::FactorAnalysis), "Factor Analysis");
    assert_eq!(format!("{}", Method::Nmf), "NMF");
}

#[test]
fn test_method_slug() {
    assert_eq!(Method::Pca.slug(), "pca");
    assert_eq!(Method::Ica.slug(), "ica");
    assert_eq!(Method::FactorAnalysis.slug(), "factor_analysis");
    assert_eq!(Method::Nmf.slug(), "nmf");
}

#[test]
fn test_method_serde_snake_case() {
    assert_eq!(
        serde_json::to_string(&Method::FactorAnalysis).unwrap(),
        "\"factor_analysis\""
    );
    let parsed: Method = serde_json::from_str("\"nmf\"").unwrap();
    assert_eq!(parsed, Method::Nmf);
}

#[test]
fn test_nmf_init_serde_snake_case() {
    assert_eq!(serde_json::to_string(&NmfInit::Nndsvd).unwrap(), "\"nndsvd\"");
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

#[test]
fn test_motion_config_default() {
    let cfg = MotionConfig::default();
    assert!((cfg.template_fraction - 0.2).abs() < 1e-9);
    assert_eq!(cfg.template_iterations, 2);
    assert_eq!(cfg.median_window, 5);
    assert!((cfg.smoothing_sigma - 1.0).abs() < 1e-9);
    assert_eq!(cfg.max_jump, 5);
}

#[test]
fn test_separation_config_default() {
    let cfg = SeparationConfig::default();
    assert_eq!(
        cfg.methods,
        vec![Method::Pca, Method::Ica, Method::FactorAnalysis, Method::Nmf]
    );
    assert_eq!(cfg.k, 8);
    assert!(!cfg.normalize_variance);
}

#[test]
fn test_sweep_config_default() {
    let cfg = SweepConfig::default();
    assert_eq!(cfg.ranks, vec![4, 8, 12, 16]);
    assert_eq!(cfg.alphas, vec![0.0, 0.01, 0.1]);
    assert_eq!(cfg.runs, 5);
}

#[test]
fn test_nmf_options_default() {
    let opts = NmfOptions::default();
    assert_eq!(opts.max_iter, 500);
    assert!((opts.tolerance - 1e-5).abs() < 1e-12);
    assert_eq!(opts.l1, 0.0);
    assert_eq!(opts.l2, 0.0);
    assert_eq!(opts.init, NmfInit::Random);
    assert_eq!(opts.seed, 0);
}

// ---------------------------------------------------------------------------
// TOML round trip
// ---------------------------------------------------------------------------

#[test]
fn test_pipeline_config_toml_round_trip() {
    let config = PipelineConfig {
        input: "movie.nrrd".into(),
        output_dir: "out".into(),
        motion: MotionConfig {
            median_window: 7,
            ..Default::default()
        },
        separation: SeparationConfig {
            methods: vec![Method::Pca, Method::Nmf],
            k: 4,
            ..Default::default()
        },
        sweep: Some(SweepConfig::default()),
    };

    let text = toml::to_string(&config).unwrap();
    let parsed: PipelineConfig = toml::from_str(&text).unwrap();

    assert_eq!(parsed.input, config.input);
    assert_eq!(parsed.output_dir, config.output_dir);
    assert_eq!(parsed.motion.median_window, 7);
    assert_eq!(parsed.separation.methods, vec![Method::Pca, Method::Nmf]);
    assert_eq!(parsed.separation.k, 4);
    assert!(parsed.sweep.is_some());
}

#[test]
fn test_minimal_toml_fills_defaults() {
    let text = "input = \"movie.nrrd\"\noutput_dir = \"out\"\n";
    let parsed: PipelineConfig = toml::from_str(text).unwrap();

    assert_eq!(parsed.motion.median_window, 5);
    assert_eq!(parsed.separation.k, 8);
    assert_eq!(parsed.separation.methods.len(), 4);
    assert!(parsed.sweep.is_none());
}

#[test]
fn test_toml_overrides_nested_fields() {
    let text = "input = \"movie.nrrd\"\n\
                output_dir = \"out\"\n\
                \n\
                [separation]\n\
                methods = [\"pca\", \"factor_analysis\"]\n\
                k = 3\n\
                normalize_variance = true\n";
    let parsed: PipelineConfig = toml::from_str(text).unwrap();

    assert_eq!(
        parsed.separation.methods,
        vec![Method::Pca, Method::FactorAnalysis]
    );
    assert_eq!(parsed.separation.k, 3);
    assert!(parsed.separation.normalize_variance);
    // Untouched sections keep their defaults.
    assert_eq!(parsed.motion.max_jump, 5);
}

// ---------------------------------------------------------------------------
// PipelineStage Display
// ---------------------------------------------------------------------------

#[test]
fn test_pipeline_stage_display() {
    assert_eq!(format!("{}", PipelineStage::Reading), "Reading frames");
    assert_eq!(format!("{}", PipelineStage::Stabilizing), "Stabilizing");
    assert_eq!(
        format!("{}", PipelineStage::WritingMovie),
        "Writing stabilized movie"
    );
    assert_eq!(format!("{}", PipelineStage::Decomposing), "Decomposing");
    assert_eq!(
        format!("{}", PipelineStage::Exporting),
        "Exporting components"
    );
    assert_eq!(
        format!("{}", PipelineStage::Sweeping),
        "Searching hyperparameters"
    );
}
