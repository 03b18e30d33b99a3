use pdf_harvest::config::Config;

#[test]
fn parse_example_config() {
    let raw = include_str!("../pdf-harvest.example.toml");
    let cfg: Config = toml::from_str(raw).expect("parse TOML");
    assert_eq!(cfg.batch.sample_size, 5);
    assert_eq!(cfg.batch.max_workers, 1);
    assert_eq!(cfg.batch.max_workers_ceiling, 32);
    assert!(cfg.batch.seed.is_none());
    assert_eq!(cfg.paths.out_dir, "markdown_output");
    assert_eq!(cfg.output.combined_filename, "all_documents.md");
}

#[test]
fn missing_sections_fall_back_to_defaults() {
    let cfg: Config = toml::from_str("[batch]\nseed = 7\n").expect("parse TOML");
    assert_eq!(cfg.batch.seed, Some(7));
    assert_eq!(cfg.discovery.extension, "pdf");
    assert_eq!(cfg.output.training_filename, "features.json");
    assert_eq!(cfg.output.results_filename, "processing_results.json");
}

#[test]
fn single_key_overrides_keep_the_rest_of_the_section() {
    let raw = "[batch]\nmax_workers = 8\n\n[converter]\ntimeout_seconds = 30\n\n\
               [postprocess]\nremove_by_regex = true\n";
    let cfg: Config = toml::from_str(raw).expect("parse TOML");
    assert_eq!(cfg.batch.max_workers, 8);
    assert_eq!(cfg.batch.sample_size, 5);
    assert_eq!(cfg.batch.max_workers_ceiling, 32);
    assert!(cfg.batch.print_summary);
    assert_eq!(cfg.converter.timeout_seconds, 30);
    assert_eq!(cfg.converter.python_exe, "auto");
    assert!(cfg.postprocess.remove_by_regex);
    assert!(cfg.postprocess.normalize_newlines);
    assert_eq!(cfg.postprocess.regex.patterns.len(), 1);
}
