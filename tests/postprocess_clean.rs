use pdf_harvest::{config::Config, postprocess::Cleaner};

#[test]
fn default_cleaner_only_normalizes_newlines() {
    let cleaner = Cleaner::new(&Config::default()).unwrap();
    let out = cleaner.clean("# Title  \r\nBody\\path\r\n");
    assert_eq!(out, "# Title  \nBody\\path\n");
}

#[test]
fn sanitizes_control_chars_but_keeps_structure() {
    let mut cfg = Config::default();
    cfg.postprocess.control_chars_to_sanitize = vec![0x02, 0x07];
    let cleaner = Cleaner::new(&cfg).unwrap();
    let out = cleaner.clean("Alpha\u{0002}Beta\u{0007}\nLine\tTabbed");
    assert_eq!(out, "AlphaBeta\nLine\tTabbed");
}

#[test]
fn regex_removes_page_footers() {
    let mut cfg = Config::default();
    cfg.postprocess.remove_by_regex = true;
    cfg.postprocess.trim_trailing_whitespace = true;
    let cleaner = Cleaner::new(&cfg).unwrap();
    let out = cleaner.clean("Intro\nPage 3\n  12 / 40  \nOutro");
    assert_eq!(out, "Intro\nOutro");
}

#[test]
fn invalid_pattern_is_rejected_up_front() {
    let mut cfg = Config::default();
    cfg.postprocess.remove_by_regex = true;
    cfg.postprocess.regex.patterns = vec!["(unclosed".into()];
    assert!(Cleaner::new(&cfg).is_err());
}

#[test]
fn passthrough_leaves_content_alone() {
    let raw = "a\r\nb  \n";
    assert_eq!(Cleaner::passthrough().clean(raw), raw);
}
