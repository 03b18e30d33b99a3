use pdf_harvest::{
    config::Config,
    sample::{choose_sample, discover_inputs, make_rng, select_inputs, InputFile},
};
use std::collections::HashSet;
use std::path::PathBuf;

fn files(n: usize) -> Vec<InputFile> {
    (0..n)
        .map(|i| InputFile {
            name: format!("doc{i:02}.pdf"),
            path: PathBuf::from(format!("/in/doc{i:02}.pdf")),
            size: i as u64,
        })
        .collect()
}

#[test]
fn picks_exactly_five_distinct_from_many() {
    let all = files(12);
    let mut rng = make_rng(Some(1));
    let picked = choose_sample(&all, 5, &mut rng);
    assert_eq!(picked.len(), 5);
    let names: HashSet<_> = picked.iter().map(|f| f.name.clone()).collect();
    assert_eq!(names.len(), 5);
    assert!(picked.iter().all(|f| all.contains(f)));
}

#[test]
fn exactly_five_selects_all_five() {
    let all = files(5);
    let mut rng = make_rng(Some(9));
    let picked = choose_sample(&all, 5, &mut rng);
    let mut names: Vec<_> = picked.iter().map(|f| f.name.clone()).collect();
    names.sort();
    let mut want: Vec<_> = all.iter().map(|f| f.name.clone()).collect();
    want.sort();
    assert_eq!(names, want);
}

#[test]
fn fewer_than_five_selects_everything() {
    let all = files(3);
    let mut rng = make_rng(None);
    assert_eq!(choose_sample(&all, 5, &mut rng).len(), 3);
}

#[test]
fn same_seed_same_selection() {
    let all = files(20);
    let a = choose_sample(&all, 5, &mut make_rng(Some(42)));
    let b = choose_sample(&all, 5, &mut make_rng(Some(42)));
    assert_eq!(a, b);
}

#[test]
fn discovery_filters_by_extension() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.pdf"), b"%PDF-a").unwrap();
    std::fs::write(dir.path().join("b.PDF"), b"%PDF-b").unwrap();
    std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();
    std::fs::create_dir(dir.path().join("nested.pdf")).unwrap();

    let mut cfg = Config::default();
    let found = discover_inputs(&cfg, dir.path()).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "a.pdf");
    assert_eq!(found[0].size, 6);

    cfg.discovery.case_insensitive = true;
    assert_eq!(discover_inputs(&cfg, dir.path()).unwrap().len(), 2);
}

#[test]
fn empty_folder_is_nothing_to_process() {
    let dir = tempfile::tempdir().unwrap();
    let (total, picked) = select_inputs(&Config::default(), dir.path()).unwrap();
    assert_eq!(total, 0);
    assert!(picked.is_empty());
}

#[test]
fn missing_folder_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(select_inputs(&Config::default(), &dir.path().join("nope")).is_err());
}
