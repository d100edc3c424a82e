//! End-to-end filtering from rule files on disk.

use mailsift_test::prelude::*;
use std::fs;
use std::sync::Arc;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("mailsift=debug")
        .with_test_writer()
        .try_init();
}

#[test]
fn yaml_file_filters_messages() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("filters.yaml"),
        r#"
'list:announce@': [label:announce, '-inbox']
'from:@bank\.test$': [label:finance, star]
spam: read
"#,
    )
    .unwrap();

    let filter = Filter::new(RuleLoader::new(FileSource::new().with_root(dir.path())));
    let source = RuleSource::named("filters.yaml");

    let mut announce = TestMessage::new()
        .with_list("announce@lists.test")
        .with_labels(["inbox", "unread"]);
    assert_eq!(filter.apply_filters(&mut announce, &source), 1);
    assert_eq!(announce.labels(), ["announce", "unread"]);

    let mut statement = TestMessage::new()
        .with_from("statements@BANK.test")
        .with_labels(["inbox", "starred"]);
    filter.apply_filters(&mut statement, &source);
    assert_eq!(statement.labels(), ["finance", "inbox"]);

    assert!(filter.loader().is_cached("filters.yaml"));
    assert_eq!(filter.loader().cache().len(), 1);
}

#[test]
fn spellings_of_one_file_share_a_cache_entry() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    fs::write(dir.path().join("filters.yaml"), "inbox: label:seen\n").unwrap();

    let filter = Filter::new(RuleLoader::new(FileSource::new().with_root(dir.path())));
    let mut rule_sets = Vec::new();
    for id in ["filters.yaml", "./filters.yaml", "sub/../filters.yaml"] {
        let mut msg = TestMessage::new().with_labels(["inbox"]);
        assert_eq!(filter.apply_filters(&mut msg, &RuleSource::named(id)), 1);
        assert_eq!(msg.labels(), ["inbox", "seen"]);
        rule_sets.push(filter.loader().resolve(&RuleSource::named(id)).unwrap());
    }

    assert_eq!(filter.loader().cache().len(), 1);
    assert!(rule_sets.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));

    let canonical = fs::canonicalize(dir.path().join("filters.yaml")).unwrap();
    assert_eq!(
        filter.loader().cached_ids(),
        [canonical.to_string_lossy().into_owned()]
    );
}

#[test]
fn absolute_and_relative_ids_share_a_cache_entry() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("filters.json");
    fs::write(&path, r#"{"spam": "read"}"#).unwrap();

    let filter = Filter::new(RuleLoader::new(FileSource::new().with_root(dir.path())));
    let absolute = path.to_string_lossy().into_owned();
    assert!(filter.loader().resolve(&RuleSource::named(&absolute)).is_some());
    assert!(filter.loader().is_cached("filters.json"));
    assert!(filter.loader().resolve(&RuleSource::named("filters.json")).is_some());
    assert_eq!(filter.loader().cache().len(), 1);
}

#[test]
fn json_file_keeps_order() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("filters.json"),
        r#"{"label:x": "label:y", "label:y": "label:z"}"#,
    )
    .unwrap();

    let filter = Filter::new(RuleLoader::new(FileSource::new().with_root(dir.path())));
    let mut msg = TestMessage::new().with_labels(["x"]);
    assert_eq!(filter.apply_filters(&mut msg, &RuleSource::named("filters.json")), 2);
    assert_eq!(msg.labels(), ["x", "y", "z"]);
}

#[test]
fn cached_rules_survive_file_changes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("filters.yaml");
    fs::write(&path, "inbox: label:v1\n").unwrap();

    let filter = Filter::new(RuleLoader::new(FileSource::new().with_root(dir.path())));
    let source = RuleSource::named("filters.yaml");

    let mut first = TestMessage::new().with_labels(["inbox"]);
    filter.apply_filters(&mut first, &source);

    fs::write(&path, "inbox: label:v2\n").unwrap();
    let mut second = TestMessage::new().with_labels(["inbox"]);
    filter.apply_filters(&mut second, &source);

    assert_eq!(first.labels(), ["inbox", "v1"]);
    assert_eq!(second.labels(), ["inbox", "v1"]);
}

#[test]
fn missing_file_is_rechecked() {
    let dir = tempfile::tempdir().unwrap();
    let filter = Filter::new(RuleLoader::new(FileSource::new().with_root(dir.path())));
    let source = RuleSource::named("later.yaml");

    let mut msg = TestMessage::new().with_labels(["inbox"]);
    assert_eq!(filter.apply_filters(&mut msg, &source), 0);
    assert_eq!(msg.labels(), ["inbox"]);

    // Absence is not cached, so a file created afterwards is picked up.
    fs::write(dir.path().join("later.yaml"), "inbox: label:found\n").unwrap();
    assert_eq!(filter.apply_filters(&mut msg, &source), 1);
    assert_eq!(msg.labels(), ["found", "inbox"]);
}

#[test]
fn malformed_and_empty_files_are_noops() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("broken.yaml"), "inbox: [label:a\n").unwrap();
    fs::write(dir.path().join("empty.yaml"), "").unwrap();
    fs::write(dir.path().join("all-bad.yaml"), "bogus: star\n").unwrap();

    let filter = Filter::new(RuleLoader::new(FileSource::new().with_root(dir.path())));
    for name in ["broken.yaml", "empty.yaml", "all-bad.yaml"] {
        let mut msg = TestMessage::new().with_labels(["inbox"]);
        assert_eq!(filter.apply_filters(&mut msg, &RuleSource::named(name)), 0);
        assert_eq!(msg.labels(), ["inbox"]);
    }
    assert!(filter.loader().cached_ids().is_empty());
}

#[test]
fn default_path_is_used_for_default_source() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mine.yaml");
    fs::write(&path, "'-inbox': label:archived\n").unwrap();

    let filter = Filter::new(RuleLoader::new(FileSource::new().with_default_path(&path)));
    let mut msg = TestMessage::new();
    assert_eq!(filter.apply_default(&mut msg), 1);
    assert_eq!(msg.labels(), ["archived"]);
}

#[test]
fn shared_cache_across_threads() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("filters.yaml"), "spam: read\ninbox: label:seen\n").unwrap();

    let filter = Arc::new(Filter::new(RuleLoader::new(
        FileSource::new().with_root(dir.path()),
    )));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let filter = Arc::clone(&filter);
            std::thread::spawn(move || {
                let mut msg = TestMessage::new().with_labels(["inbox"]);
                filter.apply_filters(&mut msg, &RuleSource::named("filters.yaml"));
                msg
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap().labels(), ["inbox", "seen"]);
    }
    assert_eq!(filter.loader().cache().len(), 1);
}
