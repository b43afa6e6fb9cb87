//! HTMX binding, stylesheet/markup utility matching, and cache coherence
//! scenarios.

use codegraph_index::cache::IncrementalCache;
use codegraph_index::framework::{extract_htmx_endpoints, scan_markup, scan_stylesheet};
use std::fs;
use tempfile::tempdir;

#[test]
fn htmx_attribute_is_extracted_with_its_trigger_and_target() {
    let markup = r##"<button hx-post="/cart/add" hx-trigger="click" hx-target="#cart">Add</button>"##;
    let endpoints = extract_htmx_endpoints(markup);
    assert_eq!(endpoints.len(), 1);
    assert_eq!(endpoints[0].method, "POST");
    assert_eq!(endpoints[0].path, "/cart/add");
    assert_eq!(endpoints[0].metadata.get("trigger"), Some(&"click".to_string()));
    assert_eq!(endpoints[0].metadata.get("target"), Some(&"#cart".to_string()));
}

#[test]
fn markup_utility_classes_line_up_with_an_apply_directive_in_the_stylesheet() {
    let markup = r#"<div className="flex items-center p-4">hi</div>"#;
    let css = "@layer components {\n  .card { @apply flex items-center p-4; }\n}\n";

    let markup_utilities = scan_markup(markup);
    let css_result = scan_stylesheet(css);

    for utility in &markup_utilities {
        assert!(
            css_result.utilities.contains(utility),
            "markup utility `{utility}` should also appear from the @apply directive"
        );
    }
}

#[test]
fn incremental_cache_round_trips_through_disk_and_detects_changes() {
    let dir = tempdir().unwrap();
    let file_path = dir.path().join("module.py");
    fs::write(&file_path, "def foo():\n    pass\n").unwrap();

    let cache_dir = dir.path().join("cache");
    let cache = IncrementalCache::load(&cache_dir, None).unwrap();

    assert!(cache.needs_parsing(&file_path).unwrap());
    cache.hashes.update(&file_path).unwrap();
    assert!(!cache.needs_parsing(&file_path).unwrap());

    // A fresh handle over the same cache directory should see the same
    // state without re-running anything: persistence happens on `update`.
    let reloaded = IncrementalCache::load(&cache_dir, None).unwrap();
    assert!(!reloaded.needs_parsing(&file_path).unwrap());

    fs::write(&file_path, "def foo():\n    return 1\n").unwrap();
    assert!(reloaded.needs_parsing(&file_path).unwrap());
}
