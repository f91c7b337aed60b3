/// End-to-end browser tests against a real temporary filesystem.
///
/// These run the full pipeline (rayon I/O pool, `FsLister`, flatten, sort,
/// filter, progress) the way the GUI and the headless CLI do, with no
/// in-memory stand-ins.
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use treescout_core::config::ScanConfig;
use treescout_core::export::{collect_rows, export_to_path};
use treescout_core::lister::FsLister;
use treescout_core::model::{EntryKind, ListModel};
use treescout_core::progress::Poll;
use treescout_core::tree::{ExpandPolicy, SortOrder};
use treescout_core::{Browser, BrowserConfig, BrowserError};

// ── Helpers ──────────────────────────────────────────────────────────────────

/// ```text
/// root/
///   alpha/
///     a.txt
///     B.rs
///   beta/
///     nested/
///       deep.md
///   c.png
/// ```
fn build_test_tree(root: &Path) {
    fs::create_dir_all(root.join("alpha")).unwrap();
    fs::create_dir_all(root.join("beta/nested")).unwrap();
    fs::write(root.join("alpha/a.txt"), b"a").unwrap();
    fs::write(root.join("alpha/B.rs"), b"b").unwrap();
    fs::write(root.join("beta/nested/deep.md"), b"d").unwrap();
    fs::write(root.join("c.png"), b"c").unwrap();
}

fn open(root: &Path, expand: ExpandPolicy) -> Browser {
    let config = BrowserConfig {
        scan: ScanConfig {
            io_threads: 2,
            ..ScanConfig::default()
        },
        expand,
        ..BrowserConfig::default()
    };
    let mut browser = Browser::open(root, Arc::new(FsLister::new()), config).unwrap();
    assert!(
        browser.run_until_idle(Duration::from_secs(30)),
        "enumeration did not finish within 30 seconds"
    );
    browser
}

/// Visible rows as `"  name"` with two spaces per depth level.
fn outline(browser: &Browser) -> Vec<String> {
    browser
        .rows(0, browser.len())
        .iter()
        .map(|row| format!("{}{}", "  ".repeat(row.depth as usize), row.name()))
        .collect()
}

fn position(browser: &Browser, name: &str) -> usize {
    (0..browser.len())
        .find(|&i| browser.row(i).unwrap().name() == name)
        .unwrap_or_else(|| panic!("{name} is not visible"))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[test]
fn root_children_are_expanded_by_default() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    build_test_tree(tmp.path());
    let browser = open(tmp.path(), ExpandPolicy::default());

    assert_eq!(
        outline(&browser),
        ["alpha", "  a.txt", "  B.rs", "beta", "  nested", "c.png"]
    );
    assert_eq!(browser.summary(), "6 items");
}

#[test]
fn recursive_policy_reaches_the_bottom() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    build_test_tree(tmp.path());
    let mut browser = open(tmp.path(), ExpandPolicy::Recursive);

    assert_eq!(browser.len(), 7);
    let deep = browser.row(position(&browser, "deep.md")).unwrap();
    assert_eq!(deep.depth, 2);
    assert_eq!(deep.entry.kind(), EntryKind::File);
    assert_eq!(deep.path(), tmp.path().join("beta/nested/deep.md"));
    assert_eq!(browser.tick(), Poll::Stop);
}

#[test]
fn expand_collapse_and_sort_toggle() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    build_test_tree(tmp.path());
    let mut browser = open(tmp.path(), ExpandPolicy::Manual);
    assert_eq!(outline(&browser), ["alpha", "beta", "c.png"]);

    assert!(browser.toggle_expanded(position(&browser, "beta")));
    assert!(browser.run_until_idle(Duration::from_secs(30)));
    assert_eq!(outline(&browser), ["alpha", "beta", "  nested", "c.png"]);

    browser.toggle_sort();
    assert_eq!(browser.sort_order(), SortOrder::Descending);
    assert_eq!(outline(&browser), ["c.png", "beta", "  nested", "alpha"]);

    assert!(browser.toggle_expanded(position(&browser, "beta")));
    assert_eq!(outline(&browser), ["c.png", "beta", "alpha"]);
}

#[test]
fn filter_matches_absolute_paths() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    build_test_tree(tmp.path());
    let mut browser = open(tmp.path(), ExpandPolicy::Recursive);

    browser.set_filter("alpha");
    assert_eq!(outline(&browser), ["alpha", "  a.txt", "  B.rs"]);
    assert_eq!(browser.summary(), "3/7 items");

    browser.set_filter("b.rs");
    assert!(outline(&browser).is_empty());
}

#[test]
fn files_are_not_expandable() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    build_test_tree(tmp.path());
    let mut browser = open(tmp.path(), ExpandPolicy::Manual);
    let file = position(&browser, "c.png");
    assert!(!browser.row(file).unwrap().expandable);
    assert!(!browser.toggle_expanded(file));
}

#[test]
fn empty_directory_finishes_immediately() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let mut browser = open(tmp.path(), ExpandPolicy::Recursive);
    assert!(browser.is_empty());
    assert_eq!(browser.summary(), "0 items");
    assert_eq!(browser.tick(), Poll::Stop);
}

#[test]
fn missing_root_is_reported() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let missing = tmp.path().join("nope");
    let result = Browser::open(&missing, Arc::new(FsLister::new()), BrowserConfig::default());
    assert!(matches!(result, Err(BrowserError::RootUnavailable(_))));
}

#[test]
fn export_writes_visible_rows() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let data = tmp.path().join("data");
    build_test_tree(&data);
    let browser = open(&data, ExpandPolicy::RootChildren);

    let csv_path = tmp.path().join("rows.csv");
    assert_eq!(export_to_path(&browser, &csv_path).unwrap(), 6);
    let csv = fs::read_to_string(&csv_path).unwrap();
    assert_eq!(csv.lines().count(), 7);
    assert!(csv.starts_with("depth,name,display_name,kind,path,icon"));

    let json_path = tmp.path().join("rows.json");
    export_to_path(&browser, &json_path).unwrap();
    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(value.as_array().unwrap().len(), collect_rows(&browser).len());

    assert!(export_to_path(&browser, &tmp.path().join("rows.xml")).is_err());
}

#[cfg(target_os = "linux")]
#[test]
fn non_utf8_directory_is_still_enumerated() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let tmp = TempDir::new().expect("failed to create temp dir");
    let dir = tmp.path().join(OsStr::from_bytes(b"d\xff"));
    fs::create_dir(&dir).unwrap();
    fs::write(dir.join("f"), b"f").unwrap();

    let browser = open(tmp.path(), ExpandPolicy::Recursive);
    assert_eq!(browser.len(), 2);

    let parent = browser.row(0).unwrap();
    assert_eq!(parent.name(), "d\u{fffd}");
    assert!(parent.expandable);
    assert!(parent.expanded);
    assert_eq!(parent.path(), dir.as_path());

    let child = browser.row(1).unwrap();
    assert_eq!(child.name(), "f");
    assert_eq!(child.depth, 1);
    assert!(child.path().exists());
    assert_eq!(browser.status().failed, 0);
}
