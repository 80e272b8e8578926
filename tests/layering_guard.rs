//! Layering guardrails to keep the language vocabulary crate free of dependencies.
//!
//! `bascule_core` holds the keyword/operator/type registries and the numeric and string policies shared by
//! the compiler and its tests. It must stay a leaf: this test scans its `Cargo.toml` and fails if its
//! `[dependencies]` table lists anything.

#[test]
fn core_crate_has_no_dependencies() {
    let manifest = include_str!("../crates/bascule_core/Cargo.toml");
    let mut in_dependencies = false;

    for raw_line in manifest.lines() {
        let line = raw_line.trim();
        // Track when we enter/exit the `[dependencies]` table.
        if line.starts_with('[') {
            in_dependencies = line == "[dependencies]";
            continue;
        }

        if !in_dependencies || line.is_empty() || line.starts_with('#') {
            continue;
        }

        // Strip inline comments for robustness.
        let entry = line.split('#').next().unwrap_or("").trim();
        if !entry.is_empty() {
            panic!("`bascule_core` must not have dependencies, found `{entry}`");
        }
    }
}

#[test]
fn compiler_depends_on_core_by_path() {
    let manifest = include_str!("../Cargo.toml");
    assert!(
        manifest
            .lines()
            .any(|line| line.trim().starts_with("bascule_core") && line.contains("path = \"crates/bascule_core\"")),
        "the compiler must use the in-tree `bascule_core`"
    );
}
