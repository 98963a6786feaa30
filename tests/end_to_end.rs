//! End-to-end scenarios over a synthetic project tree: one source file,
//! a manifest, a lockfile, and a small curated authority store, run
//! through the full pipeline.

use std::fs;
use std::path::Path;

use doxy::analyzer::{FindingKind, SuppressionSource};
use doxy::config::Config;
use doxy::pipeline;
use doxy::suppression::SuppressionRule;
use pretty_assertions::assert_eq;

fn write_project(root: &Path, manifest_version: &str, source: &str) {
    fs::write(
        root.join("package.json"),
        format!(r#"{{"dependencies": {{"react": "{manifest_version}"}}}}"#),
    )
    .unwrap();
    fs::create_dir_all(root.join("src")).unwrap();
    fs::write(root.join("src/app.tsx"), source).unwrap();
}

fn write_lockfile(root: &Path, resolved_version: &str) {
    fs::write(
        root.join("package-lock.json"),
        format!(r#"{{"packages": {{"node_modules/react": {{"version": "{resolved_version}"}}}}}}"#),
    )
    .unwrap();
}

fn write_authority(root: &Path) -> std::path::PathBuf {
    let authority_dir = root.join("authority");
    fs::create_dir_all(authority_dir.join("react")).unwrap();
    fs::write(
        authority_dir.join("manifest.json"),
        r#"{"schemaVersion": 1, "dataVersion": "1.0.0", "packages": [{"name": "react", "latestMappedVersion": "18.2.0", "specFile": "react/18.x.json"}]}"#,
    )
    .unwrap();
    fs::write(
        authority_dir.join("react/18.x.json"),
        r#"{
            "schemaVersion": 1,
            "package": "react",
            "specs": [
                {
                    "package": "react", "export": "useState", "kind": "hook",
                    "availableIn": ">=16.8.0",
                    "signatures": [{"since": "16.8.0", "minArity": 0, "maxArity": 1, "params": [{"name": "initial", "required": false}]}],
                    "deprecations": []
                },
                {
                    "package": "react", "export": "useEffect", "kind": "hook",
                    "availableIn": ">=16.8.0",
                    "signatures": [{"since": "16.8.0", "minArity": 1, "maxArity": 2, "params": []}],
                    "deprecations": []
                },
                {
                    "package": "react", "export": "useCallback", "kind": "hook",
                    "availableIn": ">=16.8.0",
                    "signatures": [{"since": "16.8.0", "minArity": 2, "maxArity": 2, "params": []}],
                    "deprecations": []
                },
                {
                    "package": "react", "export": "useId", "kind": "hook",
                    "availableIn": ">=18.0.0",
                    "signatures": [{"since": "18.0.0", "minArity": 0, "maxArity": 0, "params": []}],
                    "deprecations": []
                },
                {
                    "package": "react", "export": "createFactory", "kind": "function",
                    "availableIn": ">=0.14.0, <19.0.0",
                    "signatures": [{"since": "0.14.0", "minArity": 1, "maxArity": 1, "params": []}],
                    "deprecations": [{
                        "since": "16.13.0",
                        "removedIn": "19.0.0",
                        "message": "createFactory is deprecated",
                        "replacement": {"package": "react", "export": "createElement"}
                    }]
                }
            ]
        }"#,
    )
    .unwrap();
    authority_dir
}

fn run(root: &Path, authority: &Path) -> Vec<doxy::analyzer::Finding> {
    let config = Config::default();
    pipeline::run(root, &config, None, authority).unwrap().findings
}

#[test]
fn clean_react_18_project_has_no_findings() {
    let dir = tempfile::tempdir().unwrap();
    write_project(
        dir.path(),
        "^18.0.0",
        "import { useState, useEffect, useCallback } from 'react';\nuseState(0);\nuseEffect(() => {}, []);\nuseCallback(() => {}, []);\n",
    );
    write_lockfile(dir.path(), "18.2.0");
    let authority = write_authority(dir.path());

    let findings = run(dir.path(), &authority);
    assert!(findings.is_empty(), "expected no findings, got {findings:?}");
}

#[test]
fn deprecated_in_installed_version_reports_warning() {
    let dir = tempfile::tempdir().unwrap();
    write_project(dir.path(), "^18.0.0", "import { createFactory } from 'react';\ncreateFactory('div');\n");
    write_lockfile(dir.path(), "18.2.0");
    let authority = write_authority(dir.path());

    let findings = run(dir.path(), &authority);
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].kind, FindingKind::DeprecatedApi);
    assert!(findings[0].message.contains("16.13.0"));
    assert!(findings[0].fixes[0].description.contains("createElement"));
}

#[test]
fn removed_in_installed_version_reports_error_and_fails() {
    let dir = tempfile::tempdir().unwrap();
    write_project(dir.path(), "^19.0.0", "import { createFactory } from 'react';\ncreateFactory('div');\n");
    write_lockfile(dir.path(), "19.0.0");
    let authority = write_authority(dir.path());

    let findings = run(dir.path(), &authority);
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].kind, FindingKind::RemovedApi);
}

#[test]
fn future_api_before_introduction_version() {
    let dir = tempfile::tempdir().unwrap();
    write_project(dir.path(), "^17.0.2", "import { useId } from 'react';\nuseId();\n");
    write_lockfile(dir.path(), "17.0.2");
    let authority = write_authority(dir.path());

    let findings = run(dir.path(), &authority);
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].kind, FindingKind::FutureApi);
    assert!(findings[0].message.contains("18.0.0"));
}

#[test]
fn wrong_arity_call_reports_error() {
    let dir = tempfile::tempdir().unwrap();
    write_project(dir.path(), "^18.0.0", "import { useState } from 'react';\nuseState(0, \"extra\");\n");
    write_lockfile(dir.path(), "18.2.0");
    let authority = write_authority(dir.path());

    let findings = run(dir.path(), &authority);
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].kind, FindingKind::WrongArity);
}

#[test]
fn inline_suppression_hides_finding_by_default() {
    let dir = tempfile::tempdir().unwrap();
    write_project(
        dir.path(),
        "^18.0.0",
        "import { createFactory } from 'react';\n// doxy-ignore deprecated-api -- legacy call site\ncreateFactory('div');\n",
    );
    write_lockfile(dir.path(), "18.2.0");
    let authority = write_authority(dir.path());

    let config = Config::default();
    let outcome = pipeline::run(dir.path(), &config, None, &authority).unwrap();
    let visible: Vec<_> = outcome.findings.iter().filter(|f| f.suppressed.is_none()).collect();
    assert!(visible.is_empty());

    let suppressed = outcome.findings.iter().find(|f| f.kind == FindingKind::DeprecatedApi).unwrap();
    assert_eq!(suppressed.suppressed.as_ref().unwrap().source, SuppressionSource::Inline);
}

#[test]
fn import_only_usage_of_removed_symbol_still_emits_finding() {
    let dir = tempfile::tempdir().unwrap();
    write_project(dir.path(), "^19.0.0", "import { createFactory } from 'react';\n");
    write_lockfile(dir.path(), "19.0.0");
    let authority = write_authority(dir.path());

    let findings = run(dir.path(), &authority);
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].kind, FindingKind::RemovedApi);
    assert_eq!(findings[0].location.line, 1);
}

#[test]
fn two_calls_to_same_symbol_emit_two_wrong_arity_findings() {
    let dir = tempfile::tempdir().unwrap();
    write_project(
        dir.path(),
        "^18.0.0",
        "import { useState } from 'react';\nuseState(0, 1);\nuseState(2, 3);\n",
    );
    write_lockfile(dir.path(), "18.2.0");
    let authority = write_authority(dir.path());

    let findings = run(dir.path(), &authority);
    assert_eq!(findings.len(), 2);
    assert!(findings.iter().all(|f| f.kind == FindingKind::WrongArity));
}

#[test]
fn second_run_reuses_cache_and_produces_identical_findings() {
    let dir = tempfile::tempdir().unwrap();
    write_project(dir.path(), "^18.0.0", "import { createFactory } from 'react';\ncreateFactory('div');\n");
    write_lockfile(dir.path(), "18.2.0");
    let authority = write_authority(dir.path());

    let first = run(dir.path(), &authority);
    let second = run(dir.path(), &authority);
    assert_eq!(first, second);
}

#[test]
fn baseline_suppresses_a_previously_accepted_finding() {
    let dir = tempfile::tempdir().unwrap();
    write_project(dir.path(), "^19.0.0", "import { createFactory } from 'react';\ncreateFactory('div');\n");
    write_lockfile(dir.path(), "19.0.0");
    let authority = write_authority(dir.path());

    let long_id = doxy::analyzer::Finding::make_long_id(
        "react",
        "createFactory",
        &dir.path().join("src/app.tsx"),
        doxy::ast::SourceLocation { line: 2, column: 1 },
    );
    fs::create_dir_all(dir.path().join(".doxy")).unwrap();
    fs::write(
        dir.path().join(".doxy/baseline.json"),
        format!(r#"{{"finding_ids": ["{long_id}"]}}"#),
    )
    .unwrap();

    let config = Config::default();
    let outcome = pipeline::run(dir.path(), &config, None, &authority).unwrap();
    let finding = outcome.findings.iter().find(|f| f.kind == FindingKind::RemovedApi).unwrap();
    assert_eq!(finding.suppressed.as_ref().unwrap().source, SuppressionSource::Baseline);
}

#[test]
fn require_suppression_reason_rejects_a_reasonless_config_rule() {
    let dir = tempfile::tempdir().unwrap();
    write_project(dir.path(), "^18.0.0", "import { createFactory } from 'react';\ncreateFactory('div');\n");
    write_lockfile(dir.path(), "18.2.0");
    let authority = write_authority(dir.path());

    let mut config = Config::default();
    config.require_suppression_reason = true;
    config.suppressions.push(SuppressionRule {
        package: Some("react".into()),
        export: Some("createFactory".into()),
        kind: "*".into(),
        paths: None,
        reason: None,
    });

    let err = pipeline::run(dir.path(), &config, None, &authority).unwrap_err();
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn config_change_invalidates_cache_even_with_unchanged_file_content() {
    let dir = tempfile::tempdir().unwrap();
    write_project(dir.path(), "^18.0.0", "import { createFactory } from 'react';\ncreateFactory('div');\n");
    write_lockfile(dir.path(), "18.2.0");
    let authority = write_authority(dir.path());

    let config = Config::default();
    let first = pipeline::run(dir.path(), &config, None, &authority).unwrap();
    assert_eq!(first.stats.analyzed, 1);

    let unchanged = pipeline::run(dir.path(), &config, None, &authority).unwrap();
    assert_eq!(unchanged.stats.analyzed, 0, "same config + same content should serve from cache");

    let mut changed_config = Config::default();
    changed_config.suppressions.push(SuppressionRule {
        package: Some("react".into()),
        export: Some("createFactory".into()),
        kind: "*".into(),
        paths: None,
        reason: Some("tracked separately".into()),
    });
    let after_config_change = pipeline::run(dir.path(), &changed_config, None, &authority).unwrap();
    assert_eq!(after_config_change.stats.analyzed, 1, "a config change alone must force re-analysis");
}
