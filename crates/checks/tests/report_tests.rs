//! End-to-end report runs over a temporary catalog with real `sh` scripts.
#![cfg(unix)]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use {
    skillpack_checks::{Aggregator, ProcessRunner, Report, ScriptStatus, Severity},
    skillpack_skills::{Catalog, ScriptLookup},
    tokio_util::sync::CancellationToken,
};

const CRITICAL_DOC: &str = r#"cat <<'EOF'
{"skill":"widget-a","summary":{"critical":1},"issues":[{"file":"src/x","line":10,"rule":"r1","message":"bad","severity":"Critical"}]}
EOF
exit 1
"#;

fn write(path: &Path, body: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, body).unwrap();
}

fn add_skill(root: &Path, category: &str, id: &str, scripts: &[(&str, &str)]) -> PathBuf {
    let dir = root.join(category).join(id);
    write(
        &dir.join("SKILL.md"),
        &format!("---\nname: {id}\ndescription: demo\n---\n# {id}\n"),
    );
    for (name, body) in scripts {
        write(&dir.join("scripts").join(name), body);
    }
    dir
}

fn aggregator(root: &Path) -> Aggregator {
    let interpreters = BTreeMap::from([("sh".to_string(), vec!["sh".to_string()])]);
    let runner = ProcessRunner::new(interpreters, Some(Duration::from_secs(20)));
    Aggregator::new(Catalog::open(root).unwrap(), Arc::new(runner)).with_concurrency(3)
}

async fn report(root: &Path, target: &Path) -> Report {
    aggregator(root)
        .build_report(target, &CancellationToken::new())
        .await
        .unwrap()
}

fn assert_summary_consistent(report: &Report) {
    let all: Vec<_> = report.results().iter().flat_map(|r| &r.issues).collect();
    let summary = report.summary();
    assert_eq!(summary.total_skills_checked, report.results().len());
    assert_eq!(summary.total_issues, all.len());
    for severity in Severity::RANKED {
        assert_eq!(
            summary.count(severity),
            all.iter().filter(|f| f.severity == severity).count()
        );
    }
}

#[tokio::test]
async fn single_critical_finding_scenario() {
    let catalog = tempfile::tempdir().unwrap();
    let project = tempfile::tempdir().unwrap();
    add_skill(catalog.path(), "api", "widget-a", &[("check.sh", CRITICAL_DOC)]);
    add_skill(catalog.path(), "auth", "widget-b", &[]);

    let report = report(catalog.path(), project.path()).await;

    assert_eq!(report.results().len(), 1);
    let result = &report.results()[0];
    assert_eq!(result.skill, "widget-a");
    assert_eq!(result.category, "api");
    assert_eq!(result.issues.len(), 1);
    assert_eq!(result.issues[0].file, "src/x");
    assert_eq!(result.issues[0].line, 10);
    assert_eq!(result.issues[0].rule, "r1");
    assert_eq!(result.scripts[0].exit_code, Some(1));

    let summary = report.summary();
    assert_eq!(summary.total_skills_checked, 1);
    assert_eq!(summary.total_issues, 1);
    assert_eq!(summary.critical_issues, 1);
    assert_eq!(summary.high_issues, 0);
    assert!(report.has_critical());

    let abs = std::path::absolute(project.path()).unwrap();
    assert_eq!(report.project_path(), abs.display().to_string());
}

#[tokio::test]
async fn script_receives_absolute_target() {
    let catalog = tempfile::tempdir().unwrap();
    let project = tempfile::tempdir().unwrap();
    write(&project.path().join("marker.txt"), "");
    add_skill(catalog.path(), "fs", "marker", &[(
        "check.sh",
        r#"if [ -f "$1/marker.txt" ] && [ "$2" = "--output" ] && [ "$3" = "json" ]; then
  echo '{"issues":[{"rule":"seen","severity":"High"}]}'
fi
"#,
    )]);

    let report = report(catalog.path(), project.path()).await;
    assert_eq!(report.results()[0].issues[0].rule, "seen");
    assert_eq!(report.summary().high_issues, 1);
}

#[tokio::test]
async fn broken_scripts_do_not_abort_the_run() {
    let catalog = tempfile::tempdir().unwrap();
    let project = tempfile::tempdir().unwrap();
    add_skill(catalog.path(), "api", "noisy", &[(
        "check.sh",
        "echo 'Traceback (most recent call last):'\necho 'boom' >&2\nexit 3\n",
    )]);
    add_skill(catalog.path(), "api", "mixed", &[(
        "check.sh",
        r#"echo '{"issues":[{"rule":"kept","severity":"Medium"}, "junk", 7]}'"#,
    )]);
    add_skill(catalog.path(), "api", "silent", &[("check.sh", "exit 0\n")]);
    add_skill(catalog.path(), "db", "fine", &[(
        "check.sh",
        r#"echo '{"issues":[{"rule":"low-one","severity":"whatever"}]}'"#,
    )]);

    let report = report(catalog.path(), project.path()).await;
    let by_skill = |id: &str| {
        report
            .results()
            .iter()
            .find(|r| r.skill == id)
            .unwrap()
            .clone()
    };

    let noisy = by_skill("noisy");
    assert!(noisy.issues.is_empty());
    assert_eq!(noisy.scripts[0].status, ScriptStatus::Unparseable);

    let mixed = by_skill("mixed");
    assert_eq!(mixed.issues.len(), 1);
    assert_eq!(mixed.issues[0].rule, "kept");

    let silent = by_skill("silent");
    assert!(silent.issues.is_empty());
    assert_eq!(silent.scripts[0].status, ScriptStatus::Empty);

    assert_eq!(by_skill("fine").issues[0].severity, Severity::Low);
    assert_summary_consistent(&report);
}

#[tokio::test]
async fn repeated_runs_are_identical_apart_from_timestamp() {
    let catalog = tempfile::tempdir().unwrap();
    let project = tempfile::tempdir().unwrap();
    for (category, id) in [("b", "two"), ("a", "one"), ("c", "three"), ("a", "zero")] {
        let slow = format!(
            "sleep 0.2\necho '{{\"issues\":[{{\"rule\":\"{id}-a\",\"severity\":\"High\"}}]}}'\n"
        );
        let fast =
            format!("echo '{{\"issues\":[{{\"rule\":\"{id}-b\",\"severity\":\"Low\"}}]}}'\n");
        add_skill(catalog.path(), category, id, &[
            ("a.sh", slow.as_str()),
            ("b.sh", fast.as_str()),
        ]);
    }

    let first = report(catalog.path(), project.path()).await;
    let second = report(catalog.path(), project.path()).await;

    assert_eq!(first.results(), second.results());
    assert_eq!(first.summary(), second.summary());

    let order: Vec<_> = first
        .results()
        .iter()
        .map(|r| format!("{}/{}", r.category, r.skill))
        .collect();
    assert_eq!(order, vec!["a/one", "a/zero", "b/two", "c/three"]);

    let rules: Vec<_> = first.results()[0].issues.iter().map(|f| f.rule.as_str()).collect();
    assert_eq!(rules, vec!["one-a", "one-b"]);
    assert_summary_consistent(&first);
}

#[tokio::test]
async fn unreadable_scripts_dir_does_not_abort_the_run() {
    use std::os::unix::fs::PermissionsExt;

    let catalog = tempfile::tempdir().unwrap();
    let project = tempfile::tempdir().unwrap();
    add_skill(catalog.path(), "api", "good", &[(
        "check.sh",
        r#"echo '{"issues":[{"rule":"ok","severity":"High"}]}'"#,
    )]);
    let locked = add_skill(catalog.path(), "auth", "locked", &[("check.sh", CRITICAL_DOC)])
        .join("scripts");
    std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();

    let result = aggregator(catalog.path())
        .build_report(project.path(), &CancellationToken::new())
        .await;
    std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();

    let report = result.unwrap();
    let good = report
        .results()
        .iter()
        .find(|r| r.skill == "good")
        .unwrap();
    assert_eq!(good.category, "api");
    assert_eq!(good.issues[0].rule, "ok");
    assert_summary_consistent(&report);
}

#[tokio::test]
async fn duplicate_skill_ids_share_the_first_category_scripts() {
    let catalog = tempfile::tempdir().unwrap();
    let project = tempfile::tempdir().unwrap();
    add_skill(catalog.path(), "api", "dup", &[("check.sh", CRITICAL_DOC)]);
    add_skill(catalog.path(), "auth", "dup", &[(
        "other.sh",
        r#"echo '{"issues":[{"rule":"never-run","severity":"Low"}]}'"#,
    )]);

    let report = report(catalog.path(), project.path()).await;

    // Both entries resolve to api/dup/scripts, so its finding is counted twice.
    let order: Vec<_> = report
        .results()
        .iter()
        .map(|r| format!("{}/{}", r.category, r.skill))
        .collect();
    assert_eq!(order, vec!["api/dup", "auth/dup"]);
    for result in report.results() {
        assert_eq!(result.scripts.len(), 1);
        assert_eq!(result.scripts[0].script, "check.sh");
        assert_eq!(result.issues[0].rule, "r1");
    }
    assert_eq!(report.summary().total_issues, 2);
    assert_eq!(report.summary().critical_issues, 2);
    assert_summary_consistent(&report);
}

#[test]
fn unknown_skill_resolves_to_not_found() {
    let catalog = tempfile::tempdir().unwrap();
    add_skill(catalog.path(), "api", "widget-a", &[("check.sh", CRITICAL_DOC)]);
    let catalog = Catalog::open(catalog.path()).unwrap();
    assert_eq!(
        catalog.find_scripts("nonexistent-skill").unwrap(),
        ScriptLookup::NotFound
    );
}

#[tokio::test]
async fn empty_catalog_yields_empty_report() {
    let catalog = tempfile::tempdir().unwrap();
    let project = tempfile::tempdir().unwrap();

    let report = report(catalog.path(), project.path()).await;
    assert!(report.results().is_empty());
    assert_eq!(report.summary().total_skills_checked, 0);
    assert_eq!(report.summary().total_issues, 0);
    assert!(!report.is_cancelled());
}

#[tokio::test]
async fn cancellation_skips_units_not_yet_started() {
    let catalog = tempfile::tempdir().unwrap();
    let project = tempfile::tempdir().unwrap();
    for id in ["s1", "s2", "s3", "s4"] {
        add_skill(catalog.path(), "slow", id, &[(
            "check.sh",
            "sleep 0.5\necho '{\"issues\":[{\"severity\":\"High\"}]}'\n",
        )]);
    }

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(150)).await;
        trigger.cancel();
    });

    let report = aggregator(catalog.path())
        .with_concurrency(1)
        .build_report(project.path(), &cancel)
        .await
        .unwrap();

    assert!(report.is_cancelled());
    // The unit in flight at cancellation finishes and is kept.
    assert_eq!(report.results().len(), 1);
    assert_eq!(report.results()[0].skill, "s1");
    assert_summary_consistent(&report);
}
