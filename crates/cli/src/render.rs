//! Text rendering of catalogs and reports for stdout.

use std::fmt::Write as _;

use {
    skillpack_checks::{Finding, Report, ScriptRun, Severity, SkillCheckResult, Summary},
    skillpack_common::OutputFormat,
    skillpack_skills::{SkillContent, SkillEntry},
};

pub fn report(report: &Report, format: OutputFormat) -> anyhow::Result<String> {
    Ok(match format {
        OutputFormat::Console => console(report),
        OutputFormat::Markdown => markdown(report),
        OutputFormat::Json => serde_json::to_string_pretty(report)?,
    })
}

// ── Console ─────────────────────────────────────────────────────────────────

fn console(report: &Report) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Skill check report for {}", report.project_path());
    let _ = writeln!(
        out,
        "Generated {}",
        report.generated_at().format("%Y-%m-%d %H:%M:%S UTC")
    );
    if report.is_cancelled() {
        let _ = writeln!(out, "(cancelled: only checks started before the interrupt are included)");
    }

    for result in report.results() {
        let _ = writeln!(out, "\n== {}/{} ==", result.category, result.skill);
        if result.issues.is_empty() {
            let _ = writeln!(out, "  no issues");
        }
        for finding in ranked(&result.issues) {
            let _ = writeln!(out, "  {}", console_line(finding));
        }
        for run in result.scripts.iter().filter(|r| r.status.is_failure()) {
            let _ = writeln!(out, "  ! {}", script_note(run));
        }
    }

    let _ = writeln!(out, "\n{}", summary_block(report.summary()));
    out
}

fn console_line(finding: &Finding) -> String {
    let mut line = format!("[{}]", finding.severity);
    match (finding.file.is_empty(), finding.line) {
        (true, _) => {},
        (false, 0) => {
            let _ = write!(line, " {}", finding.file);
        },
        (false, n) => {
            let _ = write!(line, " {}:{n}", finding.file);
        },
    }
    if !finding.rule.is_empty() {
        let _ = write!(line, " ({})", finding.rule);
    }
    if !finding.message.is_empty() {
        let _ = write!(line, " {}", finding.message);
    }
    line
}

fn script_note(run: &ScriptRun) -> String {
    let status = serde_json::to_value(run.status)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default();
    match &run.detail {
        Some(detail) => format!("{} {status}: {detail}", run.script),
        None => format!("{} {status}", run.script),
    }
}

fn summary_block(summary: &Summary) -> String {
    let mut out = format!(
        "Skills checked: {}\nTotal issues:   {}",
        summary.total_skills_checked, summary.total_issues
    );
    for severity in Severity::RANKED {
        let _ = write!(out, "\n  {:<9} {}", severity.as_str(), summary.count(severity));
    }
    out
}

/// Most severe first; order within a severity is kept.
fn ranked(findings: &[Finding]) -> Vec<&Finding> {
    let mut sorted: Vec<&Finding> = findings.iter().collect();
    sorted.sort_by_key(|f| std::cmp::Reverse(f.severity));
    sorted
}

// ── Markdown ────────────────────────────────────────────────────────────────

fn markdown(report: &Report) -> String {
    let summary = report.summary();
    let mut out = String::from("# Skill check report\n\n");
    let _ = writeln!(out, "- Project: `{}`", report.project_path());
    let _ = writeln!(out, "- Generated: {}", report.generated_at().to_rfc3339());
    if report.is_cancelled() {
        let _ = writeln!(out, "- Cancelled: partial results");
    }

    out.push_str("\n## Summary\n\n| Severity | Count |\n|---|---|\n");
    for severity in Severity::RANKED {
        let _ = writeln!(out, "| {severity} | {} |", summary.count(severity));
    }
    let _ = writeln!(out, "| **Total** | {} |", summary.total_issues);
    let _ = writeln!(out, "\nSkills checked: {}", summary.total_skills_checked);

    for result in report.results() {
        out.push_str(&markdown_result(result));
    }
    out
}

fn markdown_result(result: &SkillCheckResult) -> String {
    let mut out = format!("\n## {}/{}\n\n", result.category, result.skill);
    if result.issues.is_empty() {
        out.push_str("No issues.\n");
    } else {
        out.push_str("| Severity | File | Line | Rule | Message |\n|---|---|---|---|---|\n");
        for f in ranked(&result.issues) {
            let line = if f.line == 0 {
                String::new()
            } else {
                f.line.to_string()
            };
            let _ = writeln!(
                out,
                "| {} | {} | {line} | {} | {} |",
                f.severity,
                cell(&f.file),
                cell(&f.rule),
                cell(&f.message)
            );
        }
    }
    for run in result.scripts.iter().filter(|r| r.status.is_failure()) {
        let _ = writeln!(out, "\n> {}", script_note(run));
    }
    out
}

fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

// ── Catalog ─────────────────────────────────────────────────────────────────

/// Skills grouped under their category, each with its script count.
pub fn skill_list(skills: &[(SkillEntry, usize)]) -> String {
    if skills.is_empty() {
        return "No skills found.\n".to_string();
    }
    let width = skills.iter().map(|(s, _)| s.id.len()).max().unwrap_or(0);
    let mut out = String::new();
    let mut current: Option<&str> = None;
    for (skill, scripts) in skills {
        if current != Some(skill.category.as_str()) {
            if current.is_some() {
                out.push('\n');
            }
            let _ = writeln!(out, "{}", skill.category);
            current = Some(skill.category.as_str());
        }
        let _ = write!(out, "  {:<width$}  {:<8}", skill.id, skill.priority.as_str());
        if !skill.description.is_empty() {
            let _ = write!(out, "  {}", skill.description);
        }
        match scripts {
            0 => out.push('\n'),
            1 => out.push_str("  (1 script)\n"),
            n => {
                let _ = writeln!(out, "  ({n} scripts)");
            },
        }
    }
    out
}

pub fn skill_info(content: &SkillContent, scripts: &[std::path::PathBuf]) -> String {
    let e = &content.entry;
    let mut out = String::new();
    let _ = writeln!(out, "Name:          {}", e.name);
    let _ = writeln!(out, "Id:            {}", e.id);
    let _ = writeln!(out, "Category:      {}", e.category);
    if !e.description.is_empty() {
        let _ = writeln!(out, "Description:   {}", e.description);
    }
    if !e.version.is_empty() {
        let _ = writeln!(out, "Version:       {}", e.version);
    }
    let _ = writeln!(out, "Priority:      {}", e.priority);
    for (label, values) in [
        ("Categories:", &e.categories),
        ("Use when:", &e.use_when),
        ("Prerequisites:", &e.prerequisites),
        ("Related:", &e.related_skills),
    ] {
        if !values.is_empty() {
            let _ = writeln!(out, "{label:<14} {}", values.join(", "));
        }
    }
    let _ = writeln!(out, "Path:          {}", e.path.display());
    if scripts.is_empty() {
        let _ = writeln!(out, "Scripts:       none");
    } else {
        let _ = writeln!(out, "Scripts:");
        for script in scripts {
            let name = script.file_name().map_or_else(
                || script.display().to_string(),
                |n| n.to_string_lossy().into_owned(),
            );
            let _ = writeln!(out, "  {name}");
        }
    }
    let _ = write!(out, "\n{}", content.body);
    out
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        skillpack_checks::ScriptStatus,
        skillpack_skills::Priority,
    };

    fn finding(severity: Severity, rule: &str) -> Finding {
        Finding {
            file: "src/db.rs".into(),
            line: 12,
            rule: rule.into(),
            message: "a | b".into(),
            severity,
        }
    }

    fn sample() -> Report {
        let mut r = SkillCheckResult::new("sql", "security");
        r.record(
            ScriptRun {
                script: "check.py".into(),
                status: ScriptStatus::Ok,
                findings: 2,
                exit_code: Some(1),
                detail: None,
            },
            vec![finding(Severity::Low, "low-one"), finding(Severity::Critical, "crit-one")],
        );
        r.record(
            ScriptRun {
                script: "extra.sh".into(),
                status: ScriptStatus::TimedOut,
                findings: 0,
                exit_code: None,
                detail: Some("timed out after 1s".into()),
            },
            Vec::new(),
        );
        Report::new("/work/project", vec![r])
    }

    #[test]
    fn console_ranks_by_severity() {
        let text = report(&sample(), OutputFormat::Console).unwrap();
        let crit = text.find("crit-one").unwrap();
        let low = text.find("low-one").unwrap();
        assert!(crit < low);
        assert!(text.contains("== security/sql =="));
        assert!(text.contains("[Critical] src/db.rs:12 (crit-one)"));
        assert!(text.contains("! extra.sh timed_out: timed out after 1s"));
        assert!(text.contains("Total issues:   2"));
    }

    #[test]
    fn markdown_has_summary_and_escaped_cells() {
        let text = report(&sample(), OutputFormat::Markdown).unwrap();
        assert!(text.contains("| Critical | 1 |"));
        assert!(text.contains("| **Total** | 2 |"));
        assert!(text.contains("## security/sql"));
        assert!(text.contains("a \\| b"));
    }

    #[test]
    fn json_is_the_report_document() {
        let text = report(&sample(), OutputFormat::Json).unwrap();
        let v: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(v["summary"]["totalIssues"], 2);
        assert_eq!(v["projectPath"], "/work/project");
    }

    fn entry(category: &str, id: &str, description: &str) -> SkillEntry {
        SkillEntry {
            id: id.into(),
            category: category.into(),
            name: id.into(),
            description: description.into(),
            version: String::new(),
            priority: Priority::High,
            categories: Vec::new(),
            use_when: Vec::new(),
            prerequisites: Vec::new(),
            related_skills: Vec::new(),
            path: std::path::PathBuf::new(),
        }
    }

    #[test]
    fn skill_list_groups_by_category() {
        let text = skill_list(&[
            (entry("api", "paging", "Cursor paging"), 2),
            (entry("api", "versioning", ""), 0),
            (entry("auth", "jwt", "Token checks"), 1),
        ]);
        let lines: Vec<&str> = text.lines().map(str::trim_end).collect();
        assert_eq!(lines[0], "api");
        assert!(lines[1].starts_with("  paging      high"));
        assert!(lines[1].ends_with("Cursor paging  (2 scripts)"));
        assert_eq!(lines[2], "  versioning  high");
        assert_eq!(lines[3], "");
        assert_eq!(lines[4], "auth");
        assert!(lines[5].ends_with("Token checks  (1 script)"));
    }

    #[test]
    fn empty_skill_list() {
        assert_eq!(skill_list(&[]), "No skills found.\n");
    }
}
