use std::path::{Path, PathBuf};

use anyhow::Context;
use colored::Colorize;
use docdelta_diff::text_diff::DEFAULT_CONTEXT;
use docdelta_diff::{MapChange, NumberedLine, RunTag, SideBySideRow, TextDiffView};
use docdelta_dispatch::{
    Artifact, DispatchOutcome, Dispatcher, StructuredDiff, TreeComparison, TreeReport,
};
use docdelta_types::{DiffConfig, DiffOutcome, RunId};
use docdelta_visual::DiffReport;
use tracing::info;

use crate::cli::*;

const COLUMN_WIDTH: usize = 48;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Command::Tree(args) => cmd_tree(config, args, &cli.format),
        Command::File(args) => cmd_file(config, args, &cli.format),
        Command::Classify(args) => cmd_classify(config, args, &cli.format),
        Command::Config(_) => cmd_config(config),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<DiffConfig> {
    match path {
        Some(path) => DiffConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => Ok(DiffConfig::default()),
    }
}

fn cmd_tree(mut config: DiffConfig, args: TreeArgs, format: &OutputFormat) -> anyhow::Result<()> {
    config.exclude.extend(args.exclude);
    let comparison = TreeComparison::new(&config)?.with_content_dispatch(!args.no_content);
    let report = comparison.run(RunId::new(), &args.left, &args.right)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print_tree_report(&report),
    }
    Ok(())
}

fn cmd_file(config: DiffConfig, args: FileArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let dispatcher = Dispatcher::new(&config)?;
    let run_id = RunId::new();
    let outcome = dispatcher.compare_files(run_id, &args.left, &args.right);

    if let (Some(out), Some(Artifact::Visual(report))) = (&args.out, outcome.artifact()) {
        let written = write_composites(out, report)?;
        info!(run_id = %run_id, pages = written.len(), dir = %out.display(), "wrote page composites");
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
        OutputFormat::Text => print_outcome(&args.left, &args.right, &outcome),
    }

    if let Some(failure) = outcome.failure() {
        anyhow::bail!("comparison failed: {failure}");
    }
    Ok(())
}

fn cmd_classify(config: DiffConfig, args: ClassifyArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let dispatcher = Dispatcher::new(&config)?;
    let class = dispatcher.classify(&args.path);
    match format {
        OutputFormat::Json => {
            let value = serde_json::json!({ "path": args.path, "content_class": class });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Text => println!("{}: {}", args.path.display(), class.to_string().cyan()),
    }
    Ok(())
}

fn cmd_config(config: DiffConfig) -> anyhow::Result<()> {
    print!("{}", config.to_toml_string()?);
    Ok(())
}

/// Write every page composite of `report` as `DIR/<run-id>/page-NNN.png`.
fn write_composites(dir: &Path, report: &DiffReport) -> anyhow::Result<Vec<PathBuf>> {
    let run_dir = dir.join(report.run_id.simple());
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("creating {}", run_dir.display()))?;

    let mut written = Vec::with_capacity(report.pages.len());
    for page in &report.pages {
        let path = run_dir.join(format!("page-{:03}.png", page.index + 1));
        std::fs::write(&path, &page.composite)
            .with_context(|| format!("writing {}", path.display()))?;
        written.push(path);
    }
    Ok(written)
}

fn print_tree_report(report: &TreeReport) {
    let c = &report.comparison;
    println!(
        "Comparing {} with {}",
        report.left_root.display().to_string().bold(),
        report.right_root.display().to_string().bold()
    );
    for path in &c.only_in_a {
        println!("  {} {}", "-".red().bold(), path.red());
    }
    for path in &c.only_in_b {
        println!("  {} {}", "+".green().bold(), path.green());
    }
    for path in &c.different {
        let detail = report
            .outcomes
            .get(path)
            .map(outcome_summary)
            .unwrap_or_default();
        println!("  {} {} {}", "~".yellow().bold(), path.yellow(), detail.dimmed());
    }

    let s = report.stats;
    println!(
        "\n{} identical, {} different, {} only in left, {} only in right ({} total)",
        s.identical.to_string().green(),
        s.different.to_string().yellow(),
        s.only_in_a.to_string().red(),
        s.only_in_b.to_string().green(),
        s.total
    );
    if c.is_identical() {
        println!("{} Trees are identical.", "✓".green().bold());
    }
}

fn outcome_summary(outcome: &DispatchOutcome) -> String {
    match outcome {
        DiffOutcome::Unchanged => "(content equivalent)".into(),
        DiffOutcome::Failed(f) => format!("({f})"),
        DiffOutcome::Changed(Artifact::Text(view)) => {
            format!("(+{} -{})", view.additions(), view.deletions())
        }
        DiffOutcome::Changed(Artifact::Visual(report)) => format!(
            "({} of {} pages changed)",
            report.changed_pages().count(),
            report.pages.len()
        ),
        DiffOutcome::Changed(Artifact::Structured(diff)) => {
            format!("({} {} changes)", diff.change_count(), diff.schema)
        }
    }
}

fn print_outcome(left: &Path, right: &Path, outcome: &DispatchOutcome) {
    match outcome {
        DiffOutcome::Unchanged => println!(
            "{} {} and {} are equivalent",
            "✓".green().bold(),
            left.display(),
            right.display()
        ),
        // Reported through the command's error.
        DiffOutcome::Failed(_) => {}
        DiffOutcome::Changed(Artifact::Text(view)) => print_text_diff(view),
        DiffOutcome::Changed(Artifact::Visual(report)) => print_visual_report(report),
        DiffOutcome::Changed(Artifact::Structured(diff)) => print_structured_diff(diff),
    }
}

fn print_text_diff(view: &TextDiffView) {
    for hunk in view.hunks(DEFAULT_CONTEXT) {
        println!("{}", format!("@@ row {} @@", hunk.first_row + 1).cyan());
        for row in &hunk.rows {
            println!("{}", format_row(row));
        }
    }
    println!(
        "\n{} additions, {} deletions",
        view.additions().to_string().green(),
        view.deletions().to_string().red()
    );
}

fn format_row(row: &SideBySideRow) -> String {
    let cell = |line: &Option<NumberedLine>| match line {
        Some(l) => (format!("{:>5}", l.number), truncate(&l.text, COLUMN_WIDTH)),
        None => (" ".repeat(5), String::new()),
    };
    let (ln, lt) = cell(&row.left);
    let (rn, rt) = cell(&row.right);
    let left = format!("{ln} {lt:<width$}", width = COLUMN_WIDTH);
    let right = format!("{rn} {rt}");
    match row.tag {
        RunTag::Equal => format!("{} | {}", left.dimmed(), right.dimmed()),
        RunTag::Delete => format!("{} < {}", left.red(), right),
        RunTag::Insert => format!("{} > {}", left, right.green()),
        RunTag::Replace => format!("{} ~ {}", left.red(), right.green()),
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut s: String = text.chars().take(width.saturating_sub(1)).collect();
        s.push('…');
        s
    }
}

fn print_visual_report(report: &DiffReport) {
    println!(
        "{} vs {} ({} pages)",
        report.left_name.bold(),
        report.right_name.bold(),
        report.pages.len()
    );
    for page in report.changed_pages() {
        let mut notes = Vec::new();
        if page.text_changed {
            notes.push("text changed".to_string());
        }
        if !page.regions.is_empty() {
            notes.push(format!("{} regions", page.regions.len()));
        }
        println!("  page {:>3}: {}", page.index + 1, notes.join(", ").yellow());
    }
}

fn print_structured_diff(diff: &StructuredDiff) {
    println!("{} diff, {} changes", diff.schema.to_string().bold(), diff.change_count());
    for category in &diff.categories {
        println!("  {}", category.category.cyan());
        for change in &category.changes.changes {
            match change {
                MapChange::Added { key, .. } => println!("    {} {}", "+".green(), key),
                MapChange::Removed { key, .. } => println!("    {} {}", "-".red(), key),
                MapChange::Modified { key, old, new } => {
                    println!("    {} {}", "~".yellow(), key);
                    for (field, value) in new {
                        let before = old.get(field).map(String::as_str).unwrap_or("");
                        if before != value {
                            println!("        {field}: {} -> {}", before.red(), value.green());
                        }
                    }
                    for (field, value) in old {
                        if !new.contains_key(field) {
                            println!("        {field}: {} -> ", value.red());
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docdelta_visual::PageDiffResult;

    #[test]
    fn default_config_without_file() {
        assert_eq!(load_config(None).unwrap(), DiffConfig::default());
    }

    #[test]
    fn config_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docdelta.toml");
        std::fs::write(&path, "dpi = 150\nexclude = [\".git\"]\n").unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.dpi, 150);
        assert_eq!(config.exclude, vec![".git"]);
    }

    #[test]
    fn missing_config_file_is_an_error() {
        assert!(load_config(Some(Path::new("/nonexistent/docdelta.toml"))).is_err());
    }

    #[test]
    fn composites_are_written_per_run() {
        let dir = tempfile::tempdir().unwrap();
        let mut report = DiffReport::new(RunId::new(), "a.pdf", "b.pdf");
        for index in 0..2 {
            report.pages.push(PageDiffResult {
                index,
                text_changed: false,
                regions: Vec::new(),
                composite: vec![index as u8; 4],
            });
        }

        let written = write_composites(dir.path(), &report).unwrap();
        let run_dir = dir.path().join(report.run_id.simple());
        assert_eq!(written, vec![run_dir.join("page-001.png"), run_dir.join("page-002.png")]);
        assert_eq!(std::fs::read(&written[1]).unwrap(), vec![1u8; 4]);
    }

    #[test]
    fn truncate_long_lines() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
    }
}
