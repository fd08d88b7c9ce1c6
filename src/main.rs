use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use similar::{ChangeTag, TextDiff};
use srcmend::catalog::{self, RuleCatalog};
use srcmend::report::BatchSummary;
use srcmend::rule::RuleKind;
use srcmend::{BatchOutcome, BatchRunner};
use std::env;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "srcmend")]
#[command(about = "Batch source repair for known structural defects", long_about = None)]
#[command(version)]
#[command(after_help = "Exit status: bit 0 set when any file changed (or would \
change), bit 1 set when any conflict, diagnostic or file error was recorded.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Repair target files in place
    Apply {
        /// Files or directories to repair (directories expand to *.rs)
        targets: Vec<PathBuf>,

        /// Rule catalog file (otherwise all .toml files in ./rules, then
        /// the built-in legacy catalog)
        #[arg(short, long)]
        rules: Option<PathBuf>,

        /// Dry run - report what would change without touching files
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show unified diff of changes
        #[arg(short, long)]
        diff: bool,

        /// Emit the report as JSON instead of a console summary
        #[arg(long)]
        json: bool,
    },

    /// Report which targets still carry defects, read-only
    Check {
        /// Files or directories to inspect
        targets: Vec<PathBuf>,

        /// Rule catalog file
        #[arg(short, long)]
        rules: Option<PathBuf>,

        /// Emit the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the rules in the active catalog
    List {
        /// Rule catalog file
        #[arg(short, long)]
        rules: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Apply {
            targets,
            rules,
            dry_run,
            diff,
            json,
        } => cmd_apply(targets, rules, dry_run, diff, json),

        Commands::Check {
            targets,
            rules,
            json,
        } => cmd_apply(targets, rules, true, false, json),

        Commands::List { rules } => cmd_list(rules),
    }
}

/// Resolve the active catalog.
///
/// Priority order:
/// 1. Explicit --rules file
/// 2. All .toml files under ./rules, merged in sorted order
/// 3. The built-in legacy catalog
fn resolve_catalog(rules: Option<PathBuf>) -> Result<RuleCatalog> {
    if let Some(path) = rules {
        return Ok(catalog::load_from_path(&path)?);
    }

    let rules_dir = env::current_dir()?.join("rules");
    if rules_dir.is_dir() {
        let mut files = Vec::new();
        for entry in WalkDir::new(&rules_dir).max_depth(1) {
            let entry = entry?;
            if entry.file_type().is_file()
                && entry.path().extension().and_then(|s| s.to_str()) == Some("toml")
            {
                files.push(entry.path().to_path_buf());
            }
        }
        files.sort();
        if !files.is_empty() {
            return Ok(catalog::load_many(&files)?);
        }
    }

    eprintln!("{}", "Using built-in legacy rule catalog".dimmed());
    Ok(RuleCatalog::legacy_defaults()?)
}

/// Expand target arguments: directories become every .rs file beneath
/// them, plain files pass through.
fn collect_targets(targets: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for target in targets {
        if target.is_dir() {
            for entry in WalkDir::new(target) {
                let entry = entry?;
                if entry.file_type().is_file()
                    && entry.path().extension().and_then(|s| s.to_str()) == Some("rs")
                {
                    files.push(entry.path().to_path_buf());
                }
            }
        } else {
            files.push(target.clone());
        }
    }
    files.sort();
    files.dedup();

    if files.is_empty() {
        anyhow::bail!("no target files to process");
    }
    Ok(files)
}

fn display_diff(file: &Path, original: &str, modified: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (repaired)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);
    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        print!("{}", sign);
    }
}

fn cmd_apply(
    targets: Vec<PathBuf>,
    rules: Option<PathBuf>,
    dry_run: bool,
    show_diff: bool,
    json: bool,
) -> Result<()> {
    let catalog = resolve_catalog(rules)?;
    let files = collect_targets(&targets)?;

    if !json {
        println!(
            "Catalog: {} ({} rules)",
            catalog.meta.name,
            catalog.len()
        );
        if dry_run {
            println!("{}", "[DRY RUN - no files will be modified]".cyan());
        }
        println!();
    }

    let runner = BatchRunner::new(&catalog, !dry_run);
    let outcome = runner.run(&files);

    if json {
        println!("{}", render_json(&outcome)?);
        std::process::exit(outcome.summary.exit_code());
    }

    for report in &outcome.reports {
        match &report.outcome {
            Ok(result) => {
                if result.changed {
                    let verb = if dry_run { "Would fix" } else { "Fixed" };
                    println!(
                        "{} {}: {} ({} edits)",
                        "✓".green(),
                        report.path.display(),
                        verb,
                        result.accepted_edits()
                    );
                    if show_diff {
                        display_diff(&report.path, &result.original_text, &result.final_text);
                    }
                } else if !result.has_conflicts() {
                    println!("{} {}: Unchanged", "⊙".dimmed(), report.path.display());
                }

                for edit in result.edits.iter().filter(|e| !e.accepted) {
                    let reason = edit
                        .reject_reason
                        .as_ref()
                        .map_or_else(|| "rejected".to_string(), ToString::to_string);
                    eprintln!(
                        "{} {}: Conflict at byte {} ({}): {}",
                        "✗".red(),
                        report.path.display(),
                        edit.region.start,
                        edit.rule_id,
                        reason
                    );
                }
                for diagnostic in &result.diagnostics {
                    eprintln!(
                        "{} {}: Diagnostic at byte {} ({}): {}",
                        "⊘".yellow(),
                        report.path.display(),
                        diagnostic.offset,
                        diagnostic.rule_id,
                        diagnostic.message
                    );
                }
            }
            Err(error) => {
                eprintln!("{} {}: Error - {}", "✗".red(), report.path.display(), error);
            }
        }
    }

    println!();
    print_summary(&outcome.summary, dry_run);
    std::process::exit(outcome.summary.exit_code());
}

fn print_summary(summary: &BatchSummary, dry_run: bool) {
    println!("{}", "Summary:".bold());
    let fixed_label = if dry_run { "would fix" } else { "fixed" };
    println!("  {} {}", format!("{}", summary.fixed).green(), fixed_label);
    println!("  {} unchanged", format!("{}", summary.unchanged).dimmed());
    println!("  {} conflicts", format!("{}", summary.conflicts).red());
    println!("  {} errors", format!("{}", summary.errors).red());
}

fn render_json(outcome: &BatchOutcome) -> Result<String> {
    let reports: Vec<serde_json::Value> = outcome
        .reports
        .iter()
        .map(|report| match &report.outcome {
            Ok(result) => serde_json::json!({
                "path": report.path,
                "changed": result.changed,
                "accepted_edits": result.accepted_edits(),
                "rejected_edits": result.edits.iter().filter(|e| !e.accepted).collect::<Vec<_>>(),
                "diagnostics": result.diagnostics,
            }),
            Err(error) => serde_json::json!({
                "path": report.path,
                "error": error.to_string(),
            }),
        })
        .collect();

    let doc = serde_json::json!({
        "summary": outcome.summary,
        "files": reports,
    });
    Ok(serde_json::to_string_pretty(&doc)?)
}

fn cmd_list(rules: Option<PathBuf>) -> Result<()> {
    let catalog = resolve_catalog(rules)?;

    println!(
        "{} {} ({} rules)",
        "Catalog:".bold(),
        catalog.meta.name,
        catalog.len()
    );
    if let Some(description) = &catalog.meta.description {
        println!("{}", description.dimmed());
    }
    println!();

    for rule in catalog.rules() {
        match &rule.kind {
            RuleKind::NestedDefinition(nested) => {
                println!("{} {}", rule.id.bold(), "[nested-definition]".cyan());
                println!("    header: {}", nested.header.as_str());
            }
            RuleKind::ArityMigration(arity) => {
                println!("{} {}", rule.id.bold(), "[arity-migration]".cyan());
                println!(
                    "    callee: {}  old arity: {}",
                    arity.callee, arity.old_arity
                );
                for insertion in &arity.insertions {
                    println!("    insert @{}: {}", insertion.index, insertion.token);
                }
            }
        }
    }

    Ok(())
}
