mod logging;

use clap::{ArgAction, Parser, Subcommand};
use form_editor::Session;
use form_spec::{
    AnswerMap, Node, Questionnaire, Severity, ValidationReport, parse_xml, preorder,
    regenerate_all_ids, render_outline, resolve_visibility, to_json,
};
use serde_json::{Map, Value};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

const OUTPUT_DIR_VAR: &str = "FORMFORGE_OUTPUT_DIR";

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Questionnaire XML toolkit",
    long_about = "Creates, checks, normalizes and previews bar-application questionnaire XML files"
)]
struct Cli {
    /// More log output on stderr (-v info, -vv debug, -vvv trace). RUST_LOG overrides it.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create an empty questionnaire file.
    New {
        /// Questionnaire title.
        #[arg(long)]
        title: String,
        /// Five digit id suffix; drawn at random when omitted.
        #[arg(long)]
        suffix: Option<String>,
        /// Directory for the new file (defaults to FORMFORGE_OUTPUT_DIR or the current directory).
        #[arg(long, value_name = "DIR")]
        out: Option<PathBuf>,
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
    /// Report duplicate ids, stale counters and misplaced nodes.
    Check {
        file: PathBuf,
        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Rewrite a file in normalized form.
    Fmt {
        file: PathBuf,
        /// Write the result back instead of printing it.
        #[arg(long)]
        write: bool,
    },
    /// Renumber every node `1<suffix>, 2<suffix>, ...` in document order.
    Renumber {
        file: PathBuf,
        /// Write the result back instead of printing it.
        #[arg(long)]
        write: bool,
    },
    /// Show which conditional branches a set of answers opens.
    Preview {
        file: PathBuf,
        /// JSON object mapping question ids to answers.
        #[arg(long, value_name = "ANSWERS")]
        answers: PathBuf,
    },
    /// Print the document outline.
    Tree { file: PathBuf },
    /// Print the document as JSON.
    Json { file: PathBuf },
    /// Print the JSON schema of the document model.
    Schema,
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);
    match cli.command {
        Command::New {
            title,
            suffix,
            out,
            force,
        } => run_new(&title, suffix.as_deref(), out, force),
        Command::Check { file, json } => run_check(&file, json),
        Command::Fmt { file, write } => run_fmt(&file, write),
        Command::Renumber { file, write } => run_renumber(&file, write),
        Command::Preview { file, answers } => run_preview(&file, &answers),
        Command::Tree { file } => {
            print!("{}", render_outline(&load(&file)?));
            Ok(())
        }
        Command::Json { file } => {
            println!("{}", to_json(&load(&file)?)?);
            Ok(())
        }
        Command::Schema => {
            println!("{}", serde_json::to_string_pretty(&form_spec::schema())?);
            Ok(())
        }
    }
}

fn load(path: &Path) -> CliResult<Questionnaire> {
    let xml = fs::read_to_string(path)
        .map_err(|err| format!("failed to read {}: {}", path.display(), err))?;
    let doc = parse_xml(&xml)?;
    debug!(path = %path.display(), id = %doc.id, "loaded questionnaire");
    Ok(doc)
}

fn emit(path: &Path, xml: &str, write: bool) -> CliResult<()> {
    if write {
        fs::write(path, xml)?;
        println!("Wrote {}", path.display());
    } else {
        print!("{}", xml);
    }
    Ok(())
}

fn run_new(title: &str, suffix: Option<&str>, out: Option<PathBuf>, force: bool) -> CliResult<()> {
    let session = Session::create(title, suffix)?;
    let out_root = resolve_output_root(out)?;
    let target = out_root.join(format!("{}.xml", slug(title)));
    if target.exists() && !force {
        return Err(format!(
            "{} already exists; rerun with --force to overwrite",
            target.display()
        )
        .into());
    }
    fs::create_dir_all(&out_root)?;
    fs::write(&target, session.export_xml())?;
    info!(path = %target.display(), "wrote questionnaire");
    println!(
        "Created {} (id {}, suffix {})",
        target.display(),
        session.document().id,
        session.document().suffix
    );
    Ok(())
}

fn run_check(path: &Path, json: bool) -> CliResult<()> {
    let report = Session::new(load(path)?).validate();
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        describe_report(&report);
    }
    if report.valid {
        Ok(())
    } else {
        Err("validation failed".into())
    }
}

fn describe_report(report: &ValidationReport) {
    println!(
        "Validation result: {} ({} error(s), {} warning(s))",
        if report.valid { "valid" } else { "invalid" },
        report.errors,
        report.warnings
    );
    for finding in &report.findings {
        let severity = match finding.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        println!("  {}: {}", severity, finding.message);
    }
}

fn run_fmt(path: &Path, write: bool) -> CliResult<()> {
    let session = Session::new(load(path)?);
    emit(path, &session.export_xml(), write)
}

fn run_renumber(path: &Path, write: bool) -> CliResult<()> {
    let doc = regenerate_all_ids(&load(path)?);
    info!(next_id = doc.next_id, "renumbered questionnaire");
    emit(path, &form_spec::build_xml(&doc), write)
}

fn run_preview(path: &Path, answers_path: &Path) -> CliResult<()> {
    let doc = load(path)?;
    let answers = read_answers(answers_path)?;
    let visibility = resolve_visibility(&doc, &answers);
    for node in preorder(&doc) {
        if let Node::Conditional(conditional) = node {
            let visible = visibility.get(&conditional.id).copied().unwrap_or(false);
            println!(
                "{} if {}: {}",
                conditional.id,
                conditional.condition,
                if visible { "shown" } else { "hidden" }
            );
        }
    }
    Ok(())
}

/// Answers may be strings, numbers or booleans; anything else is skipped.
fn read_answers(path: &Path) -> CliResult<AnswerMap> {
    let contents = fs::read_to_string(path)?;
    let raw: Map<String, Value> = serde_json::from_str(&contents)?;
    Ok(raw
        .into_iter()
        .filter_map(|(id, value)| {
            let answer = match value {
                Value::String(text) => text,
                Value::Bool(flag) => flag.to_string(),
                Value::Number(number) => number.to_string(),
                _ => return None,
            };
            Some((id, answer))
        })
        .collect())
}

fn resolve_output_root(out: Option<PathBuf>) -> CliResult<PathBuf> {
    let candidate = match out {
        Some(path) => path,
        None => env::var_os(OUTPUT_DIR_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".")),
    };
    if candidate.as_os_str().is_empty() {
        return Err("output directory cannot be empty".into());
    }
    Ok(candidate)
}

/// File stem for a title: lowercase ASCII alphanumerics joined by `-`.
fn slug(title: &str) -> String {
    let words: Vec<String> = title
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_ascii_lowercase)
        .collect();
    if words.is_empty() {
        "questionnaire".to_string()
    } else {
        words.join("-")
    }
}
