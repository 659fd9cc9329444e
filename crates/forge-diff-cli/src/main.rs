use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use forge_diff::{
    cut_diff_around_line, parse_patch_skip_to, Diff, DiffLineType, IntralineDiffer,
};
use std::collections::HashSet;
use std::fmt::Write as _;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

mod logger;
mod settings;

use settings::LimitOverrides;

#[derive(Parser, Debug)]
#[command(name = "forge-diff")]
#[command(about = "Parse, cut and render git patches")]
#[command(version)]
struct Args {
    /// Config file to use instead of the default lookup
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Content lines per file before the file is marked incomplete
    #[arg(long, global = true)]
    max_lines: Option<usize>,

    /// Characters per content line before the line is cut
    #[arg(long, global = true)]
    max_line_characters: Option<usize>,

    /// Files per diff before the rest of the patch is skipped
    #[arg(long, global = true)]
    max_files: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a patch and print it as JSON
    Parse {
        /// Patch file, stdin when omitted
        file: Option<PathBuf>,

        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,

        /// Oid of a stored LFS object, may be repeated
        #[arg(long = "lfs-oid", value_name = "OID")]
        lfs_oids: Vec<String>,

        /// Start with this file, skipping the ones before it
        #[arg(long, value_name = "FILE")]
        skip_to: Option<String>,
    },
    /// Print the part of a single-file diff leading up to a line
    Cut {
        /// Patch file, stdin when omitted
        file: Option<PathBuf>,

        /// Line number to cut around
        #[arg(long)]
        line: i64,

        /// The line number refers to the old side
        #[arg(long)]
        old: bool,

        /// Lines to keep, defaults to the configured context
        #[arg(long)]
        context: Option<usize>,
    },
    /// Print every line with its intraline HTML
    Inline {
        /// Patch file, stdin when omitted
        file: Option<PathBuf>,

        /// Start with this file, skipping the ones before it
        #[arg(long, value_name = "FILE")]
        skip_to: Option<String>,
    },
}

fn main() -> Result<()> {
    logger::init();
    let args = Args::parse();
    log::debug!("Starting forge-diff with {:?}", args);

    let config = settings::load_config(args.config.as_deref())?;
    let limits = settings::parse_limits(
        &config,
        LimitOverrides {
            max_lines: args.max_lines,
            max_line_characters: args.max_line_characters,
            max_files: args.max_files,
        },
    );

    match args.command {
        Command::Parse {
            file,
            pretty,
            lfs_oids,
            skip_to,
        } => {
            let lfs: HashSet<String> = lfs_oids.into_iter().collect();
            let diff = parse_patch_skip_to(
                limits,
                &lfs,
                open_input(file.as_deref())?,
                skip_to.as_deref(),
            )
            .context("Failed to parse patch")?;
            log_summary(&diff);

            let json = if pretty {
                serde_json::to_string_pretty(&diff)?
            } else {
                serde_json::to_string(&diff)?
            };
            println!("{}", json);
        }
        Command::Cut {
            file,
            line,
            old,
            context,
        } => {
            let mut patch = String::new();
            open_input(file.as_deref())?
                .read_to_string(&mut patch)
                .context("Failed to read patch")?;
            let context = context.unwrap_or(config.context_lines);
            let cut = cut_diff_around_line(&patch, line, old, context);
            if cut.is_empty() {
                log::warn!("No hunk covers line {}", line);
            }
            println!("{}", cut);
        }
        Command::Inline { file, skip_to } => {
            let lfs: HashSet<String> = HashSet::new();
            let diff = parse_patch_skip_to(
                limits,
                &lfs,
                open_input(file.as_deref())?,
                skip_to.as_deref(),
            )
            .context("Failed to parse patch")?;
            log_summary(&diff);

            let differ = IntralineDiffer::new(settings::intraline_options(&config));
            print!("{}", render_inline(&diff, &differ));
        }
    }

    Ok(())
}

fn open_input(file: Option<&Path>) -> Result<Box<dyn Read>> {
    match file {
        Some(path) => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            Ok(Box::new(file))
        }
        None => Ok(Box::new(io::stdin().lock())),
    }
}

fn log_summary(diff: &Diff) {
    log::info!(
        "Parsed {} files, +{} -{}, {} lines kept{}",
        diff.num_files(),
        diff.total_addition,
        diff.total_deletion,
        kept_lines(diff),
        if diff.is_incomplete { " (incomplete)" } else { "" }
    );
    if let Some(end) = &diff.end {
        log::warn!("File limit reached, continue with --skip-to {:?}", end);
    }
}

/// Content lines held in memory, section headers excluded.
fn kept_lines(diff: &Diff) -> usize {
    diff.files
        .iter()
        .flat_map(|file| file.lines())
        .filter(|line| line.line_type != DiffLineType::Section)
        .count()
}

/// One block per file, one row per line: old number, new number, css class, HTML.
fn render_inline(diff: &Diff, differ: &IntralineDiffer) -> String {
    let mut out = String::new();
    for file in &diff.files {
        let _ = writeln!(out, "== {}", file.diff_file_name());
        for section in &file.sections {
            for line in &section.lines {
                let html = differ.computed_inline_diff_for(section, line);
                let _ = writeln!(
                    out,
                    "{:>5} {:>5} {:<4} {}",
                    line_number(line.left_idx),
                    line_number(line.right_idx),
                    line.html_line_type(),
                    html
                );
            }
        }
    }
    out
}

fn line_number(idx: u32) -> String {
    if idx == 0 {
        String::new()
    } else {
        idx.to_string()
    }
}
