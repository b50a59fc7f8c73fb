//! File-level operations for the command line tool.
//!
//! These wrap the pure exporter with reading snapshots from disk, writing
//! documents, batch conversion and box score reports.

use crate::export::{export_match, ExportOptions, ExportWarning};
use crate::model::MatchSnapshot;
use crate::qbj::Match;
use crate::stats::{box_score, BoxScore};
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::fmt::Write;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Extension given to exported documents
pub const QBJ_EXTENSION: &str = "qbj";

// ============================================================================
// Loading
// ============================================================================

/// Read a match snapshot from a JSON file.
pub fn load_snapshot(path: &Path) -> Result<MatchSnapshot> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid match snapshot in {}", path.display()))
}

/// Read an exported QBJ match document.
pub fn load_match(path: &Path) -> Result<Match> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read match {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid QBJ match in {}", path.display()))
}

// ============================================================================
// Export
// ============================================================================

/// Configuration for exporting a single snapshot.
pub struct ExportConfig {
    /// Snapshot JSON path
    pub input: PathBuf,
    /// Where to write the document; `None` leaves writing to the caller
    pub output: Option<PathBuf>,
    pub options: ExportOptions,
}

/// Result of exporting a single snapshot.
pub struct ExportOutcome {
    /// The serialized document
    pub json: String,
    /// Number of questions exported
    pub questions: usize,
    pub warnings: Vec<ExportWarning>,
}

/// Export one snapshot file, writing the document if an output is configured.
pub fn export_file(config: &ExportConfig) -> Result<ExportOutcome> {
    let snapshot = load_snapshot(&config.input)?;
    let export = export_match(&snapshot, &config.options)
        .with_context(|| format!("Failed to export {}", config.input.display()))?;
    let json = export.to_json(config.options.pretty)?;

    if let Some(output) = &config.output {
        fs::write(output, &json)
            .with_context(|| format!("Failed to write {}", output.display()))?;
        log::info!(
            "Exported {} questions from {} to {}",
            export.document.match_questions.len(),
            config.input.display(),
            output.display()
        );
    }

    Ok(ExportOutcome {
        json,
        questions: export.document.match_questions.len(),
        warnings: export.warnings,
    })
}

/// Output path for a snapshot in batch mode: `<out_dir>/<stem>.qbj`.
pub fn output_path_for(input: &Path, out_dir: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "match".to_string());
    out_dir.join(format!("{}.{}", stem, QBJ_EXTENSION))
}

// ============================================================================
// Batch Export
// ============================================================================

/// Configuration for converting many snapshots at once.
pub struct BatchConfig {
    pub inputs: Vec<PathBuf>,
    /// Directory that receives one `.qbj` file per input
    pub out_dir: PathBuf,
    /// Number of parallel threads (default: number of CPU cores)
    pub threads: Option<usize>,
    pub options: ExportOptions,
}

/// Progress information for a batch export.
pub struct BatchProgress {
    /// Number of files finished so far
    pub completed: usize,
    /// Total number of files
    pub total: usize,
    /// Number of files that failed
    pub errors: usize,
}

/// Summary of a batch export.
pub struct BatchResult {
    pub converted: usize,
    pub failures: Vec<(PathBuf, String)>,
}

impl BatchResult {
    pub fn summary(&self) -> String {
        format!(
            "Done! Converted {} of {} files ({} failed)",
            self.converted,
            self.converted + self.failures.len(),
            self.failures.len()
        )
    }
}

/// Convert every input in parallel. A failing file is recorded and does not
/// stop the others.
///
/// Calls `on_progress` after each file.
pub fn export_batch(
    config: &BatchConfig,
    on_progress: impl Fn(&BatchProgress) + Sync,
) -> Result<BatchResult> {
    if let Some(n) = config.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .ok(); // Ignore error if already initialized
    }

    fs::create_dir_all(&config.out_dir)
        .with_context(|| format!("Failed to create {}", config.out_dir.display()))?;

    let total = config.inputs.len();
    let completed = AtomicUsize::new(0);
    let error_count = AtomicUsize::new(0);
    let failures: Mutex<Vec<(PathBuf, String)>> = Mutex::new(Vec::new());

    config.inputs.par_iter().for_each(|input| {
        let export = ExportConfig {
            input: input.clone(),
            output: Some(output_path_for(input, &config.out_dir)),
            options: config.options.clone(),
        };

        if let Err(e) = export_file(&export) {
            error_count.fetch_add(1, Ordering::Relaxed);
            log::warn!("{}: {:#}", input.display(), e);
            if let Ok(mut failures) = failures.lock() {
                failures.push((input.clone(), format!("{:#}", e)));
            }
        }

        let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
        on_progress(&BatchProgress {
            completed: done,
            total,
            errors: error_count.load(Ordering::Relaxed),
        });
    });

    let mut failures = failures
        .into_inner()
        .map_err(|_| anyhow::anyhow!("Batch worker panicked"))?;
    failures.sort();

    Ok(BatchResult {
        converted: total - failures.len(),
        failures,
    })
}

// ============================================================================
// Stats
// ============================================================================

/// Render the box score of an exported match as a text report.
pub fn compute_stats(input: &Path) -> Result<String> {
    let document = load_match(input)?;
    format_box_score(&box_score(&document))
}

pub fn format_box_score(score: &BoxScore) -> Result<String> {
    let mut out = String::new();
    writeln!(out, "Tossups read: {}\n", score.tossups_read)?;

    writeln!(out, "{:=^72}", " Teams ")?;
    writeln!(
        out,
        "{:<24} {:>10} {:>10} {:>8} {:>8} {:>8}",
        "Team", "TU Pts", "Bonus Pts", "Heard", "PPB", "Total"
    )?;
    writeln!(out, "{:-<72}", "")?;
    for team in &score.teams {
        writeln!(
            out,
            "{:<24} {:>10} {:>10} {:>8} {:>8.2} {:>8}",
            truncate_name(&team.name, 24),
            team.tossup_points,
            team.bonus_points,
            team.bonuses_heard,
            team.points_per_bonus(),
            team.total()
        )?;
    }

    writeln!(out, "\n{:=^72}", " Players ")?;
    writeln!(
        out,
        "{:<20} {:<20} {:>6} {:>6} {:>6} {:>8}",
        "Player", "Team", "TUH", "Gets", "Negs", "Points"
    )?;
    writeln!(out, "{:-<72}", "")?;
    for player in &score.players {
        writeln!(
            out,
            "{:<20} {:<20} {:>6} {:>6} {:>6} {:>8}",
            truncate_name(&player.name, 20),
            truncate_name(&player.team, 20),
            player.tossups_heard,
            player.gets(),
            player.negs(),
            player.tossup_points()
        )?;
    }

    Ok(out)
}

/// Write one CSV row per player with a column per answer value.
///
/// Returns the number of player rows written.
pub fn write_stats_csv(input: &Path, output: &Path) -> Result<usize> {
    let document = load_match(input)?;
    let score = box_score(&document);
    let values = score.answer_values();

    let mut writer = csv::Writer::from_path(output).context("Failed to create output CSV")?;
    let mut headers = vec!["Team".to_string(), "Player".to_string(), "TUH".to_string()];
    headers.extend(values.iter().map(|v| v.to_string()));
    headers.push("Points".to_string());
    writer.write_record(&headers)?;

    for player in &score.players {
        let mut record = vec![
            player.team.clone(),
            player.name.clone(),
            player.tossups_heard.to_string(),
        ];
        record.extend(
            values
                .iter()
                .map(|v| player.answers.get(v).copied().unwrap_or(0).to_string()),
        );
        record.push(player.tossup_points().to_string());
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(score.players.len())
}

fn truncate_name(name: &str, max_len: usize) -> String {
    if name.chars().count() <= max_len {
        name.to_string()
    } else {
        let truncated: String = name.chars().take(max_len - 2).collect();
        format!("{}..", truncated)
    }
}
