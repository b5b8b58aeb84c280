//! `fcheck` review commands: check, options, page, mark, summary, export,
//! reasons.
//!
//! Every command loads the upload, the verdict side file and the review
//! profile into a [`Workbench`]. Only `page` (cursor) and `mark` (verdicts)
//! write the side file back.

use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};
use fieldcheck_config::ReviewProfile;
use fieldcheck_engine::dataset::{LATEST_EVIDENCE, RAISED_EVIDENCE};
use fieldcheck_engine::session::SeedReport;
use fieldcheck_engine::{
    ExportScope, FillScope, LoadReport, ReviewCursor, ReviewSession, ReviewSummary, Selection, Verdict,
};
use fieldcheck_io::store::default_store_path;
use fieldcheck_io::xlsx::{self, XlsxOptions};
use fieldcheck_io::{load_dataset, StoreFile};
use serde_json::{json, Map, Value};

use crate::util::{one_line, render_table};
use crate::CliError;

/// Widest table column on the terminal, in display columns.
const MAX_CELL_WIDTH: usize = 40;

// ============================================================================
// Arguments
// ============================================================================

#[derive(Args, Debug, Clone)]
pub struct DataArgs {
    /// Upload to review (.csv, .tsv, .xlsx, .xls, .xlsb, .ods)
    pub data: PathBuf,

    /// Verdict side file [default: <upload stem>.verdicts.json beside the upload]
    #[arg(long, value_name = "PATH")]
    pub store: Option<PathBuf>,

    /// Review profile (TOML) [default: <config dir>/fieldcheck/profile.toml if present]
    #[arg(long, value_name = "PATH", env = "FCHECK_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Filter selections. Unnamed columns keep their saved selection; `All`
/// clears one column, `--clear` clears every column first.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Zone to show (or All)
    #[arg(long)]
    pub zone: Option<String>,

    /// Ward to show (or All)
    #[arg(long)]
    pub ward: Option<String>,

    /// Organisation to show (or All)
    #[arg(long = "org", value_name = "ORGANISATION")]
    pub org: Option<String>,

    /// Any configured filter column. Repeatable.
    #[arg(long = "filter", value_name = "COLUMN=VALUE")]
    pub filter: Vec<String>,

    /// Drop saved filter selections before applying the ones given
    #[arg(long)]
    pub clear: bool,
}

impl FilterArgs {
    fn selections(&self) -> Result<Vec<(String, Selection)>, CliError> {
        let mut out = Vec::new();
        let shortcuts = [("Zone", &self.zone), ("Ward", &self.ward), ("Organisation", &self.org)];
        for (column, value) in shortcuts {
            if let Some(value) = value {
                out.push((column.to_string(), Selection::from(value.as_str())));
            }
        }
        for expr in &self.filter {
            let (column, value) = expr.split_once('=').ok_or_else(|| {
                CliError::args(format!("invalid --filter '{expr}'"))
                    .with_hint("use COLUMN=VALUE, e.g. --filter 'Zone=North'")
            })?;
            let column = column.trim();
            if column.is_empty() {
                return Err(CliError::args(format!("invalid --filter '{expr}': empty column name")));
            }
            out.push((column.to_string(), Selection::from(value)));
        }
        Ok(out)
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct PageArgs {
    /// Jump to page N (1-based); clamped to the last page
    #[arg(long, value_name = "N", conflicts_with_all = ["next", "prev"])]
    pub page: Option<usize>,

    /// Advance one page (stays on the last page)
    #[arg(long, conflicts_with = "prev")]
    pub next: bool,

    /// Go back one page (stays on the first page)
    #[arg(long)]
    pub prev: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ExportArgs {
    /// Output path [default: profile file_name beside the upload]
    #[arg(long, short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Export only rows passing the current filters
    #[arg(long)]
    pub filtered: bool,

    /// Color whole rows or only the Quality cell
    #[arg(long, value_enum)]
    pub fill: Option<FillArg>,

    /// Copy every upload column instead of the profile's column list
    #[arg(long)]
    pub all_columns: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FillArg {
    Row,
    Verdict,
}

impl From<FillArg> for FillScope {
    fn from(arg: FillArg) -> Self {
        match arg {
            FillArg::Row => FillScope::Row,
            FillArg::Verdict => FillScope::Verdict,
        }
    }
}

// ============================================================================
// Workbench
// ============================================================================

/// Upload + side file + profile, joined into one review session.
struct Workbench {
    profile: ReviewProfile,
    session: ReviewSession,
    report: LoadReport,
    seed: SeedReport,
    data_path: PathBuf,
    store_path: PathBuf,
    cursor: Option<ReviewCursor>,
}

impl Workbench {
    fn open(args: &DataArgs) -> Result<Self, CliError> {
        let profile = ReviewProfile::resolve(args.config.as_deref()).map_err(CliError::config)?;
        let options = profile.session_options();

        let (dataset, report) = load_dataset(&args.data, &options.id_column, &options.required_columns)
            .map_err(CliError::dataset)?;

        let store_path = args.store.clone().unwrap_or_else(|| default_store_path(&args.data));
        let store = StoreFile::load(&store_path).map_err(CliError::store)?;

        let mut session =
            ReviewSession::new(dataset, store.verdicts, &options).map_err(CliError::review)?;
        let seed = session.seed_from_upload();

        Ok(Self {
            profile,
            session,
            report,
            seed,
            data_path: args.data.clone(),
            store_path,
            cursor: store.cursor,
        })
    }

    /// Saved cursor first, then the selections given on the command line.
    /// A selection that differs from the saved one sends the page back to
    /// the start.
    fn apply_filters(&mut self, filters: &FilterArgs) -> Result<(), CliError> {
        if let Some(cursor) = &self.cursor {
            self.session.restore_cursor(cursor);
        }
        if filters.clear {
            self.session
                .set_filters(Vec::new())
                .map_err(CliError::review)?;
        }
        for (column, selection) in filters.selections()? {
            self.session
                .set_filter(&column, selection)
                .map_err(CliError::review)?;
        }
        Ok(())
    }

    /// Commit staged verdicts and write the side file.
    fn save(&mut self, cursor: Option<ReviewCursor>) -> Result<(), CliError> {
        self.session.commit();
        let store = StoreFile::new(self.session.book().persisted().clone(), cursor);
        store.save(&self.store_path).map_err(CliError::store)
    }

    fn active_filters(&self) -> Vec<(String, String)> {
        self.session
            .filters()
            .selections()
            .iter()
            .filter(|(_, s)| !s.is_all())
            .map(|(c, s)| (c.clone(), s.to_string()))
            .collect()
    }

    fn filters_json(&self) -> Value {
        let mut map = Map::new();
        for (column, value) in self.active_filters() {
            map.insert(column, Value::String(value));
        }
        Value::Object(map)
    }

    fn filters_label(&self) -> String {
        if !self.session.filters().is_active() {
            "no filters".to_string()
        } else {
            self.active_filters()
                .iter()
                .map(|(c, v)| format!("{c}={v}"))
                .collect::<Vec<_>>()
                .join(", ")
        }
    }
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let text = serde_json::to_string_pretty(value).map_err(|e| CliError::io(e.to_string()))?;
    println!("{text}");
    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ============================================================================
// check
// ============================================================================

pub fn cmd_check(args: DataArgs, json: bool) -> Result<(), CliError> {
    let bench = Workbench::open(&args)?;
    let dataset = bench.session.dataset();
    let stored = bench.session.book().persisted().len();
    let orphaned = bench.session.orphaned_ids().len();
    let invalid: Vec<&str> = bench.session.invalid_entries().into_iter().map(|(id, _)| id).collect();

    if json {
        return print_json(&json!({
            "file": bench.data_path,
            "id_column": dataset.id_column(),
            "distinct_ids": dataset.distinct_ids(),
            "columns": dataset.headers(),
            "report": bench.report,
            "store": bench.store_path,
            "stored_verdicts": stored,
            "orphaned_verdicts": orphaned,
            "invalid_verdicts": invalid,
            "seeded": bench.seed,
        }));
    }

    let source = match (&bench.report.sheet, bench.report.delimiter) {
        (Some(sheet), _) => format!("sheet '{sheet}'"),
        (None, Some('\t')) => "tab-delimited".to_string(),
        (None, Some(d)) => format!("delimiter '{d}'"),
        (None, None) => String::new(),
    };
    println!("file:       {} ({source})", file_name(&bench.data_path));
    println!(
        "rows:       {} ({} distinct {})",
        bench.report.rows_loaded,
        dataset.distinct_ids(),
        dataset.id_column()
    );
    println!("columns:    {}", dataset.headers().len());
    if bench.report.blank_ids_skipped > 0 {
        println!(
            "skipped:    {} row(s) with blank {}",
            bench.report.blank_ids_skipped,
            dataset.id_column()
        );
    }
    if !bench.report.duplicate_ids.is_empty() {
        println!(
            "duplicates: {} (rows with the same id share one verdict)",
            bench.report.duplicate_ids.join(", ")
        );
    }
    println!(
        "store:      {} ({stored} verdict(s), {orphaned} not in this upload)",
        bench.store_path.display()
    );
    if !invalid.is_empty() {
        println!(
            "invalid:    {} (stored verdict breaks the reason rules; re-mark it)",
            invalid.join(", ")
        );
    }
    if bench.seed.seeded > 0 || bench.seed.invalid > 0 {
        println!(
            "seeded:     {} verdict(s) from the Quality column ({} invalid)",
            bench.seed.seeded, bench.seed.invalid
        );
    }
    Ok(())
}

// ============================================================================
// options
// ============================================================================

pub fn cmd_options(args: DataArgs, json: bool) -> Result<(), CliError> {
    let bench = Workbench::open(&args)?;
    let dataset = bench.session.dataset();
    let columns: Vec<String> = bench.session.filters().columns().map(str::to_string).collect();

    if json {
        let mut map = Map::new();
        for column in &columns {
            let values = bench.session.filter_options(column);
            map.insert(
                column.clone(),
                json!({ "present": dataset.has_column(column), "values": values }),
            );
        }
        return print_json(&Value::Object(map));
    }

    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            println!();
        }
        if !dataset.has_column(column) {
            println!("{column}: not in this upload (only All)");
            continue;
        }
        // First entry is the All wildcard
        let values = bench.session.filter_options(column);
        println!("{column} ({} values)", values.len().saturating_sub(1));
        for entry in values {
            println!("  {}  ({})", entry.value, entry.count);
        }
    }
    Ok(())
}

// ============================================================================
// page
// ============================================================================

pub fn cmd_page(args: DataArgs, filters: FilterArgs, paging: PageArgs, json: bool) -> Result<(), CliError> {
    let mut bench = Workbench::open(&args)?;
    bench.apply_filters(&filters)?;

    if let Some(n) = paging.page {
        if n == 0 {
            return Err(CliError::args("--page is 1-based"));
        }
        bench.session.goto_page(n - 1);
    } else if paging.next {
        bench.session.next_page();
    } else if paging.prev {
        bench.session.prev_page();
    }

    let cursor = bench.session.cursor();
    bench.save(Some(cursor))?;

    let dataset = bench.session.dataset();
    let page = bench.session.page();
    let filter_cols: Vec<&str> = bench
        .session
        .filters()
        .columns()
        .filter(|c| dataset.has_column(c))
        .collect();
    let evidence: Vec<&str> = [RAISED_EVIDENCE, LATEST_EVIDENCE]
        .into_iter()
        .filter(|c| dataset.has_column(c))
        .collect();

    if json {
        let rows: Vec<Value> = page
            .entries
            .iter()
            .map(|entry| {
                let mut fields = Map::new();
                for (header, value) in dataset.headers().iter().zip(&entry.record.cells) {
                    fields.insert(header.clone(), Value::String(value.clone()));
                }
                json!({
                    "ordinal": entry.ordinal,
                    "id": entry.record.id,
                    "verdict": entry.review.verdict,
                    "label": entry.review.verdict.label(),
                    "reason": entry.review.reason,
                    "updated_at": entry.review.updated_at,
                    "fields": fields,
                })
            })
            .collect();
        return print_json(&json!({
            "page": page.window,
            "filters": bench.filters_json(),
            "rows": rows,
        }));
    }

    let w = page.window;
    if w.total == 0 {
        println!("no rows match ({})", bench.filters_label());
        return Ok(());
    }
    println!(
        "page {}/{}  rows {}-{} of {}  ({})",
        w.page + 1,
        w.page_count,
        w.start,
        w.end,
        w.total,
        bench.filters_label()
    );
    println!();

    let mut headers: Vec<&str> = vec!["#", dataset.id_column()];
    headers.extend(&filter_cols);
    headers.extend(["Verdict", "Reason"]);
    headers.extend(&evidence);

    let rows: Vec<Vec<String>> = page
        .entries
        .iter()
        .map(|entry| {
            let mut row = vec![entry.ordinal.to_string(), one_line(&entry.record.id)];
            for col in filter_cols.iter().copied() {
                row.push(one_line(dataset.value(entry.record, col)));
            }
            row.push(entry.review.verdict.label().to_string());
            row.push(entry.review.reason.clone());
            for col in evidence.iter().copied() {
                row.push(one_line(dataset.value(entry.record, col)));
            }
            row
        })
        .collect();
    println!("{}", render_table(&headers, &rows, MAX_CELL_WIDTH));

    if bench.session.paginator().has_next() {
        println!();
        println!("more: fcheck page {} --next", args.data.display());
    }
    Ok(())
}

// ============================================================================
// mark
// ============================================================================

pub fn cmd_mark(args: DataArgs, id: String, verdict: String, reason: Option<String>) -> Result<(), CliError> {
    let mut bench = Workbench::open(&args)?;
    let verdict: Verdict = verdict.parse().map_err(CliError::review)?;

    let id_column = bench.session.dataset().id_column().to_string();
    let review = bench
        .session
        .mark(&id, verdict, reason.as_deref())
        .map_err(|e| match e {
            e @ fieldcheck_engine::ReviewError::UnknownRecord { .. } => CliError::review(e)
                .with_hint(format!("ids are read from the '{id_column}' column; see `fcheck page`")),
            e => CliError::review(e),
        })?;

    let cursor = bench.cursor.clone();
    bench.save(cursor)?;

    let id = id.trim();
    match review.verdict {
        Verdict::NotYetUpdated => println!("{id}: reverted to {}", review.verdict),
        Verdict::Incorrect => println!("{id}: {} ({})", review.verdict, review.reason),
        v => println!("{id}: {v}"),
    }
    Ok(())
}

// ============================================================================
// summary
// ============================================================================

pub fn cmd_summary(args: DataArgs, filters: FilterArgs, json: bool) -> Result<(), CliError> {
    let mut bench = Workbench::open(&args)?;
    bench.apply_filters(&filters)?;
    let summary = bench.session.summary();

    if json {
        let mut value = serde_json::to_value(&summary).map_err(|e| CliError::io(e.to_string()))?;
        if let Value::Object(map) = &mut value {
            map.insert("filters".to_string(), bench.filters_json());
        }
        return print_json(&value);
    }

    println!("{} row(s) ({})", summary.total, bench.filters_label());
    println!();
    print!("{}", render_summary(&summary));
    Ok(())
}

fn render_summary(summary: &ReviewSummary) -> String {
    let rows: Vec<Vec<String>> = summary
        .counts
        .iter()
        .map(|c| vec![c.label.to_string(), c.count.to_string(), format!("{:.1}%", c.percent)])
        .collect();
    let mut out = render_table(&["Verdict", "Rows", "Share"], &rows, MAX_CELL_WIDTH);
    out.push('\n');
    out.push_str(&format!(
        "\nreviewed: {}  accuracy: {:.1}%\n",
        summary.reviewed, summary.accuracy
    ));
    if !summary.reasons.is_empty() {
        out.push_str("\nIncorrect by reason:\n");
        for (reason, count) in &summary.reasons {
            out.push_str(&format!("  {count:>4}  {reason}\n"));
        }
    }
    out
}

// ============================================================================
// export
// ============================================================================

pub fn cmd_export(args: DataArgs, filters: FilterArgs, export: ExportArgs, json: bool) -> Result<(), CliError> {
    let mut bench = Workbench::open(&args)?;
    bench.apply_filters(&filters)?;

    let profile = &bench.profile.export;
    let scope = if export.filtered { ExportScope::Filtered } else { profile.scope };
    let fill = export.fill.map(FillScope::from).unwrap_or(profile.fill);
    let columns: Vec<String> = if export.all_columns { Vec::new() } else { profile.columns.clone() };
    let output = export
        .output
        .clone()
        .unwrap_or_else(|| default_output(&args.data, &profile.file_name));

    if same_file(&args.data, &output) {
        return Err(CliError::args(format!(
            "refusing to overwrite the upload {}",
            args.data.display()
        ))
        .with_hint("pass -o with a different path"));
    }

    let options = XlsxOptions {
        sheet_name: profile.sheet_name.clone(),
        fill,
    };
    bench.session.commit();
    let plan = bench
        .session
        .export_plan(&columns, scope)
        .map_err(CliError::review)?;
    let result = xlsx::export(&plan, &output, &options).map_err(CliError::export)?;

    if json {
        let mut value = serde_json::to_value(&result).map_err(|e| CliError::io(e.to_string()))?;
        if let Value::Object(map) = &mut value {
            map.insert("scope".to_string(), json!(scope));
            map.insert("filters".to_string(), bench.filters_json());
        }
        return print_json(&value);
    }

    println!(
        "exported {} row(s) to {} ({} correct, {} incorrect)",
        result.rows_written,
        output.display(),
        result.green_rows,
        result.red_rows
    );
    Ok(())
}

/// Do both paths name the same file? The output may not exist yet, so its
/// parent directory is resolved instead.
fn same_file(upload: &Path, output: &Path) -> bool {
    let Ok(upload) = std::fs::canonicalize(upload) else {
        return false;
    };
    if let Ok(existing) = std::fs::canonicalize(output) {
        return existing == upload;
    }
    let parent = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    match (std::fs::canonicalize(parent), output.file_name()) {
        (Ok(dir), Some(name)) => dir.join(name) == upload,
        _ => false,
    }
}

/// The profile's file name beside the upload, or `<stem>.reviewed.xlsx`
/// when the upload already has that name.
fn default_output(data: &Path, file_name: &str) -> PathBuf {
    let candidate = data.with_file_name(file_name);
    if !same_file(data, &candidate) {
        return candidate;
    }
    let stem = data
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "export".to_string());
    data.with_file_name(format!("{stem}.reviewed.xlsx"))
}

// ============================================================================
// reasons
// ============================================================================

pub fn cmd_reasons(config: Option<PathBuf>) -> Result<(), CliError> {
    let profile = ReviewProfile::resolve(config.as_deref()).map_err(CliError::config)?;
    for (i, reason) in profile.disapproval_reasons.iter().enumerate() {
        println!("{:>2}. {reason}", i + 1);
    }
    Ok(())
}
