//! Event journal for sandbox runs.
//!
//! A `tracing` subscriber appends every event to a per-target journal. Each
//! entry keeps its own fields, so targets do not need a fixed schema. Journals
//! become polars DataFrames on demand; a column absent from an entry is null.
//!
//! # Usage
//!
//! ```ignore
//! // In editor code:
//! tracing::info!(target: "sale", island = id.0, price);
//!
//! // In a test:
//! instrument::install_subscriber();
//! // ... paint, build, work ...
//! let journal = instrument::drain();
//! let sales = journal.to_dataframe("sale")?;
//! ```

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use polars::prelude::*;
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Record};
use tracing::{Event, Id, Level, Metadata, Subscriber};

// ============================================================================
// Journal entries
// ============================================================================

/// One recorded field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    U64(u64),
    I64(i64),
    F64(f64),
    Bool(bool),
    Str(String),
}

impl FieldValue {
    fn kind(&self) -> u8 {
        match self {
            FieldValue::U64(_) => 0,
            FieldValue::I64(_) => 1,
            FieldValue::F64(_) => 2,
            FieldValue::Bool(_) => 3,
            FieldValue::Str(_) => 4,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::U64(v) => write!(f, "{v}"),
            FieldValue::I64(v) => write!(f, "{v}"),
            FieldValue::F64(v) => write!(f, "{v}"),
            FieldValue::Bool(v) => write!(f, "{v}"),
            FieldValue::Str(v) => f.write_str(v),
        }
    }
}

/// A single event: its position in the run, level and fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub seq: u64,
    pub level: Level,
    pub fields: BTreeMap<String, FieldValue>,
}

impl Entry {
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }
}

/// Entries grouped by tracing target, in the order they were emitted.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    pub targets: BTreeMap<String, Vec<Entry>>,
    next_seq: u64,
}

impl Journal {
    pub fn push(&mut self, target: &str, level: Level, fields: BTreeMap<String, FieldValue>) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.targets.entry(target.to_string()).or_default().push(Entry {
            seq,
            level,
            fields,
        });
    }

    pub fn entries(&self, target: &str) -> &[Entry] {
        self.targets.get(target).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn count(&self, target: &str) -> usize {
        self.entries(target).len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Build a DataFrame for one target.
    ///
    /// Every table has `seq` and `level` columns. A field whose values all share
    /// one type keeps it; mixed fields fall back to strings.
    pub fn to_dataframe(&self, target: &str) -> PolarsResult<DataFrame> {
        let entries = self.entries(target);
        let names: BTreeSet<&str> = entries
            .iter()
            .flat_map(|entry| entry.fields.keys().map(String::as_str))
            .collect();

        let mut columns = vec![
            Column::new(
                "seq".into(),
                entries.iter().map(|e| e.seq).collect::<Vec<u64>>(),
            ),
            Column::new(
                "level".into(),
                entries
                    .iter()
                    .map(|e| e.level.as_str())
                    .collect::<Vec<&str>>(),
            ),
        ];
        for name in names {
            let values: Vec<Option<&FieldValue>> =
                entries.iter().map(|entry| entry.get(name)).collect();
            columns.push(build_column(name, &values));
        }
        DataFrame::new(columns)
    }

    /// DataFrames for every target that has entries.
    pub fn to_dataframes(&self) -> PolarsResult<BTreeMap<String, DataFrame>> {
        self.targets
            .keys()
            .map(|target| Ok((target.clone(), self.to_dataframe(target)?)))
            .collect()
    }
}

fn build_column(name: &str, values: &[Option<&FieldValue>]) -> Column {
    let kinds: BTreeSet<u8> = values.iter().flatten().map(|v| v.kind()).collect();
    let uniform = kinds.len() == 1;

    macro_rules! typed {
        ($variant:ident, $ty:ty) => {
            Column::new(
                name.into(),
                values
                    .iter()
                    .map(|v| match v {
                        Some(FieldValue::$variant(x)) => Some(x.clone()),
                        _ => None,
                    })
                    .collect::<Vec<Option<$ty>>>(),
            )
        };
    }

    match values.iter().flatten().next() {
        Some(FieldValue::U64(_)) if uniform => typed!(U64, u64),
        Some(FieldValue::I64(_)) if uniform => typed!(I64, i64),
        Some(FieldValue::F64(_)) if uniform => typed!(F64, f64),
        Some(FieldValue::Bool(_)) if uniform => typed!(Bool, bool),
        _ => Column::new(
            name.into(),
            values
                .iter()
                .map(|v| v.map(ToString::to_string))
                .collect::<Vec<Option<String>>>(),
        ),
    }
}

thread_local! {
    static JOURNAL: RefCell<Journal> = RefCell::default();
}

// ============================================================================
// Subscriber
// ============================================================================

struct FieldCollector {
    fields: BTreeMap<String, FieldValue>,
}

impl FieldCollector {
    fn put(&mut self, field: &Field, value: FieldValue) {
        self.fields.insert(field.name().to_string(), value);
    }
}

impl Visit for FieldCollector {
    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, FieldValue::U64(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, FieldValue::I64(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.put(field, FieldValue::F64(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, FieldValue::Bool(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, FieldValue::Str(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.put(field, FieldValue::Str(format!("{value:?}")));
    }
}

/// Records events at INFO and above into the thread-local journal. Spans are ignored.
pub struct JournalSubscriber;

impl Subscriber for JournalSubscriber {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.is_event() && *metadata.level() <= Level::INFO
    }

    fn new_span(&self, _span: &Attributes<'_>) -> Id {
        Id::from_u64(1)
    }

    fn record(&self, _span: &Id, _values: &Record<'_>) {}

    fn record_follows_from(&self, _span: &Id, _follows: &Id) {}

    fn event(&self, event: &Event<'_>) {
        let mut collector = FieldCollector {
            fields: BTreeMap::new(),
        };
        event.record(&mut collector);
        let metadata = event.metadata();
        JOURNAL.with(|journal| {
            journal
                .borrow_mut()
                .push(metadata.target(), *metadata.level(), collector.fields)
        });
    }

    fn enter(&self, _span: &Id) {}

    fn exit(&self, _span: &Id) {}
}

/// Install the journal subscriber as the global default. Later calls are no-ops.
pub fn install_subscriber() {
    let _ = tracing::subscriber::set_global_default(JournalSubscriber);
}

/// Take everything recorded on this thread so far.
pub fn drain() -> Journal {
    JOURNAL.with(|journal| std::mem::take(&mut *journal.borrow_mut()))
}

pub fn clear() {
    JOURNAL.with(|journal| *journal.borrow_mut() = Journal::default());
}

// ============================================================================
// Parquet export
// ============================================================================

fn io_error(error: std::io::Error) -> PolarsError {
    PolarsError::IO {
        error: error.into(),
        msg: None,
    }
}

/// Write each DataFrame to `{dir}/{target}.parquet`.
pub fn save_parquet(dfs: &mut BTreeMap<String, DataFrame>, dir: &Path) -> PolarsResult<()> {
    std::fs::create_dir_all(dir).map_err(io_error)?;
    for (target, df) in dfs.iter_mut() {
        let file = std::fs::File::create(dir.join(format!("{target}.parquet"))).map_err(io_error)?;
        ParquetWriter::new(file).finish(df)?;
    }
    Ok(())
}

/// Lowercase alphanumerics and `-`, everything else becomes `_`.
fn slug(name: &str) -> String {
    name.chars()
        .take(48)
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Clears the journal when created and writes it as parquet when dropped.
///
/// Runs land in `{parent}/{unix_secs}_{name}/`, one file per target, followed by
/// an empty `_ready` marker once every file is written.
///
/// ```ignore
/// let mut rec = isle_core::instrument::ScopedRecorder::new("runs", "farm_economy");
/// // ... run the editor ...
/// let sales = rec.journal().count("sale");
/// ```
pub struct ScopedRecorder {
    run_dir: PathBuf,
    journal: Option<Journal>,
}

impl ScopedRecorder {
    pub fn new(parent: impl Into<PathBuf>, name: &str) -> Self {
        let secs = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        clear();
        install_subscriber();
        Self {
            run_dir: parent.into().join(format!("{secs}_{}", slug(name))),
            journal: None,
        }
    }

    /// Drain once; later calls return the same journal.
    pub fn journal(&mut self) -> &Journal {
        self.journal.get_or_insert_with(drain)
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }
}

impl Drop for ScopedRecorder {
    fn drop(&mut self) {
        let journal = self.journal.take().unwrap_or_else(drain);
        if journal.is_empty() {
            return;
        }
        let written = journal
            .to_dataframes()
            .and_then(|mut dfs| save_parquet(&mut dfs, &self.run_dir));
        if let Err(e) = written {
            eprintln!("ScopedRecorder: failed to write {}: {e}", self.run_dir.display());
            return;
        }
        if let Err(e) = std::fs::File::create(self.run_dir.join("_ready")) {
            eprintln!("ScopedRecorder: failed to write _ready marker: {e}");
        }
    }
}
