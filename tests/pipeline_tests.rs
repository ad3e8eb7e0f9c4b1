use edgar_fsds::core::config::{LoaderConfig, MissingQuarterPolicy};
use edgar_fsds::db;
use edgar_fsds::edgar::ReportType;
use edgar_fsds::fsds::Table;
use edgar_fsds::{LoadError, Pipeline, ResetMode, Selection};
use itertools::Itertools;
use sqlx::sqlite::SqlitePool;
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

type Fields<'a> = &'a [(&'a str, &'a str)];

/// Writes `table`'s file with every schema column; unnamed fields are left empty.
fn write_table(quarter_dir: &Path, table: Table, rows: &[Fields]) {
    fs::create_dir_all(quarter_dir).unwrap();
    let columns: Vec<&str> = table.columns().iter().map(|(name, _)| *name).collect();
    let mut content = columns.join("\t");
    content.push('\n');
    for row in rows {
        let line = columns
            .iter()
            .map(|column| {
                row.iter()
                    .find(|(name, _)| name == column)
                    .map(|(_, value)| *value)
                    .unwrap_or("")
            })
            .join("\t");
        content.push_str(&line);
        content.push('\n');
    }
    fs::write(quarter_dir.join(table.file_name()), content).unwrap();
}

fn sub(adsh: &'static str, name: &'static str, form: &'static str) -> Vec<(&'static str, &'static str)> {
    vec![("adsh", adsh), ("cik", "1"), ("name", name), ("form", form), ("period", "20201231")]
}

fn pre(adsh: &'static str, line: &'static str, tag: &'static str) -> Vec<(&'static str, &'static str)> {
    vec![
        ("adsh", adsh),
        ("report", "1"),
        ("line", line),
        ("stmt", "BS"),
        ("tag", tag),
        ("version", "us-gaap/2020"),
    ]
}

fn tag(tag: &'static str) -> Vec<(&'static str, &'static str)> {
    vec![("tag", tag), ("version", "us-gaap/2020"), ("custom", "0"), ("abstract", "0"), ("iord", "D")]
}

fn num(adsh: &'static str, tag: &'static str, value: &'static str) -> Vec<(&'static str, &'static str)> {
    vec![
        ("adsh", adsh),
        ("tag", tag),
        ("version", "us-gaap/2020"),
        ("ddate", "20201231"),
        ("qtrs", "4"),
        ("uom", "USD"),
        ("value", value),
    ]
}

fn write_quarter(
    dir: &Path,
    subs: &[Vec<(&str, &str)>],
    pres: &[Vec<(&str, &str)>],
    tags: &[Vec<(&str, &str)>],
    nums: &[Vec<(&str, &str)>],
) {
    write_table(dir, Table::Sub, &subs.iter().map(|r| r.as_slice()).collect::<Vec<_>>());
    write_table(dir, Table::Pre, &pres.iter().map(|r| r.as_slice()).collect::<Vec<_>>());
    write_table(dir, Table::Tag, &tags.iter().map(|r| r.as_slice()).collect::<Vec<_>>());
    write_table(dir, Table::Num, &nums.iter().map(|r| r.as_slice()).collect::<Vec<_>>());
}

/// The end-to-end fixture: Acme (A1, 10-K) plus an unrelated filer (B9).
fn write_acme_2020q1(data_dir: &Path) {
    write_quarter(
        &data_dir.join("2020Q1"),
        &[sub("A1", "Acme", "10-K"), sub("B9", "Beta Inc", "10-K")],
        &[
            pre("A1", "1", "Revenue"),
            pre("A1", "2", "Assets"),
            pre("B9", "1", "Cash"),
        ],
        &[tag("Revenue"), tag("Assets"), tag("Cash")],
        &[
            num("A1", "Revenue", "100"),
            num("A1", "Assets", "250"),
            num("B9", "Revenue", "999"),
        ],
    );
}

struct Fixture {
    dir: TempDir,
    config: LoaderConfig,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempdir().unwrap();
        let config = LoaderConfig {
            database_url: format!("sqlite://{}", dir.path().join("SEC.sqlite").display()),
            data_dir: dir.path().join("fsds"),
            batch_size: 2,
            on_missing: MissingQuarterPolicy::Skip,
        };
        Self { dir, config }
    }

    fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    async fn pool(&self) -> SqlitePool {
        db::connect(&self.config.database_url).await.unwrap()
    }

    async fn second_pool(&self, name: &str) -> (SqlitePool, LoaderConfig) {
        let config = LoaderConfig {
            database_url: format!("sqlite://{}", self.dir.path().join(name).display()),
            ..self.config.clone()
        };
        (db::connect(&config.database_url).await.unwrap(), config)
    }
}

fn selection(company: &str, forms: &[ReportType], reset: ResetMode) -> Selection {
    Selection::new(company, [2020], forms.iter().cloned(), reset)
}

async fn counts(pool: &SqlitePool) -> Vec<(Table, i64)> {
    let mut counts = Vec::new();
    for table in Table::all() {
        counts.push((table, db::count_rows(pool, table).await.unwrap()));
    }
    counts
}

/// Primary keys of every row, sorted.
async fn snapshot(pool: &SqlitePool, table: Table) -> Vec<String> {
    let key = table
        .primary_key()
        .iter()
        .map(|c| format!("CAST(\"{}\" AS TEXT)", c))
        .join(" || '|' || ");
    let query = format!("SELECT {} FROM \"{}\" ORDER BY 1", key, table.name());
    sqlx::query_as::<_, (String,)>(&query)
        .fetch_all(pool)
        .await
        .unwrap()
        .into_iter()
        .map(|(k,)| k)
        .collect()
}

#[tokio::test]
async fn test_end_to_end_loads_only_selected_rows() {
    let fx = Fixture::new();
    write_acme_2020q1(fx.data_dir());
    let pool = fx.pool().await;

    let summary = Pipeline::new(&pool, &fx.config)
        .run(&selection("Acme", &[ReportType::Form10K], ResetMode::Append))
        .await
        .unwrap();

    assert_eq!(summary.filings, 1);
    assert_eq!(summary.quarters.len(), 1);
    assert_eq!(summary.quarters[0].quarter, "2020Q1");
    assert_eq!(summary.quarters[0].tag_versions, 2);

    assert_eq!(
        counts(&pool).await,
        vec![(Table::Sub, 1), (Table::Pre, 2), (Table::Tag, 2), (Table::Num, 2)]
    );
    assert_eq!(
        snapshot(&pool, Table::Tag).await,
        vec!["Assets|us-gaap/2020", "Revenue|us-gaap/2020"]
    );
    assert!(snapshot(&pool, Table::Num)
        .await
        .iter()
        .all(|key| key.starts_with("A1|")));
}

#[tokio::test]
async fn test_company_match_is_case_insensitive() {
    let fx = Fixture::new();
    write_acme_2020q1(fx.data_dir());
    let pool = fx.pool().await;

    let summary = Pipeline::new(&pool, &fx.config)
        .run(&selection("ACME", &[ReportType::Form10K], ResetMode::Append))
        .await
        .unwrap();
    assert_eq!(summary.filings, 1);
    assert_eq!(snapshot(&pool, Table::Sub).await, vec!["A1"]);
}

#[tokio::test]
async fn test_repeated_runs_are_idempotent() {
    let fx = Fixture::new();
    write_acme_2020q1(fx.data_dir());
    let pool = fx.pool().await;
    let pipeline = Pipeline::new(&pool, &fx.config);
    let acme = selection("Acme", &[ReportType::Form10K], ResetMode::Append);

    pipeline.run(&acme).await.unwrap();
    let first = counts(&pool).await;
    let second_run = pipeline.run(&acme).await.unwrap();

    assert_eq!(counts(&pool).await, first);
    let totals = second_run.totals();
    assert!(totals.values().all(|stats| stats.inserted == 0));
    assert_eq!(totals[&Table::Num].ignored(), 2);
}

#[tokio::test]
async fn test_wipe_matches_fresh_load() {
    let fx = Fixture::new();
    write_acme_2020q1(fx.data_dir());

    // A store that already holds another company's data.
    let pool = fx.pool().await;
    let pipeline = Pipeline::new(&pool, &fx.config);
    pipeline
        .run(&selection("Beta Inc", &[ReportType::Form10K], ResetMode::Append))
        .await
        .unwrap();
    let summary = pipeline
        .run(&selection("Acme", &[ReportType::Form10K], ResetMode::Wipe))
        .await
        .unwrap();
    assert!(summary.wiped);

    let (fresh_pool, fresh_config) = fx.second_pool("fresh.sqlite").await;
    Pipeline::new(&fresh_pool, &fresh_config)
        .run(&selection("Acme", &[ReportType::Form10K], ResetMode::Append))
        .await
        .unwrap();

    for table in Table::all() {
        assert_eq!(
            snapshot(&pool, table).await,
            snapshot(&fresh_pool, table).await,
            "table {} differs",
            table
        );
    }
}

#[tokio::test]
async fn test_empty_selection_leaves_store_untouched() {
    let fx = Fixture::new();
    write_acme_2020q1(fx.data_dir());
    let pool = fx.pool().await;
    let pipeline = Pipeline::new(&pool, &fx.config);
    pipeline
        .run(&selection("Acme", &[ReportType::Form10K], ResetMode::Append))
        .await
        .unwrap();
    let before = counts(&pool).await;

    // Wipe mode must not drop anything when nothing matches.
    let result = pipeline
        .run(&selection("Initech", &[ReportType::Form10K], ResetMode::Wipe))
        .await;
    assert!(matches!(result, Err(LoadError::EmptySelection { .. })));

    let result = pipeline
        .run(&selection("Acme", &[ReportType::Form8K], ResetMode::Wipe))
        .await;
    assert!(matches!(result, Err(LoadError::EmptySelection { .. })));

    assert_eq!(counts(&pool).await, before);
}

#[tokio::test]
async fn test_empty_selection_on_fresh_store_creates_nothing() {
    let fx = Fixture::new();
    write_acme_2020q1(fx.data_dir());
    let pool = fx.pool().await;

    let result = Pipeline::new(&pool, &fx.config)
        .run(&selection("Initech", &[ReportType::Form10K], ResetMode::Append))
        .await;
    assert!(matches!(result, Err(LoadError::EmptySelection { .. })));
    for table in Table::all() {
        assert!(!db::table_exists(&pool, table).await.unwrap());
    }
}

#[tokio::test]
async fn test_filings_accumulate_across_quarters() {
    let fx = Fixture::new();
    write_acme_2020q1(fx.data_dir());
    write_quarter(
        &fx.data_dir().join("2020Q2"),
        &[sub("A2", "ACME", "10-Q"), sub("A3", "Acme", "8-K")],
        &[pre("A2", "1", "Inventory"), pre("A3", "1", "Goodwill")],
        &[tag("Inventory"), tag("Goodwill"), tag("Revenue")],
        &[num("A2", "Inventory", "5"), num("A3", "Goodwill", "7")],
    );
    for q in ["2020Q3", "2020Q4"] {
        write_quarter(&fx.data_dir().join(q), &[], &[], &[], &[]);
    }
    let pool = fx.pool().await;

    let summary = Pipeline::new(&pool, &fx.config)
        .run(&selection(
            "acme",
            &[ReportType::Form10K, ReportType::Form10Q],
            ResetMode::Append,
        ))
        .await
        .unwrap();

    assert_eq!(summary.filings, 2);
    assert_eq!(summary.quarters.len(), 4);
    assert!(summary.skipped.is_empty());
    assert_eq!(snapshot(&pool, Table::Sub).await, vec!["A1", "A2"]);
    // Q2's tag file also defines Revenue, but no selected Q2 presentation row uses it.
    assert_eq!(
        snapshot(&pool, Table::Tag).await,
        vec!["Assets|us-gaap/2020", "Inventory|us-gaap/2020", "Revenue|us-gaap/2020"]
    );
    assert_eq!(summary.quarters[1].tables[&Table::Tag].inserted, 1);
    assert_eq!(db::count_rows(&pool, Table::Num).await.unwrap(), 3);
}

#[tokio::test]
async fn test_missing_quarter_is_skipped() {
    let fx = Fixture::new();
    write_acme_2020q1(fx.data_dir());
    // 2020Q2 lacks num.txt; 2020Q3 and 2020Q4 do not exist at all.
    let q2 = fx.data_dir().join("2020Q2");
    write_table(&q2, Table::Sub, &[sub("A2", "Acme", "10-Q").as_slice()]);
    write_table(&q2, Table::Pre, &[]);
    write_table(&q2, Table::Tag, &[]);
    let pool = fx.pool().await;

    let summary = Pipeline::new(&pool, &fx.config)
        .run(&selection("Acme", &[ReportType::Form10Q, ReportType::Form10K], ResetMode::Append))
        .await
        .unwrap();

    assert_eq!(summary.skipped, vec!["2020Q2", "2020Q3", "2020Q4"]);
    assert_eq!(summary.filings, 1);
    assert_eq!(snapshot(&pool, Table::Sub).await, vec!["A1"]);
}

#[tokio::test]
async fn test_missing_quarter_aborts_before_writing() {
    let mut fx = Fixture::new();
    fx.config.on_missing = MissingQuarterPolicy::Abort;
    write_acme_2020q1(fx.data_dir());
    let pool = fx.pool().await;

    let result = Pipeline::new(&pool, &fx.config)
        .run(&selection("Acme", &[ReportType::Form10Q], ResetMode::Wipe))
        .await;

    match result {
        Err(LoadError::NotFound(path)) => assert!(path.ends_with("2020Q2/sub.txt")),
        other => panic!("expected NotFound, got {:?}", other.map(|s| s.filings)),
    }
    assert!(!db::table_exists(&pool, Table::Sub).await.unwrap());
}

#[tokio::test]
async fn test_no_quarter_on_disk_is_not_found() {
    let fx = Fixture::new();
    let pool = fx.pool().await;

    let result = Pipeline::new(&pool, &fx.config)
        .run(&selection("Acme", &[ReportType::Form10K], ResetMode::Wipe))
        .await;

    match result {
        Err(LoadError::NotFound(path)) => assert!(path.ends_with("2020Q1/sub.txt")),
        other => panic!("expected NotFound, got {:?}", other.map(|s| s.filings)),
    }
    for table in Table::all() {
        assert!(!db::table_exists(&pool, table).await.unwrap());
    }
}

#[tokio::test]
async fn test_malformed_rows_are_skipped_and_counted() {
    let fx = Fixture::new();
    write_acme_2020q1(fx.data_dir());
    let num_path = fx.data_dir().join("2020Q1").join("num.txt");
    let mut content = fs::read_to_string(&num_path).unwrap();
    content.push_str("A1\tBroken\trow\n");
    fs::write(&num_path, content).unwrap();
    let pool = fx.pool().await;

    let summary = Pipeline::new(&pool, &fx.config)
        .run(&selection("Acme", &[ReportType::Form10K], ResetMode::Append))
        .await
        .unwrap();

    let num_stats = summary.quarters[0].tables[&Table::Num];
    assert_eq!(num_stats.malformed, 1);
    assert_eq!(num_stats.inserted, 2);
}

#[tokio::test]
async fn test_invalid_selection_is_rejected() {
    let fx = Fixture::new();
    write_acme_2020q1(fx.data_dir());
    let pool = fx.pool().await;

    let result = Pipeline::new(&pool, &fx.config)
        .run(&selection("   ", &[ReportType::Form10K], ResetMode::Append))
        .await;
    assert!(matches!(result, Err(LoadError::InvalidSelection(_))));
}
