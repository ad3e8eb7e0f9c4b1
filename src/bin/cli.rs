use anyhow::Result;
use colored::*;
use edgar_fsds::{
    core::{
        config::{LoaderConfig, MissingQuarterPolicy},
        types::{parse_forms, parse_years, ResetMode},
    },
    db,
    fsds::Table,
    repl::{self, SelectionDraft},
    utils::dirs,
    LoadError, Pipeline, ProgressTracker, RunSummary,
};
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(StructOpt, Debug)]
#[structopt(
    name = "fsds-cli",
    about = "Load one company's filings from the SEC Financial Statement Data Sets into SQLite"
)]
struct Opt {
    /// Company name as it appears in sub.txt (case-insensitive)
    #[structopt(short, long)]
    company: Option<String>,

    /// Years to load, e.g. "2019,2021-2022"
    #[structopt(short, long)]
    years: Option<String>,

    /// Filing types, e.g. "10-K,10-Q"
    #[structopt(short, long)]
    forms: Option<String>,

    /// What to do with existing rows: append or wipe
    #[structopt(long)]
    reset: Option<ResetMode>,

    /// SQLite database URL [env: DATABASE_URL]
    #[structopt(long)]
    database_url: Option<String>,

    /// Directory holding one sub-directory per quarter (2020Q1, ...) [env: FSDS_DATA_DIR]
    #[structopt(long, parse(from_os_str))]
    data_dir: Option<PathBuf>,

    /// Rows per committed batch [env: FSDS_BATCH_SIZE]
    #[structopt(long)]
    batch_size: Option<usize>,

    /// Policy for quarters with missing files: skip or abort [env: FSDS_ON_MISSING]
    #[structopt(long)]
    on_missing: Option<MissingQuarterPolicy>,

    /// Print the run summary as JSON
    #[structopt(long)]
    json: bool,
}

fn print_summary(summary: &RunSummary) {
    println!(
        "\n{} {} ({}): {} filings",
        "Loaded".green().bold(),
        summary.company.blue().bold(),
        summary.forms,
        summary.filings
    );
    if summary.wiped {
        println!("{}", "Tables were wiped before loading".yellow());
    }

    for quarter in &summary.quarters {
        let counts = quarter
            .tables
            .iter()
            .map(|(table, stats)| format!("{} {}", table, stats.inserted))
            .collect::<Vec<_>>()
            .join(", ");
        println!("  {} {}", quarter.quarter.cyan(), counts);
    }

    let totals = summary.totals();
    for table in Table::all() {
        if let Some(stats) = totals.get(&table) {
            let mut line = format!(
                "  {:<4} {:>10} inserted {:>10} ignored",
                table.name(),
                stats.inserted,
                stats.ignored()
            );
            if stats.malformed > 0 {
                line.push_str(&format!(" {:>8} malformed", stats.malformed));
            }
            println!("{}", line);
        }
    }

    if !summary.skipped.is_empty() {
        println!(
            "{} {}",
            "Skipped quarters with missing files:".yellow(),
            summary.skipped.join(", ")
        );
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();
    log::debug!("Logger initialized");

    let opt = Opt::from_args();

    let mut config = LoaderConfig::from_env()?;
    if let Some(database_url) = opt.database_url {
        config.database_url = database_url;
    }
    if let Some(data_dir) = opt.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(batch_size) = opt.batch_size {
        config.batch_size = batch_size;
    }
    if let Some(on_missing) = opt.on_missing {
        config.on_missing = on_missing;
    }
    config.validate()?;

    let draft = SelectionDraft {
        company: opt.company,
        years: opt.years.as_deref().map(parse_years).transpose()?,
        forms: opt.forms.as_deref().map(parse_forms).transpose()?,
        reset: opt.reset,
    };

    let selection = if draft.is_complete() {
        draft.into_selection()?
    } else {
        let mut rl = repl::create_editor()?;
        let result = repl::prompt_selection(&mut rl, draft);
        if let Err(e) = repl::save_history(&mut rl) {
            log::debug!("Could not save history: {}", e);
        }
        match result {
            Ok(selection) => selection,
            Err(e) => {
                eprintln!("{} {}", "Nothing to load:".yellow(), e);
                std::process::exit(1);
            }
        }
    };

    dirs::ensure_database_dir(&config.database_url)?;
    let pool = db::connect(&config.database_url).await?;

    let tracker = (!opt.json).then(ProgressTracker::new);
    let mut pipeline = Pipeline::new(&pool, &config);
    if let Some(tracker) = &tracker {
        pipeline = pipeline.with_progress(tracker);
    }

    let result = pipeline.run(&selection).await;
    if let Some(tracker) = &tracker {
        tracker.finish();
    }

    match result {
        Ok(summary) => {
            if opt.json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_summary(&summary);
            }
            Ok(())
        }
        Err(e @ LoadError::EmptySelection { .. }) => {
            eprintln!("{} {}", "Not found:".yellow().bold(), e);
            std::process::exit(1);
        }
        Err(e @ LoadError::InvalidSelection(_)) => {
            eprintln!("{} {}", "Invalid selection:".red().bold(), e);
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}
