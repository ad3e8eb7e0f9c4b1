use crate::core::types::{parse_forms, parse_years, ResetMode, Selection};
use crate::edgar::report::ReportType;
use anyhow::{anyhow, Result as AnyhowResult};
use colored::*;
use once_cell::sync::Lazy;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::FileHistory;
use rustyline::validate::Validator;
use rustyline::{CompletionType, Config as RustylineConfig, Context, EditMode, Editor, Helper, Result};
use std::collections::BTreeSet;
use std::env;

static HISTORY_PATH: Lazy<String> = Lazy::new(|| {
    let home_dir = env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.fsds.history", home_dir)
});

/// Completes form codes in a comma separated list.
pub struct FormHelper;

impl Completer for FormHelper {
    type Candidate = Pair;

    fn complete(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Result<(usize, Vec<Pair>)> {
        let start = line[..pos].rfind(',').map(|i| i + 1).unwrap_or(0);
        let start = start + (line[start..pos].len() - line[start..pos].trim_start().len());
        let prefix = line[start..pos].to_uppercase();

        let candidates = ReportType::list_types()
            .iter()
            .filter(|form| form.starts_with(&prefix))
            .map(|form| Pair {
                display: form.clone(),
                replacement: form.clone(),
            })
            .collect();
        Ok((start, candidates))
    }
}

impl Highlighter for FormHelper {}

impl Hinter for FormHelper {
    type Hint = String;

    fn hint(&self, _line: &str, _pos: usize, _ctx: &Context<'_>) -> Option<Self::Hint> {
        None
    }
}

impl Validator for FormHelper {}

impl Helper for FormHelper {}

pub type SelectionEditor = Editor<FormHelper, FileHistory>;

pub fn create_editor() -> Result<SelectionEditor> {
    log::debug!("Creating rustyline editor configuration");
    let rustyline_config = RustylineConfig::builder()
        .completion_type(CompletionType::List)
        .edit_mode(EditMode::Emacs)
        .auto_add_history(true)
        .build();

    let mut rl = Editor::<FormHelper, FileHistory>::with_config(rustyline_config)?;
    if rl.load_history(&**HISTORY_PATH).is_err() {
        log::debug!("No previous history file found");
    }
    rl.set_helper(Some(FormHelper));
    Ok(rl)
}

pub fn save_history(rl: &mut SelectionEditor) -> Result<()> {
    rl.save_history(&**HISTORY_PATH)
}

/// Parts of a selection given on the command line; `None` means ask.
#[derive(Debug, Default, Clone)]
pub struct SelectionDraft {
    pub company: Option<String>,
    pub years: Option<BTreeSet<i32>>,
    pub forms: Option<BTreeSet<ReportType>>,
    pub reset: Option<ResetMode>,
}

impl SelectionDraft {
    pub fn is_complete(&self) -> bool {
        self.company.is_some() && self.years.is_some() && self.forms.is_some()
    }

    /// Builds the selection without prompting; an unset reset mode means append.
    pub fn into_selection(self) -> AnyhowResult<Selection> {
        match (self.company, self.years, self.forms) {
            (Some(company), Some(years), Some(forms)) => Ok(Selection::new(
                company,
                years,
                forms,
                self.reset.unwrap_or_default(),
            )),
            _ => Err(anyhow!("company, years and forms are required")),
        }
    }
}

/// Asks for every part of the selection the draft leaves open.
pub fn prompt_selection(rl: &mut SelectionEditor, draft: SelectionDraft) -> AnyhowResult<Selection> {
    let company = match draft.company {
        Some(company) => company,
        None => rl.readline(&format!("{} ", "Company name:".cyan().bold()))?,
    };
    if company.trim().is_empty() {
        return Err(anyhow!("no company name given"));
    }

    let years = match draft.years {
        Some(years) => years,
        None => prompt_until(rl, "Years (e.g. 2019, 2021-2022):", |s| {
            parse_years(s).map_err(Into::into).and_then(non_empty)
        })?,
    };

    let forms = match draft.forms {
        Some(forms) => forms,
        None => {
            println!(
                "{} {}",
                "Known forms:".dimmed(),
                ReportType::list_types().join(", ").dimmed()
            );
            prompt_until(rl, "Forms (e.g. 10-K, 10-Q):", |s| {
                parse_forms(s).map_err(Into::into).and_then(non_empty)
            })?
        }
    };

    let reset = match draft.reset {
        Some(reset) => reset,
        None => prompt_until(rl, "Existing data [append/wipe] (append):", |s| {
            if s.trim().is_empty() {
                Ok(ResetMode::Append)
            } else {
                s.trim()
                    .parse::<ResetMode>()
                    .map_err(|_| anyhow!("answer 'append' or 'wipe'"))
            }
        })?,
    };

    Ok(Selection::new(company, years, forms, reset))
}

fn non_empty<T>(set: BTreeSet<T>) -> AnyhowResult<BTreeSet<T>> {
    if set.is_empty() {
        Err(anyhow!("at least one value is required"))
    } else {
        Ok(set)
    }
}

fn prompt_until<T>(
    rl: &mut SelectionEditor,
    prompt: &str,
    parse: impl Fn(&str) -> AnyhowResult<T>,
) -> AnyhowResult<T> {
    let prompt = format!("{} ", prompt.cyan().bold());
    loop {
        let line = rl.readline(&prompt)?;
        match parse(&line) {
            Ok(value) => return Ok(value),
            Err(e) => eprintln!("{} {}", "Invalid input:".red(), e),
        }
    }
}
