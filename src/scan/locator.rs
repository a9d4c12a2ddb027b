//! Run discovery.
//!
//! `RunLocator` walks a directory tree and yields every run directory whose
//! configuration postdates a cutoff and matches a template. The walk is a
//! lazy iterator with no shared state: calling `candidates()` again starts a
//! fresh traversal of the same tree.
//!
//! Directory entries are visited in file-name order so repeated scans over an
//! unchanged tree produce the same sequence.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::domain::{PARAMS_FILE, RunDirectory, SkippedRun, Template};
use crate::error::AppError;
use crate::io::params::{load_param_record, run_start_date};
use crate::scan::matcher::matches;

/// What the traversal learned about one directory holding a configuration file.
#[derive(Debug, Clone)]
pub enum Candidate {
    Matched(RunDirectory),
    /// Unreadable or malformed; reported and left out.
    Skipped(SkippedRun),
}

/// Everything `locate` found, in traversal order.
#[derive(Debug, Clone, Default)]
pub struct Located {
    pub runs: Vec<RunDirectory>,
    pub skipped: Vec<SkippedRun>,
}

#[derive(Debug, Clone)]
pub struct RunLocator {
    root: PathBuf,
    cutoff: NaiveDate,
    template: Template,
    /// The template's own file, never treated as a run if it sits in the tree.
    template_file: Option<PathBuf>,
}

impl RunLocator {
    pub fn new(root: impl Into<PathBuf>, cutoff: NaiveDate, template: Template) -> Self {
        Self {
            root: root.into(),
            cutoff,
            template,
            template_file: None,
        }
    }

    pub fn with_template_file(mut self, path: &Path) -> Self {
        self.template_file = path.canonicalize().ok();
        self
    }

    /// Start a new traversal.
    pub fn candidates(&self) -> Candidates<'_> {
        Candidates {
            locator: self,
            walker: WalkDir::new(&self.root).sort_by_file_name().into_iter(),
        }
    }

    /// Inspect one directory. `None` means "not a run" or "silently excluded".
    fn inspect(&self, dir: &Path) -> Option<Result<Candidate, AppError>> {
        let params_path = dir.join(PARAMS_FILE);
        if !params_path.is_file() {
            return None;
        }
        if self.is_template_file(&params_path) {
            debug!(dir = %dir.display(), "Skipping the template file");
            return None;
        }

        let skipped = |reason: String| {
            Some(Ok(Candidate::Skipped(SkippedRun {
                dir: dir.to_path_buf(),
                reason,
            })))
        };

        let params = match load_param_record(&params_path) {
            Ok(params) => params,
            Err(reason) => return skipped(reason),
        };
        let start_date = match run_start_date(&params) {
            Ok(date) => date,
            Err(reason) => return skipped(reason),
        };
        if start_date < self.cutoff {
            debug!(dir = %dir.display(), %start_date, "Run predates the cutoff");
            return None;
        }

        match matches(&self.template, &params) {
            Ok(true) => Some(Ok(Candidate::Matched(RunDirectory {
                path: dir.to_path_buf(),
                params,
                start_date,
            }))),
            Ok(false) => {
                debug!(dir = %dir.display(), "Run does not match the template");
                None
            }
            Err(e) => Some(Err(e)),
        }
    }

    fn is_template_file(&self, params_path: &Path) -> bool {
        match (&self.template_file, params_path.canonicalize()) {
            (Some(template), Ok(candidate)) => *template == candidate,
            _ => false,
        }
    }
}

/// Lazy traversal produced by `RunLocator::candidates`.
pub struct Candidates<'a> {
    locator: &'a RunLocator,
    walker: walkdir::IntoIter,
}

impl Iterator for Candidates<'_> {
    type Item = Result<Candidate, AppError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.walker.next()? {
                Ok(entry) => entry,
                Err(e) => {
                    let dir = e.path().map(Path::to_path_buf).unwrap_or_else(|| self.locator.root.clone());
                    return Some(Ok(Candidate::Skipped(SkippedRun {
                        dir,
                        reason: format!("Cannot read directory: {e}"),
                    })));
                }
            };
            if !entry.file_type().is_dir() {
                continue;
            }
            if let Some(candidate) = self.locator.inspect(entry.path()) {
                return Some(candidate);
            }
        }
    }
}

/// Collect every matching run under the locator's root.
///
/// Malformed runs are logged and returned in `skipped`; a structural error
/// from the matcher stops the scan. A root that is not a directory is an
/// input error.
pub fn locate(locator: &RunLocator) -> Result<Located, AppError> {
    if !locator.root.is_dir() {
        return Err(AppError::input(format!(
            "Run tree root '{}' is not a directory.",
            locator.root.display()
        )));
    }
    let mut located = Located::default();
    for candidate in locator.candidates() {
        match candidate? {
            Candidate::Matched(run) => {
                debug!(dir = %run.path.display(), "Matched run");
                located.runs.push(run);
            }
            Candidate::Skipped(skip) => {
                warn!(dir = %skip.dir.display(), reason = %skip.reason, "Skipping run");
                located.skipped.push(skip);
            }
        }
    }
    Ok(located)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PARAMETER_SCHEMA, ParamValue, ParameterRecord, RUN_START_FIELD};
    use crate::error::EXIT_INPUT;
    use serde_json::{Map, Value, json};
    use std::fs;

    fn template() -> Template {
        Template::from_record(ParameterRecord::new(vec![
            ("run_start_date_and_time".to_string(), ParamValue::Text("x".to_string())),
            ("number_of_pathogen_species".to_string(), ParamValue::Text("VAR".to_string())),
        ]))
        .unwrap()
    }

    #[test]
    fn directories_without_params_are_not_runs() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("a/b")).unwrap();
        fs::write(tmp.path().join("a/HostsGeneDivers.csv"), "0 1 2 3 4 5 6\n").unwrap();

        let cutoff = NaiveDate::from_ymd_opt(2016, 1, 1).unwrap();
        let locator = RunLocator::new(tmp.path(), cutoff, template());
        let located = locate(&locator).unwrap();
        assert!(located.runs.is_empty());
        assert!(located.skipped.is_empty());
    }

    #[test]
    fn malformed_params_are_skipped_not_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("run")).unwrap();
        fs::write(tmp.path().join("run").join(PARAMS_FILE), "{ not json").unwrap();

        let cutoff = NaiveDate::from_ymd_opt(2016, 1, 1).unwrap();
        let locator = RunLocator::new(tmp.path(), cutoff, template());
        let located = locate(&locator).unwrap();
        assert!(located.runs.is_empty());
        assert_eq!(located.skipped.len(), 1);
        assert!(located.skipped[0].reason.contains("Invalid JSON"));
    }

    fn params_with_date(date: &str) -> String {
        let mut map = Map::new();
        for spec in PARAMETER_SCHEMA {
            map.insert(spec.name.to_string(), json!(1));
        }
        map.insert(RUN_START_FIELD.to_string(), json!(date));
        Value::Object(map).to_string()
    }

    #[test]
    fn malformed_start_date_is_skipped_not_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("bad")).unwrap();
        fs::write(tmp.path().join("bad").join(PARAMS_FILE), params_with_date("10/05/2016")).unwrap();

        let cutoff = NaiveDate::from_ymd_opt(2016, 1, 1).unwrap();
        let locator = RunLocator::new(tmp.path(), cutoff, template());
        let located = locate(&locator).unwrap();
        assert!(located.runs.is_empty());
        assert_eq!(located.skipped.len(), 1);
        assert!(located.skipped[0].dir.ends_with("bad"));
        assert!(located.skipped[0].reason.contains("Invalid run start date"));
    }

    #[test]
    fn missing_root_is_an_input_error() {
        let tmp = tempfile::tempdir().unwrap();
        let cutoff = NaiveDate::from_ymd_opt(2016, 1, 1).unwrap();
        let locator = RunLocator::new(tmp.path().join("nope"), cutoff, template());
        let err = locate(&locator).unwrap_err();
        assert_eq!(err.exit_code(), EXIT_INPUT);
        assert!(err.message().contains("not a directory"));
    }
}
