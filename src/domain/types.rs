//! Shared domain types.
//!
//! These types flow left to right through the pipeline:
//!
//! - `ParameterRecord` / `Template`: one run's configuration and the template it is matched against
//! - `RunDirectory`: a located run on disk
//! - `PerRunStatistics`: steady-state scalars extracted from one run
//! - `AggregatedStatistics`: one row per distinct `(VAR, VARX)` pair

use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::AppError;

/// Name of the per-run configuration file.
pub const PARAMS_FILE: &str = "InputParameters.json";
/// Population-level diversity time series.
pub const DIVERSITY_FILE: &str = "HostsGeneDivers.csv";
/// Per-individual MHC type counts, sampled before mating.
pub const INDIVIDUAL_MHC_FILE: &str = "NumberOfMhcBeforeMating.csv";
/// Optional per-individual presented-pathogen counts.
pub const PRESENTED_PATHOGEN_FILE: &str = "PresentedPathogenNumbers.csv";

pub const RUN_START_FIELD: &str = "run_start_date_and_time";
pub const THREADS_FIELD: &str = "number_of_threads";
pub const PATHOGEN_SPECIES_FIELD: &str = "number_of_pathogen_species";
pub const PATHOGEN_GENERATIONS_FIELD: &str = "number_of_pathogen_generation_per_one_host_generation";
pub const ALPHA_FIELD: &str = "alpha_factor_for_the_host_fitness_function";

/// One configuration field: its canonical JSON key plus any older spellings.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
}

const fn field(name: &'static str) -> FieldSpec {
    FieldSpec { name, aliases: &[] }
}

/// Ordered configuration schema shared by run files and template files.
pub const PARAMETER_SCHEMA: [FieldSpec; 18] = [
    field(RUN_START_FIELD),
    field(THREADS_FIELD),
    field("number_of_bits_per_gene"),
    field("number_of_bits_per_antigen"),
    field("host_population_size"),
    field("pathogen_population_size"),
    field(PATHOGEN_SPECIES_FIELD),
    field("number_of_genes_per_host_one_chromosome"),
    field(PATHOGEN_GENERATIONS_FIELD),
    field("number_of_host_generations"),
    field("mutation_probability_in_host"),
    field("mutation_probability_in_pathogen"),
    FieldSpec {
        name: "heterozygote_advantage",
        aliases: &["separated_species_genomes"],
    },
    field("host_gene_deletion_probability"),
    field("host_gene_duplication_probability"),
    field("host_maximal_number_of_genes_in_chromosome"),
    field("number_of_sex_mates"),
    field(ALPHA_FIELD),
];

/// Fields that vary run-to-run regardless of experiment identity.
pub const EXEMPT_FIELDS: [&str; 3] = [RUN_START_FIELD, THREADS_FIELD, ALPHA_FIELD];

/// A single configuration value as it appears in the JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Number(f64),
    Text(String),
}

impl ParamValue {
    /// Numeric view of the value. Text is coerced when it parses as a float.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Number(v) => Some(*v),
            ParamValue::Text(s) => s.trim().parse::<f64>().ok(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) => Some(s.as_str()),
            ParamValue::Number(_) => None,
        }
    }

    /// Role marker carried by this value, if any.
    pub fn role(&self) -> Option<Role> {
        self.as_text().and_then(Role::from_marker)
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Number(v) => write!(f, "{v}"),
            ParamValue::Text(s) => write!(f, "{s}"),
        }
    }
}

/// Ordered, named view of one run's configuration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParameterRecord {
    fields: Vec<(String, ParamValue)>,
}

impl ParameterRecord {
    pub fn new(fields: Vec<(String, ParamValue)>) -> Self {
        Self { fields }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// Numeric value of a named field, or a message naming what went wrong.
    pub fn number(&self, name: &str) -> Result<f64, String> {
        let value = self
            .get(name)
            .ok_or_else(|| format!("Missing parameter `{name}`."))?;
        value
            .as_f64()
            .ok_or_else(|| format!("Parameter `{name}` is not numeric (got `{value}`)."))
    }
}

/// Role a template field plays instead of carrying a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Primary independent variable.
    Var,
    /// Secondary independent variable (x-axis).
    Varx,
    /// Field explicitly excluded from matching.
    Irr,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Var, Role::Varx, Role::Irr];

    pub fn marker(self) -> &'static str {
        match self {
            Role::Var => "VAR",
            Role::Varx => "VARX",
            Role::Irr => "IRR",
        }
    }

    pub fn from_marker(s: &str) -> Option<Self> {
        Role::ALL.into_iter().find(|r| r.marker() == s)
    }
}

/// Which field plays which role, learned once from the template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleMap {
    pub var: Option<String>,
    pub varx: Option<String>,
    pub irr: Option<String>,
}

impl RoleMap {
    pub fn field(&self, role: Role) -> Option<&str> {
        match role {
            Role::Var => self.var.as_deref(),
            Role::Varx => self.varx.as_deref(),
            Role::Irr => self.irr.as_deref(),
        }
    }

    fn slot(&mut self, role: Role) -> &mut Option<String> {
        match role {
            Role::Var => &mut self.var,
            Role::Varx => &mut self.varx,
            Role::Irr => &mut self.irr,
        }
    }

    /// Whether the named field is claimed by any role.
    pub fn claims(&self, name: &str) -> bool {
        Role::ALL.into_iter().any(|r| self.field(r) == Some(name))
    }
}

/// A template record plus the role map derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub record: ParameterRecord,
    pub roles: RoleMap,
}

impl Template {
    /// Derive the role map from the markers embedded in a template record.
    ///
    /// Each role may be marked at most once and `VAR` must be present.
    pub fn from_record(record: ParameterRecord) -> Result<Self, AppError> {
        let mut roles = RoleMap::default();
        for (name, value) in record.iter() {
            let Some(role) = value.role() else { continue };
            let slot = roles.slot(role);
            if let Some(previous) = slot {
                return Err(AppError::input(format!(
                    "Template marks `{}` twice (`{previous}` and `{name}`).",
                    role.marker()
                )));
            }
            *slot = Some(name.to_string());
        }
        if roles.var.is_none() {
            return Err(AppError::input("Template does not mark any field as `VAR`."));
        }
        Ok(Self { record, roles })
    }

    /// Axis label handed to the rendering layer: the VARX field name, or the
    /// VAR field name for one-variable templates.
    pub fn axis_label(&self) -> &str {
        self.roles
            .varx
            .as_deref()
            .or(self.roles.var.as_deref())
            .unwrap_or("")
    }
}

/// A directory holding one run's persisted outputs.
#[derive(Debug, Clone, PartialEq)]
pub struct RunDirectory {
    pub path: PathBuf,
    pub params: ParameterRecord,
    pub start_date: NaiveDate,
}

impl RunDirectory {
    pub fn params_file(&self) -> PathBuf {
        self.path.join(PARAMS_FILE)
    }

    pub fn diversity_file(&self) -> PathBuf {
        self.path.join(DIVERSITY_FILE)
    }

    pub fn individual_file(&self) -> PathBuf {
        self.path.join(INDIVIDUAL_MHC_FILE)
    }

    pub fn presented_file(&self) -> PathBuf {
        self.path.join(PRESENTED_PATHOGEN_FILE)
    }
}

/// A run that was seen but left out, with the reason.
#[derive(Debug, Clone)]
pub struct SkippedRun {
    pub dir: PathBuf,
    pub reason: String,
}

/// Mean and (population) standard deviation of one quantity in one run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeanStd {
    pub mean: f64,
    pub std: f64,
}

impl MeanStd {
    pub const MISSING: MeanStd = MeanStd {
        mean: f64::NAN,
        std: f64::NAN,
    };
}

/// Steady-state statistics of a single matched run.
#[derive(Debug, Clone, PartialEq)]
pub struct PerRunStatistics {
    pub var: f64,
    pub varx: f64,
    /// Population-level MHC type count.
    pub mhc_types: MeanStd,
    /// OLS slope of the MHC type count over the steady window.
    pub slope: f64,
    /// Per-individual MHC type count (raw, not normalized).
    pub individual: MeanStd,
    /// Mean fitness normalized by pathogen load.
    pub fitness: MeanStd,
    /// Fitness coefficient of variation normalized by pathogen load.
    pub fitness_cv: MeanStd,
    /// Presented pathogens normalized by pathogen load; `None` when the file is absent.
    pub presented: Option<MeanStd>,
    pub source_dir: PathBuf,
}

impl PerRunStatistics {
    /// Ordering used for the data slice: VAR, VARX, then the MHC statistics.
    pub fn sort_key_cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.var
            .total_cmp(&other.var)
            .then(self.varx.total_cmp(&other.varx))
            .then(self.mhc_types.mean.total_cmp(&other.mhc_types.mean))
            .then(self.mhc_types.std.total_cmp(&other.mhc_types.std))
            .then(self.slope.total_cmp(&other.slope))
    }

    pub fn presented_or_missing(&self) -> MeanStd {
        self.presented.unwrap_or(MeanStd::MISSING)
    }
}

/// `serde_json` writes non-finite floats as `null`; read them back as NaN.
fn nan_from_null<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

/// Central estimate plus dispersion for one aggregated quantity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    #[serde(deserialize_with = "nan_from_null")]
    pub central: f64,
    /// Pooled std or 95% CI half-width, depending on `AggregationMode`.
    #[serde(deserialize_with = "nan_from_null")]
    pub dispersion: f64,
}

/// One row per distinct `(VAR, VARX)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedStatistics {
    #[serde(deserialize_with = "nan_from_null")]
    pub var: f64,
    /// NaN when the template has no VARX field.
    #[serde(deserialize_with = "nan_from_null")]
    pub varx: f64,
    pub n_runs: usize,
    pub mhc_types: Estimate,
    pub individual: Estimate,
    pub fitness: Estimate,
    pub fitness_cv: Estimate,
    pub presented: Estimate,
}

/// How groups of runs are reduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AggregationMode {
    /// Mean of per-run means, pooled per-run standard deviations.
    Pooled,
    /// Mean of per-run means, 95% Student-t confidence half-width.
    Ci,
}

impl AggregationMode {
    pub fn dispersion_label(self) -> &'static str {
        match self {
            AggregationMode::Pooled => "pooled std",
            AggregationMode::Ci => "95% CI",
        }
    }
}

/// Fully-resolved settings for a `collect` invocation.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct CollectConfig {
    pub root: PathBuf,
    pub since: NaiveDate,
    pub template_path: PathBuf,
    /// Number of trailing generations treated as post-transient.
    pub steady_window: usize,
    pub mode: AggregationMode,
    pub prefix: String,
    pub out_dir: PathBuf,
    pub export_summary: Option<PathBuf>,
    pub quiet: bool,
}

impl CollectConfig {
    pub fn slice_path(&self) -> PathBuf {
        self.out_dir.join(format!("{}DataSlice.csv", self.prefix))
    }
}

/// What the rendering layer receives: the aggregated table plus its axis label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryFile {
    pub tool: String,
    pub label: String,
    pub mode: AggregationMode,
    pub steady_window: Option<usize>,
    pub rows: Vec<AggregatedStatistics>,
}
