//! Run configuration (`InputParameters.json`) loading.
//!
//! Turns the simulator's JSON parameter dump into an ordered `ParameterRecord`
//! following `PARAMETER_SCHEMA`. The same loader reads template files, whose
//! role fields hold the literal markers `VAR`, `VARX` and `IRR`.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::NaiveDate;
use serde_json::{Map, Value};

use crate::domain::{PARAMETER_SCHEMA, ParamValue, ParameterRecord, RUN_START_FIELD, Template};
use crate::error::AppError;

/// Read a configuration file into a `ParameterRecord`.
///
/// Errors are plain messages: for run files they are per-run problems that
/// the caller reports and skips.
pub fn load_param_record(path: &Path) -> Result<ParameterRecord, String> {
    let file = File::open(path).map_err(|e| format!("Failed to open '{}': {e}", path.display()))?;
    let json: Value = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| format!("Invalid JSON in '{}': {e}", path.display()))?;
    let Value::Object(map) = json else {
        return Err(format!("'{}' is not a JSON object.", path.display()));
    };
    record_from_map(&map)
}

/// Build a record from an already-parsed JSON object.
pub fn record_from_map(map: &Map<String, Value>) -> Result<ParameterRecord, String> {
    let mut fields = Vec::with_capacity(PARAMETER_SCHEMA.len());
    let mut missing = Vec::new();

    for spec in PARAMETER_SCHEMA {
        let raw = std::iter::once(spec.name)
            .chain(spec.aliases.iter().copied())
            .find_map(|key| map.get(key));
        let Some(raw) = raw else {
            missing.push(spec.name);
            continue;
        };
        let value = json_to_param(raw).ok_or_else(|| format!("Parameter `{}` has an unsupported value: {raw}", spec.name))?;
        fields.push((spec.name.to_string(), value));
    }

    if !missing.is_empty() {
        return Err(format!("Missing parameters: {}", missing.join(", ")));
    }
    Ok(ParameterRecord::new(fields))
}

fn json_to_param(value: &Value) -> Option<ParamValue> {
    match value {
        Value::Number(n) => n.as_f64().map(ParamValue::Number),
        Value::String(s) => Some(ParamValue::Text(s.clone())),
        Value::Bool(b) => Some(ParamValue::Text(b.to_string())),
        _ => None,
    }
}

/// Raw value of any key in a configuration file, rendered as text.
///
/// Unlike `load_param_record` this is not limited to the schema fields.
pub fn read_param_value(path: &Path, key: &str) -> Result<Option<String>, String> {
    let file = File::open(path).map_err(|e| format!("Failed to open '{}': {e}", path.display()))?;
    let json: Value = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| format!("Invalid JSON in '{}': {e}", path.display()))?;
    Ok(json.get(key).map(|v| match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }))
}

/// Load a template file and derive its role map.
pub fn load_template(path: &Path) -> Result<Template, AppError> {
    let record = load_param_record(path).map_err(|e| AppError::input(format!("Template: {e}")))?;
    Template::from_record(record)
}

/// Start date of a run, from its `run_start_date_and_time` field.
pub fn run_start_date(record: &ParameterRecord) -> Result<NaiveDate, String> {
    let value = record
        .get(RUN_START_FIELD)
        .ok_or_else(|| format!("Missing parameter `{RUN_START_FIELD}`."))?;
    let text = value
        .as_text()
        .ok_or_else(|| format!("`{RUN_START_FIELD}` is not a timestamp string (got `{value}`)."))?;
    parse_run_date(text)
}

/// Parse the date part of a simulator timestamp such as `2016-05-10.18:53:47`.
pub fn parse_run_date(s: &str) -> Result<NaiveDate, String> {
    let date_part = s
        .trim()
        .split(['.', ' ', 'T'])
        .next()
        .unwrap_or_default();
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|_| format!("Invalid run start date '{s}'. Expected YYYY-MM-DD at the start."))
}

/// Parse a user-supplied ISO date (`YYYY-MM-DD`).
pub fn parse_cutoff_date(s: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::input(format!("Invalid date '{s}'. It has to be in YYYY-MM-DD format.")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;
    use serde_json::json;

    fn sample_params() -> Value {
        json!({
            "run_start_date_and_time": "2016-05-10.18:53:47",
            "number_of_threads": 4,
            "number_of_bits_per_gene": 16,
            "number_of_bits_per_antigen": 16,
            "host_population_size": 1000,
            "pathogen_population_size": 1000,
            "number_of_pathogen_species": 4,
            "number_of_genes_per_host_one_chromosome": 1,
            "number_of_pathogen_generation_per_one_host_generation": 10,
            "number_of_host_generations": 5000,
            "mutation_probability_in_host": 0.0001,
            "mutation_probability_in_pathogen": 0.001,
            "heterozygote_advantage": "NO",
            "host_gene_deletion_probability": 0.001,
            "host_gene_duplication_probability": 0.001,
            "host_maximal_number_of_genes_in_chromosome": 50,
            "number_of_sex_mates": 1,
            "alpha_factor_for_the_host_fitness_function": 0.5
        })
    }

    fn as_map(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => unreachable!(),
        }
    }

    #[test]
    fn record_follows_schema_order() {
        let record = record_from_map(&as_map(sample_params())).unwrap();
        assert_eq!(record.len(), PARAMETER_SCHEMA.len());
        let names: Vec<&str> = record.iter().map(|(k, _)| k).collect();
        let expected: Vec<&str> = PARAMETER_SCHEMA.iter().map(|f| f.name).collect();
        assert_eq!(names, expected);
        assert_eq!(record.number("number_of_pathogen_species").unwrap(), 4.0);
    }

    #[test]
    fn legacy_flag_key_is_accepted() {
        let mut map = as_map(sample_params());
        let flag = map.remove("heterozygote_advantage").unwrap();
        map.insert("separated_species_genomes".to_string(), flag);
        let record = record_from_map(&map).unwrap();
        assert_eq!(
            record.get("heterozygote_advantage"),
            Some(&ParamValue::Text("NO".to_string()))
        );
    }

    #[test]
    fn missing_keys_are_named() {
        let mut map = as_map(sample_params());
        map.remove("number_of_sex_mates");
        map.remove("host_population_size");
        let err = record_from_map(&map).unwrap_err();
        assert!(err.contains("number_of_sex_mates"));
        assert!(err.contains("host_population_size"));
    }

    #[test]
    fn template_markers_become_roles() {
        let mut map = as_map(sample_params());
        map.insert("number_of_pathogen_species".to_string(), json!("VAR"));
        map.insert("host_population_size".to_string(), json!("VARX"));
        let record = record_from_map(&map).unwrap();
        let template = Template::from_record(record).unwrap();
        assert_eq!(template.roles.field(Role::Var), Some("number_of_pathogen_species"));
        assert_eq!(template.axis_label(), "host_population_size");
    }

    #[test]
    fn run_dates_parse_from_timestamp() {
        let d = parse_run_date("2016-05-10.18:53:47").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2016, 5, 10).unwrap());
        assert!(parse_run_date("10/05/2016").is_err());
        assert!(parse_cutoff_date("2016-13-01").is_err());
    }

    #[test]
    fn numeric_timestamp_is_rejected() {
        let mut map = as_map(sample_params());
        map.insert(RUN_START_FIELD.to_string(), json!(20160510));
        let record = record_from_map(&map).unwrap();
        assert!(run_start_date(&record).is_err());
    }
}
