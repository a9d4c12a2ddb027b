//! Template matching: is a candidate run "the same experiment" as the template?
//!
//! Fields are compared pairwise in schema order. A field is skipped when it is
//! exempt by name (`EXEMPT_FIELDS`) or claimed by a role in the template's
//! `RoleMap`. Everything else must compare equal under `values_equal`.

use crate::domain::{EXEMPT_FIELDS, ParamValue, ParameterRecord, Template};
use crate::error::AppError;

/// Outcome of comparing two configuration values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueComparison {
    /// Both sides coerced to numbers.
    Numeric { equal: bool },
    /// At least one side is not numeric; compared as text.
    Textual { equal: bool },
}

impl ValueComparison {
    pub fn is_equal(self) -> bool {
        match self {
            ValueComparison::Numeric { equal } | ValueComparison::Textual { equal } => equal,
        }
    }
}

/// Numeric-first comparison with a string fallback.
///
/// Step one coerces both values to `f64`; if either side refuses, step two
/// compares their textual forms.
pub fn compare_values(a: &ParamValue, b: &ParamValue) -> ValueComparison {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => ValueComparison::Numeric { equal: x == y },
        _ => ValueComparison::Textual {
            equal: a.to_string() == b.to_string(),
        },
    }
}

pub fn values_equal(a: &ParamValue, b: &ParamValue) -> bool {
    compare_values(a, b).is_equal()
}

/// Whether a field takes part in the comparison at all.
pub fn is_compared(template: &Template, name: &str) -> bool {
    !EXEMPT_FIELDS.contains(&name) && !template.roles.claims(name)
}

/// Decide whether `candidate` belongs to the experiment described by `template`.
///
/// Errors (both structural):
/// - the records differ in length or field order
/// - no field was compared, so the answer would be meaningless
pub fn matches(template: &Template, candidate: &ParameterRecord) -> Result<bool, AppError> {
    if template.record.len() != candidate.len() {
        return Err(AppError::structural(format!(
            "Parameter records have different lengths (template {}, run {}).",
            template.record.len(),
            candidate.len()
        )));
    }

    let mut compared = 0usize;
    for ((t_name, t_value), (c_name, c_value)) in template.record.iter().zip(candidate.iter()) {
        if t_name != c_name {
            return Err(AppError::structural(format!(
                "Parameter records are ordered differently (`{t_name}` vs `{c_name}`)."
            )));
        }
        if !is_compared(template, t_name) || t_value.role().is_some() {
            continue;
        }
        compared += 1;
        if !values_equal(t_value, c_value) {
            return Ok(false);
        }
    }

    if compared == 0 {
        return Err(AppError::structural(
            "Template comparison compared no fields; every field is exempt or a role.",
        ));
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ALPHA_FIELD, PARAMETER_SCHEMA, PATHOGEN_SPECIES_FIELD, RUN_START_FIELD, THREADS_FIELD};

    fn num(v: f64) -> ParamValue {
        ParamValue::Number(v)
    }

    fn text(s: &str) -> ParamValue {
        ParamValue::Text(s.to_string())
    }

    fn record(values: &[(&str, ParamValue)]) -> ParameterRecord {
        ParameterRecord::new(values.iter().map(|(k, v)| (k.to_string(), v.clone())).collect())
    }

    fn run(date: &str, threads: f64, species: f64, hosts: f64, flag: &str, alpha: f64) -> ParameterRecord {
        record(&[
            (RUN_START_FIELD, text(date)),
            (THREADS_FIELD, num(threads)),
            ("species", num(species)),
            ("hosts", num(hosts)),
            ("flag", text(flag)),
            (ALPHA_FIELD, num(alpha)),
        ])
    }

    fn template() -> Template {
        let rec = record(&[
            (RUN_START_FIELD, text("2016-01-01.00:00:00")),
            (THREADS_FIELD, num(1.0)),
            ("species", text("VAR")),
            ("hosts", num(1000.0)),
            ("flag", text("NO")),
            (ALPHA_FIELD, num(0.1)),
        ]);
        Template::from_record(rec).unwrap()
    }

    #[test]
    fn numeric_first_then_text() {
        assert_eq!(compare_values(&num(10.0), &text("10")), ValueComparison::Numeric { equal: true });
        assert_eq!(compare_values(&text("1e3"), &num(1000.0)), ValueComparison::Numeric { equal: true });
        assert_eq!(compare_values(&text("NO"), &text("NO")), ValueComparison::Textual { equal: true });
        assert_eq!(compare_values(&text("NO"), &num(0.0)), ValueComparison::Textual { equal: false });
    }

    #[test]
    fn timestamp_threads_and_alpha_are_exempt() {
        let candidate = run("2017-03-04.12:00:00", 8.0, 2.0, 1000.0, "NO", 0.9);
        assert!(matches(&template(), &candidate).unwrap());
    }

    #[test]
    fn role_fields_are_not_compared() {
        let a = run("2017-03-04.12:00:00", 1.0, 2.0, 1000.0, "NO", 0.1);
        let b = run("2017-03-04.12:00:00", 1.0, 64.0, 1000.0, "NO", 0.1);
        assert!(matches(&template(), &a).unwrap());
        assert!(matches(&template(), &b).unwrap());
    }

    #[test]
    fn any_differing_field_breaks_the_match() {
        let numeric = run("2017-03-04.12:00:00", 1.0, 2.0, 999.0, "NO", 0.1);
        let textual = run("2017-03-04.12:00:00", 1.0, 2.0, 1000.0, "YES", 0.1);
        assert!(!matches(&template(), &numeric).unwrap());
        assert!(!matches(&template(), &textual).unwrap());
    }

    #[test]
    fn length_mismatch_is_an_error() {
        let short = record(&[(RUN_START_FIELD, text("2017-03-04")), ("species", num(1.0))]);
        let err = matches(&template(), &short).unwrap_err();
        assert!(err.is_structural());
    }

    #[test]
    fn field_order_mismatch_is_an_error() {
        let rec = record(&[
            (RUN_START_FIELD, text("2017-03-04")),
            (THREADS_FIELD, num(1.0)),
            ("hosts", num(1000.0)),
            ("species", num(2.0)),
            ("flag", text("NO")),
            (ALPHA_FIELD, num(0.1)),
        ]);
        assert!(matches(&template(), &rec).is_err());
    }

    #[test]
    fn nothing_compared_is_an_error() {
        let t = Template::from_record(record(&[
            (RUN_START_FIELD, text("2016-01-01")),
            ("species", text("VAR")),
            ("hosts", text("IRR")),
        ]))
        .unwrap();
        let c = record(&[
            (RUN_START_FIELD, text("2016-01-01")),
            ("species", num(1.0)),
            ("hosts", num(5.0)),
        ]);
        let err = matches(&t, &c).unwrap_err();
        assert!(err.message().contains("no fields"));
    }

    /// A full schema-ordered record; `var_field` carries the `VAR` marker.
    fn schema_record(var_field: Option<&str>) -> ParameterRecord {
        let fields = PARAMETER_SCHEMA
            .iter()
            .enumerate()
            .map(|(i, spec)| {
                let value = if Some(spec.name) == var_field {
                    text("VAR")
                } else if spec.name == RUN_START_FIELD {
                    text("2016-05-10.18:53:47")
                } else if spec.name == "heterozygote_advantage" {
                    text("NO")
                } else {
                    num(i as f64 + 1.0)
                };
                (spec.name.to_string(), value)
            })
            .collect();
        ParameterRecord::new(fields)
    }

    fn changed(value: &ParamValue) -> ParamValue {
        match value {
            ParamValue::Number(v) => num(v + 0.5),
            ParamValue::Text(s) => text(&format!("{s}-changed")),
        }
    }

    #[test]
    fn each_schema_field_is_compared_unless_exempt_or_var() {
        let template = Template::from_record(schema_record(Some(PATHOGEN_SPECIES_FIELD))).unwrap();
        let base = schema_record(None);
        assert!(matches(&template, &base).unwrap());

        for (i, spec) in PARAMETER_SCHEMA.iter().enumerate() {
            let fields = base
                .iter()
                .enumerate()
                .map(|(j, (k, v))| (k.to_string(), if i == j { changed(v) } else { v.clone() }))
                .collect();
            let candidate = ParameterRecord::new(fields);
            let tolerated = EXEMPT_FIELDS.contains(&spec.name) || spec.name == PATHOGEN_SPECIES_FIELD;
            assert_eq!(
                matches(&template, &candidate).unwrap(),
                tolerated,
                "changing `{}`",
                spec.name
            );
        }
    }
}
