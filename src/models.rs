use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Serde helper: parse an opaque identifier from either a JSON number or a string.
fn de_id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    struct IdVisitor;

    impl<'de> Visitor<'de> for IdVisitor {
        type Value = String;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            write!(f, "a string or integer identifier")
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(v.to_string())
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(v.to_string())
        }

        fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(s.trim().to_string())
        }
    }

    deserializer.deserialize_any(IdVisitor)
}

/// Serde helper: years come back as `"2022"` from the data endpoint; accept numbers too.
fn de_year_from_string_or_number<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    struct YearVisitor;

    impl<'de> Visitor<'de> for YearVisitor {
        type Value = i32;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            write!(f, "a string or integer representing a year")
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            i32::try_from(v).map_err(E::custom)
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            i32::try_from(v).map_err(E::custom)
        }

        fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            s.trim().parse::<i32>().map_err(E::custom)
        }
    }

    deserializer.deserialize_any(YearVisitor)
}

fn de_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapped(#[serde(deserialize_with = "de_id_from_string_or_number")] String);

    let v: Option<Wrapped> = Option::deserialize(deserializer)?;
    Ok(v.map(|Wrapped(s)| s).filter(|s| !s.is_empty()))
}

/// Raw payload of `GET /variables/{id}`.
///
/// The hierarchical name levels (`n1`, `n2`, …) are not a fixed set, so
/// everything not named here is kept in `extra` and scanned by the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableMeta {
    #[serde(deserialize_with = "de_id_from_string_or_number")]
    pub id: String,
    #[serde(rename = "subjectId", default, deserialize_with = "de_opt_id")]
    pub subject_id: Option<String>,
    #[serde(rename = "measureUnitName", default)]
    pub measure_unit_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VariableMeta {
    /// Name part at the given level (1-based). Null or non-string values count as missing.
    pub fn name_level(&self, level: usize) -> Option<&str> {
        self.extra
            .get(&format!("n{}", level))
            .and_then(Value::as_str)
    }
}

/// `links` section of a paginated response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Links {
    #[serde(default)]
    pub next: Option<String>,
}

/// One `{year, val}` entry inside a series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YearValue {
    #[serde(deserialize_with = "de_year_from_string_or_number")]
    pub year: i32,
    #[serde(default)]
    pub val: Option<f64>,
}

/// One variable's series inside a unit response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesResult {
    #[serde(deserialize_with = "de_id_from_string_or_number")]
    pub id: String,
    #[serde(default)]
    pub values: Vec<YearValue>,
}

/// Raw payload of `GET /data/by-unit/{id}` (one page).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitData {
    #[serde(rename = "unitId", deserialize_with = "de_id_from_string_or_number")]
    pub unit_id: String,
    #[serde(rename = "unitName")]
    pub unit_name: String,
    #[serde(default)]
    pub results: Vec<SeriesResult>,
    #[serde(default)]
    pub links: Option<Links>,
    #[serde(rename = "totalRecords", default)]
    pub total_records: Option<u64>,
}

impl UnitData {
    /// Flatten into one observation per (variable, year), stamped with this response's unit.
    pub fn into_observations(self) -> Vec<Observation> {
        let UnitData {
            unit_id,
            unit_name,
            results,
            ..
        } = self;
        let mut out = Vec::new();
        for series in results {
            for v in series.values {
                out.push(Observation {
                    unit_id: unit_id.clone(),
                    unit_name: unit_name.clone(),
                    variable_id: series.id.clone(),
                    year: v.year,
                    value: v.val,
                });
            }
        }
        out
    }

    pub fn has_next_page(&self) -> bool {
        self.links
            .as_ref()
            .and_then(|l| l.next.as_deref())
            .is_some_and(|s| !s.is_empty())
    }
}

/// Normalized catalog row (one per requested variable).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Variable {
    pub variable_id: String,
    pub variable_name: String,
    pub variable_unit: Option<String>,
    pub variable_subject_id: Option<String>,
}

/// Tidy structure used by this crate (one row = one observation for one unit).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Observation {
    pub unit_id: String,
    pub unit_name: String,
    pub variable_id: String,
    pub year: i32,
    pub value: Option<f64>,
}

/// An observation with the matching catalog metadata attached (left join).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JoinedRecord {
    #[serde(flatten)]
    pub observation: Observation,
    pub variable_name: Option<String>,
    pub variable_unit: Option<String>,
    pub variable_subject_id: Option<String>,
}

impl JoinedRecord {
    /// Composite column label: `[subject/id] name [unit]`.
    ///
    /// Without a subject the prefix is `[id]`; a missing unit drops the trailing
    /// bracket; a variable absent from the catalog is labelled by its id alone.
    pub fn variable_label(&self) -> String {
        let id = &self.observation.variable_id;
        let mut label = match self.variable_subject_id.as_deref() {
            Some(subject) => format!("[{}/{}]", subject, id),
            None => format!("[{}]", id),
        };
        if let Some(name) = self.variable_name.as_deref() {
            label.push(' ');
            label.push_str(name);
            if let Some(unit) = self.variable_unit.as_deref().filter(|u| !u.is_empty()) {
                label.push_str(&format!(" [{}]", unit));
            }
        }
        label
    }
}
