//! Matrix Generator: explicit zip matrices, cartesian products, and
//! exclusion by canonical row signature.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uptodate_common::error::{Result, UptodateError};

use crate::variables::ResolvedVariable;

/// One concrete build configuration: a value for every variable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatrixEntry(BTreeMap<String, String>);

impl MatrixEntry {
    /// Creates an empty entry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy with `name` set to `value`.
    #[must_use]
    pub fn with(&self, name: &str, value: &str) -> Self {
        let mut next = self.clone();
        let _ = next.0.insert(name.to_string(), value.to_string());
        next
    }

    /// Value of `name`, if set.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Variable names in key order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Number of variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no variable is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Canonical signature: `key:value` pairs in key order joined by `;`.
    /// Independent of insertion order.
    #[must_use]
    pub fn signature(&self) -> String {
        self.iter()
            .map(|(k, v)| format!("{k}:{v}"))
            .collect::<Vec<_>>()
            .join(";")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MatrixEntry {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Builds rows by zipping `columns` positionally; row *i* takes index *i*
/// of every column. Longer columns are truncated to the shortest.
#[must_use]
pub fn zip_columns(columns: &BTreeMap<String, Vec<String>>) -> Vec<MatrixEntry> {
    let Some(min_len) = columns.values().map(Vec::len).min() else {
        return Vec::new();
    };
    let truncated: Vec<&str> = columns
        .iter()
        .filter(|(_, v)| v.len() > min_len)
        .map(|(k, _)| k.as_str())
        .collect();
    if !truncated.is_empty() {
        warn!(?truncated, rows = min_len, "matrix columns have unequal length, truncating");
    }
    (0..min_len)
        .map(|i| {
            columns
                .iter()
                .map(|(name, values)| (name.as_str(), values[i].as_str()))
                .collect()
        })
        .collect()
}

/// Builds the cartesian product of `variables`.
///
/// Earlier variables vary fastest. A variable without values empties the
/// product; no variables at all yield no rows.
#[must_use]
pub fn cartesian(variables: &[ResolvedVariable]) -> Vec<MatrixEntry> {
    if variables.is_empty() {
        return Vec::new();
    }
    variables.iter().fold(vec![MatrixEntry::new()], |rows, variable| {
        variable
            .values
            .iter()
            .flat_map(|value| rows.iter().map(move |row| row.with(&variable.name, value)))
            .collect()
    })
}

/// Signatures of the rows described by exclusion `columns`.
///
/// # Errors
///
/// Returns [`UptodateError::Config`] if the columns differ in length.
pub fn exclusion_signatures(columns: &BTreeMap<String, Vec<String>>) -> Result<BTreeSet<String>> {
    let lengths: BTreeSet<usize> = columns.values().map(Vec::len).collect();
    if lengths.len() > 1 {
        return Err(UptodateError::config(
            "all entries in exclude must have equal length",
        ));
    }
    Ok(zip_columns(columns)
        .iter()
        .map(MatrixEntry::signature)
        .filter(|s| !s.is_empty())
        .collect())
}

/// Names a generated matrix is restricted to when an explicit matrix is
/// given.
#[must_use]
pub fn allow_list(explicit: &BTreeMap<String, Vec<String>>) -> BTreeSet<String> {
    explicit.keys().cloned().collect()
}

/// Generates the final matrix.
///
/// With `explicit` columns the rows are zipped from them and `variables`
/// are ignored; otherwise the cartesian product of `variables` is used.
/// Rows matching an `excludes` row are dropped.
///
/// # Errors
///
/// Returns [`UptodateError::Config`] if exclusion columns differ in
/// length.
pub fn generate(
    variables: &[ResolvedVariable],
    explicit: Option<&BTreeMap<String, Vec<String>>>,
    excludes: Option<&BTreeMap<String, Vec<String>>>,
) -> Result<Vec<MatrixEntry>> {
    let rows = explicit.map_or_else(|| cartesian(variables), zip_columns);
    let Some(excludes) = excludes else {
        return Ok(rows);
    };

    let excluded = exclusion_signatures(excludes)?;
    Ok(rows
        .into_iter()
        .filter(|row| {
            let drop = excluded.contains(&row.signature());
            if drop {
                debug!(entry = %row.signature(), "excluding matrix entry");
            }
            !drop
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(pairs: &[(&str, &[&str])]) -> BTreeMap<String, Vec<String>> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.iter().map(|s| (*s).to_string()).collect()))
            .collect()
    }

    #[test]
    fn cartesian_row_count_is_product() {
        let vars = vec![
            ResolvedVariable::new("a", ["1", "2"]),
            ResolvedVariable::new("b", ["x", "y", "z"]),
            ResolvedVariable::new("c", ["only"]),
        ];
        let rows = cartesian(&vars);
        assert_eq!(rows.len(), 6);
        let distinct: BTreeSet<String> = rows.iter().map(MatrixEntry::signature).collect();
        assert_eq!(distinct.len(), 6);
        assert!(rows.iter().all(|r| r.len() == 3));
    }

    #[test]
    fn cartesian_empty_variable_empties_product() {
        let vars = vec![
            ResolvedVariable::new("a", ["1", "2"]),
            ResolvedVariable::new("b", Vec::<String>::new()),
            ResolvedVariable::new("c", ["x"]),
        ];
        assert!(cartesian(&vars).is_empty());
        assert!(cartesian(&[]).is_empty());
    }

    #[test]
    fn zip_uses_shortest_column() {
        let rows = zip_columns(&columns(&[("os", &["18.04", "20.04", "22.04"]), ("py", &["3.8", "3.9"])]));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get("os"), Some("20.04"));
        assert_eq!(rows[1].get("py"), Some("3.9"));
    }

    #[test]
    fn signature_ignores_insertion_order() {
        let ab = MatrixEntry::new().with("a", "1").with("b", "2");
        let ba = MatrixEntry::new().with("b", "2").with("a", "1");
        assert_eq!(ab.signature(), ba.signature());
        assert_eq!(ab.signature(), "a:1;b:2");
    }

    #[test]
    fn generate_applies_exclusions() {
        let vars = vec![
            ResolvedVariable::new("a", ["1", "2"]),
            ResolvedVariable::new("b", ["x", "y"]),
        ];
        let excludes = columns(&[("b", &["y"]), ("a", &["1"])]);
        let rows = generate(&vars, None, Some(&excludes)).expect("generate");
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.signature() != "a:1;b:y"));
    }

    #[test]
    fn generate_unequal_exclusions_is_config_error() {
        let vars = vec![ResolvedVariable::new("a", ["1"])];
        let excludes = columns(&[("a", &["1", "2"]), ("b", &["x"])]);
        assert!(matches!(
            generate(&vars, None, Some(&excludes)),
            Err(UptodateError::Config { .. })
        ));
    }

    #[test]
    fn generate_prefers_explicit_matrix() {
        let vars = vec![ResolvedVariable::new("a", ["1", "2", "3"])];
        let explicit = columns(&[("a", &["9"])]);
        let rows = generate(&vars, Some(&explicit), None).expect("generate");
        assert_eq!(rows, vec![MatrixEntry::new().with("a", "9")]);
        assert!(allow_list(&explicit).contains("a"));
    }
}
