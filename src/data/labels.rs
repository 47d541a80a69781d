//! Label encoding between class names and dense integer ids

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::frame::{Column, DataFrame};
use crate::error::{Error, Result};

/// Bijective mapping between sorted class names and `0..num_classes`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, usize>", into = "BTreeMap<String, usize>")]
pub struct LabelIndex {
    labels: Vec<String>,
    ids: BTreeMap<String, usize>,
}

impl LabelIndex {
    /// Build an index from labels in ascending order. Duplicates are ignored.
    pub fn from_sorted<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut index = Self::default();
        for label in labels {
            let label = label.into();
            if index.ids.contains_key(&label) {
                continue;
            }
            index.ids.insert(label.clone(), index.labels.len());
            index.labels.push(label);
        }
        index
    }

    /// Build an index from labels in any order; they are sorted lexicographically.
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut all: Vec<String> = labels.into_iter().map(Into::into).collect();
        all.sort();
        all.dedup();
        Self::from_sorted(all)
    }

    pub fn num_classes(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Id for `label`, if present
    pub fn get(&self, label: &str) -> Option<usize> {
        self.ids.get(label).copied()
    }

    /// Id for `label`, failing with [`Error::LabelNotFound`]
    pub fn encode(&self, label: &str) -> Result<usize> {
        self.get(label).ok_or_else(|| Error::LabelNotFound(label.to_string()))
    }

    /// Label for `id`, if in range
    pub fn decode(&self, id: usize) -> Option<&str> {
        self.labels.get(id).map(String::as_str)
    }

    /// Class names ordered by id
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// `(label, id)` pairs ordered by id
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.labels.iter().enumerate().map(|(i, l)| (l.as_str(), i))
    }
}

/// Accepts a saved `label -> id` map whose ids are exactly `0..n`
impl TryFrom<BTreeMap<String, usize>> for LabelIndex {
    type Error = Error;

    fn try_from(map: BTreeMap<String, usize>) -> Result<Self> {
        let mut labels: Vec<Option<String>> = vec![None; map.len()];
        for (label, &id) in &map {
            match labels.get_mut(id) {
                Some(slot) if slot.is_none() => *slot = Some(label.clone()),
                _ => {
                    return Err(Error::config(format!(
                        "label index ids must be 0..{} with no gaps; '{label}' has id {id}",
                        map.len()
                    )))
                }
            }
        }
        Ok(Self { labels: labels.into_iter().flatten().collect(), ids: map })
    }
}

impl From<LabelIndex> for BTreeMap<String, usize> {
    fn from(index: LabelIndex) -> Self {
        index.ids
    }
}

/// Build the label index of `label_column`: sorted distinct values numbered from 0
pub fn build_index(frame: &DataFrame, label_column: &str) -> Result<LabelIndex> {
    Ok(LabelIndex::from_sorted(frame.column(label_column)?.distinct_sorted()))
}

/// Rewrite `label_column` in place as integer ids from `index`
pub fn encode(frame: &mut DataFrame, label_column: &str, index: &LabelIndex) -> Result<()> {
    let ids = frame
        .column(label_column)?
        .keys()
        .iter()
        .map(|label| index.encode(label).map(|id| id as i64))
        .collect::<Result<Vec<_>>>()?;
    frame.insert_column(Column::int(label_column, ids))
}

/// Rewrite an encoded `label_column` in place back to class names
pub fn decode(frame: &mut DataFrame, label_column: &str, index: &LabelIndex) -> Result<()> {
    let column = frame.column(label_column)?;
    let ids = column.as_int().ok_or_else(|| {
        Error::config(format!("column '{label_column}' does not hold encoded labels"))
    })?;
    let labels = ids
        .iter()
        .map(|&id| {
            usize::try_from(id)
                .ok()
                .and_then(|id| index.decode(id))
                .map(str::to_string)
                .ok_or_else(|| Error::LabelNotFound(id.to_string()))
        })
        .collect::<Result<Vec<_>>>()?;
    frame.insert_column(Column::text(label_column, labels))
}

/// Encode a copy of `frame` with a freshly built index and return both
pub fn labels_to_int(frame: &DataFrame, label_column: &str) -> Result<(DataFrame, LabelIndex)> {
    let index = build_index(frame, label_column)?;
    let mut data = frame.clone();
    encode(&mut data, label_column, &index)?;
    Ok((data, index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn frame(labels: &[&str]) -> DataFrame {
        DataFrame::from_columns(vec![Column::text(
            "target",
            labels.iter().map(|s| s.to_string()).collect(),
        )])
        .unwrap()
    }

    #[test]
    fn test_index_is_sorted() {
        let index = build_index(&frame(&["dog", "cat", "bird", "cat"]), "target").unwrap();
        assert_eq!(index.labels(), &["bird", "cat", "dog"]);
        assert_eq!(index.get("cat"), Some(1));
        assert_eq!(index.num_classes(), 3);
    }

    #[test]
    fn test_encode_in_place() {
        let mut df = frame(&["dog", "cat", "dog"]);
        let index = build_index(&df, "target").unwrap();
        encode(&mut df, "target", &index).unwrap();
        assert_eq!(df.column("target").unwrap().as_int(), Some(&[1, 0, 1][..]));

        decode(&mut df, "target", &index).unwrap();
        assert_eq!(df.column("target").unwrap().keys(), vec!["dog", "cat", "dog"]);
    }

    #[test]
    fn test_encode_unknown_label() {
        let mut df = frame(&["dog", "fish"]);
        let index = LabelIndex::from_labels(["cat", "dog"]);
        let err = encode(&mut df, "target", &index).unwrap_err();
        assert!(matches!(err, Error::LabelNotFound(ref l) if l == "fish"));
        // frame untouched on failure
        assert!(df.column("target").unwrap().as_text().is_some());
    }

    #[test]
    fn test_labels_to_int_leaves_input() {
        let df = frame(&["b", "a"]);
        let (encoded, index) = labels_to_int(&df, "target").unwrap();
        assert_eq!(encoded.column("target").unwrap().as_int(), Some(&[1, 0][..]));
        assert_eq!(df.column("target").unwrap().keys(), vec!["b", "a"]);
        assert_eq!(index.decode(0), Some("a"));
    }

    #[test]
    fn test_missing_column() {
        let err = build_index(&frame(&["a"]), "label").unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_serializes_as_map() {
        let index = LabelIndex::from_labels(["dog", "cat"]);
        let json = serde_json::to_string(&index).unwrap();
        assert_eq!(json, r#"{"cat":0,"dog":1}"#);
        let back: LabelIndex = serde_json::from_str(&json).unwrap();
        assert_eq!(back, index);
    }

    #[test]
    fn test_saved_index_keeps_its_ids() {
        let index: LabelIndex = serde_json::from_str(r#"{"cat":1,"dog":0}"#).unwrap();
        assert_eq!(index.get("dog"), Some(0));
        assert_eq!(index.get("cat"), Some(1));
        assert_eq!(index.decode(0), Some("dog"));

        let mut df = frame(&["cat", "dog"]);
        encode(&mut df, "target", &index).unwrap();
        assert_eq!(df.column("target").unwrap().as_int(), Some(&[1, 0][..]));
    }

    #[test]
    fn test_saved_index_with_gaps_rejected() {
        let err = serde_json::from_str::<LabelIndex>(r#"{"cat":3,"dog":7}"#).unwrap_err();
        assert!(err.to_string().contains("no gaps"));

        let duplicate = BTreeMap::from([("cat".to_string(), 0), ("dog".to_string(), 0)]);
        let err = LabelIndex::try_from(duplicate).unwrap_err();
        assert!(err.is_config_error());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_index_bijective_and_order_free(
            labels in proptest::collection::vec("[a-z]{1,6}", 1..30),
        ) {
            let mut labels = labels;
            let index = LabelIndex::from_labels(labels.clone());
            for label in &labels {
                let id = index.encode(label).unwrap();
                prop_assert_eq!(index.decode(id), Some(label.as_str()));
            }

            labels.reverse();
            prop_assert_eq!(LabelIndex::from_labels(labels), index);
        }
    }
}
