use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub name: String,
    #[serde(default)]
    pub category: String,
    /// `None` means ungraded / pending.
    #[serde(default)]
    pub score: Option<f64>,
    pub points_possible: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_dropped: Option<bool>,
}

impl Assignment {
    /// Merge key: case and surrounding whitespace are insignificant, nothing else is.
    pub fn identity(&self) -> String {
        normalize_name(&self.name)
    }

    pub fn is_graded(&self) -> bool {
        self.score.is_some()
    }
}

pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub name: String,
    /// Percentage (0-100) contribution to the final grade.
    pub weight: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drop_lowest: Option<u32>,
}

/// Letter label -> minimum percentage, in document order.
///
/// Kept as an ordered list rather than a hash/btree map so that labels sharing
/// a threshold resolve in the order the extractor reported them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GradingScale {
    entries: Vec<(String, f64)>,
}

impl GradingScale {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites `label`. An overwrite keeps the label's original position.
    pub fn insert(&mut self, label: impl Into<String>, threshold: f64) {
        let label = label.into();
        match self.entries.iter_mut().find(|(l, _)| *l == label) {
            Some(entry) => entry.1 = threshold,
            None => self.entries.push((label, threshold)),
        }
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, t)| *t)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(l, t)| (l.as_str(), *t))
    }
}

impl<L: Into<String>> FromIterator<(L, f64)> for GradingScale {
    fn from_iter<I: IntoIterator<Item = (L, f64)>>(iter: I) -> Self {
        let mut scale = GradingScale::new();
        for (label, threshold) in iter {
            scale.insert(label, threshold);
        }
        scale
    }
}

impl Serialize for GradingScale {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (label, threshold) in &self.entries {
            map.serialize_entry(label, threshold)?;
        }
        map.end()
    }
}

struct GradingScaleVisitor;

impl<'de> Visitor<'de> for GradingScaleVisitor {
    type Value = GradingScale;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an object mapping letter grades to minimum percentages")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut scale = GradingScale::new();
        while let Some((label, threshold)) = access.next_entry::<String, f64>()? {
            scale.insert(label, threshold);
        }
        Ok(scale)
    }

    fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
        Ok(GradingScale::new())
    }
}

impl<'de> Deserialize<'de> for GradingScale {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(GradingScaleVisitor)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeRecord {
    pub class_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructor: Option<String>,
    pub current_grade: f64,
    pub letter_grade: String,
    #[serde(default)]
    pub assignments: Vec<Assignment>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub grading_scale: GradingScale,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalProjection {
    pub target_grade: String,
    pub target_percentage: f64,
    pub current_grade: f64,
    pub final_weight: f64,
    /// Clamped to >= 0. Never clamped from above.
    pub needed_score: f64,
    /// Decided on the unclamped value.
    pub is_possible: bool,
}
