use ndarray::Array3;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::errors::LabelError;
use crate::labels::LabelTables;
use crate::segmentation::bone_token;

/// Semantic label scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelScheme {
    /// Background and generic bone
    Binary,
    /// One class per bone of the anatomy table
    Multiclass,
}

impl LabelScheme {
    /// Semantic class -> name, background excluded
    pub fn class_names(&self, tables: &LabelTables) -> BTreeMap<u32, String> {
        match self {
            LabelScheme::Binary => BTreeMap::from([(1, "bone".to_string())]),
            LabelScheme::Multiclass => tables.class_names(),
        }
    }
}

impl FromStr for LabelScheme {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "binary" => Ok(LabelScheme::Binary),
            "multiclass" => Ok(LabelScheme::Multiclass),
            _ => Err(LabelError::UnknownScheme(s.to_string())),
        }
    }
}

impl fmt::Display for LabelScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabelScheme::Binary => write!(f, "binary"),
            LabelScheme::Multiclass => write!(f, "multiclass"),
        }
    }
}

/// Instance label -> semantic class, background included
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceToSemanticMap {
    classes: BTreeMap<u32, u32>,
}

impl InstanceToSemanticMap {
    /// Builds the map of an instance -> name table
    ///
    /// Multiclass looks up the bone token of every instance name, whether or
    /// not the instance occurs in the volume.
    pub fn build(
        scheme: LabelScheme,
        instance_names: &BTreeMap<u32, String>,
        tables: &LabelTables,
    ) -> Result<InstanceToSemanticMap, LabelError> {
        let mut classes = BTreeMap::new();
        for (&instance, name) in instance_names.iter() {
            let class = match scheme {
                LabelScheme::Binary => 1,
                LabelScheme::Multiclass => tables.class_of(bone_token(name))?,
            };
            classes.insert(instance, class);
        }
        classes.insert(0, 0);
        Ok(InstanceToSemanticMap { classes })
    }

    /// Semantic class of an instance label
    pub fn get(&self, instance: u32) -> Option<u32> {
        self.classes.get(&instance).copied()
    }

    /// Iterates over (instance, class) pairs in instance order
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.classes.iter().map(|(&i, &c)| (i, c))
    }

    /// Number of entries, background included
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Checks if the map only holds background
    pub fn is_empty(&self) -> bool {
        self.classes.len() <= 1
    }

    /// Remaps an instance volume to its semantic class volume
    pub fn apply(&self, instances: &Array3<u32>) -> Result<Array3<u32>, LabelError> {
        if let Some(&label) = instances.iter().find(|&&v| !self.classes.contains_key(&v)) {
            return Err(LabelError::UnmappedLabel { label });
        }
        Ok(instances.mapv(|v| self.get(v).unwrap_or(0)))
    }
}
