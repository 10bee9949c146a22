use std::collections::BTreeMap;

use crate::errors::LabelError;

/// Semantic classes of the ankle bones
pub static ANKLE_ANATOMY: &[(&str, u32)] = &[
    ("tibia", 1),
    ("fibula", 2),
    ("talus", 3),
    ("calcaneus", 4),
];

/// Largest label found in volumes without segment metadata
pub const ANKLE_LEGACY_MAX_LABEL: u32 = 4;

/// Lookup tables used to resolve labels
///
/// The anatomy table maps lower-case bone names to semantic classes. Volumes
/// without segment metadata are read with the same table, used as
/// label -> bone name, restricted to labels `1..=legacy_max_label`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelTables<'a> {
    pub anatomy: &'a [(&'a str, u32)],
    pub legacy_max_label: u32,
}

impl Default for LabelTables<'static> {
    fn default() -> Self {
        LabelTables::ankle()
    }
}

impl<'a> LabelTables<'a> {
    /// Tables of the ankle dataset
    pub const fn ankle() -> LabelTables<'static> {
        LabelTables {
            anatomy: ANKLE_ANATOMY,
            legacy_max_label: ANKLE_LEGACY_MAX_LABEL,
        }
    }

    /// Semantic class of a bone name (case insensitive)
    pub fn class_of(&self, bone_name: &str) -> Result<u32, LabelError> {
        let lower = bone_name.to_lowercase();
        self.anatomy
            .iter()
            .find(|(name, _)| *name == lower)
            .map(|&(_, class)| class)
            .ok_or(LabelError::UnknownAnatomy {
                name: bone_name.to_string(),
            })
    }

    /// Semantic class -> bone name
    pub fn class_names(&self) -> BTreeMap<u32, String> {
        self.anatomy
            .iter()
            .map(|&(name, class)| (class, name.to_string()))
            .collect()
    }

    /// Instance -> name table adopted for volumes without segment metadata
    pub fn legacy_instance_names(&self) -> BTreeMap<u32, String> {
        self.class_names()
            .into_iter()
            .filter(|&(label, _)| label >= 1 && label <= self.legacy_max_label)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_of() {
        let tables = LabelTables::ankle();
        assert_eq!(tables.class_of("Tibia"), Ok(1));
        assert_eq!(tables.class_of("CALCANEUS"), Ok(4));
        assert_eq!(
            tables.class_of("Femur"),
            Err(LabelError::UnknownAnatomy {
                name: "Femur".to_string()
            })
        );
    }

    #[test]
    fn test_legacy_names() {
        let names = LabelTables::default().legacy_instance_names();
        assert_eq!(names.len(), 4);
        assert_eq!(names[&1], "tibia");
        assert_eq!(names[&4], "calcaneus");
    }

    #[test]
    fn test_alternate_tables() {
        let knee: &[(&str, u32)] = &[("femur", 1), ("patella", 2)];
        let tables = LabelTables {
            anatomy: knee,
            legacy_max_label: 1,
        };
        assert_eq!(tables.class_of("Patella"), Ok(2));
        assert!(tables.class_of("tibia").is_err());
        assert_eq!(tables.legacy_instance_names().len(), 1);
    }
}
