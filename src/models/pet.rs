use serde::{Deserialize, Serialize};

use super::user::DEFAULT_PET_STYLE;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PetInfo {
    pub id: String,
    pub name: String,
    pub unlock_level: i64,
}

impl PetInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>, unlock_level: i64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            unlock_level,
        }
    }
}

/// Level-gated pet cosmetics. Lookup never depends on table order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PetCatalog {
    pets: Vec<PetInfo>,
}

impl Default for PetCatalog {
    fn default() -> Self {
        Self::new(vec![
            PetInfo::new("pet1", "Blobby", 1),
            PetInfo::new("pet2", "Spiky", 2),
            PetInfo::new("pet3", "Cacto", 5),
            PetInfo::new("pet4", "Boxy", 10),
            PetInfo::new("pet5", "Cloudy", 15),
        ])
    }
}

impl PetCatalog {
    pub fn new(pets: Vec<PetInfo>) -> Self {
        Self { pets }
    }

    pub fn pets(&self) -> &[PetInfo] {
        &self.pets
    }

    pub fn get(&self, id: &str) -> Option<&PetInfo> {
        self.pets.iter().find(|pet| pet.id == id)
    }

    /// Highest `unlock_level` not above `level`. Ties go to the earlier entry.
    pub fn pet_for_level(&self, level: i64) -> Option<&PetInfo> {
        self.pets
            .iter()
            .filter(|pet| pet.unlock_level <= level)
            .fold(None, |best: Option<&PetInfo>, pet| match best {
                Some(current) if current.unlock_level >= pet.unlock_level => Some(current),
                _ => Some(pet),
            })
    }

    pub fn style_for_level(&self, level: i64) -> String {
        self.pet_for_level(level)
            .map(|pet| pet.id.clone())
            .unwrap_or_else(|| DEFAULT_PET_STYLE.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_tiers() {
        let catalog = PetCatalog::default();
        assert_eq!(catalog.style_for_level(1), "pet1");
        assert_eq!(catalog.style_for_level(2), "pet2");
        assert_eq!(catalog.style_for_level(9), "pet3");
        assert_eq!(catalog.style_for_level(10), "pet4");
        assert_eq!(catalog.style_for_level(40), "pet5");
    }

    #[test]
    fn lookup_ignores_table_order() {
        let catalog = PetCatalog::new(vec![
            PetInfo::new("pet3", "Cacto", 10),
            PetInfo::new("pet1", "Blobby", 1),
            PetInfo::new("pet2", "Spiky", 5),
        ]);
        assert_eq!(catalog.style_for_level(4), "pet1");
        assert_eq!(catalog.style_for_level(5), "pet2");
        assert_eq!(catalog.style_for_level(12), "pet3");
    }

    #[test]
    fn empty_catalog_falls_back() {
        let catalog = PetCatalog::new(Vec::new());
        assert_eq!(catalog.style_for_level(7), DEFAULT_PET_STYLE);
    }
}
