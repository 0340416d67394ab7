//! Static library catalog shown on the main screen.
//!
//! Loaded once at startup (built-in or from config) and never mutated.

use serde::{Deserialize, Serialize};

const SHAPIRO_IMAGE: &str = "https://www.lib.umich.edu/static/e01b363c2988bc9ff1e2a9b5063aad2f/e2514/Shapiro-1stFloor4-Apr2019.jpg";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Floor {
    pub name: String,
    pub capacity: u32,
}

impl Floor {
    pub fn new(name: impl Into<String>, capacity: u32) -> Self {
        Self {
            name: name.into(),
            capacity,
        }
    }

    /// Fraction of seats taken. `None` when the floor has no declared capacity.
    #[must_use]
    pub fn occupancy(&self, people: u32) -> Option<f64> {
        if self.capacity == 0 {
            None
        } else {
            Some(f64::from(people) / f64::from(self.capacity))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Library {
    pub name: String,
    #[serde(default, rename = "image")]
    pub image_ref: String,
    #[serde(default)]
    pub floors: Vec<Floor>,
}

impl Library {
    #[must_use]
    pub fn total_capacity(&self) -> u32 {
        self.floors
            .iter()
            .fold(0u32, |acc, floor| acc.saturating_add(floor.capacity))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LibraryCatalog {
    libraries: Vec<Library>,
}

impl LibraryCatalog {
    #[must_use]
    pub fn new(libraries: Vec<Library>) -> Self {
        Self { libraries }
    }

    /// The four campus libraries the app ships with.
    #[must_use]
    pub fn builtin() -> Self {
        fn library(name: &str, capacities: [u32; 3]) -> Library {
            Library {
                name: name.to_string(),
                image_ref: SHAPIRO_IMAGE.to_string(),
                floors: vec![
                    Floor::new("First Floor", capacities[0]),
                    Floor::new("Second Floor", capacities[1]),
                    Floor::new("Third Floor", capacities[2]),
                ],
            }
        }

        Self::new(vec![
            library("Shapiro Undergraduate Library", [240, 180, 120]),
            library("Hatcher Undergraduate Library", [200, 160, 140]),
            library("Law Library", [150, 120, 90]),
            library("Duderstadt Undergraduate Library", [220, 180, 160]),
        ])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.libraries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.libraries.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Library> {
        self.libraries.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Library> {
        self.libraries.iter()
    }

    /// Case-insensitive lookup of a `(library, floor)` pair.
    #[must_use]
    pub fn find_floor(&self, library: &str, floor: &str) -> Option<(usize, &Floor)> {
        let (index, found) = self
            .libraries
            .iter()
            .enumerate()
            .find(|(_, lib)| lib.name.eq_ignore_ascii_case(library.trim()))?;
        let floor = found
            .floors
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(floor.trim()))?;
        Some((index, floor))
    }
}
