/// Level catalog: the ordered, immutable table of selectable levels.
///
/// The catalog is a plain `Vec<LevelDescriptor>`. Position in the vector
/// *is* the ordinal, assigned once at construction, so ordinals are always
/// `0..N-1` with no gaps. Navigation and unlock logic live in free
/// functions / methods over the table, never inside an entry.
///
/// ## Catalog file format (`levels.toml`):
///   ```toml
///   [[level]]
///   id = "tutorial"
///   map = "maps/tutorial.tmx"
///   preview = "tutorial"
///   name = "Tutorial"
///   cutscene = "intro"      # optional
///   ```
///
/// Entries are ordered as written. Map references, preview keys and
/// cutscene ids are opaque tokens.

use std::collections::HashSet;

use serde::Deserialize;
use thiserror::Error;

/// One selectable level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelDescriptor {
    pub id: String,
    pub map_reference: String,
    pub preview_key: String,
    pub display_name: String,
    pub intro_cutscene: Option<String>,
    pub ordinal: usize,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Direction {
    Previous,
    Next,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog has no levels")]
    Empty,
    #[error("duplicate level id `{0}`")]
    DuplicateId(String),
    #[error("duplicate map reference `{0}`")]
    DuplicateMap(String),
    #[error("catalog parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Raw level definition, before an ordinal is assigned.
#[derive(Clone, Debug, Deserialize)]
pub struct LevelDef {
    pub id: String,
    pub map: String,
    pub preview: String,
    pub name: String,
    #[serde(default)]
    pub cutscene: Option<String>,
}

#[derive(Deserialize)]
struct CatalogFile {
    #[serde(default)]
    level: Vec<LevelDef>,
}

#[derive(Clone, Debug)]
pub struct LevelCatalog {
    levels: Vec<LevelDescriptor>,
}

// ══════════════════════════════════════════════════════════════
// Construction
// ══════════════════════════════════════════════════════════════

impl LevelCatalog {
    pub fn new(defs: Vec<LevelDef>) -> Result<Self, CatalogError> {
        if defs.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut ids = HashSet::with_capacity(defs.len());
        let mut maps = HashSet::with_capacity(defs.len());
        let mut levels = Vec::with_capacity(defs.len());

        for (ordinal, def) in defs.into_iter().enumerate() {
            if !ids.insert(def.id.clone()) {
                return Err(CatalogError::DuplicateId(def.id));
            }
            if !maps.insert(def.map.clone()) {
                return Err(CatalogError::DuplicateMap(def.map));
            }
            levels.push(LevelDescriptor {
                id: def.id,
                map_reference: def.map,
                preview_key: def.preview,
                display_name: def.name,
                intro_cutscene: def.cutscene,
                ordinal,
            });
        }

        Ok(LevelCatalog { levels })
    }

    /// Parse a catalog from the `[[level]]` TOML format.
    pub fn from_toml(text: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = toml::from_str(text)?;
        Self::new(file.level)
    }

    /// The four levels shipped with the game.
    pub fn builtin() -> Self {
        let levels = BUILTIN
            .iter()
            .enumerate()
            .map(|(ordinal, &(id, preview, map, name, cutscene))| LevelDescriptor {
                id: id.to_string(),
                map_reference: format!("maps/{}", map),
                preview_key: preview.to_string(),
                display_name: name.to_string(),
                intro_cutscene: cutscene.map(str::to_string),
                ordinal,
            })
            .collect();
        LevelCatalog { levels }
    }
}

/// (id, preview, map file, display name, intro cutscene)
const BUILTIN: &[(&str, &str, &str, &str, Option<&str>)] = &[
    ("tutorial", "tutorial", "tutorial.tmx", "Tutorial", Some("intro")),
    ("level_1", "level1", "level1.tmx", "Level_1", None),
    ("level_2", "level2", "level2.tmx", "Level_2", Some("level2_intro")),
    ("level_3", "level3", "level3.tmx", "Level_3", Some("level3_intro")),
];

// ══════════════════════════════════════════════════════════════
// Lookups
// ══════════════════════════════════════════════════════════════

impl LevelCatalog {
    /// Entry point of the selection flow (ordinal 0).
    pub fn first(&self) -> &LevelDescriptor {
        // Non-empty by construction.
        &self.levels[0]
    }

    pub fn get(&self, ordinal: usize) -> Option<&LevelDescriptor> {
        self.levels.get(ordinal)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    #[cfg(test)]
    pub fn iter(&self) -> impl Iterator<Item = &LevelDescriptor> {
        self.levels.iter()
    }

    pub fn by_id(&self, id: &str) -> Option<&LevelDescriptor> {
        self.levels.iter().find(|l| l.id == id)
    }

    /// Exact-match lookup over map references.
    pub fn by_map_reference(&self, map: &str) -> Option<&LevelDescriptor> {
        self.levels.iter().find(|l| l.map_reference == map)
    }

    /// Does this map have a corresponding level?
    #[cfg(test)]
    pub fn contains_map(&self, map: &str) -> bool {
        self.by_map_reference(map).is_some()
    }

    /// Adjacent entry by ordinal. `None` at either boundary, or when
    /// `level` is not an entry of this catalog.
    pub fn neighbor(&self, level: &LevelDescriptor, dir: Direction) -> Option<&LevelDescriptor> {
        let own = self.levels.get(level.ordinal)?;
        if own != level {
            return None;
        }
        match dir {
            Direction::Previous => level.ordinal.checked_sub(1).and_then(|i| self.levels.get(i)),
            Direction::Next => self.levels.get(level.ordinal + 1),
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
