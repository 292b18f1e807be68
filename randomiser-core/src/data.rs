use log::{debug, info};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use crate::layout::{parse_layout_pages, LayoutPage};
use crate::skills::{read_skill_definitions, read_skill_descriptors, SkillDefinition, SkillDescriptor};
use crate::strings::StringTable;
use crate::table::Table;
use crate::{RandomiserError, Result};

/// Every tab-delimited table the randomiser reads or rewrites.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TableKind {
    Skills,
    SkillDesc,
    MonStats,
    ActInfo,
    Levels,
    LvlTypes,
    Hireling,
    MonPreset,
    ObjPreset,
    SuperUniques,
    CharStats,
    UniqueItems,
}

impl TableKind {
    pub const ALL: [TableKind; 12] = [
        TableKind::Skills,
        TableKind::SkillDesc,
        TableKind::MonStats,
        TableKind::ActInfo,
        TableKind::Levels,
        TableKind::LvlTypes,
        TableKind::Hireling,
        TableKind::MonPreset,
        TableKind::ObjPreset,
        TableKind::SuperUniques,
        TableKind::CharStats,
        TableKind::UniqueItems,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            TableKind::Skills => "skills.txt",
            TableKind::SkillDesc => "skilldesc.txt",
            TableKind::MonStats => "monstats.txt",
            TableKind::ActInfo => "actinfo.txt",
            TableKind::Levels => "levels.txt",
            TableKind::LvlTypes => "lvltypes.txt",
            TableKind::Hireling => "hireling.txt",
            TableKind::MonPreset => "monpreset.txt",
            TableKind::ObjPreset => "objpreset.txt",
            TableKind::SuperUniques => "superuniques.txt",
            TableKind::CharStats => "charstats.txt",
            TableKind::UniqueItems => "uniqueitems.txt",
        }
    }

    pub fn is_required(self) -> bool {
        matches!(self, TableKind::Skills | TableKind::SkillDesc)
    }
}

pub const GRID_FILE: &str = "skill_tree_grid.csv";
pub const TABLE_DIR: &str = "txt";
pub const SKILL_STRINGS_FILE: &str = "local/strings/skills.json";
pub const ITEM_NAME_STRINGS_FILE: &str = "local/strings/item-names.json";

/// Immutable inputs shared by every run.
#[derive(Clone, Debug)]
pub struct GameData {
    pub pages: Vec<LayoutPage>,
    pub skills: Vec<SkillDefinition>,
    pub descriptors: HashMap<String, SkillDescriptor>,
    pub tables: BTreeMap<TableKind, Table>,
    pub skill_strings: Option<StringTable>,
    pub item_names: Option<StringTable>,
}

impl GameData {
    /// Build from already-read inputs. The grid and the skills and skilldesc
    /// tables are required.
    pub fn from_parts(
        grid: &str,
        tables: BTreeMap<TableKind, Table>,
        skill_strings: Option<StringTable>,
        item_names: Option<StringTable>,
    ) -> Result<Self> {
        for kind in TableKind::ALL.iter().filter(|k| k.is_required()) {
            if !tables.contains_key(kind) {
                return Err(RandomiserError::MissingInput(kind.file_name().to_string()));
            }
        }
        let pages = parse_layout_pages(grid)?;
        let skills = read_skill_definitions(&tables[&TableKind::Skills])?;
        let descriptors = read_skill_descriptors(&tables[&TableKind::SkillDesc])?;
        debug!(
            "{} grid pages, {} class skills, {} descriptors",
            pages.len(),
            skills.len(),
            descriptors.len()
        );

        Ok(Self {
            pages,
            skills,
            descriptors,
            tables,
            skill_strings,
            item_names,
        })
    }

    /// Read `skill_tree_grid.csv`, `txt/*.txt` and `local/strings/*.json`
    /// under `dir`. Optional tables that are absent are simply not rewritten.
    pub fn load(dir: &Path) -> Result<Self> {
        let grid_path = dir.join(GRID_FILE);
        let grid = fs::read_to_string(&grid_path)
            .map_err(|_| RandomiserError::MissingInput(grid_path.display().to_string()))?;

        let mut tables = BTreeMap::new();
        for kind in TableKind::ALL {
            let path = dir.join(TABLE_DIR).join(kind.file_name());
            match fs::read(&path) {
                Ok(bytes) => {
                    let text = String::from_utf8_lossy(&bytes);
                    tables.insert(kind, Table::parse(&text));
                }
                Err(_) if kind.is_required() => {
                    return Err(RandomiserError::MissingInput(path.display().to_string()));
                }
                Err(_) => debug!("{} not present, not rewritten", kind.file_name()),
            }
        }

        let read_strings = |rel: &str| -> Result<Option<StringTable>> {
            match fs::read_to_string(dir.join(rel)) {
                Ok(text) => Ok(Some(StringTable::parse(&text)?)),
                Err(_) => Ok(None),
            }
        };
        let skill_strings = read_strings(SKILL_STRINGS_FILE)?;
        let item_names = read_strings(ITEM_NAME_STRINGS_FILE)?;

        info!("loaded {} tables from {}", tables.len(), dir.display());
        Self::from_parts(&grid, tables, skill_strings, item_names)
    }

    pub fn table(&self, kind: TableKind) -> Option<&Table> {
        self.tables.get(&kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn missing_required_table_is_fatal() {
        let mut tables = BTreeMap::new();
        tables.insert(TableKind::Skills, fixtures::table(TableKind::Skills));
        let err = GameData::from_parts(&fixtures::grid_text(), tables, None, None).unwrap_err();
        assert!(matches!(err, RandomiserError::MissingInput(ref s) if s == "skilldesc.txt"));
    }

    #[test]
    fn loads_every_table_present() {
        let data = fixtures::game_data();
        assert_eq!(data.pages.len(), 24);
        assert_eq!(data.skills.len(), 240);
        assert_eq!(data.descriptors.len(), 241);
        assert_eq!(data.tables.len(), TableKind::ALL.len());
        assert!(data.skill_strings.is_some());
        assert_eq!(data.item_names.as_ref().map(|t| t.len()), Some(3));
    }

    #[test]
    fn optional_tables_may_be_absent() {
        let dir = tempfile::tempdir().unwrap();
        let src = fixtures::fixture_dir();
        fs::create_dir_all(dir.path().join(TABLE_DIR)).unwrap();
        fs::copy(src.join(GRID_FILE), dir.path().join(GRID_FILE)).unwrap();
        for kind in [TableKind::Skills, TableKind::SkillDesc] {
            let rel = Path::new(TABLE_DIR).join(kind.file_name());
            fs::copy(src.join(&rel), dir.path().join(&rel)).unwrap();
        }
        let data = GameData::load(dir.path()).unwrap();
        assert_eq!(data.tables.len(), 2);
        assert!(data.table(TableKind::MonStats).is_none());
        assert!(data.skill_strings.is_none());
    }

    #[test]
    fn missing_grid_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            GameData::load(dir.path()),
            Err(RandomiserError::MissingInput(_))
        ));
    }
}
