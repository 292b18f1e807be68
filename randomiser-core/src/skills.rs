use log::warn;
use std::collections::HashMap;

use crate::classes::{class_by_charclass, Capability, ClassCode};
use crate::table::{cell_int, Column, Table};
use crate::{RandomiserError, Result};

/// Stat formula columns that may reference other skills by name.
pub const FORMULA_COLUMNS: [&str; 3] = ["EDmgSymPerCalc", "ELenSymPerCalc", "DmgSymPerCalc"];

/// Weapon item-type columns a skill can be restricted by.
pub const WEAPON_TYPE_COLUMNS: [&str; 4] = ["passiveitype", "itypea1", "itypea2", "itypea3"];

pub const MAX_SYNERGY_SLOTS: usize = 7;

/// One class ability, read from the skills table.
#[derive(Clone, Debug, PartialEq)]
pub struct SkillDefinition {
    pub id: i64,
    pub name: String,
    pub origin: ClassCode,
    /// Key into the descriptor table.
    pub descriptor: String,
    pub required_level: u32,
    /// `(column name, formula)` for every non-empty formula column.
    pub formulas: Vec<(&'static str, String)>,
    /// `(column name, item type)` for every non-empty weapon-type column.
    pub weapon_types: Vec<(&'static str, String)>,
    pub requires: Vec<Capability>,
}

impl SkillDefinition {
    /// Pinned skills need something only their origin class can do and
    /// never leave it.
    pub fn is_pinned(&self) -> bool {
        !self.requires.is_empty()
    }
}

/// Display metadata for one skill, keyed by the shared descriptor name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkillDescriptor {
    pub key: String,
    pub page: u8,
    pub row: u8,
    pub col: u8,
    pub icon_index: u32,
    /// The `str name` string key.
    pub str_name: String,
    /// Contiguous non-empty synergy display references (`dsc3textb1..7`).
    pub synergy_refs: Vec<String>,
}

/// Extract every class skill (non-empty, known `charclass`) in table order.
pub fn read_skill_definitions(skills: &Table) -> Result<Vec<SkillDefinition>> {
    let schema = skills.schema();
    let name_col = schema
        .column_or("skill", 0)
        .ok_or_else(|| RandomiserError::MissingInput("skills table is empty".to_string()))?;
    let class_col = schema.column_or("charclass", 2).ok_or_else(|| {
        RandomiserError::MissingInput("skills table has no charclass column".to_string())
    })?;
    let id_col = schema.column("*Id").or_else(|| schema.column("Id"));
    let desc_col = schema.column("skilldesc");
    let level_col = schema.column("reqlevel");
    let weapsel_col = schema.column("weapsel");
    let restrict_col = schema.column("restrict");
    let offhand_col = schema.column("itypeb1");

    let formula_cols: Vec<_> = FORMULA_COLUMNS
        .iter()
        .filter_map(|n| schema.column(n).map(|c| (*n, c)))
        .collect();
    let weapon_cols: Vec<_> = WEAPON_TYPE_COLUMNS
        .iter()
        .filter_map(|n| schema.column(n).map(|c| (*n, c)))
        .collect();

    let mut out = Vec::new();
    for row in 0..skills.len() {
        let charclass = skills.get(row, class_col);
        if charclass.trim().is_empty() {
            continue;
        }
        let Some(class) = class_by_charclass(charclass) else {
            warn!(
                "skill '{}' has unknown charclass '{}', not shuffled",
                skills.get(row, name_col),
                charclass
            );
            continue;
        };

        let get = move |col: Option<Column>| col.map(|c| skills.get(row, c)).unwrap_or("");

        let mut requires = Vec::new();
        if cell_int(get(weapsel_col)) == Some(3) {
            requires.push(Capability::DualWield);
        }
        if matches!(get(offhand_col).trim(), "h2h" | "h2h2") {
            requires.push(Capability::OffHandClaw);
        }
        if cell_int(get(restrict_col)) == Some(2) {
            requires.push(Capability::Shapeshift);
        }

        out.push(SkillDefinition {
            id: cell_int(get(id_col)).unwrap_or(row as i64),
            name: skills.get(row, name_col).to_string(),
            origin: class.code,
            descriptor: get(desc_col).to_string(),
            required_level: cell_int(get(level_col))
                .filter(|&l| l > 0)
                .map(|l| l as u32)
                .unwrap_or(1),
            formulas: formula_cols
                .iter()
                .filter(|(_, c)| !skills.get(row, *c).is_empty())
                .map(|(n, c)| (*n, skills.get(row, *c).to_string()))
                .collect(),
            weapon_types: weapon_cols
                .iter()
                .filter(|(_, c)| !skills.get(row, *c).trim().is_empty())
                .map(|(n, c)| (*n, skills.get(row, *c).trim().to_string()))
                .collect(),
            requires,
        });
    }

    if out.is_empty() {
        return Err(RandomiserError::MissingInput(
            "skills table contains no class skills".to_string(),
        ));
    }
    Ok(out)
}

pub fn read_skill_descriptors(table: &Table) -> Result<HashMap<String, SkillDescriptor>> {
    let schema = table.schema();
    let key_col = schema
        .column_or("skilldesc", 0)
        .ok_or_else(|| RandomiserError::MissingInput("skilldesc table is empty".to_string()))?;
    let page_col = schema.column("SkillPage");
    let row_col = schema.column("SkillRow");
    let col_col = schema.column("SkillColumn");
    let icon_col = schema.column("IconCel");
    let str_col = schema.column("str name");
    let textb_cols: Vec<_> = (1..=MAX_SYNERGY_SLOTS)
        .map(|i| schema.column(&format!("dsc3textb{i}")))
        .collect();

    let mut out = HashMap::new();
    for row in 0..table.len() {
        let key = table.get(row, key_col);
        if key.is_empty() {
            continue;
        }
        let num = move |col: Option<Column>| {
            col.and_then(|c| cell_int(table.get(row, c))).unwrap_or(0)
        };

        let mut synergy_refs = Vec::new();
        for col in &textb_cols {
            match col.map(|c| table.get(row, c)) {
                Some(v) if !v.is_empty() => synergy_refs.push(v.to_string()),
                _ => break,
            }
        }

        out.insert(
            key.to_string(),
            SkillDescriptor {
                key: key.to_string(),
                page: num(page_col).clamp(0, u8::MAX as i64) as u8,
                row: num(row_col).clamp(0, u8::MAX as i64) as u8,
                col: num(col_col).clamp(0, u8::MAX as i64) as u8,
                icon_index: num(icon_col).max(0) as u32,
                str_name: str_col.map(|c| table.get(row, c).to_string()).unwrap_or_default(),
                synergy_refs,
            },
        );
    }
    Ok(out)
}
