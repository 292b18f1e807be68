use serde::{Deserialize, Serialize};

/// Capabilities a skill can require of the class that uses it.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Capability {
    DualWield,
    Shapeshift,
    OffHandClaw,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassCode {
    Ama,
    Sor,
    Nec,
    Pal,
    Bar,
    Dru,
    Ass,
    War,
}

#[derive(Debug)]
pub struct ClassDefinition {
    pub code: ClassCode,
    pub name: &'static str,
    /// Value of the `charclass` column in the skills table.
    pub charclass: &'static str,
    pub sprite_prefix: &'static str,
    pub icon_folder: &'static str,
    /// Folder under `ui/spells/` in the packaged mod.
    pub spell_folder: &'static str,
    pub capabilities: &'static [Capability],
    pub natural_weapon: &'static str,
}

impl ClassDefinition {
    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}

pub static CLASSES: [ClassDefinition; 8] = [
    ClassDefinition {
        code: ClassCode::Ama,
        name: "Amazon",
        charclass: "ama",
        sprite_prefix: "am",
        icon_folder: "Amazon",
        spell_folder: "amazon",
        capabilities: &[],
        natural_weapon: "miss",
    },
    ClassDefinition {
        code: ClassCode::Sor,
        name: "Sorceress",
        charclass: "sor",
        sprite_prefix: "so",
        icon_folder: "Sorceress",
        spell_folder: "sorceress",
        capabilities: &[],
        natural_weapon: "staf",
    },
    ClassDefinition {
        code: ClassCode::Nec,
        name: "Necromancer",
        charclass: "nec",
        sprite_prefix: "ne",
        icon_folder: "Necro",
        spell_folder: "necromancer",
        capabilities: &[],
        natural_weapon: "wand",
    },
    ClassDefinition {
        code: ClassCode::Pal,
        name: "Paladin",
        charclass: "pal",
        sprite_prefix: "pa",
        icon_folder: "Paladin",
        spell_folder: "paladin",
        capabilities: &[],
        natural_weapon: "mele",
    },
    ClassDefinition {
        code: ClassCode::Bar,
        name: "Barbarian",
        charclass: "bar",
        sprite_prefix: "ba",
        icon_folder: "Barbarian",
        spell_folder: "barbarian",
        capabilities: &[Capability::DualWield],
        natural_weapon: "mele",
    },
    ClassDefinition {
        code: ClassCode::Dru,
        name: "Druid",
        charclass: "dru",
        sprite_prefix: "dr",
        icon_folder: "Druid",
        spell_folder: "druid",
        capabilities: &[Capability::Shapeshift],
        natural_weapon: "mele",
    },
    ClassDefinition {
        code: ClassCode::Ass,
        name: "Assassin",
        charclass: "ass",
        sprite_prefix: "as",
        icon_folder: "Assassin",
        spell_folder: "assassin",
        capabilities: &[Capability::DualWield, Capability::OffHandClaw],
        natural_weapon: "h2h",
    },
    ClassDefinition {
        code: ClassCode::War,
        name: "Warlock",
        charclass: "war",
        sprite_prefix: "wa",
        icon_folder: "Warlock",
        spell_folder: "warlock",
        capabilities: &[],
        natural_weapon: "weap",
    },
];

pub const GRID_ROWS: u8 = 6;
pub const GRID_COLS: u8 = 3;
pub const TABS_PER_CLASS: usize = 3;
pub const SKILLS_PER_CLASS: usize = 30;

/// Required level for each grid row, index 0 = row 1.
pub const ROW_TIERS: [u32; 6] = [1, 6, 12, 18, 24, 30];

/// Weapon item types only one class can equip.
pub const CLASS_RESTRICTED_WEAPON_TYPES: &[&str] = &["h2h", "h2h2"];

pub fn class(code: ClassCode) -> &'static ClassDefinition {
    // CLASSES is declared in ClassCode order.
    &CLASSES[code as usize]
}

pub fn class_by_charclass(charclass: &str) -> Option<&'static ClassDefinition> {
    CLASSES
        .iter()
        .find(|c| c.charclass.eq_ignore_ascii_case(charclass.trim()))
}

pub fn class_by_name(name: &str) -> Option<&'static ClassDefinition> {
    CLASSES.iter().find(|c| c.name == name)
}

/// Tier (required level) for a 1-based grid row. Rows outside 1..=6 fall
/// back to tier 1.
pub fn tier_for_row(row: u8) -> u32 {
    match row {
        1..=6 => ROW_TIERS[(row - 1) as usize],
        _ => ROW_TIERS[0],
    }
}
