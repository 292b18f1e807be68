use log::{debug, info};

use crate::table::{scale_cell, Column, Schema, Table};
use crate::ActSet;

pub const ACT_COUNT: u8 = 5;

pub(crate) const HP_COLUMNS: &[&str] = &["minHP", "maxHP", "MinHP(N)", "MaxHP(N)", "MinHP(H)", "MaxHP(H)"];
pub(crate) const EXP_COLUMNS: &[&str] = &["Exp", "Exp(N)", "Exp(H)"];
pub(crate) const DAMAGE_COLUMNS: &[&str] = &[
    "A1MinD", "A1MaxD", "A2MinD", "A2MaxD", "S1MinD", "S1MaxD",
    "A1MinD(N)", "A1MaxD(N)", "A2MinD(N)", "A2MaxD(N)", "S1MinD(N)", "S1MaxD(N)",
    "A1MinD(H)", "A1MaxD(H)", "A2MinD(H)", "A2MaxD(H)", "S1MinD(H)", "S1MaxD(H)",
];
pub(crate) const HIT_COLUMNS: &[&str] = &[
    "A1TH", "A2TH", "S1TH",
    "A1TH(N)", "A2TH(N)", "S1TH(N)",
    "A1TH(H)", "A2TH(H)", "S1TH(H)",
];
pub(crate) const AC_COLUMNS: &[&str] = &["AC", "AC(N)", "AC(H)"];
pub(crate) const LEVEL_COLUMNS: &[&str] = &["Level", "Level(N)", "Level(H)"];
pub(crate) const TREASURE_CLASS_COLUMNS: &[&str] = &[
    "TreasureClass", "TreasureClassChamp", "TreasureClassUnique", "TreasureClassQuest",
    "TreasureClassDesecrated", "TreasureClassDesecratedChamp", "TreasureClassDesecratedUnique",
    "TreasureClassHerald",
    "TreasureClass(N)", "TreasureClassChamp(N)", "TreasureClassUnique(N)", "TreasureClassQuest(N)",
    "TreasureClassDesecrated(N)", "TreasureClassDesecratedChamp(N)", "TreasureClassDesecratedUnique(N)",
    "TreasureClassHerald(N)",
    "TreasureClass(H)", "TreasureClassChamp(H)", "TreasureClassUnique(H)", "TreasureClassQuest(H)",
    "TreasureClassDesecrated(H)", "TreasureClassDesecratedChamp(H)", "TreasureClassDesecratedUnique(H)",
    "TreasureClassHerald(H)",
];

/// Monsters whose treasure class carries no act prefix.
const BOSS_ACTS: &[(&str, u8)] = &[
    ("andariel", 1), ("bloodraven", 1), ("griswold", 1), ("smith", 1),
    ("quillrat1", 1), ("quillrat2", 1), ("quillrat3", 1), ("quillrat4", 1),
    ("quillrat5", 1), ("quillrat6", 1), ("quillrat7", 1), ("quillrat8", 1),
    ("radament", 2), ("duriel", 2), ("summoner", 2), ("flyingscimitar", 2),
    ("swarm1", 2), ("swarm2", 2), ("swarm3", 2), ("swarm4", 2), ("swarm5", 2),
    ("vulture1", 2), ("vulture2", 2), ("vulture3", 2), ("vulture4", 2), ("vulture5", 2),
    ("maggotegg1", 2), ("maggotegg2", 2), ("maggotegg3", 2), ("maggotegg4", 2),
    ("maggotegg5", 2), ("maggotegg6", 2), ("sarcophagus", 2),
    ("mephisto", 3), ("councilmember1", 3), ("councilmember2", 3), ("councilmember3", 3),
    ("mosquito1", 3), ("mosquito2", 3), ("mosquito3", 3), ("mosquito4", 3),
    ("tentacle1", 3), ("tentacle2", 3), ("tentacle3", 3),
    ("tentaclehead1", 3), ("tentaclehead2", 3), ("tentaclehead3", 3),
    ("compellingorb", 3),
    ("diablo", 4), ("izual", 4), ("hephasto", 4),
    ("trappedsoul1", 4), ("trappedsoul2", 4), ("mephistospirit", 4),
    ("lightningspire", 4), ("firetower", 4), ("wakeofdestruction", 4),
    ("suicideminion1", 4), ("suicideminion2", 4), ("suicideminion3", 4),
    ("suicideminion4", 4), ("suicideminion5", 4), ("suicideminion6", 4),
    ("suicideminion7", 4), ("suicideminion8", 4), ("suicideminion9", 4),
    ("suicideminion10", 4), ("suicideminion11", 4),
    ("baalcrab", 5), ("nihlathakboss", 5), ("baalthrone", 5), ("baalclone", 5),
    ("baaltentacle1", 5), ("baaltentacle2", 5), ("baaltentacle3", 5),
    ("baaltentacle4", 5), ("baaltentacle5", 5),
    ("ancientbarb1", 5), ("ancientbarb2", 5), ("ancientbarb3", 5),
    ("painworm1", 5), ("painworm2", 5), ("painworm3", 5), ("painworm4", 5), ("painworm5", 5),
    ("act5pow", 5),
];

pub fn boss_act(id: &str) -> Option<u8> {
    BOSS_ACTS
        .iter()
        .find(|(name, _)| *name == id.trim())
        .map(|(_, act)| *act)
}

/// Act number from an `Act k...` treasure-class prefix.
pub fn treasure_class_act(tc: &str) -> Option<u8> {
    let rest = tc.strip_prefix("Act ")?;
    let digit = rest.chars().next()?.to_digit(10)? as u8;
    (1..=ACT_COUNT).contains(&digit).then_some(digit)
}

/// Resolved monstats columns, looked up once per table.
pub(crate) struct MonsterColumns {
    pub id: Option<Column>,
    pub treasure_class: Option<Column>,
    pub hp: Vec<Column>,
    pub exp: Vec<Column>,
    pub damage: Vec<Column>,
    pub hit: Vec<Column>,
    pub ac: Vec<Column>,
    pub level: Vec<Column>,
    pub treasure_classes: Vec<Column>,
}

impl MonsterColumns {
    pub fn resolve(schema: &Schema) -> Self {
        Self {
            id: schema.column_or("Id", 0),
            treasure_class: schema.column("TreasureClass"),
            hp: schema.columns(HP_COLUMNS),
            exp: schema.columns(EXP_COLUMNS),
            damage: schema.columns(DAMAGE_COLUMNS),
            hit: schema.columns(HIT_COLUMNS),
            ac: schema.columns(AC_COLUMNS),
            level: schema.columns(LEVEL_COLUMNS),
            treasure_classes: schema.columns(TREASURE_CLASS_COLUMNS),
        }
    }

    pub fn is_boss(&self, table: &Table, row: usize) -> bool {
        self.id
            .map(|c| boss_act(table.get(row, c)).is_some())
            .unwrap_or(false)
    }

    /// Treasure-class prefix first, then the boss table.
    pub fn act_of(&self, table: &Table, row: usize) -> Option<u8> {
        self.treasure_class
            .and_then(|c| treasure_class_act(table.get(row, c)))
            .or_else(|| self.id.and_then(|c| boss_act(table.get(row, c))))
    }
}

/// Multiply every listed cell in `row`. Sentinels stay as they are. Returns
/// how many non-empty cells were left alone.
pub(crate) fn scale_row(table: &mut Table, row: usize, cols: &[Column], factor: f64) -> usize {
    let mut skipped = 0;
    for &col in cols {
        match scale_cell(table.get(row, col), factor) {
            Some(v) => table.set(row, col, v),
            None if !table.get(row, col).trim().is_empty() => skipped += 1,
            None => {}
        }
    }
    skipped
}

pub fn hp_multiplier(players: u8) -> f64 {
    (players as f64 + 1.0) / 2.0
}

pub fn damage_multiplier(players: u8) -> f64 {
    1.0 + (players as f64 - 1.0) / 16.0
}

/// Simulate a higher player count for monsters of the enabled acts.
/// Monsters with no act affiliation or in a disabled act are untouched.
pub fn scale_players(monstats: &mut Table, players: u8, acts: &ActSet) {
    let cols = MonsterColumns::resolve(&monstats.schema());
    let hp = hp_multiplier(players);
    let dmg = damage_multiplier(players);
    let damage_cols: Vec<Column> = cols.damage.iter().chain(&cols.hit).copied().collect();

    let mut scaled = 0;
    let mut skipped = 0;
    for row in 0..monstats.len() {
        let Some(act) = cols.act_of(monstats, row) else {
            continue;
        };
        if !acts.contains(act) {
            continue;
        }
        skipped += scale_row(monstats, row, &cols.hp, hp);
        skipped += scale_row(monstats, row, &cols.exp, hp);
        skipped += scale_row(monstats, row, &damage_cols, dmg);
        scaled += 1;
    }
    debug!("players scaling left {skipped} sentinel cells");
    info!("players {players}: scaled {scaled} monsters (hp x{hp}, damage x{dmg})");
}
