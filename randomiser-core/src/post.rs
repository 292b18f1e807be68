//! Optional rewrites layered on top of the placed trees: start skills,
//! weapon-type fixes, tab titles and the starting staff.

use log::{debug, info, warn};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::classes::{class, class_by_charclass, class_by_name, ClassCode, CLASSES, CLASS_RESTRICTED_WEAPON_TYPES, ROW_TIERS};
use crate::data::TableKind;
use crate::placement::Placement;
use crate::rng::SeededRng;
use crate::skills::SkillDescriptor;
use crate::strings::{StringEntry, StringTable};
use crate::table::{Column, Table};
use crate::{LogicMode, RandomiserSettings};

/// The mutable half of a run: every table and string file the run emits.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModTables {
    pub tables: BTreeMap<TableKind, Table>,
    pub skill_strings: Option<StringTable>,
    pub item_names: Option<StringTable>,
}

impl ModTables {
    pub fn table_mut(&mut self, kind: TableKind) -> Option<&mut Table> {
        self.tables.get_mut(&kind)
    }
}

/// Read-only facts a post-step may consult.
pub struct PostContext<'a> {
    pub placements: &'a [Placement],
    pub descriptors: &'a HashMap<String, SkillDescriptor>,
}

pub trait PostStep {
    fn name(&self) -> &'static str;
    fn apply(&self, rng: &mut SeededRng, ctx: &PostContext<'_>, out: &mut ModTables);
}

/// The steps a run's settings enable, in the order they must run.
pub fn post_steps(settings: &RandomiserSettings) -> Vec<Box<dyn PostStep>> {
    let mut steps: Vec<Box<dyn PostStep>> = Vec::new();
    if settings.logic == LogicMode::Normal {
        steps.push(Box::new(WeaponRemap));
    }
    steps.push(Box::new(TabLabels));
    steps.push(Box::new(StartSkill));
    if let Some(items) = &settings.starting_items {
        steps.push(Box::new(StartingItems { level: items.level }));
    }
    steps
}

pub fn run_post_steps(
    steps: &[Box<dyn PostStep>],
    rng: &mut SeededRng,
    ctx: &PostContext<'_>,
    out: &mut ModTables,
) {
    for step in steps {
        debug!("post-step: {}", step.name());
        step.apply(rng, ctx, out);
    }
}

// ---------------------------------------------------------------------------
// Start skill

/// Give every class one of its first-row skills to start with.
pub struct StartSkill;

impl PostStep for StartSkill {
    fn name(&self) -> &'static str {
        "start skill"
    }

    fn apply(&self, rng: &mut SeededRng, _ctx: &PostContext<'_>, out: &mut ModTables) {
        let Some(skills) = out.tables.get(&TableKind::Skills) else {
            return;
        };
        let candidates = first_tier_skills(skills);

        let Some(charstats) = out.table_mut(TableKind::CharStats) else {
            return;
        };
        let schema = charstats.schema();
        let (Some(class_col), Some(start_col)) = (schema.column("class"), schema.column("StartSkill")) else {
            warn!("charstats has no class/StartSkill column; start skills unchanged");
            return;
        };

        for row in 0..charstats.len() {
            let Some(def) = class_by_name(charstats.get(row, class_col)) else {
                continue;
            };
            let pick = match candidates.get(&def.code) {
                Some(list) if !list.is_empty() => list[rng.rand_int(0, list.len() - 1)].clone(),
                _ => {
                    warn!("{} has no first-row skill to start with", def.name);
                    String::new()
                }
            };
            debug!("{} starts with '{pick}'", def.name);
            charstats.set(row, start_col, pick);
        }
    }
}

/// Skills now at the first tier, per class, in skills-table order.
fn first_tier_skills(skills: &Table) -> HashMap<ClassCode, Vec<String>> {
    let schema = skills.schema();
    let (Some(name_col), Some(class_col), Some(level_col)) = (
        schema.column_or("skill", 0),
        schema.column_or("charclass", 2),
        schema.column_or("reqlevel", 174),
    ) else {
        return HashMap::new();
    };
    let first_tier = ROW_TIERS[0].to_string();

    let mut out: HashMap<ClassCode, Vec<String>> = HashMap::new();
    for row in 0..skills.len() {
        if skills.get(row, level_col) != first_tier {
            continue;
        }
        if let Some(def) = class_by_charclass(skills.get(row, class_col)) {
            out.entry(def.code)
                .or_default()
                .push(skills.get(row, name_col).to_string());
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Weapon types

struct WeaponTypeText {
    code: &'static str,
    name: &'static str,
    phrase: &'static str,
}

const WEAPON_TYPE_TEXT: &[WeaponTypeText] = &[
    WeaponTypeText { code: "h2h", name: "Claw", phrase: "claw class weapons" },
    WeaponTypeText { code: "mele", name: "Melee", phrase: "melee weapons" },
    WeaponTypeText { code: "miss", name: "Missile", phrase: "missile weapons" },
    WeaponTypeText { code: "staf", name: "Staff", phrase: "staves" },
    WeaponTypeText { code: "wand", name: "Wand", phrase: "wands" },
    WeaponTypeText { code: "weap", name: "Weapon", phrase: "weapons" },
];

fn weapon_text(code: &str) -> Option<&'static WeaponTypeText> {
    WEAPON_TYPE_TEXT.iter().find(|w| w.code == code)
}

/// Skills restricted to a weapon only their old class could use are
/// pointed at their new class's weapon, and their text follows.
pub struct WeaponRemap;

impl WeaponRemap {
    /// First weapon type on `p` that its new class cannot satisfy.
    fn foreign_weapon(p: &Placement) -> Option<&str> {
        let natural = class(p.target).natural_weapon;
        p.skill
            .weapon_types
            .iter()
            .map(|(_, t)| t.as_str())
            .find(|t| CLASS_RESTRICTED_WEAPON_TYPES.contains(t) && *t != natural)
    }

    fn rewrite_columns(skills: &mut Table, placements: &[&Placement]) {
        let schema = skills.schema();
        let Some(name_col) = schema.column_or("skill", 0) else {
            return;
        };
        let mut rows: HashMap<String, usize> = HashMap::new();
        for row in 0..skills.len() {
            rows.entry(skills.get(row, name_col).to_string()).or_insert(row);
        }

        for p in placements {
            let Some(&row) = rows.get(&p.skill.name) else {
                continue;
            };
            let natural = class(p.target).natural_weapon;
            for (column, value) in &p.skill.weapon_types {
                if !CLASS_RESTRICTED_WEAPON_TYPES.contains(&value.as_str()) || value == natural {
                    continue;
                }
                if let Some(col) = schema.column(column) {
                    skills.set(row, col, natural);
                }
            }
        }
    }

    fn rewrite_strings(
        strings: &mut StringTable,
        placements: &[&Placement],
        descriptors: &HashMap<String, SkillDescriptor>,
    ) {
        let mut done: HashSet<&str> = HashSet::new();
        for p in placements {
            if !done.insert(&p.skill.name) {
                continue;
            }
            let (Some(old), Some(new)) = (
                Self::foreign_weapon(p).and_then(weapon_text),
                weapon_text(class(p.target).natural_weapon),
            ) else {
                continue;
            };
            let Some(number) = descriptors
                .get(&p.skill.descriptor)
                .and_then(|d| numeric_suffix(&d.str_name))
            else {
                continue;
            };

            for prefix in ["skillname", "skillan", "skillsd", "skillld"] {
                let Some(entry) = strings.get_mut(&format!("{prefix}{number}")) else {
                    continue;
                };
                let mut text = entry.en_us.replace(old.phrase, new.phrase);
                if prefix == "skillname" || prefix == "skillan" {
                    text = replace_word(&text, old.name, new.name);
                }
                entry.en_us = text;
            }
        }
    }
}

impl PostStep for WeaponRemap {
    fn name(&self) -> &'static str {
        "weapon remap"
    }

    fn apply(&self, _rng: &mut SeededRng, ctx: &PostContext<'_>, out: &mut ModTables) {
        let affected: Vec<&Placement> = ctx
            .placements
            .iter()
            .filter(|p| Self::foreign_weapon(p).is_some())
            .collect();
        info!("{} skills moved off their class weapon", affected.len());

        if let Some(skills) = out.table_mut(TableKind::Skills) {
            Self::rewrite_columns(skills, &affected);
        }
        if let Some(strings) = out.skill_strings.as_mut() {
            Self::rewrite_strings(strings, &affected, ctx.descriptors);
        }
    }
}

fn numeric_suffix(s: &str) -> Option<&str> {
    let start = s.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    (start < s.len()).then(|| &s[start..])
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Replace whole-word occurrences of `word`.
fn replace_word(text: &str, word: &str, with: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    let mut prev: Option<char> = None;
    while let Some(pos) = rest.find(word) {
        let before = rest[..pos].chars().next_back().or(prev);
        let after = rest[pos + word.len()..].chars().next();
        out.push_str(&rest[..pos]);
        if before.map_or(true, |c| !is_word_char(c)) && after.map_or(true, |c| !is_word_char(c)) {
            out.push_str(with);
        } else {
            out.push_str(word);
        }
        prev = word.chars().next_back();
        rest = &rest[pos + word.len()..];
    }
    out.push_str(rest);
    out
}

// ---------------------------------------------------------------------------
// Tab labels

/// Rename every class's three tabs to "Random 1..3". Warlock tabs count
/// the other way.
pub struct TabLabels;

impl PostStep for TabLabels {
    fn name(&self) -> &'static str {
        "tab labels"
    }

    fn apply(&self, _rng: &mut SeededRng, _ctx: &PostContext<'_>, out: &mut ModTables) {
        let Some(strings) = out.skill_strings.as_mut() else {
            return;
        };
        let mut renamed = 0;
        for def in CLASSES.iter() {
            let prefix = capitalize(def.sprite_prefix);
            for tab in 1..=3u8 {
                let label = match def.code {
                    ClassCode::War => 4 - tab,
                    _ => tab,
                };
                if let Some(entry) = strings.get_mut(&format!("SkillCategory{prefix}{tab}")) {
                    entry.en_us = format!("Random {label}");
                    renamed += 1;
                }
            }
        }
        debug!("{renamed} tab labels renamed");
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Starting staff

pub const STAFF_CODE: &str = "sst";
pub const STAFF_UNIQUE: &str = "Astral Wayfarer";
const REPLACED_UNIQUE: &str = "Bane Ash";
const ITEM_SLOTS: u8 = 10;
const UNIQUE_QUALITY: &str = "7";
const TELEPORT_SKILL_ID: &str = "54";
const TELEPORT_CHARGES: &str = "20";
const ITEM_NAME_ID: i64 = 99999;
const LANGUAGES: &[&str] = &[
    "zhTW", "deDE", "esES", "frFR", "itIT", "koKR", "plPL", "esMX", "jaJP", "ptBR", "ruRU", "zhCN",
];

/// Put a unique teleport staff in every class's starting inventory.
pub struct StartingItems {
    pub level: u32,
}

impl StartingItems {
    fn give_staff(charstats: &mut Table) {
        let schema = charstats.schema();
        let Some(class_col) = schema.column("class") else {
            warn!("charstats has no class column; no starting staff");
            return;
        };
        let class_rows: Vec<usize> = (0..charstats.len())
            .filter(|&r| class_by_name(charstats.get(r, class_col)).is_some())
            .collect();

        let free = (1..=ITEM_SLOTS).find_map(|n| {
            let col = schema.column(&format!("item{n}"))?;
            class_rows
                .iter()
                .all(|&r| matches!(charstats.get(r, col).trim(), "" | "0"))
                .then_some((n, col))
        });
        let Some((slot, item_col)) = free else {
            warn!("no item slot is free for every class; no starting staff");
            return;
        };

        let extra: [(Option<Column>, &str); 3] = [
            (schema.column(&format!("item{slot}loc")), ""),
            (schema.column(&format!("item{slot}count")), "1"),
            (schema.column(&format!("item{slot}quality")), UNIQUE_QUALITY),
        ];
        for &row in &class_rows {
            charstats.set(row, item_col, STAFF_CODE);
            for (col, value) in &extra {
                if let Some(col) = col {
                    charstats.set(row, *col, *value);
                }
            }
        }
        info!("starting staff in item slot {slot}");
    }

    fn add_unique(&self, uniques: &mut Table) {
        let schema = uniques.schema();
        if let (Some(index_col), Some(disabled_col)) = (schema.column("index"), schema.column("disabled")) {
            for row in 0..uniques.len() {
                if uniques.get(row, index_col) == REPLACED_UNIQUE {
                    uniques.set(row, disabled_col, "1");
                }
            }
        }
        uniques.push_named(&[
            ("index", STAFF_UNIQUE.to_string()),
            ("version", "0".to_string()),
            ("disabled", "0".to_string()),
            ("spawnable", "1".to_string()),
            ("code", STAFF_CODE.to_string()),
            ("lvl", "1".to_string()),
            ("lvl req", self.level.to_string()),
            ("rarity", "1".to_string()),
            ("prop1", "charged".to_string()),
            ("par1", TELEPORT_SKILL_ID.to_string()),
            ("min1", TELEPORT_CHARGES.to_string()),
            ("max1", "1".to_string()),
        ]);
    }

    fn item_name() -> StringEntry {
        let mut entry = StringEntry::new(Some(ITEM_NAME_ID), STAFF_UNIQUE, STAFF_UNIQUE);
        entry.other = LANGUAGES
            .iter()
            .map(|lang| (lang.to_string(), Value::String(STAFF_UNIQUE.to_string())))
            .collect::<Map<String, Value>>();
        entry
    }
}

impl PostStep for StartingItems {
    fn name(&self) -> &'static str {
        "starting items"
    }

    fn apply(&self, _rng: &mut SeededRng, _ctx: &PostContext<'_>, out: &mut ModTables) {
        if let Some(charstats) = out.table_mut(TableKind::CharStats) {
            Self::give_staff(charstats);
        }
        if let Some(uniques) = out.table_mut(TableKind::UniqueItems) {
            self.add_unique(uniques);
        }
        out.item_names
            .get_or_insert_with(StringTable::default)
            .entries
            .push(Self::item_name());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::layout::assign_trees;
    use crate::placement::place_skills;
    use crate::rng::Seed;
    use crate::writers::write_skills_table;

    fn mod_tables() -> ModTables {
        let data = fixtures::game_data();
        ModTables {
            tables: data.tables.clone(),
            skill_strings: data.skill_strings.clone(),
            item_names: data.item_names.clone(),
        }
    }

    fn column(t: &Table, name: &str) -> Vec<String> {
        let col = t.schema().column(name).unwrap();
        (0..t.len()).map(|r| t.get(r, col).to_string()).collect()
    }

    fn claw_mastery_on(target: ClassCode) -> Placement {
        let data = fixtures::game_data();
        let skill = data.skills.iter().find(|s| s.id == 191).unwrap().clone();
        Placement {
            skill,
            target,
            tab: 0,
            row: 2,
            col: 1,
            template_origin: "ass".into(),
            template_page: 1,
            rank: 5,
            icon_index: 10,
        }
    }

    #[test]
    fn steps_follow_settings() {
        let mut settings = RandomiserSettings::default();
        let names = |s: &RandomiserSettings| post_steps(s).iter().map(|p| p.name()).collect::<Vec<_>>();
        assert_eq!(names(&settings), vec!["tab labels", "start skill"]);
        settings.logic = LogicMode::Normal;
        settings.starting_items = Some(crate::StartingItemSettings { level: 5 });
        assert_eq!(
            names(&settings),
            vec!["weapon remap", "tab labels", "start skill", "starting items"]
        );
    }

    #[test]
    fn start_skill_comes_from_first_row() {
        let data = fixtures::game_data();
        let mut rng = SeededRng::new(Seed(77));
        let trees = assign_trees(&mut rng, &data.pages).unwrap();
        let placements = place_skills(&mut rng, &data.skills, &trees);
        let mut out = mod_tables();
        write_skills_table(out.table_mut(TableKind::Skills).unwrap(), &placements, None, &HashMap::new());

        let ctx = PostContext { placements: &placements, descriptors: &data.descriptors };
        StartSkill.apply(&mut rng, &ctx, &mut out);

        let charstats = &out.tables[&TableKind::CharStats];
        let classes = column(charstats, "class");
        let starts = column(charstats, "StartSkill");
        for (name, start) in classes.iter().zip(&starts) {
            let Some(def) = class_by_name(name) else {
                assert_eq!(start, "");
                continue;
            };
            let p = placements.iter().find(|p| &p.skill.name == start).unwrap();
            assert_eq!((p.target, p.row), (def.code, 1));
        }
    }

    #[test]
    fn claw_skill_on_amazon_uses_missile_text() {
        let data = fixtures::game_data();
        let placements = vec![claw_mastery_on(ClassCode::Ama)];
        let ctx = PostContext { placements: &placements, descriptors: &data.descriptors };
        let mut out = mod_tables();
        WeaponRemap.apply(&mut SeededRng::new(Seed(1)), &ctx, &mut out);

        let strings = out.skill_strings.as_ref().unwrap();
        assert_eq!(strings.get("Skillname191").unwrap().en_us, "Missile Mastery");
        assert_eq!(strings.get("Skillan191").unwrap().en_us, "Missile Mastery");
        assert_eq!(
            strings.get("Skillld191").unwrap().en_us,
            "Passive - Improves skill with missile weapons"
        );

        let skills = &out.tables[&TableKind::Skills];
        let names = column(skills, "skill");
        let row = names.iter().position(|n| *n == placements[0].skill.name).unwrap();
        assert_eq!(column(skills, "passiveitype")[row], "miss");
    }

    #[test]
    fn claw_skill_staying_on_assassin_is_untouched() {
        let data = fixtures::game_data();
        let placements = vec![claw_mastery_on(ClassCode::Ass)];
        let ctx = PostContext { placements: &placements, descriptors: &data.descriptors };
        let before = mod_tables();
        let mut out = before.clone();
        WeaponRemap.apply(&mut SeededRng::new(Seed(1)), &ctx, &mut out);
        assert_eq!(out, before);
    }

    #[test]
    fn whole_words_only() {
        assert_eq!(replace_word("Claw Mastery", "Claw", "Melee"), "Melee Mastery");
        assert_eq!(replace_word("Clawed Claw", "Claw", "Wand"), "Clawed Wand");
        assert_eq!(replace_word("Claw Claw", "Claw", "Wand"), "Wand Wand");
        assert_eq!(numeric_suffix("Skillname253"), Some("253"));
        assert_eq!(numeric_suffix("Skillname"), None);
    }

    #[test]
    fn tab_labels_reverse_for_warlock() {
        let data = fixtures::game_data();
        let ctx = PostContext { placements: &[], descriptors: &data.descriptors };
        let mut out = mod_tables();
        TabLabels.apply(&mut SeededRng::new(Seed(1)), &ctx, &mut out);
        let strings = out.skill_strings.as_ref().unwrap();
        assert_eq!(strings.get("SkillCategoryAm1").unwrap().en_us, "Random 1");
        assert_eq!(strings.get("SkillCategoryAs3").unwrap().en_us, "Random 3");
        assert_eq!(strings.get("SkillCategoryWa1").unwrap().en_us, "Random 3");
        assert_eq!(strings.get("SkillCategoryWa3").unwrap().en_us, "Random 1");
        assert_eq!(
            strings.get("SkillCategoryAm1").unwrap().other.get("deDE"),
            Some(&Value::String("Amazon Baum 1".into()))
        );
    }

    #[test]
    fn staff_goes_in_first_slot_free_for_every_class() {
        let data = fixtures::game_data();
        let ctx = PostContext { placements: &[], descriptors: &data.descriptors };
        let mut out = mod_tables();
        StartingItems { level: 12 }.apply(&mut SeededRng::new(Seed(1)), &ctx, &mut out);

        let charstats = &out.tables[&TableKind::CharStats];
        let classes = column(charstats, "class");
        let items = column(charstats, "item5");
        let quality = column(charstats, "item5quality");
        for ((name, item), q) in classes.iter().zip(&items).zip(&quality) {
            if class_by_name(name).is_some() {
                assert_eq!((item.as_str(), q.as_str()), ("sst", "7"));
            } else {
                assert_eq!(item, "");
            }
        }
        assert_eq!(column(charstats, "item4")[0], "");

        let uniques = &out.tables[&TableKind::UniqueItems];
        let index = column(uniques, "index");
        assert_eq!(index.last().map(String::as_str), Some(STAFF_UNIQUE));
        assert_eq!(column(uniques, "disabled")[1], "1");
        assert_eq!(column(uniques, "lvl req").last().map(String::as_str), Some("12"));
        assert_eq!(column(uniques, "par1").last().map(String::as_str), Some("54"));

        let names = out.item_names.as_ref().unwrap();
        assert_eq!(names.len(), 4);
        let entry = names.get(STAFF_UNIQUE).unwrap();
        assert_eq!(entry.id, Some(99999));
        assert_eq!(entry.other.len(), LANGUAGES.len());
    }

    #[test]
    fn item_names_created_when_absent() {
        let data = fixtures::game_data();
        let ctx = PostContext { placements: &[], descriptors: &data.descriptors };
        let mut out = ModTables::default();
        StartingItems { level: 1 }.apply(&mut SeededRng::new(Seed(1)), &ctx, &mut out);
        assert_eq!(out.item_names.map(|t| t.len()), Some(1));
    }
}
