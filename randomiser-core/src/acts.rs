use log::{debug, info, warn};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::data::TableKind;
use crate::rng::SeededRng;
use crate::scaling::{scale_row, treasure_class_act, MonsterColumns, ACT_COUNT};
use crate::table::{cell_int, Column, Table};
use crate::{RandomiserError, Result};

const ACT_HP: [f64; 5] = [1.0, 2.5, 5.0, 8.0, 13.0];
const ACT_DAMAGE: [f64; 5] = [1.0, 2.0, 3.5, 5.5, 8.0];
const ACT_EXP: [f64; 5] = [1.0, 3.0, 7.0, 12.0, 20.0];
const ACT_AC: [f64; 5] = [1.0, 1.8, 3.0, 4.5, 7.0];
const ACT_LEVEL: [f64; 5] = [8.0, 18.0, 24.0, 28.0, 36.0];

const MAX_MONSTER_LEVEL: i64 = 110;
const WAYPOINT_COLUMNS: usize = 9;
const NO_WAYPOINT: i64 = 255;

/// A reordering of the five acts into difficulty slots.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ActPermutation {
    /// `order[s - 1]` is the original act now played at slot `s`.
    order: [u8; 5],
}

impl ActPermutation {
    pub fn identity() -> Self {
        Self { order: [1, 2, 3, 4, 5] }
    }

    /// Fisher-Yates over the acts, on the act stream.
    pub fn draw(rng: &mut SeededRng) -> Self {
        let mut order = [1, 2, 3, 4, 5];
        rng.shuffle(&mut order);
        Self { order }
    }

    pub fn from_order(order: [u8; 5]) -> Result<Self> {
        let mut seen = [false; 5];
        for act in order {
            let idx = (act as usize).wrapping_sub(1);
            if idx >= seen.len() || seen[idx] {
                return Err(RandomiserError::Config(format!(
                    "act order {order:?} is not a permutation of 1..5"
                )));
            }
            seen[idx] = true;
        }
        Ok(Self { order })
    }

    pub fn order(&self) -> [u8; 5] {
        self.order
    }

    /// Original act played at `slot`.
    pub fn act_at(&self, slot: u8) -> Option<u8> {
        self.order.get((slot as usize).wrapping_sub(1)).copied()
    }

    /// Slot the original `act` moved to.
    pub fn slot_of(&self, act: u8) -> Option<u8> {
        self.order
            .iter()
            .position(|&a| a == act)
            .map(|i| i as u8 + 1)
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }
}

fn ratio(table: &[f64; 5], slot: u8, act: u8) -> f64 {
    table[slot as usize - 1] / table[act as usize - 1]
}

fn rewrite_act_prefix(tc: &str, slot: u8) -> Option<String> {
    treasure_class_act(tc)?;
    Some(format!("Act {}{}", slot, &tc[5..]))
}

/// Rewrite every `Act k` occurrence in `text` in one pass, so a remapped
/// act is never remapped twice.
fn remap_act_substrings(text: &str, perm: &ActPermutation) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find("Act ") {
        out.push_str(&rest[..pos + 4]);
        rest = &rest[pos + 4..];
        let slot = rest
            .chars()
            .next()
            .and_then(|c| c.to_digit(10))
            .and_then(|d| perm.slot_of(d as u8));
        if let Some(slot) = slot {
            out.push(char::from(b'0' + slot));
            rest = &rest[1..];
        }
    }
    out.push_str(rest);
    out
}

/// Move every act-affiliated monster to its new slot: rescale its stats by
/// the ratio of the slot's difficulty to its original act's and retarget its
/// treasure classes. Bosses keep their named treasure classes.
pub fn permute_monstats(monstats: &mut Table, perm: &ActPermutation) {
    let cols = MonsterColumns::resolve(&monstats.schema());
    let damage_cols: Vec<Column> = cols.damage.iter().chain(&cols.hit).copied().collect();

    let mut moved = 0;
    for row in 0..monstats.len() {
        let Some(act) = cols.act_of(monstats, row) else {
            continue;
        };
        let Some(slot) = perm.slot_of(act) else {
            continue;
        };

        scale_row(monstats, row, &cols.hp, ratio(&ACT_HP, slot, act));
        scale_row(monstats, row, &cols.exp, ratio(&ACT_EXP, slot, act));
        scale_row(monstats, row, &damage_cols, ratio(&ACT_DAMAGE, slot, act));
        scale_row(monstats, row, &cols.ac, ratio(&ACT_AC, slot, act));

        let level_ratio = ratio(&ACT_LEVEL, slot, act);
        for &col in &cols.level {
            if let Some(n) = cell_int(monstats.get(row, col)).filter(|n| *n > 0) {
                let scaled = ((n as f64) * level_ratio).round() as i64;
                monstats.set(row, col, scaled.clamp(1, MAX_MONSTER_LEVEL).to_string());
            }
        }

        if !cols.is_boss(monstats, row) {
            for &col in &cols.treasure_classes {
                if let Some(tc) = rewrite_act_prefix(monstats.get(row, col), slot) {
                    monstats.set(row, col, tc);
                }
            }
        }
        moved += 1;
    }
    info!("act order {:?}: rescaled {moved} monsters", perm.order());
}

/// Reorder the act metadata rows so slot `s` holds the content of act
/// `perm[s]`. Waypoint columns the content act leaves empty but the
/// displaced row had filled are pointed at the content act's town.
pub fn permute_actinfo(actinfo: &mut Table, perm: &ActPermutation) {
    let schema = actinfo.schema();
    let Some(act_col) = schema.column_or("act", 0) else {
        return;
    };
    let waypoint_cols: Vec<Option<Column>> = (1..=WAYPOINT_COLUMNS)
        .map(|i| schema.column(&format!("waypoint{i}")))
        .collect();

    let mut row_of = [None; 5];
    for row in 0..actinfo.len() {
        if let Some(act) = cell_int(actinfo.get(row, act_col)) {
            if (1..=ACT_COUNT as i64).contains(&act) {
                row_of[act as usize - 1].get_or_insert(row);
            }
        }
    }
    let Some(row_of) = row_of.iter().copied().collect::<Option<Vec<usize>>>() else {
        warn!("actinfo does not list all five acts; left as is");
        return;
    };

    let original = actinfo.rows.clone();
    for slot in 1..=ACT_COUNT {
        let content_act = perm.act_at(slot).unwrap_or(slot);
        let source = &original[row_of[content_act as usize - 1]];
        let displaced = &original[row_of[slot as usize - 1]];
        let mut row = source.clone();
        row[act_col.index()] = slot.to_string();

        let town = waypoint_cols
            .first()
            .copied()
            .flatten()
            .map(|c| source[c.index()].clone())
            .unwrap_or_default();
        for col in waypoint_cols.iter().flatten() {
            let i = col.index();
            if row[i].trim().is_empty() && !displaced[i].trim().is_empty() {
                row[i] = town.clone();
            }
        }
        actinfo.rows[row_of[slot as usize - 1]] = row;
    }
    debug!("actinfo reordered to {:?}", perm.order());
}

/// Remap the zero-based `Act` column of the level table and renumber the
/// global waypoint indices so each act's block follows the new act order.
pub fn permute_levels(levels: &mut Table, perm: &ActPermutation) {
    let schema = levels.schema();
    let Some(act_col) = schema.column("Act") else {
        warn!("levels has no Act column; left as is");
        return;
    };
    let waypoint_col = schema.column("Waypoint");

    let waypoint_at = |table: &Table, row: usize| -> Option<i64> {
        let col = waypoint_col?;
        cell_int(table.get(row, col)).filter(|w| *w >= 0 && *w != NO_WAYPOINT)
    };
    let act_at = |table: &Table, row: usize| -> Option<u8> {
        cell_int(table.get(row, act_col))
            .filter(|a| (0..ACT_COUNT as i64).contains(a))
            .map(|a| a as u8 + 1)
    };

    // Per original act: lowest waypoint index and number of indices spanned.
    let mut spans: [Option<(i64, i64)>; 5] = [None; 5];
    for row in 0..levels.len() {
        if let (Some(act), Some(wp)) = (act_at(levels, row), waypoint_at(levels, row)) {
            let span = &mut spans[act as usize - 1];
            *span = Some(match *span {
                Some((lo, hi)) => (lo.min(wp), hi.max(wp)),
                None => (wp, wp),
            });
        }
    }

    let mut new_base = [0i64; 5];
    let mut next = 0;
    for slot in 1..=ACT_COUNT {
        new_base[slot as usize - 1] = next;
        let act = perm.act_at(slot).unwrap_or(slot);
        if let Some((lo, hi)) = spans[act as usize - 1] {
            next += hi - lo + 1;
        }
    }

    let mut remapped = 0;
    for row in 0..levels.len() {
        let Some(act) = act_at(levels, row) else {
            continue;
        };
        let Some(slot) = perm.slot_of(act) else {
            continue;
        };
        if let (Some(wp), Some(col), Some((lo, _))) =
            (waypoint_at(levels, row), waypoint_col, spans[act as usize - 1])
        {
            let moved = new_base[slot as usize - 1] + (wp - lo);
            levels.set(row, col, moved.to_string());
        }
        levels.set(row, act_col, (slot - 1).to_string());
        remapped += 1;
    }
    debug!("levels: {remapped} rows remapped");
}

/// Remap a one-based `Act` column value for value.
pub fn permute_act_column(table: &mut Table, perm: &ActPermutation) {
    let Some(act_col) = table.schema().column("Act") else {
        warn!("table has no Act column; left as is");
        return;
    };
    for row in 0..table.len() {
        let slot = cell_int(table.get(row, act_col))
            .filter(|a| (1..=ACT_COUNT as i64).contains(a))
            .and_then(|a| perm.slot_of(a as u8));
        if let Some(slot) = slot {
            table.set(row, act_col, slot.to_string());
        }
    }
}

/// Retarget `Act k` references inside every `TC*` column.
pub fn permute_superuniques(table: &mut Table, perm: &ActPermutation) {
    let schema = table.schema();
    let tc_cols: Vec<Column> = table
        .headers
        .iter()
        .filter(|h| h.starts_with("TC"))
        .filter_map(|h| schema.column(h))
        .collect();
    for row in 0..table.len() {
        for &col in &tc_cols {
            let remapped = remap_act_substrings(table.get(row, col), perm);
            table.set(row, col, remapped);
        }
    }
}

/// Apply one permutation to every act-indexed table present.
pub fn permute_act_tables(tables: &mut BTreeMap<TableKind, Table>, perm: &ActPermutation) {
    for (kind, table) in tables.iter_mut() {
        match kind {
            TableKind::MonStats => permute_monstats(table, perm),
            TableKind::ActInfo => permute_actinfo(table, perm),
            TableKind::Levels => permute_levels(table, perm),
            TableKind::LvlTypes | TableKind::Hireling | TableKind::MonPreset | TableKind::ObjPreset => {
                permute_act_column(table, perm)
            }
            TableKind::SuperUniques => permute_superuniques(table, perm),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::rng::Seed;
    use proptest::prelude::*;

    fn scenario() -> ActPermutation {
        ActPermutation::from_order([5, 3, 1, 2, 4]).unwrap()
    }

    fn column(t: &Table, name: &str) -> Vec<String> {
        let col = t.schema().column(name).unwrap();
        (0..t.len()).map(|r| t.get(r, col).to_string()).collect()
    }

    #[test]
    fn permutation_lookups() {
        let perm = scenario();
        assert_eq!(perm.slot_of(3), Some(2));
        assert_eq!(perm.slot_of(5), Some(1));
        assert_eq!(perm.act_at(1), Some(5));
        assert_eq!(perm.slot_of(6), None);
        assert!(ActPermutation::from_order([1, 1, 2, 3, 4]).is_err());
        assert!(ActPermutation::from_order([0, 1, 2, 3, 4]).is_err());
    }

    #[test]
    fn act_three_monsters_move_to_slot_two() {
        let before = fixtures::table(TableKind::MonStats);
        let mut t = before.clone();
        permute_monstats(&mut t, &scenario());

        let tc = column(&t, "TreasureClass");
        assert_eq!(tc[3], "Act 2 H2H A"); // skeleton
        assert_eq!(column(&t, "TreasureClass(N)")[3], "Act 2 (N) H2H A");
        assert_eq!(column(&t, "TreasureClassChamp")[3], "Act 2 Champ A");
        // 110 * 2.5 / 5
        assert_eq!(column(&t, "minHP")[3], "55");
        // Level 23 * 18 / 24
        assert_eq!(column(&t, "Level")[3], "17");
        // Act 1 moves to slot 3: AC 3 * 3.0
        assert_eq!(column(&t, "AC")[0], "9");
        assert_eq!(tc[0], "Act 3 H2H A");
        // bloodraven is a boss row: rescaled, treasure class kept.
        assert_eq!(tc[7], "Act 1 Super B");
        assert_eq!(column(&t, "minHP")[7], "900");
    }

    #[test]
    fn bosses_keep_names_but_rescale() {
        let before = fixtures::table(TableKind::MonStats);
        let mut t = before.clone();
        permute_monstats(&mut t, &scenario());
        // mephisto: act 3 -> slot 2
        assert_eq!(column(&t, "TreasureClass")[9], "Mephisto");
        assert_eq!(column(&t, "minHP")[9], "2000");
        // chicken has no act
        assert_eq!(t.rows[12], before.rows[12]);
    }

    #[test]
    fn level_clamped_to_engine_range() {
        let mut t = Table::parse("Id\tTreasureClass\tLevel\tLevel(N)\nx\tAct 1 A\t90\t0\n");
        permute_monstats(&mut t, &ActPermutation::from_order([2, 3, 4, 5, 1]).unwrap());
        // act 1 -> slot 5: 90 * 36 / 8
        assert_eq!(t.rows[0], vec!["x", "Act 5 A", "110", "0"]);
    }

    #[test]
    fn actinfo_rows_follow_content_with_backfill() {
        let mut t = fixtures::table(TableKind::ActInfo);
        permute_actinfo(&mut t, &scenario());
        assert_eq!(column(&t, "act"), vec!["1", "2", "3", "4", "5"]);
        assert_eq!(column(&t, "town"), vec!["109", "75", "1", "40", "103"]);
        // Act 4 content at slot 5 displaces nine waypoints: backfilled with its town.
        let last = &t.rows[4];
        assert_eq!(&last[4..13], &["103", "106", "107", "103", "103", "103", "103", "103", "103"]);
    }

    #[test]
    fn levels_waypoints_follow_new_order() {
        let mut t = fixtures::table(TableKind::Levels);
        permute_levels(&mut t, &scenario());
        let name = column(&t, "Name");
        let act = column(&t, "Act");
        let wp = column(&t, "Waypoint");
        let find = |n: &str| name.iter().position(|x| x == n).unwrap();

        // Slot order: act 5 (9), act 3 (9), act 1 (9), act 2 (9), act 4 (3).
        assert_eq!((act[find("Act 5 Level 109")].as_str(), wp[find("Act 5 Level 109")].as_str()), ("0", "0"));
        assert_eq!((act[find("Act 3 Level 75")].as_str(), wp[find("Act 3 Level 75")].as_str()), ("1", "9"));
        assert_eq!((act[find("Act 1 Level 35")].as_str(), wp[find("Act 1 Level 35")].as_str()), ("2", "26"));
        assert_eq!((act[find("Act 4 Level 107")].as_str(), wp[find("Act 4 Level 107")].as_str()), ("4", "38"));
        assert_eq!(wp[find("Act 2 Cellar")], "255");
        assert_eq!(wp[find("Null")], "");

        let mut sorted: Vec<i64> = wp.iter().filter_map(|w| w.parse().ok()).filter(|w| *w != 255).collect();
        sorted.sort();
        assert_eq!(sorted, (0..39).collect::<Vec<_>>());
    }

    #[test]
    fn simple_act_columns_remap_value_for_value() {
        let perm = scenario();
        for kind in [TableKind::LvlTypes, TableKind::Hireling, TableKind::MonPreset, TableKind::ObjPreset] {
            let before = fixtures::table(kind);
            let mut t = before.clone();
            permute_act_column(&mut t, &perm);
            for (old, new) in column(&before, "Act").iter().zip(column(&t, "Act")) {
                match old.parse::<u8>() {
                    Ok(a) => assert_eq!(new, perm.slot_of(a).unwrap().to_string()),
                    Err(_) => assert_eq!(&new, old),
                }
            }
        }
    }

    #[test]
    fn superunique_treasure_classes_rewritten_once() {
        let mut t = fixtures::table(TableKind::SuperUniques);
        permute_superuniques(&mut t, &scenario());
        assert_eq!(column(&t, "TC")[0], "Act 3 Super A");
        assert_eq!(column(&t, "TC(H)")[2], "Act 2 (H) Super A");
        assert_eq!(column(&t, "TC")[4], "Act 1 Super A");
        assert_eq!(column(&t, "TC")[5], "Cow King");
        assert_eq!(column(&t, "Name")[0], "Bishibosh");
        assert_eq!(remap_act_substrings("Act 1/Act 2", &scenario()), "Act 3/Act 4");
    }

    proptest! {
        #[test]
        fn drawn_orders_are_bijections(seed in any::<i32>()) {
            let perm = ActPermutation::draw(&mut SeededRng::new(Seed(seed)));
            let mut order = perm.order();
            order.sort();
            prop_assert_eq!(order, [1, 2, 3, 4, 5]);
            for act in 1..=5u8 {
                let slot = perm.slot_of(act).unwrap();
                prop_assert_eq!(perm.act_at(slot), Some(act));
            }
        }
    }
}
