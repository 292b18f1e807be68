mod common;

use std::collections::{BTreeMap, HashMap, HashSet};

use skilltree_randomiser::classes::{class, class_by_charclass, tier_for_row};
use skilltree_randomiser::data::TableKind;
use skilltree_randomiser::package::{mod_files, write_zip};
use skilltree_randomiser::scaling::{boss_act, treasure_class_act};
use skilltree_randomiser::sprite::Sprite;
use skilltree_randomiser::{
    randomise, ActSet, LogicMode, PlayersSettings, RandomiserSettings, SeedInput,
    StartingItemSettings,
};

use common::{assets, column, game_data, settings};

fn everything_on(seed: SeedInput) -> RandomiserSettings {
    let mut s = settings(seed);
    s.logic = LogicMode::Normal;
    s.players = Some(PlayersSettings { count: 5, acts: ActSet::all() });
    s.act_shuffle = true;
    s.starting_items = Some(StartingItemSettings { level: 10 });
    s
}

#[test]
fn identical_settings_give_identical_output() {
    let data = game_data();
    let assets = assets();
    let s = everything_on(SeedInput::Text("determinism".into()));
    let a = randomise(&data, &assets, &s).unwrap();
    let b = randomise(&data, &assets, &s).unwrap();
    assert_eq!(a, b);
    assert_eq!(mod_files(&a).unwrap(), mod_files(&b).unwrap());
    assert_eq!(write_zip(&a).unwrap(), write_zip(&b).unwrap());
}

#[test]
fn different_seeds_differ() {
    let data = game_data();
    let assets = assets();
    let a = randomise(&data, &assets, &settings(SeedInput::Integer(1))).unwrap();
    let b = randomise(&data, &assets, &settings(SeedInput::Integer(2))).unwrap();
    assert_ne!(a.placements, b.placements);
}

#[test]
fn every_filled_slot_gets_exactly_one_skill() {
    let data = game_data();
    let out = randomise(&data, &assets(), &settings(SeedInput::Integer(11))).unwrap();

    let mut seen = HashSet::new();
    for p in &out.placements {
        assert!(seen.insert(p.skill.name.clone()), "{} placed twice", p.skill.name);
    }
    assert_eq!(seen.len(), data.skills.len());

    let mut cells = HashSet::new();
    for p in &out.placements {
        assert!(cells.insert((p.target, p.tab, p.row, p.col)), "cell used twice");
    }
    let filled: usize = out
        .preview
        .classes
        .iter()
        .flat_map(|c| &c.tabs)
        .map(|t| t.skills.len())
        .sum();
    assert_eq!(filled, cells.len());
}

#[test]
fn capability_skills_only_land_on_capable_classes() {
    let data = game_data();
    let assets = assets();
    for seed in 0..20 {
        let out = randomise(&data, &assets, &settings(SeedInput::Integer(seed))).unwrap();
        for p in &out.placements {
            for cap in &p.skill.requires {
                assert!(
                    class(p.target).has(*cap),
                    "{} needs {cap:?} but went to {}",
                    p.skill.name,
                    class(p.target).name
                );
            }
        }
    }
}

#[test]
fn level_tiers_never_decrease_down_the_tree() {
    let out = randomise(&game_data(), &assets(), &settings(SeedInput::Integer(99))).unwrap();
    let mut by_class: BTreeMap<_, Vec<_>> = BTreeMap::new();
    for p in &out.placements {
        by_class.entry(p.target).or_default().push(p);
    }
    for list in by_class.values_mut() {
        list.sort_by_key(|p| p.row);
        for pair in list.windows(2) {
            if pair[0].row < pair[1].row {
                assert!(pair[0].skill.required_level <= pair[1].skill.required_level);
            }
        }
    }
}

#[test]
fn row_two_skills_require_level_six_for_text_seed() {
    let data = game_data();
    let out = randomise(&data, &assets(), &settings(SeedInput::Text("abc".into()))).unwrap();
    assert_eq!(out.seed.value(), 96354);

    let skills = &out.files.tables[&TableKind::Skills];
    let names = column(skills, "skill");
    let levels = column(skills, "reqlevel");
    let classes = column(skills, "charclass");
    let row_of: HashMap<&str, usize> = names.iter().enumerate().map(|(i, n)| (n.as_str(), i)).collect();

    let mut row_two = 0;
    for p in &out.placements {
        let row = row_of[p.skill.name.as_str()];
        assert_eq!(levels[row], tier_for_row(p.row).to_string());
        assert_eq!(class_by_charclass(&classes[row]).map(|c| c.code), Some(p.target));
        if p.row == 2 {
            assert_eq!(levels[row], "6");
            row_two += 1;
        }
    }
    assert!(row_two > 0);
}

#[test]
fn prerequisites_point_at_classmates_above() {
    let data = game_data();
    let out = randomise(&data, &assets(), &settings(SeedInput::Integer(5))).unwrap();
    let skills = &out.files.tables[&TableKind::Skills];
    let names = column(skills, "skill");
    let req1 = column(skills, "reqskill1");
    let req2 = column(skills, "reqskill2");
    let placed: HashMap<&str, _> = out
        .placements
        .iter()
        .map(|p| (p.skill.name.as_str(), p))
        .collect();

    let mut edges = 0;
    for (i, name) in names.iter().enumerate() {
        let Some(p) = placed.get(name.as_str()) else {
            continue;
        };
        for req in [&req1[i], &req2[i]] {
            if req.is_empty() {
                continue;
            }
            let source = placed[req.as_str()];
            assert_eq!(source.target, p.target);
            assert_eq!(source.tab, p.tab);
            assert!(source.row <= p.row);
            edges += 1;
        }
    }
    assert!(edges > 0);

    let mut no_prereqs = settings(SeedInput::Integer(5));
    no_prereqs.prerequisites = false;
    let out = randomise(&data, &assets(), &no_prereqs).unwrap();
    let skills = &out.files.tables[&TableKind::Skills];
    let placed: HashSet<&str> = out.placements.iter().map(|p| p.skill.name.as_str()).collect();
    for (name, req) in column(skills, "skill").iter().zip(column(skills, "reqskill1")) {
        if placed.contains(name.as_str()) {
            assert_eq!(req, "");
        }
    }
}

#[test]
fn act_shuffle_never_moves_skills() {
    let data = game_data();
    let assets = assets();
    let plain = settings(SeedInput::Integer(31));
    let mut shuffled = plain.clone();
    shuffled.act_shuffle = true;
    let a = randomise(&data, &assets, &plain).unwrap();
    let b = randomise(&data, &assets, &shuffled).unwrap();
    assert_eq!(a.placements, b.placements);
    assert_eq!(a.files.tables[&TableKind::Skills], b.files.tables[&TableKind::Skills]);
    assert!(a.act_order.is_none());
    assert!(b.act_order.is_some());
}

#[test]
fn every_act_table_follows_one_permutation() {
    let data = game_data();
    let mut s = settings(SeedInput::Integer(2024));
    s.act_shuffle = true;
    let out = randomise(&data, &assets(), &s).unwrap();
    let perm = out.act_order.unwrap();

    for kind in [TableKind::LvlTypes, TableKind::Hireling, TableKind::MonPreset, TableKind::ObjPreset] {
        let before = column(data.table(kind).unwrap(), "Act");
        let after = match out.files.tables.get(&kind) {
            Some(t) => column(t, "Act"),
            None => before.clone(),
        };
        for (old, new) in before.iter().zip(&after) {
            match old.parse::<u8>() {
                Ok(act) => assert_eq!(*new, perm.slot_of(act).unwrap().to_string(), "{kind:?}"),
                Err(_) => assert_eq!(new, old),
            }
        }
    }

    let before = data.table(TableKind::Levels).unwrap();
    let after = out.files.tables.get(&TableKind::Levels).unwrap_or(before);
    for (old, new) in column(before, "Act").iter().zip(column(after, "Act")) {
        let act: u8 = old.parse::<u8>().unwrap() + 1;
        assert_eq!(new, (perm.slot_of(act).unwrap() - 1).to_string());
    }

    let before = data.table(TableKind::ActInfo).unwrap();
    let after = out.files.tables.get(&TableKind::ActInfo).unwrap_or(before);
    let towns = column(before, "town");
    for (slot, town) in column(after, "town").iter().enumerate() {
        let content = perm.act_at(slot as u8 + 1).unwrap();
        assert_eq!(town, &towns[content as usize - 1]);
    }

    let before = data.table(TableKind::MonStats).unwrap();
    let after = out.files.tables.get(&TableKind::MonStats).unwrap_or(before);
    let ids = column(before, "Id");
    let old_tcs = column(before, "TreasureClass");
    for (i, new) in column(after, "TreasureClass").iter().enumerate() {
        let old = &old_tcs[i];
        match treasure_class_act(old) {
            Some(_) if boss_act(&ids[i]).is_some() => assert_eq!(new, old),
            Some(act) => assert_eq!(treasure_class_act(new), perm.slot_of(act), "{}", ids[i]),
            None => assert_eq!(new, old),
        }
    }
}

#[test]
fn four_players_on_whole_pipeline() {
    let data = game_data();
    let mut s = settings(SeedInput::Integer(4));
    s.players = Some(PlayersSettings { count: 4, acts: ActSet::all() });
    let out = randomise(&data, &assets(), &s).unwrap();
    let monstats = &out.files.tables[&TableKind::MonStats];
    assert_eq!(column(monstats, "minHP")[0], "83");
}

#[test]
fn single_player_leaves_monsters_alone() {
    let data = game_data();
    let mut s = settings(SeedInput::Integer(4));
    s.players = Some(PlayersSettings { count: 1, acts: ActSet::all() });
    let out = randomise(&data, &assets(), &s).unwrap();
    assert!(!out.files.tables.contains_key(&TableKind::MonStats));
}

#[test]
fn sprites_built_for_every_class() {
    let out = randomise(&game_data(), &assets(), &settings(SeedInput::Integer(6))).unwrap();
    assert_eq!(out.tree_sprites.len(), 16);
    assert_eq!(out.icon_sheets.len(), 8);
    for bytes in out.icon_sheets.values() {
        assert_eq!(Sprite::parse(bytes).unwrap().frame_count(), 60);
    }
    for bytes in out.tree_sprites.values() {
        assert_eq!(Sprite::parse(bytes).unwrap().frame_count(), 3);
    }
}

#[test]
fn missing_seed_is_fatal() {
    let err = randomise(&game_data(), &assets(), &RandomiserSettings::default()).unwrap_err();
    assert_eq!(err.to_string(), "a seed is required");
}
