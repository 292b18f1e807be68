use log::{debug, warn};
use std::collections::BTreeMap;

use crate::classes::{class, ClassCode, CLASSES, SKILLS_PER_CLASS};
use crate::layout::TreeAssignment;
use crate::rng::SeededRng;
use crate::skills::SkillDefinition;

/// Where one skill ended up. Computed once per run and then only read.
#[derive(Clone, Debug, PartialEq)]
pub struct Placement {
    pub skill: SkillDefinition,
    pub target: ClassCode,
    /// 0..=2
    pub tab: u8,
    pub row: u8,
    pub col: u8,
    /// Template the tab was drawn from: origin class code and page index.
    pub template_origin: String,
    pub template_page: u8,
    /// Position of the skill within its new class, 0..30.
    pub rank: usize,
    pub icon_index: u32,
}

#[derive(Copy, Clone)]
struct SlotRef<'a> {
    tab: u8,
    row: u8,
    col: u8,
    origin: &'a str,
    page: u8,
}

/// Shuffle skills into the filled slots of every class's assigned trees.
///
/// Pinned skills stay on their origin class; the rest are shuffled once and
/// handed out class by class in class-table order until each class's
/// capacity is met. Within a class the combined set is ordered by required
/// level and laid onto slots ordered by `(row, tab, col)`, so low tiers land
/// in low rows whatever the template.
pub fn place_skills(
    rng: &mut SeededRng,
    skills: &[SkillDefinition],
    trees: &TreeAssignment,
) -> Vec<Placement> {
    let mut pinned: BTreeMap<ClassCode, Vec<&SkillDefinition>> = BTreeMap::new();
    let mut free: Vec<&SkillDefinition> = Vec::new();
    for skill in skills {
        if skill.is_pinned() {
            let origin = class(skill.origin);
            if let Some(missing) = skill.requires.iter().find(|cap| !origin.has(**cap)) {
                warn!(
                    "skill '{}' needs {:?} which {} lacks; kept on {} regardless",
                    skill.name, missing, origin.name, origin.name
                );
            }
            pinned.entry(skill.origin).or_default().push(skill);
        } else {
            free.push(skill);
        }
    }

    let shuffled = rng.shuffled(&free);
    let mut cursor = 0usize;
    let mut placements = Vec::with_capacity(skills.len());

    for def in CLASSES.iter() {
        let Some(tabs) = trees.get(&def.code) else {
            continue;
        };

        let mut slots: Vec<SlotRef> = Vec::new();
        for (tab, page) in tabs.iter().enumerate() {
            for slot in page.filled_slots() {
                slots.push(SlotRef {
                    tab: tab as u8,
                    row: slot.row,
                    col: slot.col,
                    origin: &page.origin_code,
                    page: page.page_index,
                });
            }
        }
        slots.sort_by_key(|s| (s.row, s.tab, s.col));
        slots.dedup_by_key(|s| (s.row, s.tab, s.col));
        let capacity = slots.len();

        let mut class_skills: Vec<&SkillDefinition> =
            pinned.get(&def.code).cloned().unwrap_or_default();
        if class_skills.len() > capacity {
            warn!(
                "{}: {} pinned skills exceed {} slots; {} left unplaced",
                def.name,
                class_skills.len(),
                capacity,
                class_skills.len() - capacity
            );
            class_skills.truncate(capacity);
        }

        let wanted = capacity - class_skills.len();
        let available = shuffled.len() - cursor;
        let take = wanted.min(available);
        class_skills.extend_from_slice(&shuffled[cursor..cursor + take]);
        cursor += take;
        if take < wanted {
            warn!(
                "{}: only {} skills for {} slots; trailing slots left empty",
                def.name,
                class_skills.len(),
                capacity
            );
        }

        // Stable, so equal tiers keep pinned-then-shuffle order.
        class_skills.sort_by_key(|s| s.required_level);

        for (rank, (skill, slot)) in class_skills.iter().zip(slots.iter()).enumerate() {
            placements.push(Placement {
                skill: (*skill).clone(),
                target: def.code,
                tab: slot.tab,
                row: slot.row,
                col: slot.col,
                template_origin: slot.origin.to_string(),
                template_page: slot.page,
                rank,
                icon_index: (rank * 2) as u32,
            });
        }

        if class_skills.len() != SKILLS_PER_CLASS {
            debug!("{}: placed {} skills", def.name, class_skills.len());
        }
    }

    if cursor < shuffled.len() {
        warn!("{} shuffled skills did not fit any slot", shuffled.len() - cursor);
    }

    placements
}

/// Placements per target class, each list ordered by rank.
pub fn group_by_class(placements: &[Placement]) -> BTreeMap<ClassCode, Vec<&Placement>> {
    let mut map: BTreeMap<ClassCode, Vec<&Placement>> = BTreeMap::new();
    for p in placements {
        map.entry(p.target).or_default().push(p);
    }
    for list in map.values_mut() {
        list.sort_by_key(|p| p.rank);
    }
    map
}
