use log::debug;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::classes::ClassCode;
use crate::placement::Placement;
use crate::rng::SeededRng;
use crate::skills::SkillDescriptor;

/// New formula text and synergy display references for one skill. Absent
/// fields were not rewritten.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SynergyRewrite {
    /// `(column name, rewritten formula)`.
    pub formulas: Vec<(&'static str, String)>,
    /// New `dsc3textb` values, slot 0 first.
    pub display_refs: Option<Vec<String>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment<'a> {
    Text(&'a str),
    Ref { name: &'a str, attr: &'a str },
}

/// Split a formula into literal text and `skill('Name'.attr)` references.
/// Anything that does not complete the reference pattern stays literal.
fn parse_formula(formula: &str) -> Vec<Segment<'_>> {
    const OPEN: &str = "skill('";
    let mut out = Vec::new();
    let mut rest = formula;

    while let Some(start) = rest.find(OPEN) {
        let after = &rest[start + OPEN.len()..];
        let parsed = after.find("'.").and_then(|name_end| {
            let name = &after[..name_end];
            let tail = &after[name_end + 2..];
            let attr_len = tail
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(tail.len());
            let attr = &tail[..attr_len];
            if name.is_empty() || attr.is_empty() || !tail[attr_len..].starts_with(')') {
                return None;
            }
            let consumed = OPEN.len() + name_end + 2 + attr_len + 1;
            Some((name, attr, consumed))
        });

        match parsed {
            Some((name, attr, consumed)) => {
                if start > 0 {
                    out.push(Segment::Text(&rest[..start]));
                }
                out.push(Segment::Ref { name, attr });
                rest = &rest[start + consumed..];
            }
            None => {
                let literal_end = start + OPEN.len();
                out.push(Segment::Text(&rest[..literal_end]));
                rest = &rest[literal_end..];
            }
        }
    }
    if !rest.is_empty() {
        out.push(Segment::Text(rest));
    }
    out
}

fn render(segments: &[Segment<'_>], names: &[String]) -> String {
    let mut out = String::new();
    let mut refs = names.iter();
    for seg in segments {
        match seg {
            Segment::Text(t) => out.push_str(t),
            Segment::Ref { name, attr } => {
                let name = refs.next().map(String::as_str).unwrap_or(*name);
                out.push_str("skill('");
                out.push_str(name);
                out.push_str("'.");
                out.push_str(attr);
                out.push(')');
            }
        }
    }
    out
}

/// Rewrite formula references so each points at a distinct skill now
/// sharing the class. A reference keeps its original target when no unused
/// classmate is left.
fn remap_formulas(
    rng: &mut SeededRng,
    placements: &[Placement],
    by_class: &BTreeMap<ClassCode, Vec<&Placement>>,
    out: &mut HashMap<String, SynergyRewrite>,
) {
    for p in placements {
        let classmates: Vec<&str> = by_class
            .get(&p.target)
            .map(|list| {
                list.iter()
                    .map(|c| c.skill.name.as_str())
                    .filter(|n| *n != p.skill.name)
                    .collect()
            })
            .unwrap_or_default();

        for (column, formula) in &p.skill.formulas {
            let segments = parse_formula(formula);
            if !segments.iter().any(|s| matches!(s, Segment::Ref { .. })) {
                continue;
            }

            let mut used: HashSet<&str> = HashSet::new();
            let mut names = Vec::new();
            for seg in &segments {
                let Segment::Ref { name, .. } = seg else {
                    continue;
                };
                let available: Vec<&str> = classmates
                    .iter()
                    .copied()
                    .filter(|c| !used.contains(c))
                    .collect();
                if available.is_empty() {
                    names.push(name.to_string());
                    continue;
                }
                let pick = available[rng.rand_int(0, available.len() - 1)];
                used.insert(pick);
                names.push(pick.to_string());
            }

            out.entry(p.skill.name.clone())
                .or_default()
                .formulas
                .push((column, render(&segments, &names)));
        }
    }
}

/// Pick fresh synergy display references from classmates, keeping the
/// original number of slots where the class has enough skills.
fn remap_display_refs(
    rng: &mut SeededRng,
    placements: &[Placement],
    by_class: &BTreeMap<ClassCode, Vec<&Placement>>,
    descriptors: &HashMap<String, SkillDescriptor>,
    out: &mut HashMap<String, SynergyRewrite>,
) {
    for p in placements {
        let Some(desc) = descriptors.get(&p.skill.descriptor) else {
            continue;
        };
        let count = desc.synergy_refs.len();
        if count == 0 {
            continue;
        }
        let classmates: Vec<&Placement> = by_class
            .get(&p.target)
            .map(|list| {
                list.iter()
                    .copied()
                    .filter(|c| c.skill.name != p.skill.name)
                    .collect()
            })
            .unwrap_or_default();
        if classmates.is_empty() {
            continue;
        }

        let take = count.min(classmates.len());
        let refs: Vec<String> = rng
            .shuffled(&classmates)
            .into_iter()
            .take(take)
            .filter_map(|c| descriptors.get(&c.skill.descriptor))
            .map(|d| d.str_name.clone())
            .filter(|s| !s.is_empty())
            .collect();

        if !refs.is_empty() {
            out.entry(p.skill.name.clone()).or_default().display_refs = Some(refs);
        }
    }
}

/// Both synergy passes, formulas first, drawing from the primary stream.
pub fn remap_synergies(
    rng: &mut SeededRng,
    placements: &[Placement],
    by_class: &BTreeMap<ClassCode, Vec<&Placement>>,
    descriptors: &HashMap<String, SkillDescriptor>,
) -> HashMap<String, SynergyRewrite> {
    let mut out = HashMap::new();
    remap_formulas(rng, placements, by_class, &mut out);
    remap_display_refs(rng, placements, by_class, descriptors, &mut out);
    debug!("synergies rewritten for {} skills", out.len());
    out
}
