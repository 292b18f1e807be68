use std::collections::{BTreeMap, HashMap};

use crate::classes::ClassCode;
use crate::placement::Placement;

/// One painted arrow set: the skill at `(row, col)` requires the skills at
/// one or two source positions on the same page.
#[derive(Copy, Clone, Debug)]
struct Arrow {
    target: (u8, u8),
    first: (u8, u8),
    second: Option<(u8, u8)>,
}

const fn one(tr: u8, tc: u8, r1: u8, c1: u8) -> Arrow {
    Arrow {
        target: (tr, tc),
        first: (r1, c1),
        second: None,
    }
}

const fn two(tr: u8, tc: u8, r1: u8, c1: u8, r2: u8, c2: u8) -> Arrow {
    Arrow {
        target: (tr, tc),
        first: (r1, c1),
        second: Some((r2, c2)),
    }
}

/// Arrow topology painted on each template page, keyed by
/// `(origin class code, page index)`.
const TREE_ARROWS: &[((&str, u8), &[Arrow])] = &[
    (("ama", 1), &[one(2, 2, 1, 2), two(3, 3, 1, 3, 2, 2), one(4, 1, 2, 1), two(4, 2, 2, 1, 2, 2), one(5, 2, 4, 2), one(5, 3, 3, 3), one(6, 1, 4, 1)]),
    (("ama", 2), &[one(3, 1, 1, 1), one(3, 2, 2, 2), one(4, 3, 1, 3), one(5, 1, 3, 1), one(5, 2, 3, 2), two(6, 1, 5, 1, 5, 2), one(6, 3, 4, 3)]),
    (("ama", 3), &[one(2, 2, 1, 1), one(3, 1, 1, 1), one(3, 3, 2, 3), two(4, 2, 2, 2, 3, 3), one(4, 3, 3, 3), one(5, 1, 3, 1), one(6, 2, 4, 2), one(6, 3, 4, 3)]),
    (("sor", 1), &[one(3, 1, 2, 1), one(3, 2, 1, 2), one(4, 1, 3, 1), two(4, 3, 1, 3, 3, 2), two(5, 2, 3, 2, 4, 1), one(6, 3, 4, 3)]),
    (("sor", 2), &[one(3, 1, 2, 1), one(3, 2, 1, 2), one(4, 2, 3, 2), one(4, 3, 2, 3), two(5, 1, 3, 1, 4, 2), two(5, 3, 4, 3, 4, 2)]),
    (("sor", 3), &[one(2, 2, 1, 2), two(3, 3, 2, 2, 1, 3), one(4, 2, 2, 2), two(5, 1, 2, 1, 4, 2), one(5, 3, 3, 3), one(6, 1, 5, 1)]),
    (("nec", 1), &[one(2, 3, 1, 2), one(3, 2, 1, 2), one(3, 3, 2, 3), one(4, 1, 2, 1), one(4, 2, 3, 2), one(5, 1, 4, 1), one(5, 3, 3, 3), two(6, 2, 4, 2, 5, 3)]),
    (("nec", 2), &[one(2, 2, 1, 2), one(3, 3, 1, 3), two(4, 1, 2, 1, 2, 2), one(4, 2, 2, 2), two(5, 3, 3, 3, 4, 2), one(6, 1, 4, 1), one(6, 2, 4, 2)]),
    (("nec", 3), &[one(1, 1, 1, 3), one(3, 1, 2, 2), one(3, 3, 1, 3), one(4, 2, 2, 2), one(5, 1, 3, 1), one(5, 2, 4, 2), one(6, 2, 5, 2), two(6, 3, 3, 3, 5, 2)]),
    (("pal", 1), &[one(3, 1, 1, 1), one(3, 3, 1, 3), one(4, 1, 3, 1), one(4, 2, 2, 2), one(5, 1, 4, 1), two(5, 3, 3, 3, 4, 2), two(6, 2, 4, 2, 5, 1)]),
    (("pal", 2), &[one(2, 2, 1, 1), one(3, 1, 1, 1), one(4, 1, 3, 1), one(4, 2, 2, 2), one(5, 2, 4, 2), two(5, 3, 2, 3, 4, 2), one(6, 1, 4, 1), one(6, 3, 5, 3)]),
    (("pal", 3), &[one(3, 1, 1, 1), two(4, 2, 3, 1, 2, 2), one(5, 1, 3, 1), one(6, 2, 4, 2)]),
    (("bar", 1), &[one(2, 3, 1, 2), one(3, 2, 1, 2), one(3, 3, 2, 3), one(4, 1, 2, 1), one(4, 2, 3, 2), one(5, 3, 3, 3), two(6, 1, 4, 1, 4, 2), one(6, 2, 4, 2)]),
    (("bar", 2), &[one(5, 1, 3, 1), one(6, 3, 4, 3)]),
    (("bar", 3), &[one(2, 1, 1, 1), one(2, 2, 1, 1), one(3, 3, 1, 3), one(4, 1, 2, 1), one(5, 2, 2, 2), one(5, 3, 3, 3), two(6, 1, 4, 1, 5, 2), one(6, 2, 5, 2)]),
    (("dru", 1), &[one(2, 2, 1, 2), one(3, 3, 1, 3), one(4, 1, 2, 1), two(4, 2, 2, 1, 2, 2), one(5, 3, 3, 3), one(6, 1, 4, 1), one(6, 2, 4, 2)]),
    (("dru", 2), &[one(1, 2, 1, 1), one(3, 1, 1, 1), one(3, 3, 2, 3), one(4, 1, 3, 1), two(4, 2, 3, 1, 3, 3), one(5, 2, 4, 2), one(5, 3, 3, 3), one(6, 1, 4, 1)]),
    (("dru", 3), &[one(2, 1, 1, 1), one(3, 1, 2, 1), one(3, 3, 2, 3), one(4, 2, 3, 3), one(5, 1, 3, 1), one(5, 2, 4, 2), one(6, 1, 5, 1), one(6, 2, 5, 2)]),
    (("ass", 1), &[one(2, 1, 1, 2), one(3, 1, 2, 1), one(3, 2, 1, 2), two(4, 3, 2, 3, 3, 2), one(5, 1, 3, 1), one(5, 2, 3, 2), one(6, 1, 5, 1), one(6, 3, 4, 3)]),
    (("ass", 2), &[one(2, 1, 1, 2), one(3, 2, 1, 2), one(3, 3, 1, 3), one(4, 1, 2, 1), two(4, 2, 3, 3, 3, 2), one(5, 3, 3, 3), one(6, 1, 4, 1), one(6, 2, 4, 2)]),
    (("ass", 3), &[one(2, 3, 1, 3), one(3, 2, 1, 2), one(4, 1, 2, 1), one(4, 3, 2, 3), one(5, 1, 4, 1), one(5, 3, 4, 3), two(6, 2, 3, 2, 5, 1)]),
    (("war", 1), &[one(1, 1, 1, 3), one(2, 1, 1, 1), one(2, 2, 1, 3), one(3, 3, 1, 3), one(4, 2, 2, 2), one(4, 3, 3, 3), one(5, 2, 4, 2), one(6, 1, 2, 1), two(6, 3, 5, 2, 4, 3)]),
    (("war", 2), &[one(2, 2, 1, 1), one(3, 1, 1, 1), one(3, 3, 1, 3), one(4, 1, 3, 1), one(4, 2, 2, 2), one(5, 2, 4, 2), one(5, 3, 3, 3), two(6, 2, 4, 1, 5, 2)]),
    (("war", 3), &[one(3, 2, 2, 2), one(3, 3, 1, 3), one(4, 1, 2, 1), one(5, 2, 3, 2), one(5, 3, 3, 3), two(6, 1, 4, 1, 5, 2), one(6, 3, 5, 3)]),
];

fn arrows_for(origin: &str, page: u8) -> &'static [Arrow] {
    TREE_ARROWS
        .iter()
        .find(|((code, idx), _)| *code == origin && *idx == page)
        .map(|(_, arrows)| *arrows)
        .unwrap_or(&[])
}

/// Prerequisites for one placed skill. Empty strings mean "none".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PrerequisiteEdge {
    pub skill: String,
    pub req1: String,
    pub req2: String,
}

/// Resolve each template's arrows against whatever now sits at the source
/// cells of the same tab. Prerequisites follow the page's shape, not the
/// identity of the skills that used to be there.
pub fn assign_prerequisites(
    by_class: &BTreeMap<ClassCode, Vec<&Placement>>,
) -> HashMap<String, PrerequisiteEdge> {
    let mut edges = HashMap::new();

    for placements in by_class.values() {
        let occupant: HashMap<(u8, u8, u8), &str> = placements
            .iter()
            .map(|p| ((p.tab, p.row, p.col), p.skill.name.as_str()))
            .collect();

        for p in placements {
            let arrow = arrows_for(&p.template_origin, p.template_page)
                .iter()
                .find(|a| a.target == (p.row, p.col));

            let mut edge = PrerequisiteEdge {
                skill: p.skill.name.clone(),
                ..Default::default()
            };
            if let Some(arrow) = arrow {
                let lookup = |(r, c): (u8, u8)| {
                    occupant
                        .get(&(p.tab, r, c))
                        .map(|s| s.to_string())
                        .unwrap_or_default()
                };
                edge.req1 = lookup(arrow.first);
                edge.req2 = arrow.second.map(lookup).unwrap_or_default();
            }
            edges.insert(p.skill.name.clone(), edge);
        }
    }

    edges
}
