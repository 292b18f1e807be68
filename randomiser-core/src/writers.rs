use log::{info, warn};
use std::collections::HashMap;

use crate::classes::{class, tier_for_row};
use crate::placement::Placement;
use crate::prereq::PrerequisiteEdge;
use crate::skills::{FORMULA_COLUMNS, MAX_SYNERGY_SLOTS};
use crate::synergy::SynergyRewrite;
use crate::table::{Column, Table};

/// Known positions of skills-table columns in the shipped file, used when a
/// header is missing.
const SKILLS_FALLBACKS: &[(&str, usize)] = &[
    ("skill", 0),
    ("charclass", 2),
    ("reqskill1", 161),
    ("reqskill2", 162),
    ("reqskill3", 163),
    ("reqlevel", 174),
    ("DmgSymPerCalc", 237),
    ("EDmgSymPerCalc", 251),
    ("ELenSymPerCalc", 256),
];

fn fallback_column(table: &Table, name: &str) -> Option<Column> {
    let schema = table.schema();
    match SKILLS_FALLBACKS.iter().find(|(n, _)| *n == name) {
        Some((_, pos)) => schema.column_or(name, *pos),
        None => schema.column(name),
    }
}

fn row_index(table: &Table, key: Option<Column>) -> HashMap<String, usize> {
    let Some(key) = key else {
        return HashMap::new();
    };
    let mut out = HashMap::with_capacity(table.len());
    for row in 0..table.len() {
        out.entry(table.get(row, key).to_string()).or_insert(row);
    }
    out
}

fn set_opt(table: &mut Table, row: usize, col: Option<Column>, value: impl Into<String>) {
    if let Some(col) = col {
        table.set(row, col, value);
    }
}

/// Move each placed skill to its new class and tier, rewire its
/// prerequisites and write its remapped synergy formulas.
///
/// `edges` is `None` when prerequisites are disabled; every placed skill
/// then has none.
pub fn write_skills_table(
    table: &mut Table,
    placements: &[Placement],
    edges: Option<&HashMap<String, PrerequisiteEdge>>,
    synergies: &HashMap<String, SynergyRewrite>,
) {
    let name_col = fallback_column(table, "skill");
    let class_col = fallback_column(table, "charclass");
    let level_col = fallback_column(table, "reqlevel");
    let req_cols = [
        fallback_column(table, "reqskill1"),
        fallback_column(table, "reqskill2"),
        fallback_column(table, "reqskill3"),
    ];
    let formula_cols: HashMap<&str, Option<Column>> = FORMULA_COLUMNS
        .iter()
        .map(|name| (*name, fallback_column(table, name)))
        .collect();
    let rows = row_index(table, name_col);

    let mut written = 0;
    for p in placements {
        let Some(&row) = rows.get(&p.skill.name) else {
            warn!("skill '{}' not found in skills table", p.skill.name);
            continue;
        };

        set_opt(table, row, class_col, class(p.target).charclass);
        set_opt(table, row, level_col, tier_for_row(p.row).to_string());

        let edge = edges.and_then(|e| e.get(&p.skill.name));
        let (req1, req2) = edge
            .map(|e| (e.req1.clone(), e.req2.clone()))
            .unwrap_or_default();
        set_opt(table, row, req_cols[0], req1);
        set_opt(table, row, req_cols[1], req2);
        set_opt(table, row, req_cols[2], "");

        if let Some(rewrite) = synergies.get(&p.skill.name) {
            for (column, formula) in &rewrite.formulas {
                let col = formula_cols.get(column).copied().flatten();
                set_opt(table, row, col, formula.clone());
            }
        }
        written += 1;
    }
    info!("skills table: {written} rows rewritten");
}

struct DisplayColumns {
    line: Option<Column>,
    texta: Option<Column>,
    textb: Option<Column>,
    calca: Option<Column>,
    calcb: Option<Column>,
}

/// Header slot then body slots, as `(line, texta, calca)`.
const HEADER_STYLE: (&str, &str, &str) = ("40", "Sksyn", "2");
const BODY_STYLE: (&str, &str, &str) = ("76", "Magdplev", "par8");

/// Rewrite each placed skill's page, cell, list row and icon, and replace
/// its synergy display block when a new one was chosen.
pub fn write_skilldesc_table(
    table: &mut Table,
    placements: &[Placement],
    synergies: &HashMap<String, SynergyRewrite>,
) {
    let schema = table.schema();
    let key_col = schema.column_or("skilldesc", 0);
    let page_col = schema.column("SkillPage");
    let row_col = schema.column("SkillRow");
    let col_col = schema.column("SkillColumn");
    let list_col = schema.column("ListRow");
    let icon_col = schema.column("IconCel");
    let slots: Vec<DisplayColumns> = (1..=MAX_SYNERGY_SLOTS)
        .map(|i| DisplayColumns {
            line: schema.column(&format!("dsc3line{i}")),
            texta: schema.column(&format!("dsc3texta{i}")),
            textb: schema.column(&format!("dsc3textb{i}")),
            calca: schema.column(&format!("dsc3calca{i}")),
            calcb: schema.column(&format!("dsc3calcb{i}")),
        })
        .collect();
    let rows = row_index(table, key_col);

    let mut written = 0;
    for p in placements {
        let Some(&row) = rows.get(&p.skill.descriptor) else {
            warn!("descriptor '{}' not found in skilldesc table", p.skill.descriptor);
            continue;
        };

        set_opt(table, row, page_col, (p.tab + 1).to_string());
        set_opt(table, row, row_col, p.row.to_string());
        set_opt(table, row, col_col, p.col.to_string());
        set_opt(table, row, list_col, (p.rank % 10 + 1).to_string());
        set_opt(table, row, icon_col, p.icon_index.to_string());

        let refs = synergies
            .get(&p.skill.name)
            .and_then(|r| r.display_refs.as_ref());
        if let Some(refs) = refs {
            for slot in &slots {
                for col in [slot.line, slot.texta, slot.textb, slot.calca, slot.calcb] {
                    set_opt(table, row, col, "");
                }
            }
            for (i, (reference, slot)) in refs.iter().zip(&slots).enumerate() {
                let (line, texta, calca) = if i == 0 { HEADER_STYLE } else { BODY_STYLE };
                set_opt(table, row, slot.line, line);
                set_opt(table, row, slot.texta, texta);
                set_opt(table, row, slot.textb, reference.clone());
                set_opt(table, row, slot.calca, calca);
            }
        }
        written += 1;
    }
    info!("skilldesc table: {written} rows rewritten");
}
