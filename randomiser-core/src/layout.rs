use log::{debug, warn};
use std::collections::BTreeMap;

use crate::classes::{ClassCode, CLASSES, GRID_COLS, GRID_ROWS, TABS_PER_CLASS};
use crate::rng::SeededRng;
use crate::{RandomiserError, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GridSlot {
    pub row: u8,
    pub col: u8,
    pub filled: bool,
    /// Skill occupying this slot in the unmodified game.
    pub original_skill: Option<String>,
}

/// One donor grid template: the slot shape of page `page_index` of the
/// `origin_code` class tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayoutPage {
    pub origin_code: String,
    pub origin_name: String,
    /// 1..=3
    pub page_index: u8,
    pub slots: Vec<GridSlot>,
}

impl LayoutPage {
    pub fn key(&self) -> (String, u8) {
        (self.origin_code.clone(), self.page_index)
    }

    pub fn filled_slots(&self) -> impl Iterator<Item = &GridSlot> {
        self.slots.iter().filter(|s| s.filled)
    }

    pub fn filled_count(&self) -> usize {
        self.filled_slots().count()
    }
}

/// Parse the grid template file:
/// `className,classCode,tree,row,col,status,skill` with a header line.
pub fn parse_layout_pages(text: &str) -> Result<Vec<LayoutPage>> {
    let mut pages: BTreeMap<(String, u8), LayoutPage> = BTreeMap::new();

    for (idx, raw_line) in text.lines().enumerate().skip(1) {
        let line = raw_line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        let cols: Vec<&str> = line.split(',').map(str::trim).collect();
        if cols.len() < 6 {
            warn!("grid template line {} has {} fields, skipped", idx + 1, cols.len());
            continue;
        }

        let parsed = (
            cols[2].parse::<u8>(),
            cols[3].parse::<u8>(),
            cols[4].parse::<u8>(),
        );
        let (page_index, row, col) = match parsed {
            (Ok(t), Ok(r), Ok(c)) => (t, r, c),
            _ => {
                warn!("grid template line {} has a non-numeric position, skipped", idx + 1);
                continue;
            }
        };
        if !(1..=TABS_PER_CLASS as u8).contains(&page_index)
            || !(1..=GRID_ROWS).contains(&row)
            || !(1..=GRID_COLS).contains(&col)
        {
            warn!("grid template line {} is outside the 3x6x3 grid, skipped", idx + 1);
            continue;
        }

        let filled = cols[5].eq_ignore_ascii_case("FILLED");
        let original_skill = cols
            .get(6)
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string());

        let key = (cols[1].to_string(), page_index);
        let page = pages.entry(key).or_insert_with(|| LayoutPage {
            origin_code: cols[1].to_string(),
            origin_name: cols[0].to_string(),
            page_index,
            slots: Vec::new(),
        });
        page.slots.push(GridSlot {
            row,
            col,
            filled,
            original_skill,
        });
    }

    if pages.is_empty() {
        return Err(RandomiserError::MissingInput(
            "grid template file has no usable pages".to_string(),
        ));
    }

    Ok(pages.into_values().collect())
}

/// The three pages chosen for one class, tab 0..2 in order.
pub type TreeAssignment = BTreeMap<ClassCode, [LayoutPage; TABS_PER_CLASS]>;

/// For every class and tab draw one page whose page index matches the tab
/// (tab 0 takes a page-1 template). Draws are independent and with
/// replacement across classes.
pub fn assign_trees(rng: &mut SeededRng, pages: &[LayoutPage]) -> Result<TreeAssignment> {
    // Pools ordered by class table order so the draw never depends on
    // input file order.
    let class_rank = |code: &str| {
        CLASSES
            .iter()
            .position(|c| c.charclass == code)
            .unwrap_or(CLASSES.len())
    };

    let mut pools: Vec<Vec<&LayoutPage>> = Vec::with_capacity(TABS_PER_CLASS);
    for tab in 0..TABS_PER_CLASS {
        let mut pool: Vec<&LayoutPage> = pages
            .iter()
            .filter(|p| p.page_index as usize == tab + 1)
            .collect();
        pool.sort_by(|a, b| {
            class_rank(&a.origin_code)
                .cmp(&class_rank(&b.origin_code))
                .then_with(|| a.origin_code.cmp(&b.origin_code))
        });
        if pool.is_empty() {
            return Err(RandomiserError::MissingInput(format!(
                "no grid templates for page {}",
                tab + 1
            )));
        }
        pools.push(pool);
    }

    let mut assignment = TreeAssignment::new();
    for class in CLASSES.iter() {
        let picked: [LayoutPage; TABS_PER_CLASS] = std::array::from_fn(|tab| {
            let pool = &pools[tab];
            let idx = rng.rand_int(0, pool.len() - 1);
            pool[idx].clone()
        });
        debug!(
            "{}: trees {}",
            class.name,
            picked
                .iter()
                .map(|p| format!("{}-{}", p.origin_code, p.page_index))
                .collect::<Vec<_>>()
                .join(", ")
        );
        assignment.insert(class.code, picked);
    }

    Ok(assignment)
}
