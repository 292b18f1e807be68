use serde::{Deserialize, Serialize};

use crate::acts::ActPermutation;
use crate::classes::{class, TABS_PER_CLASS};
use crate::layout::TreeAssignment;
use crate::placement::Placement;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewSkill {
    pub name: String,
    pub original_class: String,
    pub row: u8,
    pub col: u8,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewTab {
    pub template_class: String,
    pub template_page: u8,
    pub skills: Vec<PreviewSkill>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewClass {
    pub code: String,
    pub name: String,
    pub tabs: Vec<PreviewTab>,
}

/// What a run will produce, without any table or sprite work.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preview {
    pub classes: Vec<PreviewClass>,
    /// Original act at each difficulty slot, when acts were shuffled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub act_order: Option<[u8; 5]>,
}

pub fn build_preview(
    trees: &TreeAssignment,
    placements: &[Placement],
    acts: Option<&ActPermutation>,
) -> Preview {
    let classes = trees
        .iter()
        .map(|(code, pages)| {
            let def = class(*code);
            let tabs = (0..TABS_PER_CLASS)
                .map(|tab| {
                    let page = &pages[tab];
                    let mut skills: Vec<&Placement> = placements
                        .iter()
                        .filter(|p| p.target == *code && p.tab as usize == tab)
                        .collect();
                    skills.sort_by_key(|p| (p.row, p.col));
                    PreviewTab {
                        template_class: page.origin_name.clone(),
                        template_page: page.page_index,
                        skills: skills
                            .into_iter()
                            .map(|p| PreviewSkill {
                                name: p.skill.name.clone(),
                                original_class: class(p.skill.origin).name.to_string(),
                                row: p.row,
                                col: p.col,
                            })
                            .collect(),
                    }
                })
                .collect();
            PreviewClass {
                code: def.charclass.to_string(),
                name: def.name.to_string(),
                tabs,
            }
        })
        .collect();

    Preview {
        classes,
        act_order: acts.map(ActPermutation::order),
    }
}
