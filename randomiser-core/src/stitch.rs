use log::{info, warn};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};

use crate::assets::{icon_sheet_name, AssetSource, Resolution};
use crate::classes::{class, class_by_charclass, ClassCode, CLASSES, SKILLS_PER_CLASS};
use crate::layout::TreeAssignment;
use crate::placement::Placement;
use crate::skills::SkillDescriptor;
use crate::sprite::{self, RgbaFrame, Sprite, DEFAULT_VERSION};
use crate::Result;

pub const ICON_WIDTH: u32 = 132;
pub const ICON_HEIGHT: u32 = 130;
/// Idle and pressed frame per skill.
pub const ICONS_PER_CLASS: usize = SKILLS_PER_CLASS * 2;

/// Output sprite file name to encoded bytes.
pub type SpriteFiles = BTreeMap<String, Vec<u8>>;

/// Template sprites hold pages in reverse: page 3 is frame 0.
fn page_frame_index(frame_count: u32, page_index: u8) -> Option<u32> {
    frame_count.checked_sub(page_index as u32)
}

/// Rebuild every class's tree sprite, both resolutions, from the pages its
/// tabs were drawn from.
pub fn stitch_tree_sprites(trees: &TreeAssignment, assets: &dyn AssetSource) -> Result<SpriteFiles> {
    let mut sources: HashMap<(ClassCode, Resolution), Option<Vec<u8>>> = HashMap::new();
    let mut out = SpriteFiles::new();

    for (code, pages) in trees {
        let def = class(*code);
        for resolution in Resolution::ALL {
            let mut frames: Vec<Option<RgbaFrame>> = Vec::with_capacity(pages.len());
            for page in pages.iter() {
                let Some(origin) = class_by_charclass(&page.origin_code) else {
                    warn!("template class '{}' has no sprite", page.origin_code);
                    frames.push(None);
                    continue;
                };
                let bytes = sources
                    .entry((origin.code, resolution))
                    .or_insert_with(|| assets.tree_sprite(origin.code, resolution));
                let frame = bytes.as_deref().and_then(|buf| {
                    let sprite = Sprite::parse(buf)
                        .map_err(|e| warn!("{} tree sprite unusable: {e}", origin.name))
                        .ok()?;
                    let idx = page_frame_index(sprite.frame_count(), page.page_index)?;
                    sprite.frame(idx).ok()
                });
                if frame.is_none() {
                    warn!(
                        "{}: page {} of {} missing at {:?}, left transparent",
                        def.name, page.page_index, origin.name, resolution
                    );
                }
                frames.push(frame);
            }

            let (width, height) = frames
                .iter()
                .flatten()
                .fold((0, 0), |(w, h), f| (w.max(f.width), h.max(f.height)));
            if width == 0 || height == 0 {
                warn!("{}: no tree pages readable at {:?}, sprite skipped", def.name, resolution);
                continue;
            }

            let mut filled: Vec<RgbaFrame> = frames
                .into_iter()
                .map(|f| f.unwrap_or_else(|| RgbaFrame::transparent(width, height)))
                .collect();
            filled.reverse();
            let encoded = sprite::encode_padded(&filled, DEFAULT_VERSION)?;
            out.insert(resolution.tree_file_name(def.sprite_prefix), encoded);
        }
    }

    info!("stitched {} tree sprites", out.len());
    Ok(out)
}

/// Build one 60-frame icon sheet per class. Frame `2r` and `2r + 1` show the
/// rank-`r` skill using its original class's artwork.
pub fn build_icon_sheets(
    by_class: &BTreeMap<ClassCode, Vec<&Placement>>,
    descriptors: &HashMap<String, SkillDescriptor>,
    assets: &dyn AssetSource,
) -> Result<SpriteFiles> {
    let mut out = SpriteFiles::new();

    for def in CLASSES.iter() {
        let Some(placements) = by_class.get(&def.code) else {
            continue;
        };

        let mut jobs: Vec<Option<(ClassCode, u32)>> = vec![None; ICONS_PER_CLASS];
        for p in placements {
            if p.rank >= SKILLS_PER_CLASS {
                continue;
            }
            let base = descriptors
                .get(&p.skill.descriptor)
                .map(|d| d.icon_index)
                .unwrap_or(0);
            jobs[p.rank * 2] = Some((p.skill.origin, base));
            jobs[p.rank * 2 + 1] = Some((p.skill.origin, base + 1));
        }

        let frames: Vec<RgbaFrame> = jobs
            .par_iter()
            .map(|job| {
                let Some((origin, index)) = *job else {
                    return RgbaFrame::transparent(ICON_WIDTH, ICON_HEIGHT);
                };
                match assets.icon(origin, index) {
                    Some(frame) => frame.padded(ICON_WIDTH, ICON_HEIGHT),
                    None => {
                        warn!("icon {} of {} missing, left transparent", index, class(origin).name);
                        RgbaFrame::transparent(ICON_WIDTH, ICON_HEIGHT)
                    }
                }
            })
            .collect();

        out.insert(icon_sheet_name(def.code), sprite::encode(&frames, DEFAULT_VERSION)?);
    }

    info!("built {} icon sheets", out.len());
    Ok(out)
}
