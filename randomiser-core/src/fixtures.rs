//! Synthetic game data shared by the unit tests: eight classes of thirty
//! skills on ten-slot template pages, plus small act tables.

use std::path::{Path, PathBuf};

use crate::assets::{MemoryAssets, Resolution};
use crate::classes::{ClassCode, CLASSES};
use crate::data::{GameData, TableKind, TABLE_DIR};
use crate::skills::SkillDefinition;
use crate::sprite::{self, RgbaFrame, DEFAULT_VERSION};
use crate::table::Table;

pub fn fixture_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

pub fn game_data() -> GameData {
    GameData::load(&fixture_dir()).expect("fixture data loads")
}

pub fn grid_text() -> String {
    std::fs::read_to_string(fixture_dir().join(crate::data::GRID_FILE)).expect("fixture grid")
}

pub fn table(kind: TableKind) -> Table {
    let path = fixture_dir().join(TABLE_DIR).join(kind.file_name());
    Table::parse(&std::fs::read_to_string(path).expect("fixture table"))
}

pub fn skill_stub() -> SkillDefinition {
    SkillDefinition {
        id: 0,
        name: "Stub".to_string(),
        origin: ClassCode::Ama,
        descriptor: String::new(),
        required_level: 1,
        formulas: Vec::new(),
        weapon_types: Vec::new(),
        requires: Vec::new(),
    }
}

/// Donor page frames are tagged with their origin class, page and size so
/// tests can tell which page ended up where. Warlock pages are taller.
pub fn tree_page_frame(origin: ClassCode, page: u8, resolution: Resolution) -> RgbaFrame {
    let (width, mut height) = match resolution {
        Resolution::Full => (6, 4),
        Resolution::LowEnd => (3, 2),
    };
    if origin == ClassCode::War {
        height += 2;
    }
    let mut frame = RgbaFrame::transparent(width, height);
    for (i, px) in frame.pixels.chunks_mut(4).enumerate() {
        px.copy_from_slice(&[origin as u8 + 1, page, i as u8, 255]);
    }
    frame
}

pub fn icon_frame(origin: ClassCode, index: u32) -> RgbaFrame {
    let mut frame = RgbaFrame::transparent(4, 4);
    for px in frame.pixels.chunks_mut(4) {
        px.copy_from_slice(&[origin as u8 + 1, index as u8, 9, 255]);
    }
    frame
}

pub fn assets() -> MemoryAssets {
    let mut assets = MemoryAssets::new();
    for def in CLASSES.iter() {
        for resolution in Resolution::ALL {
            // Stored page 3 first.
            let frames: Vec<RgbaFrame> = (1..=3u8)
                .rev()
                .map(|page| tree_page_frame(def.code, page, resolution))
                .collect();
            let bytes = sprite::encode(&frames, DEFAULT_VERSION).expect("fixture sprite");
            assets.insert_tree(def.code, resolution, bytes);
        }
        for index in 0..60 {
            assets.insert_icon(def.code, index, icon_frame(def.code, index));
        }
    }
    assets
}
