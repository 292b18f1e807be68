#![allow(dead_code)]

use std::path::{Path, PathBuf};

use skilltree_randomiser::assets::{MemoryAssets, Resolution};
use skilltree_randomiser::classes::CLASSES;
use skilltree_randomiser::data::GameData;
use skilltree_randomiser::sprite::{self, RgbaFrame, DEFAULT_VERSION};
use skilltree_randomiser::table::Table;
use skilltree_randomiser::{RandomiserSettings, SeedInput};

pub fn fixture_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

pub fn game_data() -> GameData {
    GameData::load(&fixture_dir()).expect("fixture data loads")
}

fn solid(width: u32, height: u32, rgba: [u8; 4]) -> RgbaFrame {
    let mut frame = RgbaFrame::transparent(width, height);
    for px in frame.pixels.chunks_mut(4) {
        px.copy_from_slice(&rgba);
    }
    frame
}

/// Three-page tree sprites and sixty icons for every class, each frame a
/// distinct solid colour.
pub fn assets() -> MemoryAssets {
    let mut assets = MemoryAssets::new();
    for (i, def) in CLASSES.iter().enumerate() {
        for resolution in Resolution::ALL {
            let (w, h) = match resolution {
                Resolution::Full => (8, 6 + i as u32),
                Resolution::LowEnd => (4, 3),
            };
            let frames: Vec<RgbaFrame> = (1..=3u8)
                .rev()
                .map(|page| solid(w, h, [i as u8, page, 0, 255]))
                .collect();
            assets.insert_tree(def.code, resolution, sprite::encode(&frames, DEFAULT_VERSION).unwrap());
        }
        for index in 0..60 {
            assets.insert_icon(def.code, index, solid(2, 2, [i as u8, index as u8, 1, 255]));
        }
    }
    assets
}

pub fn settings(seed: SeedInput) -> RandomiserSettings {
    RandomiserSettings::with_seed(seed)
}

pub fn column(table: &Table, name: &str) -> Vec<String> {
    let col = table.schema().column(name).expect("column exists");
    (0..table.len()).map(|r| table.get(r, col).to_string()).collect()
}
