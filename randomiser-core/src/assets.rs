use log::debug;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::classes::{class, ClassCode};
use crate::sprite::RgbaFrame;

/// Which of the two shipped tree sprite sizes to read or write.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Resolution {
    Full,
    LowEnd,
}

impl Resolution {
    pub const ALL: [Resolution; 2] = [Resolution::Full, Resolution::LowEnd];

    pub fn tree_file_name(self, sprite_prefix: &str) -> String {
        match self {
            Resolution::Full => format!("{sprite_prefix}skilltree.sprite"),
            Resolution::LowEnd => format!("{sprite_prefix}skilltree.lowend.sprite"),
        }
    }
}

/// Raw graphics the stitcher reads. `None` means the asset is missing or
/// unreadable; callers substitute transparent frames.
pub trait AssetSource: Send + Sync {
    fn tree_sprite(&self, class: ClassCode, resolution: Resolution) -> Option<Vec<u8>>;
    fn icon(&self, class: ClassCode, index: u32) -> Option<RgbaFrame>;
}

/// Assets laid out on disk:
/// `sprites/skill_trees/<prefix>skilltree[.lowend].sprite` and
/// `sprites/icons/<Folder>/<Folder>_<n>.bmp` (PNG data despite the name).
pub struct DirectoryAssets {
    root: PathBuf,
}

impl DirectoryAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn tree_path(&self, class: ClassCode, resolution: Resolution) -> PathBuf {
        self.root
            .join("sprites")
            .join("skill_trees")
            .join(resolution.tree_file_name(crate::classes::class(class).sprite_prefix))
    }

    fn icon_path(&self, class: ClassCode, index: u32) -> PathBuf {
        let folder = crate::classes::class(class).icon_folder;
        self.root
            .join("sprites")
            .join("icons")
            .join(folder)
            .join(format!("{folder}_{index}.bmp"))
    }
}

fn read_optional(path: &Path) -> Option<Vec<u8>> {
    match fs::read(path) {
        Ok(bytes) => Some(bytes),
        Err(err) => {
            debug!("asset {} unreadable: {err}", path.display());
            None
        }
    }
}

impl AssetSource for DirectoryAssets {
    fn tree_sprite(&self, class: ClassCode, resolution: Resolution) -> Option<Vec<u8>> {
        read_optional(&self.tree_path(class, resolution))
    }

    fn icon(&self, class: ClassCode, index: u32) -> Option<RgbaFrame> {
        let path = self.icon_path(class, index);
        let bytes = read_optional(&path)?;
        match image::load_from_memory(&bytes) {
            Ok(img) => {
                let rgba = img.to_rgba8();
                Some(RgbaFrame {
                    width: rgba.width(),
                    height: rgba.height(),
                    pixels: rgba.into_raw(),
                })
            }
            Err(err) => {
                debug!("icon {} undecodable: {err}", path.display());
                None
            }
        }
    }
}

/// In-memory assets, for tests and callers that already hold the bytes.
#[derive(Default)]
pub struct MemoryAssets {
    trees: HashMap<(ClassCode, Resolution), Vec<u8>>,
    icons: HashMap<(ClassCode, u32), RgbaFrame>,
}

impl MemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_tree(&mut self, class: ClassCode, resolution: Resolution, bytes: Vec<u8>) {
        self.trees.insert((class, resolution), bytes);
    }

    pub fn insert_icon(&mut self, class: ClassCode, index: u32, frame: RgbaFrame) {
        self.icons.insert((class, index), frame);
    }
}

impl AssetSource for MemoryAssets {
    fn tree_sprite(&self, class: ClassCode, resolution: Resolution) -> Option<Vec<u8>> {
        self.trees.get(&(class, resolution)).cloned()
    }

    fn icon(&self, class: ClassCode, index: u32) -> Option<RgbaFrame> {
        self.icons.get(&(class, index)).cloned()
    }
}

/// Sprite file name for a class's icon sheet.
pub fn icon_sheet_name(code: ClassCode) -> String {
    format!("{}skillicon.sprite", class(code).sprite_prefix)
}
