use log::info;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::assets::icon_sheet_name;
use crate::classes::CLASSES;
use crate::{RandomiserOutput, Result};

pub const MOD_ROOT: &str = "mod";
const EXCEL_DIR: &str = "data/global/excel";
const STRINGS_DIR: &str = "data/local/lng/strings";
const TREE_DIR: &str = "data/hd/global/ui/spells/skill_trees";
const ICON_DIRS: [&str; 2] = ["data/global/ui/spells", "data/hd/global/ui/spells"];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub description: &'static str,
    pub author: &'static str,
    #[serde(rename = "d2rmmVersion")]
    pub d2rmm_version: &'static str,
}

pub const MOD_INFO: ModInfo = ModInfo {
    name: "d2r-skill-randomizer",
    version: "1.0",
    description: "Randomized skill trees across all classes",
    author: "skilltree-randomiser",
    d2rmm_version: "1.5.0",
};

/// Every file of the mod, keyed by its path under the mod's parent folder.
pub fn mod_files(output: &RandomiserOutput) -> Result<BTreeMap<String, Vec<u8>>> {
    let mut files = BTreeMap::new();
    let mut add = |rel: String, bytes: Vec<u8>| {
        files.insert(format!("{MOD_ROOT}/{rel}"), bytes);
    };

    add("modinfo.json".to_string(), serde_json::to_vec_pretty(&MOD_INFO)?);

    for (kind, table) in &output.files.tables {
        add(
            format!("{EXCEL_DIR}/{}", kind.file_name()),
            table.to_text().into_bytes(),
        );
    }
    if let Some(strings) = &output.files.skill_strings {
        add(format!("{STRINGS_DIR}/skills.json"), strings.to_json()?.into_bytes());
    }
    if let Some(names) = &output.files.item_names {
        add(format!("{STRINGS_DIR}/item-names.json"), names.to_json()?.into_bytes());
    }

    for (name, bytes) in &output.tree_sprites {
        add(format!("{TREE_DIR}/{name}"), bytes.clone());
    }
    for def in CLASSES.iter() {
        let Some(bytes) = output.icon_sheets.get(&icon_sheet_name(def.code)) else {
            continue;
        };
        for dir in ICON_DIRS {
            add(
                format!("{dir}/{}/{}", def.spell_folder, icon_sheet_name(def.code)),
                bytes.clone(),
            );
        }
    }
    Ok(files)
}

/// Write the mod tree under `dir`, returning the paths written.
pub fn write_dir(output: &RandomiserOutput, dir: &Path) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for (rel, bytes) in mod_files(output)? {
        let path = dir.join(&rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, bytes)?;
        written.push(path);
    }
    info!("wrote {} files under {}", written.len(), dir.display());
    Ok(written)
}

/// The mod as an in-memory deflate zip.
pub fn write_zip(output: &RandomiserOutput) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    let files = mod_files(output)?;
    for (rel, bytes) in &files {
        zip.start_file(rel.as_str(), options)?;
        zip.write_all(bytes)?;
    }
    let buf = zip.finish()?.into_inner();
    info!("zipped {} files ({} bytes)", files.len(), buf.len());
    Ok(buf)
}

pub fn zip_file_name(output: &RandomiserOutput) -> String {
    format!("skill-randomizer-{}.zip", output.seed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{fixtures, randomise, RandomiserSettings, SeedInput, StartingItemSettings};
    use std::io::Read;

    fn output() -> RandomiserOutput {
        let mut settings = RandomiserSettings::with_seed(SeedInput::Integer(3));
        settings.starting_items = Some(StartingItemSettings { level: 1 });
        randomise(&fixtures::game_data(), &fixtures::assets(), &settings).unwrap()
    }

    #[test]
    fn layout_of_mod_files() {
        let files = mod_files(&output()).unwrap();
        for path in [
            "mod/modinfo.json",
            "mod/data/global/excel/skills.txt",
            "mod/data/global/excel/skilldesc.txt",
            "mod/data/global/excel/charstats.txt",
            "mod/data/global/excel/uniqueitems.txt",
            "mod/data/local/lng/strings/skills.json",
            "mod/data/local/lng/strings/item-names.json",
            "mod/data/hd/global/ui/spells/skill_trees/amskilltree.sprite",
            "mod/data/hd/global/ui/spells/skill_trees/waskilltree.lowend.sprite",
            "mod/data/global/ui/spells/amazon/amskillicon.sprite",
            "mod/data/hd/global/ui/spells/amazon/amskillicon.sprite",
        ] {
            assert!(files.contains_key(path), "{path} missing");
        }
        // Untouched tables are not shipped.
        assert!(!files.contains_key("mod/data/global/excel/monstats.txt"));

        let info: serde_json::Value = serde_json::from_slice(&files["mod/modinfo.json"]).unwrap();
        assert_eq!(info["d2rmmVersion"], "1.5.0");
    }

    #[test]
    fn directory_and_zip_hold_the_same_files() {
        let output = output();
        let dir = tempfile::tempdir().unwrap();
        let written = write_dir(&output, dir.path()).unwrap();
        let files = mod_files(&output).unwrap();
        assert_eq!(written.len(), files.len());

        let zipped = write_zip(&output).unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(zipped)).unwrap();
        assert_eq!(archive.len(), files.len());
        let mut skills = String::new();
        archive
            .by_name("mod/data/global/excel/skills.txt")
            .unwrap()
            .read_to_string(&mut skills)
            .unwrap();
        let on_disk = fs::read_to_string(dir.path().join("mod/data/global/excel/skills.txt")).unwrap();
        assert_eq!(skills, on_disk);
    }
}
