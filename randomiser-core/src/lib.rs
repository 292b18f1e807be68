use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

pub mod acts;
pub mod assets;
pub mod cache;
pub mod classes;
pub mod data;
pub mod layout;
pub mod package;
pub mod placement;
pub mod post;
pub mod prereq;
pub mod preview;
pub mod rng;
pub mod scaling;
pub mod skills;
pub mod sprite;
pub mod stitch;
pub mod strings;
pub mod synergy;
pub mod table;
pub mod writers;

#[cfg(test)]
mod fixtures;

use acts::{permute_act_tables, ActPermutation};
use assets::AssetSource;
use data::{GameData, TableKind};
use layout::{assign_trees, TreeAssignment};
use placement::{group_by_class, place_skills, Placement};
use post::{post_steps, run_post_steps, ModTables, PostContext};
use prereq::assign_prerequisites;
use preview::{build_preview, Preview};
use rng::{Seed, SeededRng};
use scaling::{scale_players, ACT_COUNT};
use sprite::SpriteError;
use stitch::{build_icon_sheets, stitch_tree_sprites, SpriteFiles};
use synergy::remap_synergies;
use writers::{write_skilldesc_table, write_skills_table};

pub const MAX_PLAYERS: u8 = 8;
pub const MAX_CHARACTER_LEVEL: u32 = 99;

/// A seed as typed by a user: a number, or any text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SeedInput {
    Integer(i64),
    Text(String),
}

impl SeedInput {
    pub fn resolve(&self) -> Result<Seed> {
        match self {
            SeedInput::Integer(n) => Ok(Seed::from_integer(*n)),
            SeedInput::Text(t) if t.trim().is_empty() => Err(RandomiserError::MissingSeed),
            SeedInput::Text(t) => Ok(Seed::from_text(t)),
        }
    }
}

/// How much auxiliary text follows a moved skill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicMode {
    /// Only the tree layout changes.
    #[default]
    Minimal,
    /// Weapon restrictions and their text are adjusted to the new class.
    Normal,
}

/// Acts whose monsters are affected by players scaling.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct ActSet(BTreeSet<u8>);

impl ActSet {
    pub fn all() -> Self {
        Self((1..=ACT_COUNT).collect())
    }

    pub fn from_acts(acts: impl IntoIterator<Item = u8>) -> Result<Self> {
        let mut set = BTreeSet::new();
        for act in acts {
            if !(1..=ACT_COUNT).contains(&act) {
                return Err(RandomiserError::Config(format!("unknown act {act}")));
            }
            set.insert(act);
        }
        Ok(Self(set))
    }

    pub fn contains(&self, act: u8) -> bool {
        self.0.contains(&act)
    }

    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.0.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for ActSet {
    fn default() -> Self {
        Self::all()
    }
}

impl TryFrom<Vec<u8>> for ActSet {
    type Error = RandomiserError;

    fn try_from(acts: Vec<u8>) -> Result<Self> {
        Self::from_acts(acts)
    }
}

impl From<ActSet> for Vec<u8> {
    fn from(acts: ActSet) -> Self {
        acts.0.into_iter().collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayersSettings {
    pub count: u8,
    #[serde(default)]
    pub acts: ActSet,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StartingItemSettings {
    /// Required character level of the starting staff.
    pub level: u32,
}

/// Every option that affects a run's output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomiserSettings {
    pub seed: Option<SeedInput>,
    pub prerequisites: bool,
    pub logic: LogicMode,
    pub players: Option<PlayersSettings>,
    pub act_shuffle: bool,
    pub starting_items: Option<StartingItemSettings>,
}

impl Default for RandomiserSettings {
    fn default() -> Self {
        Self {
            seed: None,
            prerequisites: true,
            logic: LogicMode::Minimal,
            players: None,
            act_shuffle: false,
            starting_items: None,
        }
    }
}

impl RandomiserSettings {
    pub fn with_seed(seed: SeedInput) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    pub fn resolve_seed(&self) -> Result<Seed> {
        self.seed.as_ref().ok_or(RandomiserError::MissingSeed)?.resolve()
    }

    pub fn validate(&self) -> Result<()> {
        self.resolve_seed()?;
        if let Some(players) = &self.players {
            if !(1..=MAX_PLAYERS).contains(&players.count) {
                return Err(RandomiserError::Config(format!(
                    "players must be between 1 and {MAX_PLAYERS}, got {}",
                    players.count
                )));
            }
        }
        if let Some(items) = &self.starting_items {
            if !(1..=MAX_CHARACTER_LEVEL).contains(&items.level) {
                return Err(RandomiserError::Config(format!(
                    "starting staff level must be between 1 and {MAX_CHARACTER_LEVEL}, got {}",
                    items.level
                )));
            }
        }
        Ok(())
    }

    /// The equivalent settings that produce the same output: the seed in
    /// resolved form and no players scaling for a single player.
    pub fn normalized(&self) -> Result<Self> {
        self.validate()?;
        let seed = self.resolve_seed()?;
        Ok(Self {
            seed: Some(SeedInput::Integer(seed.value() as i64)),
            players: self.players.clone().filter(|p| p.count > 1),
            ..self.clone()
        })
    }

    /// Players scaling actually applied, if any.
    fn effective_players(&self) -> Option<&PlayersSettings> {
        self.players.as_ref().filter(|p| p.count > 1)
    }
}

#[derive(Debug, Error)]
pub enum RandomiserError {
    #[error("a seed is required")]
    MissingSeed,
    #[error("required input missing: {0}")]
    MissingInput(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("sprite error: {0}")]
    Sprite(#[from] SpriteError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, RandomiserError>;

/// Everything one run produces.
#[derive(Debug, Clone, PartialEq)]
pub struct RandomiserOutput {
    pub seed: Seed,
    pub settings: RandomiserSettings,
    pub placements: Vec<Placement>,
    pub act_order: Option<ActPermutation>,
    pub preview: Preview,
    /// Only the tables and string files the run changed.
    pub files: ModTables,
    pub tree_sprites: SpriteFiles,
    pub icon_sheets: SpriteFiles,
}

struct Layout {
    seed: Seed,
    rng: SeededRng,
    trees: TreeAssignment,
    placements: Vec<Placement>,
    act_order: Option<ActPermutation>,
}

/// Tree draws and skill placement, shared by full runs and previews.
fn lay_out(data: &GameData, settings: &RandomiserSettings) -> Result<Layout> {
    settings.validate()?;
    let seed = settings.resolve_seed()?;
    let mut rng = SeededRng::new(seed);

    let trees = assign_trees(&mut rng, &data.pages)?;
    let placements = place_skills(&mut rng, &data.skills, &trees);
    info!("seed {seed}: {} skills placed", placements.len());

    let act_order = settings
        .act_shuffle
        .then(|| ActPermutation::draw(&mut SeededRng::new(seed.act_stream())));

    Ok(Layout {
        seed,
        rng,
        trees,
        placements,
        act_order,
    })
}

/// The layout a run would produce, without touching tables or sprites.
pub fn preview(data: &GameData, settings: &RandomiserSettings) -> Result<Preview> {
    let layout = lay_out(data, settings)?;
    Ok(build_preview(
        &layout.trees,
        &layout.placements,
        layout.act_order.as_ref(),
    ))
}

/// Run the whole randomiser: place skills, rewrite every table and string
/// file they touch, rescale monsters and rebuild the class sprites.
pub fn randomise(
    data: &GameData,
    assets: &dyn AssetSource,
    settings: &RandomiserSettings,
) -> Result<RandomiserOutput> {
    let Layout {
        seed,
        mut rng,
        trees,
        placements,
        act_order,
    } = lay_out(data, settings)?;
    let by_class = group_by_class(&placements);

    let synergies = remap_synergies(&mut rng, &placements, &by_class, &data.descriptors);
    info!("synergies remapped for {} skills", synergies.len());
    let edges = settings
        .prerequisites
        .then(|| assign_prerequisites(&by_class));

    let mut files = ModTables {
        tables: data.tables.clone(),
        skill_strings: data.skill_strings.clone(),
        item_names: data.item_names.clone(),
    };
    if let Some(skills) = files.table_mut(TableKind::Skills) {
        write_skills_table(skills, &placements, edges.as_ref(), &synergies);
    }
    if let Some(skilldesc) = files.table_mut(TableKind::SkillDesc) {
        write_skilldesc_table(skilldesc, &placements, &synergies);
    }

    let ctx = PostContext {
        placements: &placements,
        descriptors: &data.descriptors,
    };
    run_post_steps(&post_steps(settings), &mut rng, &ctx, &mut files);

    if let Some(players) = settings.effective_players() {
        match files.table_mut(TableKind::MonStats) {
            Some(monstats) => scale_players(monstats, players.count, &players.acts),
            None => warn!("players scaling requested but monstats is missing"),
        }
    }
    if let Some(perm) = &act_order {
        permute_act_tables(&mut files.tables, perm);
    }

    let tree_sprites = stitch_tree_sprites(&trees, assets)?;
    let icon_sheets = build_icon_sheets(&by_class, &data.descriptors, assets)?;

    files
        .tables
        .retain(|kind, table| data.tables.get(kind) != Some(&*table));
    if files.skill_strings == data.skill_strings {
        files.skill_strings = None;
    }
    if files.item_names == data.item_names {
        files.item_names = None;
    }
    info!(
        "seed {seed}: {} tables, {} tree sprites, {} icon sheets",
        files.tables.len(),
        tree_sprites.len(),
        icon_sheets.len()
    );

    let preview = build_preview(&trees, &placements, act_order.as_ref());
    Ok(RandomiserOutput {
        seed,
        settings: settings.clone(),
        placements,
        act_order,
        preview,
        files,
        tree_sprites,
        icon_sheets,
    })
}
