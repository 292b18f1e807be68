use clap::{Parser, ValueEnum};
use log::{info, LevelFilter};
use std::fs;
use std::path::{Path, PathBuf};

use skilltree_randomiser::assets::DirectoryAssets;
use skilltree_randomiser::data::GameData;
use skilltree_randomiser::{
    package, preview, randomise, ActSet, LogicMode, PlayersSettings, RandomiserError,
    RandomiserSettings, Result, SeedInput, StartingItemSettings,
};

const LOG_FILE: &str = "randomiser.log";
const SPOILER_FILE: &str = "spoiler.json";

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Logic {
    Minimal,
    Normal,
}

impl From<Logic> for LogicMode {
    fn from(logic: Logic) -> Self {
        match logic {
            Logic::Minimal => LogicMode::Minimal,
            Logic::Normal => LogicMode::Normal,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "skilltree-randomiser", version, about = "Skill tree randomiser")]
struct Args {
    /// Game data directory: skill_tree_grid.csv, txt/, local/strings/, sprites/.
    #[arg(long)]
    input: PathBuf,

    #[arg(long, required_unless_present = "preview")]
    output: Option<PathBuf>,

    /// Integer or any text.
    #[arg(long)]
    seed: Option<String>,

    #[arg(long, default_value_t = false)]
    no_prereqs: bool,

    #[arg(long, value_enum)]
    logic: Option<Logic>,

    /// Simulated player count, 1-8.
    #[arg(long)]
    players: Option<u8>,

    /// Acts affected by --players, e.g. 1,2,3.
    #[arg(long, value_delimiter = ',')]
    players_acts: Option<Vec<u8>>,

    #[arg(long, default_value_t = false)]
    act_shuffle: bool,

    /// Give every class a teleport staff requiring this level.
    #[arg(long, value_name = "LEVEL")]
    starting_staff_level: Option<u32>,

    /// JSON settings file. Flags given on the command line win.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the layout preview as JSON and exit.
    #[arg(long, default_value_t = false)]
    preview: bool,

    /// Write one mod zip instead of a directory tree.
    #[arg(long, default_value_t = false)]
    zip: bool,

    #[arg(long, default_value_t = false)]
    verbose: bool,

    #[arg(long, default_value_t = false)]
    debug: bool,
}

impl Args {
    fn settings(&self) -> Result<RandomiserSettings> {
        let mut settings = match &self.config {
            Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
            None => RandomiserSettings::default(),
        };

        if let Some(seed) = &self.seed {
            settings.seed = Some(SeedInput::Text(seed.clone()));
        }
        if self.no_prereqs {
            settings.prerequisites = false;
        }
        if let Some(logic) = self.logic {
            settings.logic = logic.into();
        }
        let acts = match &self.players_acts {
            Some(acts) => Some(ActSet::from_acts(acts.iter().copied())?),
            None => None,
        };
        match (self.players, acts) {
            (Some(count), acts) => {
                settings.players = Some(PlayersSettings {
                    count,
                    acts: acts.unwrap_or_default(),
                });
            }
            (None, Some(acts)) => match settings.players.as_mut() {
                Some(players) => players.acts = acts,
                None => {
                    return Err(RandomiserError::Config(
                        "--players-acts needs --players".to_string(),
                    ))
                }
            },
            (None, None) => {}
        }
        if self.act_shuffle {
            settings.act_shuffle = true;
        }
        if let Some(level) = self.starting_staff_level {
            settings.starting_items = Some(StartingItemSettings { level });
        }

        settings.validate()?;
        Ok(settings)
    }

    fn level(&self) -> LevelFilter {
        if self.debug {
            LevelFilter::Trace
        } else if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }
}

fn setup_logging(level: LevelFilter, log_dir: Option<&Path>) -> Result<()> {
    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} [{}] {}: {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr());
    if let Some(dir) = log_dir {
        dispatch = dispatch.chain(fern::log_file(dir.join(LOG_FILE))?);
    }
    dispatch
        .apply()
        .map_err(|e| RandomiserError::Config(format!("logger already installed: {e}")))
}

fn run(args: Args) -> Result<()> {
    let log_dir = match (&args.output, args.preview) {
        (Some(dir), false) => {
            fs::create_dir_all(dir)?;
            Some(dir.as_path())
        }
        _ => None,
    };
    setup_logging(args.level(), log_dir)?;

    let settings = args.settings()?;
    let data = GameData::load(&args.input)?;

    if args.preview {
        let preview = preview(&data, &settings)?;
        println!("{}", serde_json::to_string_pretty(&preview)?);
        return Ok(());
    }

    let out_dir = args
        .output
        .as_deref()
        .ok_or_else(|| RandomiserError::Config("--output is required".to_string()))?;
    let assets = DirectoryAssets::new(&args.input);
    let output = randomise(&data, &assets, &settings)?;

    if args.zip {
        let path = out_dir.join(package::zip_file_name(&output));
        fs::write(&path, package::write_zip(&output)?)?;
        info!("mod written to {}", path.display());
    } else {
        package::write_dir(&output, out_dir)?;
        info!("mod written to {}", out_dir.join(package::MOD_ROOT).display());
    }
    fs::write(
        out_dir.join(SPOILER_FILE),
        serde_json::to_string_pretty(&output.preview)?,
    )?;
    info!("seed {} done", output.seed);
    Ok(())
}

fn main() {
    let args = Args::parse();
    if let Err(err) = run(args) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
