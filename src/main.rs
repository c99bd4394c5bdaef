// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

mod config;
mod report;

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use clap::Parser;
use log::{error, info, warn};
use map_scene::{InMemoryMap, InMemoryOverlay, OverlayHandle, Scene, SceneError};
use thiserror::Error;

use config::AppConfig;

#[derive(Parser, Debug)]
#[command(
    name = "geoscene",
    version,
    about = "Drive a map layer scene headlessly and print the resulting draw state",
    long_about = "Loads a backend resource tree, applies the requested node operations \
                  against an in-memory map engine and prints the engine state. Operations \
                  run in a fixed order: load, close, open, move, terrain, remove, fly."
)]
struct Cli {
    /// Resource tree JSON file (array of records or a single root record)
    #[arg(long, value_name = "FILE")]
    tree: Option<PathBuf>,

    /// Configuration file (defaults to the platform config location)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Backend base URL, overriding the configured host
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Activate a node
    #[arg(long = "load", value_name = "ID")]
    load: Vec<String>,

    /// Hide the layers of an active node
    #[arg(long = "close", value_name = "ID")]
    close: Vec<String>,

    /// Show the layers of an active node
    #[arg(long = "open", value_name = "ID")]
    open: Vec<String>,

    /// Move a node before another one, or to the top without a target
    #[arg(long = "move", value_name = "ID[:BEFORE]")]
    moves: Vec<String>,

    /// Set the terrain to a node's source, or clear it with `none`
    #[arg(long, value_name = "ID|none")]
    terrain: Option<String>,

    /// Deactivate a node
    #[arg(long = "remove", value_name = "ID")]
    remove: Vec<String>,

    /// Fly to a node's camera preset, or to the scene view without an id
    #[arg(long, value_name = "ID", num_args = 0..=1, default_missing_value = "")]
    fly: Option<String>,

    /// Print the state as JSON
    #[arg(long)]
    json: bool,

    /// Write the effective configuration back to disk and exit
    #[arg(long)]
    write_config: bool,
}

#[derive(Debug, Error)]
enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] confy::ConfyError),

    #[error("failed to read resource tree {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid resource tree: {0}")]
    Tree(#[from] serde_json::Error),

    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error("no resource tree given (use --tree)")]
    MissingTree,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), AppError> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(base_url) = &cli.base_url {
        config.base_url = Some(base_url.clone());
    }

    if cli.write_config {
        config.save(cli.config.as_deref())?;
        match &cli.config {
            Some(path) => println!("{}", path.display()),
            None => println!("{}", AppConfig::get_config_path()?.display()),
        }
        return Ok(());
    }

    let path = cli.tree.as_ref().ok_or(AppError::MissingTree)?;
    let json = std::fs::read_to_string(path).map_err(|source| AppError::Io {
        path: path.clone(),
        source,
    })?;
    let tree = map_scene::parse_tree(&json)?;

    let overlay = Rc::new(RefCell::new(InMemoryOverlay::new()));
    let handle: OverlayHandle = overlay.clone();
    let mut scene = Scene::with_engines(
        config.source_template(),
        config.scene.clone(),
        InMemoryMap::new(),
        Some(handle),
    );
    let events = scene.subscribe();
    let count = scene.load_from_data(&tree)?;
    info!("Loaded {} node(s) from {}", count, path.display());

    apply(cli, &mut scene);
    report::log_events(events);

    let Some(map) = scene.map() else {
        return Ok(());
    };
    if cli.json {
        println!("{}", report::to_json(&scene, map, &overlay.borrow())?);
    } else {
        print!("{}", report::to_text(&scene, map, &overlay.borrow()));
    }
    Ok(())
}

fn apply(cli: &Cli, scene: &mut Scene<InMemoryMap>) {
    for id in &cli.load {
        if !scene.load_node(id) {
            warn!("load {}: no effect", id);
        }
    }
    for id in &cli.close {
        if !scene.close_node(id) {
            warn!("close {}: no effect", id);
        }
    }
    for id in &cli.open {
        if !scene.open_node(id) {
            warn!("open {}: no effect", id);
        }
    }
    for op in &cli.moves {
        let (id, before) = match op.split_once(':') {
            Some((id, before)) if !before.is_empty() => (id, Some(before)),
            Some((id, _)) => (id, None),
            None => (op.as_str(), None),
        };
        if !scene.move_node(id, before) {
            warn!("move {}: no effect", op);
        }
    }
    if let Some(terrain) = cli.terrain.as_deref() {
        let target = (!terrain.eq_ignore_ascii_case("none")).then_some(terrain);
        if !scene.set_terrain_id(target) {
            warn!("terrain {}: no effect", terrain);
        }
    }
    for id in &cli.remove {
        if !scene.remove_node(id) {
            warn!("remove {}: no effect", id);
        }
    }
    match cli.fly.as_deref() {
        Some("") => scene.fly_to_this(),
        Some(id) => {
            if !scene.fly_to_node(id) {
                warn!("fly {}: node has no camera preset", id);
            }
        }
        None => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_collects_repeated_operations() {
        let cli = Cli::parse_from([
            "geoscene", "--tree", "t.json", "--load", "a", "--load", "b", "--move", "a:b",
            "--terrain", "none", "--fly",
        ]);
        assert_eq!(cli.load, ["a", "b"]);
        assert_eq!(cli.moves, ["a:b"]);
        assert_eq!(cli.terrain.as_deref(), Some("none"));
        assert_eq!(cli.fly.as_deref(), Some(""));
        assert!(!cli.json);
    }

    #[test]
    fn test_apply_runs_operations_in_order() {
        let tree = map_scene::parse_tree(
            r#"[{"id": "a", "category": "vector", "usage": {"type": "point"}},
                {"id": "b", "category": "vector", "usage": {"type": "line"}},
                {"id": "dem", "category": "raster", "usage": {"size": "512"}}]"#,
        )
        .unwrap();
        let mut scene = Scene::with_engines(
            AppConfig::default().source_template(),
            AppConfig::default().scene,
            InMemoryMap::new(),
            None,
        );
        scene.load_from_data(&tree).unwrap();

        let cli = Cli::parse_from([
            "geoscene", "--load", "a", "--load", "b", "--load", "dem", "--move", "a",
            "--terrain", "none", "--remove", "b",
        ]);
        apply(&cli, &mut scene);

        let map = scene.map().unwrap();
        assert_eq!(map.layer_order(), ["dem0", "a0", "a1"]);
        assert_eq!(scene.terrain_id(), None);
    }
}
