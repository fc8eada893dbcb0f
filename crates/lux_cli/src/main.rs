//! `lux` - render a scene file to an image.
//!
//! ```text
//! lux <scene> <output> <samples> [config.json]
//! ```
//!
//! The output format follows the file extension (`.png`, `.bmp`, anything
//! else is PPM). The optional JSON file overrides [`RenderConfig`] fields.

mod output;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use lux_core::load_scene;
use lux_renderer::{render, RenderConfig, World};
use rand::rngs::StdRng;
use rand::SeedableRng;

const USAGE: &str = "Usage: lux <scene> <output> <samples> [config.json]";

/// Command-line arguments.
#[derive(Debug, PartialEq)]
struct Args {
    scene: PathBuf,
    output: PathBuf,
    samples: u32,
    config: Option<PathBuf>,
}

impl Args {
    /// Parse positional arguments (program name excluded).
    fn parse<I: IntoIterator<Item = String>>(args: I) -> Option<Self> {
        let args: Vec<String> = args.into_iter().collect();
        if !(3..=4).contains(&args.len()) {
            return None;
        }

        Some(Self {
            scene: PathBuf::from(&args[0]),
            output: PathBuf::from(&args[1]),
            samples: args[2].parse().ok()?,
            config: args.get(3).map(PathBuf::from),
        })
    }
}

fn load_config(path: &Path) -> Result<RenderConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid config {}", path.display()))
}

fn run(args: &Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => RenderConfig::default(),
    };
    config.samples_per_pixel = args.samples;

    if config.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .build_global()
            .context("Failed to configure the thread pool")?;
    }

    let start = Instant::now();
    let scene = load_scene(&args.scene)
        .with_context(|| format!("Failed to load scene {}", args.scene.display()))?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let world = World::from_scene(&scene, config.acceleration, &mut rng)
        .context("Failed to assemble scene")?;
    config.background = world.background;
    log::info!("Scene ready in {:.2?}", start.elapsed());

    let image = render(&world.camera, world.root(), &config);

    output::save_image(&image, &args.output)?;
    log::info!("Wrote {}", args.output.display());
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = match Args::parse(std::env::args().skip(1)) {
        Some(args) => args,
        None => {
            eprintln!("{}", USAGE);
            std::process::exit(1);
        }
    };

    run(&args)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_args() {
        let args = Args::parse(strings(&["scene.txt", "out.png", "64"])).unwrap();
        assert_eq!(args.scene, PathBuf::from("scene.txt"));
        assert_eq!(args.output, PathBuf::from("out.png"));
        assert_eq!(args.samples, 64);
        assert_eq!(args.config, None);

        let args = Args::parse(strings(&["a", "b", "4", "render.json"])).unwrap();
        assert_eq!(args.config, Some(PathBuf::from("render.json")));
    }

    #[test]
    fn test_parse_args_usage_errors() {
        assert!(Args::parse(strings(&["scene.txt", "out.png"])).is_none());
        assert!(Args::parse(strings(&["a", "b", "many"])).is_none());
        assert!(Args::parse(strings(&["a", "b", "-3"])).is_none());
        assert!(Args::parse(strings(&["a", "b", "4", "c", "d"])).is_none());
    }

    #[test]
    fn test_load_config() {
        let path = std::env::temp_dir().join(format!("lux_config_{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "max_depth": 7, "threads": 2 }"#).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.max_depth, 7);
        assert_eq!(config.threads, 2);
        assert_eq!(config.roulette_depth, RenderConfig::default().roulette_depth);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_run_renders_scene() {
        let dir = std::env::temp_dir().join(format!("lux_run_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let scene_path = dir.join("scene.txt");
        std::fs::write(
            &scene_path,
            "Camera { from 0 0 4 at 0 0 0 up 0 1 0 angle 40 width 6 height 4 }
             Background { color 0.5 0.5 0.5 }
             Materials { numMaterials 1 Diffuse { Texture { Constant { color 0.8 0.2 0.2 } } } }
             Group { numObjects 1 MaterialIndex 0 Sphere { center 0 0 0 radius 1 } }",
        )
        .unwrap();

        let args = Args {
            scene: scene_path,
            output: dir.join("out.ppm"),
            samples: 4,
            config: None,
        };
        run(&args).unwrap();

        let text = std::fs::read_to_string(dir.join("out.ppm")).unwrap();
        assert!(text.starts_with("P3\n6 4\n255\n"));
        assert_eq!(text.lines().count(), 3 + 4);

        std::fs::remove_dir_all(&dir).ok();
    }
}
