//! Subcommand handlers for replay and config actions.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::args::{ConfigAction, ReplayArgs};
use crate::camera::StillSource;
use crate::config::{default_path, Config};
use crate::detect::ScriptedDetector;
use crate::flow::{FaceCheck, FlowOutcome, FlowSettings, Sinks};
use crate::sinks::{DirImageSink, LogStatusSink, NullOverlay};

const CONFIG_HEADER: &str = "\
# face-check configuration
#
# [camera]     resolutions are tried in order until the camera grants one
# [detection]  interval_ms between detector calls; threshold consecutive
#              hits inside the guide trigger the capture;
#              model_load_timeout_secs = 0 waits forever
# [output]     dir receives captured PNG files

";

/// Handle config subcommand actions.
pub fn handle_config_action(action: ConfigAction, path: Option<&Path>) -> Result<(), String> {
    let config_path = path.map(PathBuf::from).unwrap_or_else(default_path);
    match action {
        ConfigAction::Show => {
            let config = Config::load(Some(&config_path)).map_err(|e| e.to_string())?;
            let text = config.to_toml_string().map_err(|e| e.to_string())?;

            println!("Current configuration:");
            println!();
            print!("{}", text);
            println!();
            if config_path.exists() {
                println!("Config file: {} (exists)", config_path.display());
            } else {
                println!("Config file: {} (not found)", config_path.display());
            }
            println!("Capture directory: {}", config.capture_dir().display());
            Ok(())
        }
        ConfigAction::Init => {
            init_config(&config_path)?;
            println!("Created config file: {}", config_path.display());
            Ok(())
        }
    }
}

/// Write a default config file. Refuses to overwrite an existing one.
pub fn init_config(path: &Path) -> Result<(), String> {
    if path.exists() {
        return Err(format!(
            "Config file already exists: {}\nUse 'face-check config show' to view current settings.",
            path.display()
        ));
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Error creating config directory: {}", e))?;
    }

    let body = Config::default().to_toml_string().map_err(|e| e.to_string())?;
    std::fs::write(path, format!("{}{}", CONFIG_HEADER, body))
        .map_err(|e| format!("Error writing config file: {}", e))
}

/// Run the capture flow against a still image and a detection script.
///
/// Returns the paths of the images written, empty if cancelled.
pub async fn replay(
    args: &ReplayArgs,
    config: &Config,
    cancel: &CancellationToken,
) -> Result<Vec<PathBuf>, String> {
    let image = image::open(&args.image)
        .map_err(|e| format!("Failed to open image '{}': {}", args.image.display(), e))?
        .to_rgb8();
    let detector = ScriptedDetector::from_file(&args.script).map_err(|e| e.to_string())?;

    let mut settings = FlowSettings::from_config(config);
    if args.display_width.is_some() {
        settings.display_width = args.display_width;
    }

    let source = StillSource::new(image).with_supported(args.supports.clone());
    let output = args.output.clone().unwrap_or_else(|| config.capture_dir());
    let sinks = Sinks {
        overlay: NullOverlay,
        status: LogStatusSink::default(),
        images: DirImageSink::new(output),
    };

    if let Some(secs) = args.timeout {
        let token = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            log::warn!("No capture after {}s, giving up", secs);
            token.cancel();
        });
    }

    let mut flow = FaceCheck::new(source, detector, sinks, settings).map_err(|e| e.to_string())?;
    match flow.run(cancel).await.map_err(|e| e.to_string())? {
        FlowOutcome::Captured(report) => {
            log::info!(
                "Captured {} from {} stream (guide {})",
                report.image_size,
                report.stream.size(),
                report.guide
            );
            Ok(flow.sinks().images.saved().to_vec())
        }
        FlowOutcome::Cancelled => {
            log::info!(
                "Capture cancelled after {} detector call(s)",
                flow.detector().calls()
            );
            Ok(Vec::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::ResolutionCandidate;
    use image::RgbImage;
    use tempfile::TempDir;

    fn replay_args(temp: &TempDir, script: &str) -> ReplayArgs {
        let image = temp.path().join("face.png");
        RgbImage::from_pixel(300, 300, image::Rgb([200, 150, 120]))
            .save(&image)
            .unwrap();
        let script_path = temp.path().join("ticks.toml");
        std::fs::write(&script_path, script).unwrap();

        ReplayArgs {
            image,
            script: script_path,
            supports: vec![ResolutionCandidate::square(600)],
            output: Some(temp.path().join("out")),
            display_width: None,
            timeout: None,
        }
    }

    #[test]
    fn test_init_writes_loadable_config() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.toml");

        init_config(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("# face-check configuration"));
        assert_eq!(Config::load(Some(&path)).unwrap(), Config::default());
    }

    #[test]
    fn test_init_refuses_overwrite() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[camera]\naudio = false\n").unwrap();

        let err = init_config(&path).unwrap_err();
        assert!(err.contains("already exists"));
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "[camera]\naudio = false\n"
        );
    }

    #[test]
    fn test_show_reports_parse_errors() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[detection\n").unwrap();
        assert!(handle_config_action(ConfigAction::Show, Some(&path)).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_replay_writes_capture() {
        let temp = TempDir::new().unwrap();
        let script = "[[tick]]\nbox = [150.0, 150.0, 450.0, 450.0]\n".repeat(6);
        let args = replay_args(&temp, &script);

        let saved = replay(&args, &Config::default(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(saved.len(), 1);
        let image = image::open(&saved[0]).unwrap();
        assert_eq!((image.width(), image.height()), (400, 400));
    }

    #[tokio::test(start_paused = true)]
    async fn test_replay_timeout_cancels() {
        let temp = TempDir::new().unwrap();
        let mut args = replay_args(&temp, "[[tick]]\n");
        args.timeout = Some(3);

        let saved = replay(&args, &Config::default(), &CancellationToken::new())
            .await
            .unwrap();
        assert!(saved.is_empty());
        assert!(!temp.path().join("out").exists());
    }

    #[tokio::test]
    async fn test_replay_missing_image() {
        let temp = TempDir::new().unwrap();
        let mut args = replay_args(&temp, "");
        args.image = temp.path().join("missing.png");

        let err = replay(&args, &Config::default(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(err.contains("missing.png"));
    }
}
