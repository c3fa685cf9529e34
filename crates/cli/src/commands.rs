// FILE: crates/cli/src/commands.rs

use anyhow::{bail, Context, Result};
use clap::ArgMatches;
use console::style;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;
use verserec_config::{Config, ConfigManager, PreferenceStore, StoragePaths};
use verserec_content_sources::{AlQuranCloudProvider, AudioResolver, HttpFetcher, ResolverPaths};
use verserec_core::{AudioSource, ContentIndex, ItemId, RangeSelector};
use verserec_media_engine::{
    input_devices, ClockBackend, MicrophoneCapture, NavigationState, Outcome, PlaybackController,
    PlaybackState,
};
use verserec_network::{Client, ClientConfig};
use verserec_sync_engine::{
    delete_tracks, Activity, HttpUploadTransport, RangeRecording, RecordingFiles,
    RecordingLedger, RecordingSession, UploadCoordinator, UploadProfile, UploadProgress,
};

/// Loaded configuration and the paths derived from it
pub struct App {
    manager: Arc<ConfigManager>,
    config: Config,
    paths: StoragePaths,
}

impl App {
    pub fn open(dir: Option<PathBuf>) -> Result<Self> {
        let manager = match dir {
            Some(dir) => ConfigManager::with_directory(dir)?,
            None => ConfigManager::new()?,
        };
        let config = manager.load_with_env_overrides()?;
        let paths = manager.storage_paths(&config);
        Ok(Self {
            manager: Arc::new(manager),
            config,
            paths,
        })
    }

    fn client(&self) -> Result<Client> {
        let network = &self.config.network;
        let config = ClientConfig::default()
            .with_timeout(Duration::from_secs(network.timeout_secs))
            .with_user_agent(network.user_agent.clone());
        Client::with_config(config).context("Failed to create HTTP client")
    }

    fn index(&self) -> Result<Arc<ContentIndex>> {
        let path = &self.paths.corpus_file;
        let index = ContentIndex::load(path)
            .with_context(|| format!("Failed to load corpus from {}", path.display()))?;
        Ok(Arc::new(index))
    }

    fn resolver(&self) -> Result<AudioResolver> {
        let client = self.client()?;
        let provider =
            AlQuranCloudProvider::new(client.clone(), self.config.network.metadata_base_url.clone());
        Ok(AudioResolver::new(
            ResolverPaths {
                bundled_dir: self.paths.bundled_dir.clone(),
                cache_dir: self.paths.cache_dir.clone(),
                recordings_dir: self.paths.recordings_dir.clone(),
            },
            Arc::new(provider),
            Arc::new(HttpFetcher::new(client)),
        ))
    }

    fn ledger(&self) -> Result<RecordingLedger> {
        RecordingLedger::open(&self.paths.ledger_file).with_context(|| {
            format!(
                "Failed to open recording ledger {}",
                self.paths.ledger_file.display()
            )
        })
    }

    fn files(&self) -> RecordingFiles {
        RecordingFiles::new(self.paths.recordings_dir.clone())
    }
}

/// Write a default config file
pub fn config_init(app: &App) -> Result<()> {
    if app.manager.initialize()? {
        println!(
            "{} Created {}",
            style("✓").green().bold(),
            app.manager.config_path().display()
        );
    } else {
        println!("Config already exists at {}", app.manager.config_path().display());
    }
    Ok(())
}

pub fn config_show(app: &App) -> Result<()> {
    let json = serde_json::to_string_pretty(&app.config).context("Failed to serialize config")?;
    println!("{}", json);
    for problem in app.manager.validate()? {
        println!("{} {}", style("!").yellow().bold(), problem);
    }
    Ok(())
}

pub fn config_path(app: &App) -> Result<()> {
    println!("Config:     {}", app.manager.config_path().display());
    println!("Corpus:     {}", app.paths.corpus_file.display());
    println!("Bundled:    {}", app.paths.bundled_dir.display());
    println!("Cache:      {}", app.paths.cache_dir.display());
    println!("Recordings: {}", app.paths.recordings_dir.display());
    println!("Ledger:     {}", app.paths.ledger_file.display());
    Ok(())
}

/// Print the label and items of a page or chapter
pub fn show_range(app: &App, matches: &ArgMatches) -> Result<()> {
    let selector = parse_selector(matches).context("A page or chapter is required")?;
    let index = app.index()?;
    let mut navigation = NavigationState::new(index.clone(), selector.mode());
    navigation.set_range(selector)?;

    println!("\n{}", style(navigation.label()).bold().cyan());
    println!("{}", "=".repeat(40));
    for item in navigation.range().items() {
        let page = index.page_of(*item).unwrap_or_default();
        println!("  {}  page {}", item, page);
    }
    println!("{} item(s)", navigation.range().len());
    Ok(())
}

/// Resolve one item to a local file
pub async fn resolve_item(app: &App, matches: &ArgMatches) -> Result<()> {
    let item = parse_item(required(matches, "item")?)?;
    let source = parse_source(matches.get_one::<String>("source"), app.config.player.audio_source)?;

    let resolved = app
        .resolver()?
        .resolve(item, source)
        .await
        .with_context(|| format!("No audio for {} from {}", item, source))?;

    println!("{} {}", style("✓").green().bold(), resolved.path.display());
    println!("  Source:     {}", source);
    println!("  Provenance: {}", resolved.provenance);
    if resolved.audio_item != resolved.item {
        println!("  Audio of:   {}", resolved.audio_item);
    }
    Ok(())
}

/// Play a range without an output device, reporting each item
pub async fn play_range(app: &App, matches: &ArgMatches) -> Result<()> {
    let index = app.index()?;
    let resolver = Arc::new(app.resolver()?);
    let preferences: Arc<dyn PreferenceStore> = app.manager.clone();
    let mut controller = PlaybackController::new(
        index,
        &app.config.player,
        resolver,
        ClockBackend::new(),
        preferences,
    );

    if let Some(source) = matches.get_one::<String>("source") {
        controller.set_source(parse_source(Some(source), controller.source())?);
    }
    if matches.get_flag("repeat") {
        controller.set_repeat(true);
    }
    if let Some(selector) = parse_selector(matches) {
        controller.set_range(selector)?;
    }
    let item = matches
        .get_one::<String>("item")
        .map(|s| parse_item(s))
        .transpose()?;

    controller.play(item)?;
    println!(
        "{} {} at {} from {}",
        style("▶").green().bold(),
        controller.navigation().label(),
        controller.rate(),
        controller.source()
    );

    loop {
        let outcome = tokio::select! {
            outcome = controller.step() => Some(outcome),
            _ = tokio::signal::ctrl_c() => None,
        };
        match outcome {
            None => {
                controller.stop();
                println!("Stopped");
                break;
            }
            Some(Outcome::Started(resolved)) => {
                println!("  {} ({})", resolved.item, resolved.provenance);
            }
            Some(Outcome::Skipped { item, reason }) => {
                println!("  {} {}: {}", style("skip").yellow(), item, reason);
            }
            Some(Outcome::Finished(_)) | Some(Outcome::Stale) => {}
        }
        if controller.state() == PlaybackState::Idle {
            break;
        }
    }
    Ok(())
}

pub fn list_recordings(app: &App) -> Result<()> {
    let recordings = app.ledger()?.snapshot()?;
    if recordings.is_empty() {
        println!("No recordings yet.");
        return Ok(());
    }

    println!("\n{} Range Recordings", style(recordings.len()).bold().cyan());
    println!("{}", "=".repeat(80));
    for recording in recordings.iter() {
        print_recording(recording);
    }
    Ok(())
}

pub async fn delete_recording(app: &App, matches: &ArgMatches) -> Result<()> {
    let id = parse_recording(required(matches, "id")?)?;
    let items = match matches.get_one::<String>("item") {
        Some(item) => Some(vec![parse_item(item)?]),
        None => None,
    };

    let ledger = Arc::new(app.ledger()?);
    let removed = delete_tracks(&ledger, &app.files(), id, items.as_deref()).await?;
    if removed.is_empty() {
        println!("Nothing to delete in {}", id);
        return Ok(());
    }

    println!(
        "{} Deleted {} track(s)",
        style("✓").green().bold(),
        removed.len()
    );
    if ledger.get(id)?.is_none() {
        println!("  {} had no tracks left and was removed", id);
    }
    Ok(())
}

pub async fn upload_recording(app: &App, matches: &ArgMatches) -> Result<()> {
    let id = parse_recording(required(matches, "id")?)?;
    let transport =
        HttpUploadTransport::new(app.client()?, app.config.network.upload_endpoint.clone());
    let profile = UploadProfile {
        user_id: app.config.profile.user_id.clone(),
        riwayah: app.config.profile.riwayah.clone(),
    };

    let coordinator = UploadCoordinator::new(
        Arc::new(app.ledger()?),
        app.files(),
        Arc::new(transport),
        Activity::new(),
    )
    .with_profile(profile)
    .with_progress(Arc::new(|progress: UploadProgress| {
        println!("  {}", progress_line(&progress));
    }));

    let report = coordinator.upload_pending(id).await?;
    println!(
        "{} uploaded, {} already done, {} failed",
        report.uploaded.len(),
        report.skipped.len(),
        report.failed.len()
    );
    for failure in &report.failed {
        println!("  {} {}: {}", style("✗").red(), failure.item, failure.reason);
    }
    if !report.is_complete() {
        bail!(
            "Upload incomplete: {} track(s) still pending, run again to retry",
            report.failed.len()
        );
    }
    Ok(())
}

/// Capture one take from the microphone into the ledger
pub async fn record_take(app: &App, matches: &ArgMatches) -> Result<()> {
    if matches.get_flag("list-devices") {
        for name in input_devices().context("Failed to list input devices")? {
            println!("{}", name);
        }
        return Ok(());
    }

    let item = parse_item(required(matches, "item")?)?;
    let capture = MicrophoneCapture::with_device(matches.get_one::<String>("device").cloned());
    let mut recorder =
        RecordingSession::new(capture, Arc::new(app.ledger()?), app.files(), Activity::new());
    if let Some(id) = matches.get_one::<String>("recording") {
        recorder.resume(parse_recording(id)?)?;
    }

    recorder
        .start_recording(item)
        .await
        .with_context(|| format!("Failed to start recording {}", item))?;
    let limit = matches.get_one::<u64>("seconds").copied();
    match limit {
        Some(seconds) => println!("Recording {} for {}s (Ctrl-C stops early)", item, seconds),
        None => println!("Recording {}, press Ctrl-C to stop", item),
    }

    let timer = async {
        match limit {
            Some(seconds) => tokio::time::sleep(Duration::from_secs(seconds)).await,
            None => std::future::pending().await,
        }
    };
    tokio::select! {
        signal = tokio::signal::ctrl_c() => signal.context("Failed to listen for Ctrl-C")?,
        _ = timer => {}
    }

    recorder.stop_recording().await?;
    let recording = recorder
        .target()
        .map(|target| target.id)
        .context("Recording finished without a range recording")?;
    println!(
        "{} Recorded {} in {}",
        style("✓").green().bold(),
        item,
        recording
    );
    Ok(())
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a String> {
    matches
        .get_one::<String>(name)
        .ok_or_else(|| anyhow::anyhow!("{} is required", name))
}

fn parse_item(value: &str) -> Result<ItemId> {
    value
        .parse()
        .with_context(|| {
            format!(
                "Invalid item id '{}', expected 078001 or chapter:verse like 78:1",
                value
            )
        })
}

fn parse_source(value: Option<&String>, default: AudioSource) -> Result<AudioSource> {
    match value {
        Some(value) => value
            .parse()
            .with_context(|| format!("Unknown audio source '{}'", value)),
        None => Ok(default),
    }
}

fn parse_recording(value: &str) -> Result<Uuid> {
    Uuid::parse_str(value).with_context(|| format!("Invalid recording id '{}'", value))
}

fn parse_selector(matches: &ArgMatches) -> Option<RangeSelector> {
    matches
        .get_one::<u32>("page")
        .map(|page| RangeSelector::Page(*page))
        .or_else(|| {
            matches
                .get_one::<u16>("chapter")
                .map(|chapter| RangeSelector::Chapter(*chapter))
        })
}

fn progress_line(progress: &UploadProgress) -> String {
    let done = progress.completed + progress.failed;
    match progress.current {
        Some(item) => format!("[{}/{}] {}", done, progress.total, item),
        None => format!("[{}/{}]", done, progress.total),
    }
}

fn print_recording(recording: &RangeRecording) {
    println!(
        "\n{}  {} - {}",
        style(recording.id).bold(),
        recording.first,
        recording.last
    );
    println!(
        "  Created {} | {}/{} uploaded",
        recording.created_at.format("%Y-%m-%d %H:%M"),
        recording.uploaded_count(),
        recording.tracks.len()
    );
    for (item, track) in &recording.tracks {
        match &track.label {
            Some(label) => println!("    {}  {}  ({})", item, track.state, label),
            None => println!("    {}  {}", item, track.state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_item() {
        let expected = ItemId::new(78, 1).unwrap();
        assert_eq!(parse_item("078001").unwrap(), expected);
        assert_eq!(parse_item("78:1").unwrap(), expected);
        let err = parse_item("78-1").unwrap_err();
        assert!(err.to_string().contains("chapter:verse"));
    }

    #[test]
    fn test_parse_source_defaults() {
        assert_eq!(
            parse_source(None, AudioSource::HusaryQaloon).unwrap(),
            AudioSource::HusaryQaloon
        );
        assert_eq!(
            parse_source(Some(&"alafasyHafs".to_string()), AudioSource::HusaryQaloon).unwrap(),
            AudioSource::AlafasyHafs
        );
        assert!(parse_source(Some(&"nobody".to_string()), AudioSource::HusaryQaloon).is_err());
    }

    #[test]
    fn test_progress_line() {
        let progress = UploadProgress {
            recording: Uuid::nil(),
            total: 3,
            completed: 1,
            failed: 1,
            current: Some(ItemId::new(78, 2).unwrap()),
        };
        assert_eq!(progress_line(&progress), "[2/3] 078002");
    }

    #[test]
    fn test_app_uses_config_dir() {
        let dir = TempDir::new().unwrap();
        let app = App::open(Some(dir.path().to_path_buf())).unwrap();
        assert_eq!(app.paths.ledger_file, dir.path().join("recordings.json"));

        config_init(&app).unwrap();
        assert!(dir.path().join("config.toml").exists());
        assert!(app.ledger().unwrap().snapshot().unwrap().is_empty());
    }

    #[test]
    fn test_missing_corpus_is_reported() {
        let dir = TempDir::new().unwrap();
        let app = App::open(Some(dir.path().to_path_buf())).unwrap();
        let err = app.index().unwrap_err();
        assert!(err.to_string().contains("corpus"));
    }
}
