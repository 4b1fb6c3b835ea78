use std::path::{Path, PathBuf};
use std::process;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::{Arg, ArgMatches, Command};
use log::{error, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use conveyor::config::{default_config_file, DisplayDriver, Settings};
use conveyor::display::{main_loop, Display, Overlay};
use conveyor::display_framebuffer::FramebufferDisplay;
use conveyor::display_minifb::MiniFBDisplay;
use conveyor::errors::{ConveyorError, ConveyorResult};
use conveyor::font::FontRenderer;
use conveyor::provider::{ConveyorProvider, FrameProcessor};
use conveyor::source::ImageSource;

/// Exit status when the image folder holds nothing to show
const EXIT_NO_IMAGES: i32 = 2;

fn command() -> Command<'static> {
    Command::new("conveyor")
        .about("Show a folder of images as a glitchy full-screen conveyor line")
        .arg(
            Arg::new("folder")
                .help("Folder to read images from")
                .takes_value(true)
                .index(1),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("Configuration file")
                .takes_value(true),
        )
        .arg(
            Arg::new("time")
                .short('t')
                .long("time")
                .help("Seconds each image is shown")
                .takes_value(true)
                .validator(f64::from_str),
        )
        .arg(
            Arg::new("rate")
                .short('r')
                .long("rate")
                .help("Probability of degrading an image")
                .takes_value(true)
                .validator(f64::from_str),
        )
        .arg(
            Arg::new("display")
                .short('d')
                .long("display")
                .help("Select the display driver")
                .value_name("display")
                .takes_value(true)
                .possible_values(["window", "framebuffer"]),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .help("Framebuffer device")
                .takes_value(true),
        )
        .arg(
            Arg::new("width")
                .long("width")
                .takes_value(true)
                .validator(u32::from_str),
        )
        .arg(
            Arg::new("height")
                .long("height")
                .takes_value(true)
                .validator(u32::from_str),
        )
        .arg(
            Arg::new("font")
                .long("font")
                .help("Font file for the caption")
                .takes_value(true),
        )
        .arg(
            Arg::new("font_size")
                .long("font-size")
                .takes_value(true)
                .validator(f32::from_str),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .help("Seed the random generator for a reproducible run")
                .takes_value(true)
                .validator(u64::from_str),
        )
}

fn parsed<T: FromStr>(matches: &ArgMatches, name: &str) -> Option<T> {
    // validated by clap
    matches.value_of(name).and_then(|v| v.parse().ok())
}

/// Command line flags take precedence over every other configuration source.
fn apply_args(mut settings: Settings, matches: &ArgMatches) -> Settings {
    if let Some(folder) = matches.value_of("folder") {
        settings.image_folder = Some(PathBuf::from(folder));
    }
    if let Some(time) = parsed(matches, "time") {
        settings.display_time = time;
    }
    if let Some(rate) = parsed(matches, "rate") {
        settings.modification_rate = rate;
    }
    match matches.value_of("display") {
        Some("window") => settings.display = DisplayDriver::Window,
        Some("framebuffer") => settings.display = DisplayDriver::Framebuffer,
        _ => {}
    }
    if let Some(output) = matches.value_of("output") {
        settings.framebuffer = PathBuf::from(output);
    }
    if let Some(width) = parsed(matches, "width") {
        settings.width = width;
    }
    if let Some(height) = parsed(matches, "height") {
        settings.height = height;
    }
    if let Some(font) = matches.value_of("font") {
        settings.font = Some(PathBuf::from(font));
    }
    if let Some(font_size) = parsed(matches, "font_size") {
        settings.font_size = font_size;
    }
    if let Some(seed) = parsed(matches, "seed") {
        settings.seed = Some(seed);
    }
    settings
}

fn load_settings(matches: &ArgMatches) -> ConveyorResult<Settings> {
    let file = matches
        .value_of("config")
        .map(PathBuf::from)
        .or_else(default_config_file);
    let settings = Settings::load(file.as_deref())?;
    apply_args(settings, matches).validate()
}

/// An explicitly configured font must load, the system font is best-effort.
fn load_font(font: Option<&Path>) -> ConveyorResult<Option<FontRenderer>> {
    match font {
        Some(path) => FontRenderer::from_path(path).map(Some),
        None => Ok(FontRenderer::new()
            .map_err(|e| warn!("No caption font available, captions disabled: {}", e))
            .ok()),
    }
}

fn show<D: Display>(
    mut display: D,
    provider: &mut ConveyorProvider<StdRng>,
    overlay: &Overlay,
    settings: &Settings,
    stop: &AtomicBool,
) -> ConveyorResult<()> {
    let interval = settings.interval()?;
    main_loop(provider, &mut display, overlay, interval, stop)
}

fn run(settings: Settings) -> ConveyorResult<()> {
    let folder = settings
        .image_folder
        .clone()
        .ok_or_else(|| ConveyorError::InvalidSetting("image_folder is required".to_string()))?;
    let source = ImageSource::discover(&folder)?;
    info!("Found {} images in {}", source.len(), folder.display());

    let rng = match settings.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let mut provider = ConveyorProvider::new(
        source,
        FrameProcessor::new(rng, settings.modification_rate),
    );
    let overlay = Overlay::new(load_font(settings.font.as_deref())?, settings.font_size);

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = Arc::clone(&stop);
        ctrlc::set_handler(move || stop.store(true, Ordering::SeqCst))?;
    }

    match settings.display {
        DisplayDriver::Window => show(
            MiniFBDisplay::new(settings.width, settings.height)?,
            &mut provider,
            &overlay,
            &settings,
            &stop,
        ),
        DisplayDriver::Framebuffer => show(
            FramebufferDisplay::new(&settings.framebuffer)?,
            &mut provider,
            &overlay,
            &settings,
            &stop,
        ),
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = command().get_matches();
    let result = load_settings(&matches).and_then(run);
    match result {
        Ok(()) => info!("Conveyor stopped by user."),
        Err(e @ ConveyorError::NoImages(_)) => {
            error!("{}", e);
            process::exit(EXIT_NO_IMAGES);
        }
        Err(e) => {
            error!("Encountered error, terminating: {}", e);
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_is_well_formed() {
        command().debug_assert();
    }

    #[test]
    fn flags_override_settings() {
        let matches = command().get_matches_from(vec![
            "conveyor", "/srv/samples", "-t", "1.5", "-r", "1", "-d", "framebuffer", "--seed", "9",
        ]);
        let settings = apply_args(Settings::default(), &matches).validate().unwrap();
        assert_eq!(settings.image_folder, Some(PathBuf::from("/srv/samples")));
        assert_eq!(settings.display_time, 1.5);
        assert_eq!(settings.modification_rate, 1.0);
        assert_eq!(settings.display, DisplayDriver::Framebuffer);
        assert_eq!(settings.seed, Some(9));
        assert_eq!(settings.width, 1920);
    }

    #[test]
    fn missing_folder_is_rejected() {
        let matches = command().get_matches_from(vec!["conveyor"]);
        assert!(matches!(
            apply_args(Settings::default(), &matches).validate(),
            Err(ConveyorError::InvalidSetting(_))
        ));
    }
}
