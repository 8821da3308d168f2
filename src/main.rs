use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use boxbot::infra::DefaultObserver;
use boxbot::state::format_plan;
use boxbot::{GridNavigator, Level, Orchestrator, PlannerConfig};
use dotenv::dotenv;
use time::{OffsetDateTime, format_description};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("boxbot=debug,info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(true)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Logging was already initialized");
    }
}

/// `<folder>/<level stem> - <YYYYMMDD-HHMMSS>.plan`
fn plan_file_path(folder: &str, level_path: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    let date_time_str =
        now.format(&format_description::parse("[year][month][day]-[hour][minute][second]")?)?;
    let stem = level_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "level".to_string());

    Ok(Path::new(folder).join(format!("{} - {}.plan", stem, date_time_str)))
}

fn write_plan(
    folder: &str,
    level_path: &Path,
    rendered: &str,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let filename = plan_file_path(folder, level_path)?;
    if let Some(parent) = filename.parent()
        && !parent.exists()
    {
        fs::create_dir_all(parent)?;
    }
    fs::write(&filename, rendered)?;
    Ok(filename)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    init_logging();

    let level_path = PathBuf::from(
        env::var("BOXBOT_LEVEL").map_err(|_| "BOXBOT_LEVEL environment variable is required")?,
    );
    let plans_folder = env::var("BOXBOT_PLANS_FOLDER").ok();
    let config = PlannerConfig::from_env();

    tracing::info!(level = %level_path.display(), ?config, "Planning level");

    let text = fs::read_to_string(&level_path)?;
    let (level, initial) = Level::parse(&text)?;
    let navigator = GridNavigator::new(&level);

    let plan =
        Orchestrator::new(&level, &navigator, config).plan(&initial, &mut DefaultObserver)?;
    let rendered = format_plan(&plan);
    println!("{}", rendered);

    if let Some(folder) = plans_folder {
        let filename = write_plan(&folder, &level_path, &rendered)?;
        tracing::info!(file = %filename.display(), "Plan written");
    }

    Ok(())
}
