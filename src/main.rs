use biome_viewer::{app, ViewerSettings};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let settings = ViewerSettings::load();
    log::info!("Starting biome viewer");

    let result = app::run(settings);
    if let Err(ref err) = result {
        log::error!("Viewer error: {:#}", err);
    }
    result
}
