use orrery::{SceneConfig, Simulation};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Optional scene file; the built-in solar system otherwise.
    let simulation = match std::env::var_os("ORRERY_SCENE") {
        Some(path) => match Simulation::from_file(&path) {
            Ok(simulation) => simulation,
            Err(e) => {
                log::error!("{}: {}", path.to_string_lossy(), e);
                std::process::exit(1);
            }
        },
        None => Simulation::new(SceneConfig::solar_system()),
    };

    if let Err(e) = simulation.run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
