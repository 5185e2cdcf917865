use env_logger::Env;
use keyloc_cli::{configure_threads, run_object_localiser, AppResult, LocaliserRun, Outcome, SnapshotViewer};
use log::error;

/// Window snapshots land here
const WINDOW_DIR: &str = "windows";

fn run() -> AppResult<Outcome> {
    let run = LocaliserRun::default();
    configure_threads(run.config.n_threads)?;

    let mut viewer = SnapshotViewer::new(WINDOW_DIR);
    run_object_localiser(&run, &mut viewer)
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    match run() {
        Ok(outcome) => std::process::exit(outcome.exit_code()),
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    }
}
