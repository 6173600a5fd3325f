//! kvrestore binary
//!
//! Replays the dump logs in a directory into the keystore engine.

use kvrestore::cli;
use kvrestore::{logging, ExitStatus, Loader, StoreEngine};

fn main() {
    let args = match cli::parse(std::env::args_os()) {
        Ok(args) => args,
        Err(exit) => {
            exit.print();
            std::process::exit(exit.status.code());
        }
    };

    logging::init(args.verbosity());

    let config = match args.resolve() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(ExitStatus::Startup.code());
        }
    };

    tracing::debug!("kvrestore v{}", kvrestore::VERSION);

    let engine = StoreEngine::new(config.engine.clone());
    let mut loader = Loader::new(engine, config);
    let report = loader.run();
    println!("{}", report);

    std::process::exit(report.status.code());
}
