//! # Voxel Placer Demo Entry Point
//!
//! Runs the library's demo host, which draws a few shapes into an in-memory
//! world and logs what was placed.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info cargo run --release -- [config.json]
//! ```

use std::{path::PathBuf, process::ExitCode};

fn main() -> ExitCode {
    voxel_placer::init_logger();

    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    match voxel_placer::run(config_path.as_deref()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
