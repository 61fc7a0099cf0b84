//! Reference library native-messaging host entry point.
//!
//! `refer-host [dir]` runs the message loop against the library at `dir`
//! (default: `dir` from `config.json` in the working directory, else the
//! working directory itself, which is where the browser launches us).
//! `refer-host setup [dir]` writes the config and registration manifest.

use refer_core::{LibraryError, LibraryStore};
use refer_host::config::HostConfig;
use refer_host::dispatcher::Dispatcher;
use refer_host::{channel, setup};
use serde_json::Value;
use std::env;
use std::io;
use std::path::PathBuf;

fn main() {
    env_logger::init();

    let mut args = env::args().skip(1);
    let result = match args.next() {
        Some(arg) if arg == "setup" => {
            let dir = args.next().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
            setup::run(&dir).map(|()| {
                eprintln!("refer-host: wrote config.json and {}", setup::MANIFEST_FILE);
            })
        }
        Some(dir) => serve(PathBuf::from(dir)),
        None => serve(store_root()),
    };

    if let Err(err) = result {
        eprintln!("refer-host: {err}");
        std::process::exit(1);
    }
}

/// Store root when none is given: `config.json`'s `dir` beats the
/// working directory.
fn store_root() -> PathBuf {
    let cwd = PathBuf::from(".");
    match HostConfig::load(&cwd) {
        Some(config) => config.dir,
        None => cwd,
    }
}

/// The request-at-a-time message loop: one message is fully read,
/// processed and replied to before the next is read. Per-message failures
/// become the reply text; only stream closure (or a hard I/O fault on
/// either stream) ends the process.
fn serve(dir: PathBuf) -> Result<(), LibraryError> {
    log::info!("serving library at {}", dir.display());
    let mut dispatcher = Dispatcher::new(LibraryStore::new(dir));

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut input = stdin.lock();
    let mut output = stdout.lock();

    loop {
        let reply = match channel::read_message(&mut input) {
            Ok(Some(message)) => dispatcher.handle(message),
            // Stream closed: the browser is done with us.
            Ok(None) => return Ok(()),
            Err(err @ LibraryError::Io(_)) => return Err(err),
            Err(err) => err.to_string(),
        };
        channel::write_message(&mut output, &Value::String(reply))?;
    }
}
