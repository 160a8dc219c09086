//! # filegit-daemon
//!
//! Background component for filegit that watches the files on the watchlist and
//! records an auto snapshot whenever one of them changes.

pub mod daemon;
pub mod pidfile;
pub mod watcher;

pub use daemon::{shutdown_on_signal, FilegitDaemon};
pub use pidfile::PidFile;
pub use watcher::FileWatcher;
