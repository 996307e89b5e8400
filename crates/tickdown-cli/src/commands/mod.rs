pub mod config;
pub mod history;
pub mod runs;
pub mod sounds;
pub mod timer;
