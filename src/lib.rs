pub mod app;
pub mod bump;
pub mod cli;
pub mod config;
pub mod pack;
pub mod stream;
pub mod util;
pub mod web;

pub use config::Config;
pub use pack::{
    CommandPackRunner, PackCache, PackError, PackFailure, PackKey, PackOutcome, PackRunner,
    PackService, PackageIndex,
};
pub use stream::{ColorRegistry, JsonExtractor, LineDecoder, LinePrefixer, OutputSink};
pub use util::PackageManager;
