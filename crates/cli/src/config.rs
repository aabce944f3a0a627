use kanaja_vector_store::HnswParams;
use std::env;
use std::path::PathBuf;

pub(crate) const PORT_ENV: &str = "PORT";
pub(crate) const DEFAULT_PORT: u16 = 8080;

/// Everything needed to stand up a [`crate::service::Service`].
#[derive(Debug, Clone)]
pub struct Config {
    /// Word-vector table read once at startup.
    pub words: PathBuf,
    /// Optional persistence file, loaded at startup and rewritten after writes.
    pub store: Option<PathBuf>,
    /// Explore-width for approximate searches that do not pick one.
    pub default_breadth: usize,
    pub hnsw: HnswParams,
}

/// `0.0.0.0:$PORT`, with `PORT` defaulting to 8080.
pub(crate) fn default_bind_addr() -> String {
    let port = env::var(PORT_ENV)
        .ok()
        .and_then(|raw| raw.trim().parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT);
    format!("0.0.0.0:{port}")
}
