//! Shared User-Agent string for search and artifact requests.

/// Tool identifier placed in front of the version.
const PRODUCT: &str = "arxiv-harvester";

/// Default User-Agent for every request the harvester makes.
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("{PRODUCT}/{version} (academic-research-tool)")
}
