pub mod index;
pub mod io;
pub mod reporter;

pub use index::{IndexClient, IndexConfig, ResolveError};
pub use reporter::{NullReporter, Reporter};

/// User Agent string for core operations
pub const USER_AGENT: &str = concat!("mozdl-core/", env!("CARGO_PKG_VERSION"));

/// Maximum number of redirects followed for a single request.
pub const MAX_REDIRECTS: usize = 10;

/// Build the HTTP client shared by the resolver and the downloader.
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialised.
pub fn http_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .build()
}
