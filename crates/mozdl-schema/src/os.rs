//! Build platform identifiers and host detection.

/// Build platform identifier, as used in build-index namespaces.
///
/// Identifiers are kept verbatim: the build index uses a loose family of
/// names (`linux-x86_64`, `mac64`, `macosx64`, `win32`, ...) and anything the
/// user passes with `--os` is forwarded unchanged.
///
/// # Example
///
/// ```
/// use mozdl_schema::OsId;
///
/// let current = OsId::detect();
/// println!("Running on: {}", current);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct OsId(String);

impl OsId {
    /// Sentinel produced when the running platform is not recognised.
    pub const UNKNOWN: &'static str = "unknown";

    /// Wrap an identifier as-is.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Detect the identifier for the running platform.
    pub fn detect() -> Self {
        Self::from_platform(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Map a Rust `(target_os, target_arch)` pair to a build platform.
    ///
    /// Returns [`OsId::UNKNOWN`] for anything outside Linux, macOS and
    /// Windows on x86/x86_64 (plus Apple Silicon, which runs the `mac64`
    /// builds).
    pub fn from_platform(os: &str, arch: &str) -> Self {
        let id = match (os, arch) {
            ("linux", "x86_64") => "linux-x86_64",
            ("linux", "x86") => "linux-i686",
            ("macos", "x86_64" | "aarch64") => "mac64",
            ("windows", "x86_64") => "win64",
            ("windows", "x86") => "win32",
            _ => Self::UNKNOWN,
        };
        Self(id.to_string())
    }

    /// Whether detection failed and the user has to pass `--os`.
    pub fn is_unknown(&self) -> bool {
        self.0.is_empty() || self.0 == Self::UNKNOWN
    }

    /// Convert to string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for OsId {
    fn default() -> Self {
        Self::detect()
    }
}

impl std::fmt::Display for OsId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for OsId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().to_string()))
    }
}

impl AsRef<str> for OsId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
