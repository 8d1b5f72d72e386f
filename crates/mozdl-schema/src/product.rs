//! Gecko products and the folders their builds unpack into.

use serde::{Deserialize, Serialize};

/// A Gecko product published to the build index.
///
/// The well-known products map to the folder their archives unpack into,
/// which is how an existing install is recognised. Any other name is kept
/// verbatim so it can still be used in an index namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(into = "String", from = "String")]
pub enum Product {
    /// B2G desktop client (`b2g-desktop`), unpacks to `b2g/`.
    #[default]
    B2gDesktop,
    /// Firefox desktop, unpacks to `firefox/`.
    Firefox,
    /// Mulet (Firefox with the B2G runtime), unpacks to `firefox/`.
    Mulet,
    /// Any other product name; has no known folder.
    Other(String),
}

/// Product name to unpacked folder name.
const PRODUCT_FOLDERS: &[(&str, &str)] = &[
    ("b2g-desktop", "b2g"),
    ("firefox", "firefox"),
    ("mulet", "firefox"),
];

impl Product {
    /// Parse a product name. Never fails: unknown names become [`Product::Other`].
    pub fn new(name: &str) -> Self {
        match name {
            "b2g-desktop" => Self::B2gDesktop,
            "firefox" => Self::Firefox,
            "mulet" => Self::Mulet,
            other => Self::Other(other.to_string()),
        }
    }

    /// Name as used in the build index.
    pub fn as_str(&self) -> &str {
        match self {
            Self::B2gDesktop => "b2g-desktop",
            Self::Firefox => "firefox",
            Self::Mulet => "mulet",
            Self::Other(name) => name.as_str(),
        }
    }

    /// Folder the product's archive unpacks into, if known.
    pub fn folder_name(&self) -> Option<&'static str> {
        let name = self.as_str();
        PRODUCT_FOLDERS
            .iter()
            .find(|(product, _)| *product == name)
            .map(|(_, folder)| *folder)
    }
}

impl std::fmt::Display for Product {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Product {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<String> for Product {
    fn from(s: String) -> Self {
        Self::new(&s)
    }
}

impl From<Product> for String {
    fn from(p: Product) -> Self {
        p.as_str().to_string()
    }
}
