//! Configuration module

mod site;

pub use site::HighlightConfig;
pub use site::SiteConfig;
pub use site::DEFAULT_CATEGORY;
pub use site::DEFAULT_EXCERPT_LENGTH;
