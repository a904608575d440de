//! Content module - article records, front-matter, rendering and loading

mod article;
mod frontmatter;
pub mod loader;
pub mod markdown;
pub mod toc;

pub use article::{sort_by_date_desc, Article, ArticleMetadata};
pub use frontmatter::{parse_date_string, FrontMatter};
pub use loader::ContentLoader;
pub use markdown::{MarkdownRenderer, Render};
pub use toc::TocEntry;
