// Taxonomy module: maps free-text categories and features onto CMS entries.

pub mod dictionary;
pub mod index;
pub mod resolver;
pub mod similarity;
pub mod store;

pub use dictionary::CanonicalCategory;
pub use index::{TaxonomyEntry, TaxonomyIndex};
pub use resolver::{ResolutionNote, ResolverSettings, TaxonomyResolver};
pub use store::{StoredLabel, TaxonomyStore};
