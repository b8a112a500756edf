pub mod catalog;
pub mod client;
pub mod interface;
pub mod language;
pub mod path;
pub mod pipeline;
pub mod resolver;

pub use catalog::ModelCatalog;
pub use client::RemoteTranslationBackend;
pub use interface::{TranslationBackend, TranslationModel};
pub use language::{LanguagePair, LanguageTable};
pub use path::{ModelHandle, TranslationPath};
pub use pipeline::{TranslatedDocument, TranslationPipeline, UploadedDocument};
pub use resolver::{ModelResolver, PathResolver};
