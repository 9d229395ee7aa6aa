pub mod extractor;
pub mod languages;
pub mod prose;
pub mod regions;

use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileType {
    Markdown,
    /// Source file, checked through the content extractor for this language.
    SourceCode(String),
    PlainText,
}

impl FileType {
    /// Detect file type from extension
    pub fn from_path(path: &Path, registry: &languages::LanguageRegistry) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "md" | "mdx" | "markdown" => FileType::Markdown,
            "txt" | "text" | "" => FileType::PlainText,
            other => match registry.get(other) {
                Some(config) => FileType::SourceCode(config.id.clone()),
                None => FileType::PlainText,
            },
        }
    }
}
