use crate::config::OrganizerConfig;
use std::path::Path;

/// Bucket for files whose extension matches no configured category.
pub const OTHERS: &str = "Others";

/// Immutable extension lookup table, built once from configuration.
#[derive(Debug, Clone)]
pub struct CategoryTable {
    categories: Vec<(String, Vec<String>)>,
}

impl CategoryTable {
    pub fn new(config: &OrganizerConfig) -> Self {
        let categories = config
            .categories
            .iter()
            .map(|category| {
                let extensions = category
                    .extensions
                    .iter()
                    .map(|ext| normalize_extension(ext))
                    .filter(|ext| !ext.is_empty())
                    .collect();
                (category.name.clone(), extensions)
            })
            .collect();

        Self { categories }
    }

    /// Category for a file, `None` when it has no extension.
    ///
    /// Lookup is case-insensitive and follows table order, so an extension
    /// listed under two categories belongs to the first one.
    pub fn categorize(&self, path: &Path) -> Option<&str> {
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .filter(|ext| !ext.is_empty())?;

        let category = self
            .categories
            .iter()
            .find(|(_, extensions)| extensions.iter().any(|e| *e == extension))
            .map(|(name, _)| name.as_str());

        Some(category.unwrap_or(OTHERS))
    }

    pub fn is_category(&self, name: &str) -> bool {
        self.categories.iter().any(|(category, _)| category == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self::new(&OrganizerConfig::default())
    }
}

fn normalize_extension(extension: &str) -> String {
    extension.trim().trim_start_matches('.').to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CategoryConfig;

    #[test]
    fn test_default_table() {
        let table = CategoryTable::default();
        assert_eq!(table.len(), 10);

        let names: Vec<_> = table.names().collect();
        assert_eq!(names[0], "Images");
        assert_eq!(names[9], "Presentations");
    }

    #[test]
    fn test_categorize() {
        let table = CategoryTable::default();

        assert_eq!(table.categorize(Path::new("photo.jpg")), Some("Images"));
        assert_eq!(table.categorize(Path::new("song.mp3")), Some("Audio"));
        assert_eq!(table.categorize(Path::new("main.go")), Some("Code"));
        assert_eq!(table.categorize(Path::new("backup.tar.gz")), Some("Archives"));
        assert_eq!(table.categorize(Path::new("novel.epub")), Some("Books"));
        assert_eq!(table.categorize(Path::new("talk.key")), Some("Presentations"));
    }

    #[test]
    fn test_categorize_is_case_insensitive() {
        let table = CategoryTable::default();
        assert_eq!(table.categorize(Path::new("PHOTO.JPG")), Some("Images"));
        assert_eq!(table.categorize(Path::new("Report.PdF")), Some("Documents"));
    }

    #[test]
    fn test_first_listed_category_wins() {
        let table = CategoryTable::default();
        // pptx is listed under Documents and Presentations
        assert_eq!(table.categorize(Path::new("deck.pptx")), Some("Documents"));
    }

    #[test]
    fn test_unmatched_and_missing_extensions() {
        let table = CategoryTable::default();
        assert_eq!(table.categorize(Path::new("data.xyz")), Some(OTHERS));
        assert_eq!(table.categorize(Path::new("Makefile")), None);
        assert_eq!(table.categorize(Path::new("trailing.")), None);
    }

    #[test]
    fn test_custom_table_normalizes_extensions() {
        let config = OrganizerConfig {
            create_folders: true,
            categories: vec![CategoryConfig {
                name: "Data".to_string(),
                extensions: vec![".CSV".to_string(), " json ".to_string()],
            }],
        };
        let table = CategoryTable::new(&config);

        assert_eq!(table.categorize(Path::new("rows.csv")), Some("Data"));
        assert_eq!(table.categorize(Path::new("doc.json")), Some("Data"));
        assert_eq!(table.categorize(Path::new("photo.jpg")), Some(OTHERS));
        assert!(table.is_category("Data"));
        assert!(!table.is_category(OTHERS));
    }
}
