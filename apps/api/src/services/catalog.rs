use crate::{
    error::{ApiError, Result},
    models::{Book, CatalogKey, CatalogRow},
};
use csv::ReaderBuilder;
use std::{collections::HashMap, io::Read, path::Path};
use tracing::{debug, info, warn};

/// Immutable in-memory book catalog keyed by ISBN-13
#[derive(Debug, Default)]
pub struct Catalog {
    books: Vec<Book>,
    index: HashMap<CatalogKey, usize>,
}

impl Catalog {
    /// Load the catalog from a CSV file with a header row
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading book catalog from {}", path.display());

        let file = std::fs::File::open(path).map_err(|e| {
            ApiError::CatalogError(format!("Failed to open {}: {}", path.display(), e))
        })?;

        let catalog = Self::from_reader(file)?;
        info!("Loaded {} books", catalog.len());
        Ok(catalog)
    }

    /// Parse catalog rows from any CSV source.
    ///
    /// Rows that fail validation are skipped with a warning. A repeated
    /// `isbn13` aborts loading, since lookups by key must be unambiguous.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let mut books = Vec::new();
        let mut skipped = 0usize;

        for (line, record) in csv_reader.deserialize::<CatalogRow>().enumerate() {
            let row = match record {
                Ok(row) => row,
                Err(e) => {
                    warn!("Skipping unreadable catalog row {}: {}", line + 1, e);
                    skipped += 1;
                    continue;
                }
            };

            match Book::try_from(row) {
                Ok(book) => books.push(book),
                Err(reason) => {
                    warn!("Skipping catalog row {}: {}", line + 1, reason);
                    skipped += 1;
                }
            }
        }

        if skipped > 0 {
            debug!("Skipped {} invalid catalog rows", skipped);
        }

        Self::from_books(books)
    }

    pub fn from_books(books: Vec<Book>) -> Result<Self> {
        let mut index = HashMap::with_capacity(books.len());

        for (position, book) in books.iter().enumerate() {
            if let Some(previous) = index.insert(book.isbn13, position) {
                return Err(ApiError::CatalogError(format!(
                    "Duplicate catalog key {} ('{}' and '{}')",
                    book.isbn13, books[previous].title, book.title
                )));
            }
        }

        Ok(Self { books, index })
    }

    /// Give every book without a purchase link one built from `template`,
    /// where `{isbn}` stands for the catalog key
    pub fn fill_purchase_links(&mut self, template: &str) {
        for book in self.books.iter_mut().filter(|b| b.purchase_link.is_none()) {
            book.purchase_link = Some(template.replace("{isbn}", &book.isbn13.to_string()));
        }
    }

    pub fn get(&self, key: CatalogKey) -> Option<&Book> {
        self.index.get(&key).map(|&position| &self.books[position])
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}
