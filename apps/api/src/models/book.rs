use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

pub const GENRE_DELIMITER: char = '|';

/// Numeric catalog key, drawn from the ISBN-13 column
pub type CatalogKey = u64;

fn deserialize_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}

/// One row of the catalog CSV, before validation
#[derive(Debug, Deserialize)]
pub struct CatalogRow {
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub isbn13: Option<String>,
    #[serde(default, alias = "Title", deserialize_with = "deserialize_optional_string")]
    pub title: Option<String>,
    #[serde(
        default,
        alias = "Authors",
        alias = "author",
        deserialize_with = "deserialize_optional_string"
    )]
    pub authors: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub tagged_description: Option<String>,
    #[serde(
        default,
        alias = "image_url",
        deserialize_with = "deserialize_optional_string"
    )]
    pub thumbnail: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub genres: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub purchase_link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Book {
    #[schema(value_type = u64, example = json!(9780002005883_u64))]
    pub isbn13: CatalogKey,
    pub title: String,
    pub authors: Option<String>,
    /// Description text without the leading catalog key
    pub description: String,
    #[serde(skip)]
    pub tagged_description: String,
    pub thumbnail: Option<String>,
    pub genres: Vec<String>,
    pub purchase_link: Option<String>,
}

/// Split a `|`-delimited genre field, dropping blank entries
pub fn split_genres(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(GENRE_DELIMITER)
            .map(str::trim)
            .filter(|g| !g.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

/// Parse the catalog key at the start of a tagged description or search hit.
///
/// The content must start with an integer token, optionally wrapped in double quotes.
pub fn parse_catalog_key(content: &str) -> Option<CatalogKey> {
    content
        .trim()
        .trim_matches('"')
        .split_whitespace()
        .next()?
        .parse()
        .ok()
}

/// Drop the leading catalog key from a tagged description
fn strip_catalog_key(tagged: &str) -> String {
    let trimmed = tagged.trim().trim_matches('"');
    match trimmed.split_once(char::is_whitespace) {
        Some((head, rest)) if head.parse::<CatalogKey>().is_ok() => rest.trim().to_string(),
        None if trimmed.parse::<CatalogKey>().is_ok() => String::new(),
        _ => trimmed.to_string(),
    }
}

fn parse_isbn(raw: &str) -> Option<CatalogKey> {
    raw.parse::<CatalogKey>().ok().or_else(|| {
        // pandas exports integer columns with NaNs as floats, e.g. "9780002005883.0"
        raw.strip_suffix(".0")
            .and_then(|s| s.parse::<CatalogKey>().ok())
    })
}

impl TryFrom<CatalogRow> for Book {
    type Error = String;

    fn try_from(row: CatalogRow) -> Result<Self, Self::Error> {
        let raw_isbn = row.isbn13.ok_or("missing isbn13")?;
        let isbn13 =
            parse_isbn(&raw_isbn).ok_or_else(|| format!("invalid isbn13 '{}'", raw_isbn))?;

        let title = row
            .title
            .ok_or_else(|| format!("missing title for {}", isbn13))?;

        let tagged_description = row
            .tagged_description
            .unwrap_or_else(|| match &row.description {
                Some(description) => format!("{} {}", isbn13, description),
                None => isbn13.to_string(),
            });

        let description = row
            .description
            .unwrap_or_else(|| strip_catalog_key(&tagged_description));

        Ok(Book {
            isbn13,
            title,
            authors: row.authors,
            description,
            tagged_description,
            thumbnail: row.thumbnail,
            genres: split_genres(row.genres.as_deref()),
            purchase_link: row.purchase_link,
        })
    }
}
