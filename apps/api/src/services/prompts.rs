//! Fixed prompt templates and the renderer that fills them in.

use crate::models::Book;
use serde::Deserialize;
use std::collections::HashMap;

const BOOKWORM_TEMPLATE: &str = "\
You are a knowledgeable and friendly book recommendation assistant.
Your goal is to help users find books they'll love based on their preferences and the available books.
Don't just list the books: talk about them like a bookworm who has read every one of them.
{purchase_instruction}
Query: {query}

Available Book Information:
{retrieved_books}

Recommend every book provided above. For each recommended book, provide:
- Title and Author
- A brief reason why it matches the request
- Key themes or features";

const CONCISE_TEMPLATE: &str = "\
You are a book recommendation assistant.
{purchase_instruction}
A reader asked for: {query}

Candidate books:
{retrieved_books}

For each candidate, write one line with the title followed by a single sentence explaining why it fits the request.";

const DESCRIPTION_REWRITE_TEMPLATE: &str = "\
You are a copywriter for an online bookstore.
Rewrite the following book description so it is engaging, warm and easy to read.
Keep every fact from the original, do not invent plot details, and keep it under 150 words.
Return only the rewritten description.

Description:
{description}";

const SEARCH_QUERY_TEMPLATE: &str = "\
Convert the following book description into a short search query of at most ten words
that captures its genre, themes and mood. Only respond with the search query, nothing else.

Description:
{description}";

const PURCHASE_INSTRUCTION: &str =
    "Also provide the purchase link for each book when one is listed.";

/// Fixed prompt variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PromptTemplate {
    Bookworm,
    Concise,
    DescriptionRewrite,
    SearchQuery,
}

impl PromptTemplate {
    fn text(self) -> &'static str {
        match self {
            PromptTemplate::Bookworm => BOOKWORM_TEMPLATE,
            PromptTemplate::Concise => CONCISE_TEMPLATE,
            PromptTemplate::DescriptionRewrite => DESCRIPTION_REWRITE_TEMPLATE,
            PromptTemplate::SearchQuery => SEARCH_QUERY_TEMPLATE,
        }
    }

    /// Whether the template renders a list of retrieved books
    pub fn uses_books(self) -> bool {
        matches!(self, PromptTemplate::Bookworm | PromptTemplate::Concise)
    }
}

/// Render a recommendation prompt for `query` over the retrieved books
pub fn render_recommendation(
    template: PromptTemplate,
    query: &str,
    books: &[Book],
    include_purchase_links: bool,
) -> String {
    let retrieved_books = format_books(books, include_purchase_links);
    let purchase_instruction = if include_purchase_links {
        PURCHASE_INSTRUCTION
    } else {
        ""
    };

    render(
        template.text(),
        &HashMap::from([
            ("query", query),
            ("retrieved_books", retrieved_books.as_str()),
            ("purchase_instruction", purchase_instruction),
        ]),
    )
}

/// Render a template that works on a single description
pub fn render_description(template: PromptTemplate, description: &str) -> String {
    render(
        template.text(),
        &HashMap::from([("description", description.trim())]),
    )
}

/// Format retrieved books as blank-line separated entries.
///
/// Uses the description without the catalog key. An ISBN can only reach the model
/// through an opted-in purchase link.
pub fn format_books(books: &[Book], include_purchase_links: bool) -> String {
    books
        .iter()
        .map(|book| {
            let mut lines = vec![format!("Title: {}", book.title)];
            if let Some(authors) = &book.authors {
                lines.push(format!("Author: {}", authors));
            }
            lines.push(format!("Description: {}", book.description));
            if include_purchase_links {
                if let Some(link) = &book.purchase_link {
                    lines.push(format!("Purchase: {}", link));
                }
            }
            lines.join("\n")
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Single-pass `{name}` substitution; substituted values are never rescanned.
/// Unknown placeholders are left as they are.
fn render(template: &str, values: &HashMap<&str, &str>) -> String {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        output.push_str(&rest[..start]);
        let after = &rest[start + 1..];

        match after.find('}') {
            Some(end) => match values.get(&after[..end]) {
                Some(value) => {
                    output.push_str(value);
                    rest = &after[end + 1..];
                }
                None => {
                    output.push('{');
                    rest = after;
                }
            },
            None => {
                output.push_str(&rest[start..]);
                rest = "";
            }
        }
    }

    output.push_str(rest);
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(isbn13: u64, title: &str, authors: Option<&str>, description: &str) -> Book {
        Book {
            isbn13,
            title: title.to_string(),
            authors: authors.map(str::to_string),
            description: description.to_string(),
            tagged_description: format!("{} {}", isbn13, description),
            thumbnail: None,
            genres: Vec::new(),
            purchase_link: Some(format!("https://shop.example/{}", isbn13)),
        }
    }

    #[test]
    fn test_format_books_entries() {
        let books = vec![
            book(9780000000001, "First", Some("Ann Author"), "One."),
            book(9780000000002, "Second", None, "Two."),
        ];

        assert_eq!(
            format_books(&books, false),
            "Title: First\nAuthor: Ann Author\nDescription: One.\n\nTitle: Second\nDescription: Two."
        );
    }

    #[test]
    fn test_recommendation_prompt_hides_catalog_keys() {
        let books = vec![book(9780000000001, "First", Some("Ann"), "A story.")];
        let prompt = render_recommendation(PromptTemplate::Bookworm, "sea stories", &books, false);

        assert!(prompt.contains("Query: sea stories"));
        assert!(prompt.contains("Title: First"));
        assert!(!prompt.contains("9780000000001"));
        assert!(!prompt.contains("{retrieved_books}"));
        assert!(!prompt.contains("purchase link"));
    }

    #[test]
    fn test_purchase_links_included_when_enabled() {
        let books = vec![book(9780000000001, "First", None, "A story.")];
        let prompt = render_recommendation(PromptTemplate::Concise, "q", &books, true);

        assert!(prompt.contains("Purchase: https://shop.example/9780000000001"));
        assert!(prompt.contains(PURCHASE_INSTRUCTION));
    }

    #[test]
    fn test_values_are_not_rescanned() {
        let books = vec![book(1, "Braces", None, "Mentions {query} literally.")];
        let prompt =
            render_recommendation(PromptTemplate::Bookworm, "{retrieved_books}", &books, false);

        assert!(prompt.contains("Query: {retrieved_books}"));
        assert!(prompt.contains("Mentions {query} literally."));
    }

    #[test]
    fn test_render_is_deterministic() {
        let a = render_description(PromptTemplate::SearchQuery, "  A dragon hoards books. ");
        let b = render_description(PromptTemplate::SearchQuery, "A dragon hoards books.");
        assert_eq!(a, b);
        assert!(a.ends_with("Description:\nA dragon hoards books."));
    }

    #[test]
    fn test_render_leaves_unknown_and_unclosed_braces() {
        let values = HashMap::from([("a", "x")]);
        assert_eq!(render("{a} {b} {", &values), "x {b} {");
    }
}
