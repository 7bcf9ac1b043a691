// Site-agnostic extraction of listing text from HTML
use crate::model::{ParserError, ScrapedPage};
use crate::parser::PageParser;
use crate::utils::{collapse_whitespace, truncate_chars};
use scraper::{ElementRef, Html, Node, Selector};

pub(crate) fn selector(css: &str) -> Result<Selector, ParserError> {
    Selector::parse(css).map_err(|e| ParserError::HtmlParseError(format!("{}: {}", css, e)))
}

pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

/// Text of the first element matching `css` that has any.
pub(crate) fn first_text(document: &Html, css: &str) -> Result<Option<String>, ParserError> {
    let sel = selector(css)?;
    Ok(document
        .select(&sel)
        .map(element_text)
        .find(|text| !text.is_empty()))
}

/// Distinct non-empty texts of every element matching `css`, in document order.
pub(crate) fn all_texts(document: &Html, css: &str) -> Result<Vec<String>, ParserError> {
    let sel = selector(css)?;
    let mut texts: Vec<String> = Vec::new();
    for text in document.select(&sel).map(element_text) {
        if !text.is_empty() && !texts.contains(&text) {
            texts.push(text);
        }
    }
    Ok(texts)
}

pub(crate) fn meta_description(document: &Html) -> Result<Option<String>, ParserError> {
    let sel = selector(r#"meta[name="description"]"#)?;
    Ok(document
        .select(&sel)
        .filter_map(|meta| meta.value().attr("content"))
        .map(collapse_whitespace)
        .find(|text| !text.is_empty()))
}

/// Visible body text with scripts and styles left out.
pub(crate) fn body_text(document: &Html) -> Result<String, ParserError> {
    let sel = selector("body")?;
    let Some(body) = document.select(&sel).next() else {
        return Ok(String::new());
    };

    let mut out = String::new();
    for node in body.descendants() {
        if let Node::Text(text) = node.value() {
            let hidden = node
                .parent()
                .and_then(|parent| parent.value().as_element())
                .map(|element| matches!(element.name(), "script" | "style" | "noscript"))
                .unwrap_or(false);
            if !hidden {
                out.push_str(text);
                out.push(' ');
            }
        }
    }
    Ok(collapse_whitespace(&out))
}

pub struct GenericPageParser {
    max_content_length: usize,
}

impl GenericPageParser {
    pub fn new(max_content_length: usize) -> Self {
        Self { max_content_length }
    }
}

impl PageParser for GenericPageParser {
    fn parse(&self, html: &str, url: &str) -> Result<ScrapedPage, ParserError> {
        let document = Html::parse_document(html);

        let title = match first_text(&document, "title")? {
            Some(title) => title,
            None => first_text(&document, "h1")?.unwrap_or_default(),
        };
        let description = meta_description(&document)?.unwrap_or_default();
        let price = all_texts(&document, r#"[class*="price"], [id*="price"]"#)?
            .into_iter()
            .take(5)
            .collect::<Vec<_>>()
            .join(" | ");
        let features = all_texts(
            &document,
            r#"[class*="feature"], [class*="amenity"], [class*="benefit"]"#,
        )?;
        let body = body_text(&document)?;

        if title.is_empty() && body.is_empty() {
            return Err(ParserError::MissingField("title or body text"));
        }

        Ok(ScrapedPage {
            url: url.to_string(),
            title,
            description,
            price,
            features,
            content: truncate_chars(&body, self.max_content_length).to_string(),
            details: None,
        })
    }
}
