// HTML -> ScrapedPage extraction

pub mod encuentra24;
pub mod page_parser;

use crate::model::{ParserError, ScrapedPage};

pub use encuentra24::Encuentra24Parser;
pub use page_parser::GenericPageParser;

pub trait PageParser {
    fn parse(&self, html: &str, url: &str) -> Result<ScrapedPage, ParserError>;
}

/// Parses `html` with the site-specific parser for `url` when there is one.
pub fn parse_page(html: &str, url: &str, max_content_length: usize) -> Result<ScrapedPage, ParserError> {
    if Encuentra24Parser::can_handle(url) {
        Encuentra24Parser::new(max_content_length).parse(html, url)
    } else {
        GenericPageParser::new(max_content_length).parse(html, url)
    }
}
