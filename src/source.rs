// Command-line arguments turned into listing sources
use crate::utils::truncate_chars;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{error, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Url(String),
    /// Inline text or file contents; `origin` names where it came from.
    Text { origin: String, body: String },
}

impl Source {
    /// Classifies one argument. Returns `None` for unreadable files.
    pub fn classify(arg: &str) -> Option<Source> {
        let trimmed = arg.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            return Some(Source::Url(trimmed.to_string()));
        }

        if trimmed.ends_with(".txt") || trimmed.ends_with(".json") {
            return match fs::read_to_string(Path::new(trimmed)) {
                Ok(body) => {
                    info!("Read {} ({} bytes)", trimmed, body.len());
                    Some(Source::Text {
                        origin: trimmed.to_string(),
                        body,
                    })
                }
                Err(e) => {
                    error!("Error reading file {}: {}", trimmed, e);
                    None
                }
            };
        }

        Some(Source::Text {
            origin: "inline text".into(),
            body: arg.to_string(),
        })
    }

    pub fn collect<I, S>(args: I) -> Vec<Source>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        args.into_iter()
            .filter_map(|arg| Source::classify(arg.as_ref()))
            .collect()
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Url(url) => write!(f, "{}", url),
            Source::Text { origin, body } if origin == "inline text" => {
                let preview = truncate_chars(body.trim(), 40);
                if preview.len() < body.trim().len() {
                    write!(f, "\"{}…\"", preview)
                } else {
                    write!(f, "\"{}\"", preview)
                }
            }
            Source::Text { origin, .. } => write!(f, "{}", origin),
        }
    }
}
