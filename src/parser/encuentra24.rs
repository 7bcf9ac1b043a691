// encuentra24.com listing pages
use crate::model::{Characteristic, Currency, ParserError, PropertyType, ScrapedPage, SiteDetails};
use crate::parser::page_parser::{body_text, first_text, selector, GenericPageParser};
use crate::parser::PageParser;
use regex::Regex;
use scraper::Html;
use std::sync::LazyLock;

static TITLE_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\|\s*Encuentra24.*$").expect("static regex"));
static PRICE_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[\d,]*").expect("static regex"));
static BEDROOMS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)\s*(?:rec[aá]mar|bedroom|habitaci[oó]n)").expect("static regex")
});
static BATHROOMS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(?:ba[ñn]o|bathroom)").expect("static regex")
});
static AREA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(?:m²|mt²|m2|metros|square)").expect("static regex")
});
static PARKING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)\s*(?:estacionamiento|parking)").expect("static regex")
});
static RENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:alquiler|alquila|arriendo|rent)\b").expect("static regex")
});
static FLOOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)piso\s*(\d+)").expect("static regex"));

const PRICE_CSS: &str = r#"[class*="price"], .price, #price"#;
const BREADCRUMB_CSS: &str = r#".breadcrumb, [class*="breadcrumb"]"#;
const DESCRIPTION_CSS: &str =
    r#".description, [class*="description"], .details, [class*="detail"]"#;
const IMAGE_CSS: &str =
    r#"img[src*="property"], img[src*="inmueble"], .property-image img, .gallery img"#;

/// Amenities worth picking out of free-form descriptions.
const COMMON_FEATURES: &[&str] = &[
    "piscina",
    "gimnasio",
    "seguridad",
    "estacionamiento",
    "balcón",
    "terraza",
    "jardín",
    "aire acondicionado",
    "ascensor",
    "portero",
];

pub struct Encuentra24Parser {
    generic: GenericPageParser,
}

impl Encuentra24Parser {
    pub fn new(max_content_length: usize) -> Self {
        Self {
            generic: GenericPageParser::new(max_content_length),
        }
    }

    pub fn can_handle(url: &str) -> bool {
        url.contains("encuentra24.com")
    }
}

fn capture<T: std::str::FromStr>(re: &Regex, text: &str) -> Option<T> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn detect_currency(price_text: &str) -> Currency {
    if price_text.contains("B/.") || price_text.contains("PAB") {
        Currency::Pab
    } else {
        Currency::Usd
    }
}

fn detect_property_type(text: &str) -> PropertyType {
    if RENT.is_match(text) {
        PropertyType::Rent
    } else {
        PropertyType::Sale
    }
}

fn detect_category(text: &str) -> &'static str {
    if text.contains("apartamento") {
        "apartamento"
    } else if text.contains("casa") {
        "casa"
    } else if text.contains("duplex") || text.contains("dúplex") {
        "dúplex"
    } else if text.contains("lote") || text.contains("terreno") {
        "lote"
    } else if text.contains("oficina") {
        "oficina"
    } else if text.contains("local") {
        "local comercial"
    } else {
        "apartamento"
    }
}

fn characteristic(key: &str, label: &str, value: String, suffix: &str) -> Characteristic {
    Characteristic {
        key: key.into(),
        label: label.into(),
        value,
        suffix: suffix.into(),
    }
}

impl PageParser for Encuentra24Parser {
    fn parse(&self, html: &str, url: &str) -> Result<ScrapedPage, ParserError> {
        let mut page = self.generic.parse(html, url)?;
        let document = Html::parse_document(html);
        let body = body_text(&document)?;
        let breadcrumb = first_text(&document, BREADCRUMB_CSS)?.unwrap_or_default();

        if let Some(h1) = first_text(&document, "h1")? {
            page.title = h1;
        } else {
            let stripped = TITLE_SUFFIX.replace(&page.title, "").trim().to_string();
            page.title = stripped;
        }
        if let Some(description) = first_text(&document, DESCRIPTION_CSS)? {
            page.description = description;
        }

        let price_text = first_text(&document, PRICE_CSS)?.unwrap_or_default();
        let price = PRICE_DIGITS
            .find(&price_text)
            .and_then(|m| m.as_str().replace(',', "").parse::<u64>().ok());

        let location = match first_text(&document, r#"[class*="location"], [class*="address"]"#)? {
            Some(location) => location,
            None => breadcrumb.clone(),
        };

        let area: Option<f64> = capture(&AREA, &body);
        let mut characteristics = Vec::new();
        if let Some(area) = area {
            characteristics.push(characteristic("area", "Área", area.to_string(), "m²"));
        }
        if let Some(parking) = capture::<u32>(&PARKING, &body) {
            characteristics.push(characteristic(
                "parking",
                "Estacionamiento",
                parking.to_string(),
                "espacios",
            ));
        }
        if let Some(floor) = capture::<u32>(&FLOOR, &body) {
            characteristics.push(characteristic("floor", "Piso", floor.to_string(), ""));
        }

        let image_sel = selector(IMAGE_CSS)?;
        let mut images: Vec<String> = Vec::new();
        for src in document
            .select(&image_sel)
            .filter_map(|img| img.value().attr("src"))
        {
            if !src.contains("logo") && !src.contains("icon") && !images.iter().any(|i| i == src) {
                images.push(src.to_string());
            }
        }

        let description_lower = page.description.to_lowercase();
        for feature in COMMON_FEATURES {
            let known = page.features.iter().any(|f| f.to_lowercase() == *feature);
            if description_lower.contains(feature) && !known {
                page.features.push(feature.to_string());
            }
        }

        let lower = format!("{} {}", body, breadcrumb).to_lowercase();
        page.details = Some(SiteDetails {
            site: "encuentra24".into(),
            price,
            currency: detect_currency(&price_text),
            location,
            bedrooms: capture(&BEDROOMS, &body).unwrap_or(0),
            bathrooms: capture(&BATHROOMS, &body).unwrap_or(0.0),
            area,
            characteristics,
            images,
            property_type: detect_property_type(&lower),
            category: detect_category(&lower).to_string(),
        });
        page.price = price_text;

        Ok(page)
    }
}
