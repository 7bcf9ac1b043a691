// Prompting the model for listing JSON and validating what comes back
use crate::ai::{extract_json_object, LanguageModel};
use crate::model::{
    AiError, BilingualListing, Characteristic, Currency, ListingDraft, Location, PropertyType,
};
use serde_json::{Map, Value};
use tracing::{info, warn};

/// Fields copied from the source draft into its translation.
const LOCALE_INDEPENDENT: &[&str] = &["price", "currency", "bedrooms", "bathrooms", "propertyType"];

pub fn language_name(locale: &str) -> &str {
    match locale.split(['-', '_']).next().unwrap_or(locale) {
        "es" => "Spanish",
        "en" => "English",
        "pt" => "Portuguese",
        "fr" => "French",
        "de" => "German",
        _ => locale,
    }
}

fn structure_prompt(input: &str, language: &str) -> String {
    format!(
        r#"Analyze this real estate listing and extract structured information.
Answer with a single JSON object of this shape:

{{
  "title": "Property title",
  "description": "Detailed description",
  "address": "Property address/location",
  "price": 0,
  "currency": "USD" or "PAB",
  "bedrooms": 0,
  "bathrooms": 0,
  "propertyType": "sale" or "rent",
  "category": "apartamento", "casa", "lote", "finca", "oficina", ...,
  "features": ["feature1", "feature2"],
  "characteristics": [
    {{"key": "area", "label": "Área", "value": "114", "suffix": "m²"}}
  ],
  "location": {{"neighborhood": "...", "city": "...", "country": "..."}}
}}

Rules:
- Write every text field in {language}.
- Give exact numbers for price, bedrooms and bathrooms.
- Decide sale or rent from context.
- List every amenity mentioned as a short feature name.
- Put measurable attributes in characteristics.
- Currency is USD or PAB (Panamanian Balboa).

Listing data:
{input}
"#
    )
}

fn translate_prompt(listing_json: &str, from: &str, to: &str) -> String {
    format!(
        r#"Translate this real estate listing from {from} to {to}.
Keep the JSON structure and keys unchanged, translate only the text values, keep the
features list in the same order and length, and leave numbers untouched.
Answer with the translated JSON object only.

{listing_json}
"#
    )
}

/// Asks the model to structure `input` (free text or scraped page JSON) into a listing.
pub async fn structure_listing(
    model: &dyn LanguageModel,
    input: &str,
    source_locale: &str,
) -> Result<ListingDraft, AiError> {
    info!("Parsing listing with the language model...");
    let text = model
        .generate(&structure_prompt(input, language_name(source_locale)))
        .await?;
    let value: Value = serde_json::from_str(extract_json_object(&text)?)?;
    let draft = validate_listing(value)?;
    info!("Listing parsed: {}", draft.title);
    Ok(draft)
}

/// Translates `source` into `target_locale`. Never fails: on any error the target side
/// is a copy of the source and `translated` is false.
pub async fn translate_listing(
    model: &dyn LanguageModel,
    source: ListingDraft,
    source_locale: &str,
    target_locale: &str,
) -> BilingualListing {
    info!("Translating listing to {}...", language_name(target_locale));
    match translate(model, &source, source_locale, target_locale).await {
        Ok(target) => {
            if target.features.len() != source.features.len() {
                warn!(
                    "Translation has {} features for {} source features",
                    target.features.len(),
                    source.features.len()
                );
            }
            BilingualListing {
                source,
                target,
                translated: true,
            }
        }
        Err(e) => {
            warn!("Translation failed, keeping source text: {}", e);
            BilingualListing {
                target: source.clone(),
                source,
                translated: false,
            }
        }
    }
}

async fn translate(
    model: &dyn LanguageModel,
    source: &ListingDraft,
    source_locale: &str,
    target_locale: &str,
) -> Result<ListingDraft, AiError> {
    let source_value = serde_json::to_value(source)?;
    let prompt = translate_prompt(
        &serde_json::to_string_pretty(&source_value)?,
        language_name(source_locale),
        language_name(target_locale),
    );
    let text = model.generate(&prompt).await?;
    let mut value: Value = serde_json::from_str(extract_json_object(&text)?)?;

    if let (Some(target), Some(source)) = (value.as_object_mut(), source_value.as_object()) {
        for key in LOCALE_INDEPENDENT {
            if let Some(v) = source.get(*key) {
                target.insert(key.to_string(), v.clone());
            }
        }
    }
    validate_listing(value)
}

fn schema(reason: impl Into<String>) -> AiError {
    AiError::Schema(reason.into())
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Reads a number from JSON numbers or numeric strings such as `"$125,000"` or `"2.5"`.
pub fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            let negative = s.starts_with('-');
            let digits: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.')
                .collect();
            let digits = digits.trim_matches('.');
            if digits.is_empty() {
                return None;
            }
            let n: f64 = digits.parse().ok()?;
            Some(if negative { -n } else { n })
        }
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

fn optional_count(object: &Map<String, Value>, key: &str) -> Result<f64, AiError> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(0.0),
        Some(v) => match coerce_number(v) {
            Some(n) if n >= 0.0 => Ok(n),
            Some(n) => Err(schema(format!("{} must not be negative, got {}", key, n))),
            None => Err(schema(format!("{} is not a number: {}", key, v))),
        },
    }
}

fn parse_currency(value: Option<&Value>) -> Result<Currency, AiError> {
    let Some(raw) = value.and_then(text_of) else {
        return Ok(Currency::Usd);
    };
    match raw.to_uppercase().as_str() {
        "USD" | "$" | "US$" | "DOLLARS" => Ok(Currency::Usd),
        "PAB" | "B/." | "BALBOA" | "BALBOAS" => Ok(Currency::Pab),
        other => Err(schema(format!("unsupported currency {}", other))),
    }
}

fn parse_property_type(value: Option<&Value>) -> Result<PropertyType, AiError> {
    let Some(raw) = value.and_then(text_of) else {
        return Ok(PropertyType::Sale);
    };
    match raw.to_lowercase().as_str() {
        "sale" | "for sale" | "venta" | "en venta" => Ok(PropertyType::Sale),
        "rent" | "for rent" | "alquiler" | "en alquiler" => Ok(PropertyType::Rent),
        other => Err(schema(format!("unknown property type {}", other))),
    }
}

fn parse_features(value: Option<&Value>) -> Vec<String> {
    let raw: Vec<String> = match value {
        Some(Value::Array(items)) => items.iter().filter_map(text_of).collect(),
        Some(Value::String(s)) => s.split(',').map(|f| f.trim().to_string()).collect(),
        _ => Vec::new(),
    };

    let mut features: Vec<String> = Vec::with_capacity(raw.len());
    for feature in raw.into_iter().filter(|f| !f.is_empty()) {
        let lower = feature.to_lowercase();
        if !features.iter().any(|f| f.to_lowercase() == lower) {
            features.push(feature);
        }
    }
    features
}

fn parse_characteristics(value: Option<&Value>) -> Vec<Characteristic> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|item| {
            let field = |k: &str| item.get(k).and_then(text_of);
            let key = field("key")?;
            let value = field("value")?;
            Some(Characteristic {
                label: field("label").unwrap_or_else(|| key.clone()),
                suffix: field("suffix").unwrap_or_default(),
                key,
                value,
            })
        })
        .collect()
}

fn parse_location(value: Option<&Value>) -> Location {
    match value {
        Some(Value::Object(map)) => Location {
            neighborhood: map.get("neighborhood").and_then(text_of),
            city: map.get("city").and_then(text_of),
            country: map.get("country").and_then(text_of),
        },
        Some(Value::String(s)) if !s.trim().is_empty() => Location {
            city: Some(s.trim().to_string()),
            ..Location::default()
        },
        _ => Location::default(),
    }
}

/// Checks model output against the listing schema, coercing numeric strings.
pub fn validate_listing(value: Value) -> Result<ListingDraft, AiError> {
    let Value::Object(object) = value else {
        return Err(schema("expected a JSON object"));
    };
    let text = |key: &str| object.get(key).and_then(text_of);

    let title = text("title").ok_or_else(|| schema("title is missing"))?;
    let price = match object.get("price") {
        None | Some(Value::Null) => return Err(schema("price is missing")),
        Some(v) => coerce_number(v).ok_or_else(|| schema(format!("price is not a number: {}", v)))?,
    };
    if price < 0.0 {
        return Err(schema(format!("price must not be negative, got {}", price)));
    }

    let property_type = object.get("propertyType").or_else(|| object.get("property_type"));
    let location = parse_location(object.get("location"));
    let address = text("address").unwrap_or_else(|| location.joined());

    Ok(ListingDraft {
        title,
        description: text("description").unwrap_or_default(),
        address,
        price,
        currency: parse_currency(object.get("currency"))?,
        bedrooms: optional_count(&object, "bedrooms")?.round() as u32,
        bathrooms: optional_count(&object, "bathrooms")?,
        property_type: parse_property_type(property_type)?,
        category: text("category").unwrap_or_default(),
        features: parse_features(object.get("features")),
        characteristics: parse_characteristics(object.get("characteristics")),
        location,
    })
}
