// Static vocabulary: category synonyms and known feature translations
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// The closed set of property categories every listing is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanonicalCategory {
    Apartments,
    Houses,
    Lots,
    Farms,
    Offices,
}

impl CanonicalCategory {
    pub const ALL: [CanonicalCategory; 5] = [
        CanonicalCategory::Apartments,
        CanonicalCategory::Houses,
        CanonicalCategory::Lots,
        CanonicalCategory::Farms,
        CanonicalCategory::Offices,
    ];

    /// Source-locale name, also the lookup key of the provisioned CMS entry.
    pub fn source_name(self) -> &'static str {
        match self {
            CanonicalCategory::Apartments => "apartamentos",
            CanonicalCategory::Houses => "casas",
            CanonicalCategory::Lots => "lotes",
            CanonicalCategory::Farms => "fincas",
            CanonicalCategory::Offices => "oficinas",
        }
    }

    pub fn target_name(self) -> &'static str {
        match self {
            CanonicalCategory::Apartments => "apartments",
            CanonicalCategory::Houses => "houses",
            CanonicalCategory::Lots => "lots",
            CanonicalCategory::Farms => "farms",
            CanonicalCategory::Offices => "offices",
        }
    }
}

impl fmt::Display for CanonicalCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.source_name())
    }
}

use CanonicalCategory::*;

/// Synonym table in match order. Ties between categories resolve to the earlier row.
pub const CATEGORY_SYNONYMS: &[(&str, CanonicalCategory)] = &[
    ("apartamentos", Apartments),
    ("apartamento", Apartments),
    ("apto", Apartments),
    ("depto", Apartments),
    ("departamento", Apartments),
    ("condominio", Apartments),
    ("penthouse", Apartments),
    ("estudio", Apartments),
    ("loft", Apartments),
    ("monoambiente", Apartments),
    ("apartment", Apartments),
    ("apartments", Apartments),
    ("condo", Apartments),
    ("studio", Apartments),
    ("casas", Houses),
    ("casa", Houses),
    ("vivienda", Houses),
    ("residencia", Houses),
    ("chalet", Houses),
    ("villa", Houses),
    ("duplex", Houses),
    ("dúplex", Houses),
    ("townhouse", Houses),
    ("casa de playa", Houses),
    ("house", Houses),
    ("houses", Houses),
    ("lotes", Lots),
    ("lote", Lots),
    ("terreno", Lots),
    ("terrenos", Lots),
    ("solar", Lots),
    ("parcela", Lots),
    ("lot", Lots),
    ("lots", Lots),
    ("land", Lots),
    ("fincas", Farms),
    ("finca", Farms),
    ("rancho", Farms),
    ("hacienda", Farms),
    ("granja", Farms),
    ("casa de campo", Farms),
    ("quinta", Farms),
    ("farm", Farms),
    ("farms", Farms),
    ("ranch", Farms),
    ("oficinas", Offices),
    ("oficina", Offices),
    ("local comercial", Offices),
    ("local", Offices),
    ("consultorio", Offices),
    ("bodega", Offices),
    ("galera", Offices),
    ("office", Offices),
    ("offices", Offices),
    ("commercial space", Offices),
    ("warehouse", Offices),
];

static CATEGORY_LOOKUP: LazyLock<HashMap<&'static str, CanonicalCategory>> = LazyLock::new(|| {
    let mut map = HashMap::with_capacity(CATEGORY_SYNONYMS.len());
    for &(synonym, category) in CATEGORY_SYNONYMS {
        map.entry(synonym).or_insert(category);
    }
    map
});

/// Exact synonym lookup; `label` must already be normalized.
pub fn category_synonym(label: &str) -> Option<CanonicalCategory> {
    CATEGORY_LOOKUP.get(label).copied()
}

/// Known source→target translations of common amenities. Only used for label text.
const FEATURE_TRANSLATIONS: &[(&str, &str)] = &[
    ("piscina", "swimming pool"),
    ("gimnasio", "gym"),
    ("seguridad 24 horas", "24/7 security"),
    ("seguridad 24/7", "24/7 security"),
    ("seguridad", "security"),
    ("estacionamiento", "parking"),
    ("estacionamiento techado", "covered parking"),
    ("garaje", "garage"),
    ("balcón", "balcony"),
    ("terraza", "terrace"),
    ("terraza techada", "covered terrace"),
    ("jardín", "garden"),
    ("aire acondicionado", "air conditioning"),
    ("a/c", "air conditioning"),
    ("calefacción", "heating"),
    ("internet", "internet"),
    ("wifi", "wifi"),
    ("lavandería", "laundry"),
    ("lavandería interna", "internal laundry"),
    ("lavandería externa", "external laundry"),
    ("cocina equipada", "equipped kitchen"),
    ("cocina cerrada", "closed kitchen"),
    ("cocina abierta", "open kitchen"),
    ("ascensor", "elevator"),
    ("elevador", "elevator"),
    ("portero", "doorman"),
    ("conserje", "concierge"),
    ("conserjería", "concierge service"),
    ("sala de juegos", "game room"),
    ("área de bbq", "bbq area"),
    ("área social", "social area"),
    ("sala de fiestas", "party room"),
    ("salón de fiestas", "party hall"),
    ("jacuzzi", "jacuzzi"),
    ("sauna", "sauna"),
    ("spa", "spa"),
    ("vista al mar", "ocean view"),
    ("vista a la ciudad", "city view"),
    ("vista panorámica", "panoramic view"),
    ("vista a las montañas", "mountain view"),
    ("walk-in closet", "walk-in closet"),
    ("closet", "closet"),
    ("closet empotrado", "built-in closet"),
    ("baño privado", "private bathroom"),
    ("baño completo", "full bathroom"),
    ("ducha", "shower"),
    ("tina", "bathtub"),
    ("lavamanos doble", "double sink"),
    ("pet friendly", "pet friendly"),
    ("mascotas permitidas", "pets allowed"),
    ("amoblado", "furnished"),
    ("semi amoblado", "semi furnished"),
    ("sin amueblar", "unfurnished"),
    ("tanque de agua", "water tank"),
    ("planta eléctrica", "power generator"),
    ("generador", "generator"),
    ("cerca de escuelas", "near schools"),
    ("cerca del transporte", "near transportation"),
    ("área bancaria", "banking area"),
];

static FEATURE_LOOKUP: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| FEATURE_TRANSLATIONS.iter().copied().collect());

/// Known translation for a normalized feature label.
pub fn feature_translation(label: &str) -> Option<&'static str> {
    FEATURE_LOOKUP.get(label).copied()
}
