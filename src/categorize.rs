//! Keyword categorization of product titles.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::domain::category::{Category, NewCategory};
use crate::domain::types::{CategoryName, CategorySlug, TypeConstraintError};

/// Fallback slug for titles matching no category.
pub const OUTROS: &str = "outros";
/// Fallback slug for strongly discounted, otherwise unmatched offers.
pub const OFERTA_DO_DIA: &str = "oferta-do-dia";
/// Discount strictly above which an unmatched offer is an "oferta do dia".
pub const OFERTA_DO_DIA_MIN_DISCOUNT: u8 = 40;

const ELETRONICOS: &[&str] = &[
    "celular", "smartphone", "iphone", "samsung", "xiaomi", "motorola",
    "notebook", "laptop", "computador", "pc", "tablet", "ipad",
    "fone", "fone de ouvido", "headset", "airpods", "earphone",
    "tv", "televisão", "monitor", "smart tv", "fire tv",
    "smartwatch", "relógio inteligente", "watch",
    "câmera", "webcam", "mouse", "teclado", "ssd", "hd externo",
    "fritadeira", "air fryer", "liquidificador", "cafeteira", "micro-ondas",
    "geladeira", "lavadora", "secadora", "aspirador", "robô",
    "eletrônico", "eletronicos", "gamer", "console", "playstation", "xbox", "nintendo",
];

const LIVROS: &[&str] = &[
    "livro", "livros", "obra", "romance", "literatura", "best-seller",
    "infantil", "infantis", "didático", "enciclopédia", "biografia",
    "quadrinhos", "hq", "manga", "comics",
];

const CATOLICOS: &[&str] = &[
    "terço", "terco", "rosário", "rosario", "bíblia", "biblia",
    "santo", "santa", "católico", "catolico", "cristão", "cristao",
    "cruz", "crucifixo", "imagem", "quadro religioso", "nossa senhora",
    "são josé", "sao jose", "padre", "missal", "devocionário",
];

const CASA: &[&str] = &[
    "panela", "panelas", "frigideira", "talheres", "louça", "louca",
    "cama", "colchão", "colchon", "travesseiro", "lençol", "lencol",
    "sofá", "sofa", "cadeira", "mesa", "estante", "armário", "armario",
    "decoração", "decoracao", "cortina", "tapete", "luminária", "luminaria",
    "organizador", "caixa organizadora", "cozinha", "banheiro",
    "ferramenta", "parafusadeira", "furadeira", "chave", "martelo",
    "jardinagem", "vaso", "planta", "grama", "mangueira",
    "limpeza", "vassoura", "rodo", "balde", "desinfetante",
];

const FITNESS: &[&str] = &[
    "fitness", "academia", "musculação", "musculacao", "treino", "suplemento",
    "whey", "proteína", "proteina", "creatina", "pré-treino", "pre treino",
    "bcaa", "termogênico", "termogenico", "colchonete", "peso", "halter",
    "elástico", "elastico", "corda", "pular", "abdominal", "esteira",
    "bicicleta ergométrica", "ergometrica", "luvas academia", "cinta",
];

/// Seed table in priority order: `(slug, name, keywords)`.
const DEFAULT_TABLE: &[(&str, &str, &[&str])] = &[
    ("eletronicos", "Eletrônicos", ELETRONICOS),
    ("livros", "Livros", LIVROS),
    ("catolicos", "Católicos", CATOLICOS),
    ("casa", "Casa", CASA),
    ("fitness", "Fitness", FITNESS),
    (OFERTA_DO_DIA, "Oferta do Dia", &[]),
    (OUTROS, "Outros", &[]),
];

/// Lower-case `text` and strip diacritics.
pub fn normalize_text(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// The categories `seed-categories` writes, keyword categories first.
pub fn default_categories() -> Result<Vec<NewCategory>, TypeConstraintError> {
    DEFAULT_TABLE
        .iter()
        .zip(1..)
        .map(|(&(slug, name, keywords), position)| {
            Ok(NewCategory {
                slug: CategorySlug::new(slug)?,
                name: CategoryName::new(name)?,
                keywords: keywords.iter().map(|k| k.to_string()).collect(),
                position,
                is_active: true,
            })
        })
        .collect()
}

#[derive(Debug, Clone)]
struct Rule {
    slug: String,
    keywords: Vec<String>,
}

/// Ordered keyword table; the first matching category wins.
#[derive(Debug, Clone)]
pub struct Categorizer {
    rules: Vec<Rule>,
}

impl Default for Categorizer {
    fn default() -> Self {
        Self::from_table(
            DEFAULT_TABLE
                .iter()
                .map(|(slug, _, keywords)| (slug.to_string(), keywords.iter().map(|k| k.to_string()).collect())),
        )
    }
}

impl Categorizer {
    fn from_table(table: impl IntoIterator<Item = (String, Vec<String>)>) -> Self {
        let rules = table
            .into_iter()
            .filter(|(_, keywords)| !keywords.is_empty())
            .map(|(slug, keywords)| Rule {
                slug,
                keywords: keywords
                    .iter()
                    .map(|k| normalize_text(k))
                    .filter(|k| !k.is_empty())
                    .collect(),
            })
            .collect();
        Self { rules }
    }

    /// Table built from persisted categories: active only, by `position`.
    pub fn from_categories(categories: &[Category]) -> Self {
        let mut active: Vec<&Category> = categories.iter().filter(|c| c.is_active).collect();
        active.sort_by_key(|c| c.position);
        Self::from_table(
            active
                .into_iter()
                .map(|c| (c.slug.as_str().to_string(), c.keywords.clone())),
        )
    }

    /// Slug of the category for `title`.
    pub fn categorize(&self, title: &str, discount_pct: Option<u8>) -> &str {
        let normalized = normalize_text(title);
        let matched = self.rules.iter().find(|rule| {
            rule.keywords
                .iter()
                .any(|keyword| normalized.contains(keyword.as_str()))
        });
        match matched {
            Some(rule) => &rule.slug,
            None if discount_pct.is_some_and(|d| d > OFERTA_DO_DIA_MIN_DISCOUNT) => OFERTA_DO_DIA,
            None => OUTROS,
        }
    }
}
