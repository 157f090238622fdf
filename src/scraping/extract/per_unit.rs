//! Amazon "price per litre/kg/unit" exclusion.
//!
//! Amazon renders a unit price (`R$ 10,20 por litro`) with the same markup as
//! the purchase price. A candidate is dropped when the text of its nearest
//! price block mentions a per-unit quantity, unless the block states the
//! price per unit of the item itself.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Selector};

static PER_UNIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)por\s*litro|por\s*kg|por\s*100\s*g|por\s*unidade\s*\(|preço\s*por\s*litro|preço\s*por\s*kg",
    )
    .expect("valid regex")
});
static UNIT_TOTAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)preço\s*por\s*unidade\s*r\$|cada\s*unidade\s*r\$").expect("valid regex")
});

const PRICE_BLOCK: &str = "#corePrice_feature_div, #apex_desktop, .a-section, #twisterContainer";

/// Predicate rejecting per-unit price candidates.
#[derive(Debug, Clone)]
pub struct PerUnitPriceFilter {
    block: Option<Selector>,
}

impl Default for PerUnitPriceFilter {
    fn default() -> Self {
        Self {
            block: Selector::parse(PRICE_BLOCK).ok(),
        }
    }
}

impl PerUnitPriceFilter {
    /// Whether `element` belongs to a per-unit price block.
    pub fn excludes(&self, element: ElementRef<'_>) -> bool {
        let block = self.nearest_block(element).unwrap_or(element);
        let text = block.text().collect::<String>();
        Self::is_per_unit_text(&text)
    }

    /// Text-level rule, exposed for tuning.
    pub fn is_per_unit_text(text: &str) -> bool {
        PER_UNIT.is_match(text) && !UNIT_TOTAL.is_match(text)
    }

    fn nearest_block<'a>(&self, element: ElementRef<'a>) -> Option<ElementRef<'a>> {
        let selector = self.block.as_ref()?;
        if selector.matches(&element) {
            return Some(element);
        }
        element
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|ancestor| selector.matches(ancestor))
    }
}
