use crate::categorize::Categorizer;
use crate::domain::product::Product;
use crate::domain::types::{CategoryId, CategorySlug, ProductId, ProductStatus};
use crate::forms::products::{ManualProductForm, ManualProductFormPayload};
use crate::messages::{
    ComposeOptions, Offer, PostContent, compose_offer_message, compose_post_content,
    compose_urgent_offer_message,
};
use crate::repository::{CategoryReader, ProductListQuery, ProductReader, ProductWriter};

use super::{ServiceError, ServiceResult};

pub const DEFAULT_ITEMS_PER_PAGE: usize = 20;

fn product_id(raw: i32) -> ServiceResult<ProductId> {
    ProductId::new(raw).map_err(|_| ServiceError::NotFound)
}

fn category_id_by_slug<R: CategoryReader>(repo: &R, slug: &CategorySlug) -> ServiceResult<CategoryId> {
    match repo.get_category_by_slug(slug) {
        Ok(Some(category)) => Ok(category.id),
        Ok(None) => Err(ServiceError::Form(format!("unknown category `{slug}`"))),
        Err(e) => Err(ServiceError::from_repository("Failed to get category", e)),
    }
}

/// One page of products, newest first, with the total number of matches.
pub fn list_products<R>(
    status: Option<&str>,
    category: Option<&str>,
    page: usize,
    repo: &R,
) -> ServiceResult<(usize, Vec<Product>)>
where
    R: ProductReader + CategoryReader,
{
    let mut query = ProductListQuery::default().paginate(page, DEFAULT_ITEMS_PER_PAGE);
    if let Some(status) = status {
        query = query.status(ProductStatus::try_from(status)?);
    }
    if let Some(slug) = category {
        query = query.category(category_id_by_slug(repo, &CategorySlug::new(slug)?)?);
    }
    repo.list_products(query)
        .map_err(|e| ServiceError::from_repository("Failed to list products", e))
}

pub fn get_product<R>(id: i32, repo: &R) -> ServiceResult<Product>
where
    R: ProductReader,
{
    match repo.get_product_by_id(product_id(id)?) {
        Ok(Some(product)) => Ok(product),
        Ok(None) => Err(ServiceError::NotFound),
        Err(e) => Err(ServiceError::from_repository("Failed to get product", e)),
    }
}

/// Store a manually entered offer as `pending`.
///
/// Without an explicit category the title is categorized like scraped offers.
pub fn create_manual_product<R>(
    form: ManualProductForm,
    categorizer: &Categorizer,
    repo: &R,
) -> ServiceResult<Product>
where
    R: ProductWriter + CategoryReader,
{
    let ManualProductFormPayload {
        mut product,
        category_slug,
    } = ManualProductFormPayload::try_from(form)?;

    product.category_id = match category_slug {
        Some(slug) => Some(category_id_by_slug(repo, &slug)?),
        None => {
            let slug = categorizer.categorize(
                product.title.as_str(),
                product.discount_pct.map(|d| d.get()),
            );
            let slug = CategorySlug::new(slug)?;
            match repo.get_category_by_slug(&slug) {
                Ok(category) => category.filter(|c| c.is_active).map(|c| c.id),
                Err(e) => return Err(ServiceError::from_repository("Failed to get category", e)),
            }
        }
    };

    repo.create_product(&product)
        .map_err(|e| ServiceError::from_repository("Failed to create product", e))
}

fn set_status<R: ProductWriter>(id: i32, status: ProductStatus, repo: &R) -> ServiceResult<Product> {
    repo.set_product_status(product_id(id)?, status)
        .map_err(|e| ServiceError::from_repository("Failed to update product status", e))
}

pub fn approve_product<R: ProductWriter>(id: i32, repo: &R) -> ServiceResult<Product> {
    set_status(id, ProductStatus::Approved, repo)
}

/// Assign a category by slug, or clear it with `None`.
pub fn set_product_category<R>(id: i32, slug: Option<&str>, repo: &R) -> ServiceResult<Product>
where
    R: ProductWriter + CategoryReader,
{
    let category_id = match slug {
        Some(slug) => Some(category_id_by_slug(repo, &CategorySlug::new(slug)?)?),
        None => None,
    };
    repo.set_product_category(product_id(id)?, category_id)
        .map_err(|e| ServiceError::from_repository("Failed to set product category", e))
}

/// Rejecting removes the product for good.
pub fn reject_product<R: ProductWriter>(id: i32, repo: &R) -> ServiceResult<()> {
    match repo.delete_product(product_id(id)?) {
        Ok(0) => Err(ServiceError::NotFound),
        Ok(_) => {
            log::info!("Rejected product {id}");
            Ok(())
        }
        Err(e) => Err(ServiceError::from_repository("Failed to delete product", e)),
    }
}

/// Offer message as it would be sent.
pub fn preview_message<R>(id: i32, options: &ComposeOptions, repo: &R) -> ServiceResult<String>
where
    R: ProductReader,
{
    let product = get_product(id, repo)?;
    Ok(compose_offer_message(&Offer::from(&product), options))
}

/// Broadcast variant with the doubled-fire headline.
pub fn preview_urgent_message<R>(id: i32, options: &ComposeOptions, repo: &R) -> ServiceResult<String>
where
    R: ProductReader,
{
    let product = get_product(id, repo)?;
    Ok(compose_urgent_offer_message(&Offer::from(&product), options))
}

pub fn post_content<R>(id: i32, options: &ComposeOptions, repo: &R) -> ServiceResult<PostContent>
where
    R: ProductReader,
{
    let product = get_product(id, repo)?;
    Ok(compose_post_content(&Offer::from(&product), options))
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::repository::test::TestRepository;
    use crate::services::categories::seed_categories;

    fn form(title: &str, category: Option<&str>) -> ManualProductForm {
        ManualProductForm {
            title: title.into(),
            price: Decimal::new(4990, 2),
            previous_price: Some(Decimal::new(9990, 2)),
            affiliate_link: "https://www.mercadolivre.com.br/p/MLB123".into(),
            image_url: None,
            installments: None,
            external_id: None,
            category_slug: category.map(str::to_string),
        }
    }

    fn seeded() -> TestRepository {
        let repo = TestRepository::new();
        seed_categories(&repo).unwrap();
        repo
    }

    fn slug_of(repo: &TestRepository, product: &Product) -> Option<String> {
        let id = product.category_id?;
        repo.list_categories(false)
            .unwrap()
            .into_iter()
            .find(|c| c.id == id)
            .map(|c| c.slug.into_inner())
    }

    #[test]
    fn manual_product_is_auto_categorized() {
        let repo = seeded();
        let categorizer = Categorizer::default();

        let fone = create_manual_product(form("Fone Bluetooth", None), &categorizer, &repo).unwrap();
        assert_eq!(slug_of(&repo, &fone).as_deref(), Some("eletronicos"));
        assert_eq!(fone.status, ProductStatus::Pending);

        // 50% off and no keyword match.
        let kit = create_manual_product(form("Kit presente", None), &categorizer, &repo).unwrap();
        assert_eq!(slug_of(&repo, &kit).as_deref(), Some("oferta-do-dia"));

        let explicit =
            create_manual_product(form("Fone Bluetooth", Some("casa")), &categorizer, &repo)
                .unwrap();
        assert_eq!(slug_of(&repo, &explicit).as_deref(), Some("casa"));

        let err = create_manual_product(form("Fone", Some("inexistente")), &categorizer, &repo)
            .unwrap_err();
        assert!(matches!(err, ServiceError::Form(_)));
    }

    #[test]
    fn moderation_flow() {
        let repo = seeded();
        let product =
            create_manual_product(form("Bíblia de Estudo", None), &Categorizer::default(), &repo)
                .unwrap();
        let id = product.id.get();

        let approved = approve_product(id, &repo).unwrap();
        assert_eq!(approved.status, ProductStatus::Approved);
        assert!(approved.approved_at.is_some());

        let (total, listed) = list_products(Some("approved"), Some("catolicos"), 1, &repo).unwrap();
        assert_eq!(total, 1);
        assert_eq!(listed[0].id, product.id);

        let cleared = set_product_category(id, None, &repo).unwrap();
        assert_eq!(cleared.category_id, None);

        reject_product(id, &repo).unwrap();
        assert_eq!(get_product(id, &repo).unwrap_err(), ServiceError::NotFound);
        assert_eq!(reject_product(id, &repo).unwrap_err(), ServiceError::NotFound);
    }

    #[test]
    fn unknown_status_filter_is_rejected() {
        let repo = seeded();
        let err = list_products(Some("archived"), None, 1, &repo).unwrap_err();
        assert!(matches!(err, ServiceError::TypeConstraint(_)));
    }

    #[test]
    fn preview_renders_stored_product() {
        let repo = seeded();
        let product =
            create_manual_product(form("Cadeira gamer", None), &Categorizer::default(), &repo)
                .unwrap();
        let text = preview_message(product.id.get(), &ComposeOptions::default(), &repo).unwrap();
        assert!(text.contains("💰 De: R$ 99,90 por R$ 49,90"));
        assert!(text.contains("🏷️ 50% OFF"));
        assert!(text.ends_with("👉 https://www.mercadolivre.com.br/p/MLB123"));

        let urgent =
            preview_urgent_message(product.id.get(), &ComposeOptions::default(), &repo).unwrap();
        assert!(urgent.starts_with("🔥 OFERTA DO DIA 🔥\n"));
        assert_eq!(
            preview_urgent_message(999, &ComposeOptions::default(), &repo).unwrap_err(),
            ServiceError::NotFound
        );
    }
}
