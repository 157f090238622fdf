use std::time::Duration;

use chrono::{TimeDelta, Utc};
use diesel::prelude::*;
use diesel::sql_types::Integer;
use rust_decimal::Decimal;

use ofertas::domain::campaign::NewCampaign;
use ofertas::domain::category::NewCategory;
use ofertas::domain::message::NewMessage;
use ofertas::domain::product::NewProduct;
use ofertas::domain::send_job::{NewSendJob, QueuedMessage, SendJobPayload};
use ofertas::domain::types::{
    AffiliateLink, CampaignName, CampaignStatus, CategoryName, CategorySlug, ExternalId,
    MessageStatus, Price, ProductSource, ProductStatus, ProductTitle, RecipientPhone,
    SendJobStatus, TargetType,
};
use ofertas::db::BUSY_TIMEOUT_MS;
use ofertas::repository::errors::RepositoryError;
use ofertas::repository::{
    CampaignReader, CampaignWriter, CategoryReader, CategoryWriter, DieselRepository,
    MessageReader, MessageWriter, ProductListQuery, ProductReader, ProductWriter, SendQueue,
};

mod common;

fn new_product(external_id: &str, title: &str) -> NewProduct {
    NewProduct {
        category_id: None,
        external_id: Some(ExternalId::new(external_id).expect("valid external id")),
        source: ProductSource::Amazon,
        title: ProductTitle::new(title).expect("valid title"),
        price: Price::new(Decimal::new(19990, 2)).expect("valid price"),
        previous_price: None,
        discount_pct: None,
        image_url: None,
        installments: None,
        affiliate_link: AffiliateLink::new(format!(
            "https://www.amazon.com.br/dp/{external_id}"
        ))
        .expect("valid link"),
        raw_url: None,
    }
}

fn new_category(slug: &str, name: &str, position: i32) -> NewCategory {
    NewCategory {
        slug: CategorySlug::new(slug).expect("valid slug"),
        name: CategoryName::new(name).expect("valid name"),
        keywords: vec!["fone".to_string()],
        position,
        is_active: true,
    }
}

fn new_campaign(product_ids: Vec<ofertas::domain::types::ProductId>) -> NewCampaign {
    NewCampaign {
        name: CampaignName::new("Ofertas da manhã").expect("valid name"),
        product_ids,
        target_type: TargetType::List,
        target_ref: None,
        scheduled_at: None,
    }
}

#[test]
fn duplicate_marketplace_id_is_a_conflict() {
    let test_db = common::TestDb::new();
    let repo = DieselRepository::new(test_db.pool());

    let stored = repo
        .create_product(&new_product("B0ABCDEFGH", "Fone Bluetooth"))
        .expect("should create product");
    assert_eq!(stored.status, ProductStatus::Pending);
    assert_eq!(stored.price.get(), Decimal::new(19990, 2));

    let err = repo
        .create_product(&new_product("B0ABCDEFGH", "Fone Bluetooth v2"))
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict(_)));

    let mut manual = new_product("B0ABCDEFGH", "Mesmo id, outra origem");
    manual.source = ProductSource::Manual;
    repo.create_product(&manual)
        .expect("same id from another source is allowed");
}

#[test]
fn products_without_external_id_never_conflict() {
    let test_db = common::TestDb::new();
    let repo = DieselRepository::new(test_db.pool());

    for title in ["Primeiro", "Segundo"] {
        let mut product = new_product("unused", title);
        product.external_id = None;
        repo.create_product(&product)
            .expect("null external ids are distinct");
    }

    let (total, _) = repo
        .list_products(ProductListQuery::default())
        .expect("should list products");
    assert_eq!(total, 2);
}

#[test]
fn list_products_filters_and_paginates() {
    let test_db = common::TestDb::new();
    let repo = DieselRepository::new(test_db.pool());

    let mut ids = Vec::new();
    for n in 0..5 {
        let product = repo
            .create_product(&new_product(&format!("B0000000{n:02}"), &format!("Produto {n}")))
            .expect("should create product");
        ids.push(product.id);
    }
    repo.set_product_status(ids[1], ProductStatus::Approved)
        .expect("should approve");
    let approved = repo
        .set_product_status(ids[3], ProductStatus::Approved)
        .expect("should approve");
    assert!(approved.approved_at.is_some());

    let (total, items) = repo
        .list_products(ProductListQuery::default().status(ProductStatus::Approved))
        .expect("should list approved");
    assert_eq!(total, 2);
    assert_eq!(
        items.iter().map(|p| p.id).collect::<Vec<_>>(),
        vec![ids[3], ids[1]]
    );

    let (total, page) = repo
        .list_products(ProductListQuery::default().paginate(2, 2))
        .expect("should list second page");
    assert_eq!(total, 5);
    assert_eq!(
        page.iter().map(|p| p.id).collect::<Vec<_>>(),
        vec![ids[2], ids[1]]
    );
}

#[test]
fn reject_deletes_product_and_campaign_links() {
    let test_db = common::TestDb::new();
    let repo = DieselRepository::new(test_db.pool());

    let keep = repo
        .create_product(&new_product("B0KEEP0001", "Fica"))
        .expect("should create product");
    let dropped = repo
        .create_product(&new_product("B0DROP0001", "Sai"))
        .expect("should create product");
    let campaign = repo
        .create_campaign(&new_campaign(vec![dropped.id, keep.id]))
        .expect("should create campaign");

    assert_eq!(repo.delete_product(dropped.id).expect("should delete"), 1);
    assert_eq!(repo.delete_product(dropped.id).expect("second delete is a no-op"), 0);
    assert!(repo.get_product_by_id(dropped.id).expect("should query").is_none());

    let campaign = repo
        .get_campaign_by_id(campaign.id)
        .expect("should query")
        .expect("campaign should exist");
    assert_eq!(campaign.product_ids, vec![keep.id]);
}

#[test]
fn upsert_category_updates_by_slug() {
    let test_db = common::TestDb::new();
    let repo = DieselRepository::new(test_db.pool());

    repo.upsert_category(&new_category("casa", "Casa", 3))
        .expect("should insert");
    repo.upsert_category(&new_category("tech", "Tecnologia", 1))
        .expect("should insert");

    let mut renamed = new_category("casa", "Casa e Cozinha", 2);
    renamed.keywords = vec!["panela".to_string(), "air fryer".to_string()];
    let updated = repo.upsert_category(&renamed).expect("should update");
    assert_eq!(updated.name.as_str(), "Casa e Cozinha");
    assert_eq!(updated.keywords, vec!["panela", "air fryer"]);

    let mut hidden = new_category("moda", "Moda", 0);
    hidden.is_active = false;
    repo.upsert_category(&hidden).expect("should insert");

    let active = repo.list_categories(true).expect("should list");
    assert_eq!(
        active.iter().map(|c| c.slug.as_str()).collect::<Vec<_>>(),
        vec!["tech", "casa"]
    );
    assert_eq!(repo.list_categories(false).expect("should list").len(), 3);
}

#[test]
fn campaign_keeps_product_order_and_status_timestamps() {
    let test_db = common::TestDb::new();
    let repo = DieselRepository::new(test_db.pool());

    let a = repo
        .create_product(&new_product("B0AAAAAAAA", "A"))
        .expect("should create product");
    let b = repo
        .create_product(&new_product("B0BBBBBBBB", "B"))
        .expect("should create product");

    let campaign = repo
        .create_campaign(&new_campaign(vec![b.id, a.id]))
        .expect("should create campaign");
    assert_eq!(campaign.status, CampaignStatus::Draft);
    assert_eq!(campaign.product_ids, vec![b.id, a.id]);

    let sending = repo
        .set_campaign_status(campaign.id, CampaignStatus::Sending)
        .expect("should start");
    assert!(sending.started_at.is_some());
    assert!(sending.completed_at.is_none());

    let completed = repo
        .set_campaign_status(campaign.id, CampaignStatus::Completed)
        .expect("should complete");
    assert!(completed.completed_at.is_some());
    assert_eq!(repo.list_campaigns().expect("should list").len(), 1);
}

#[test]
fn send_queue_claims_due_jobs_in_order() {
    let test_db = common::TestDb::new();
    let repo = DieselRepository::new(test_db.pool());

    let product = repo
        .create_product(&new_product("B0QUEUE001", "Fila"))
        .expect("should create product");
    let campaign = repo
        .create_campaign(&new_campaign(vec![product.id]))
        .expect("should create campaign");
    let recipient = RecipientPhone::new("11987654321").expect("valid phone");

    let now = Utc::now().naive_utc();
    let mut jobs = Vec::new();
    for n in 0..3u64 {
        let message = repo
            .create_message(&NewMessage {
                campaign_id: campaign.id,
                product_id: product.id,
                recipient: recipient.clone(),
                body: format!("mensagem {n}"),
                short_link: None,
            })
            .expect("should create message");
        let job = repo
            .enqueue(
                &NewSendJob {
                    payload: SendJobPayload {
                        campaign_id: campaign.id,
                        product_id: product.id,
                        recipient: recipient.clone(),
                        body: message.body.clone(),
                        correlation_id: message.id,
                    },
                    delay: Duration::from_secs(6 * n),
                    max_attempts: 3,
                },
                now,
            )
            .expect("should enqueue");
        assert_eq!(job.delay_ms, (6000 * n) as i64);
        jobs.push(job);
    }

    let first = repo
        .claim_due(now)
        .expect("should claim")
        .expect("first job is due immediately");
    assert_eq!(first.id, jobs[0].id);
    assert_eq!(first.status, SendJobStatus::Processing);
    assert_eq!(first.attempts, 1);
    assert_eq!(first.payload.body, "mensagem 0");
    assert!(repo.claim_due(now).expect("should query").is_none());

    let later = now + TimeDelta::seconds(12);
    let second = repo.claim_due(later).expect("should claim").expect("due");
    assert_eq!(second.id, jobs[1].id);
    repo.retry(second.id, later + TimeDelta::seconds(60), "timeout")
        .expect("should retry");

    let third = repo.claim_due(later).expect("should claim").expect("due");
    assert_eq!(third.id, jobs[2].id);
    repo.complete(third.id).expect("should complete");
    assert!(repo.claim_due(later).expect("should query").is_none());

    let retried = repo
        .claim_due(later + TimeDelta::seconds(60))
        .expect("should claim")
        .expect("retry becomes due");
    assert_eq!(retried.id, jobs[1].id);
    assert_eq!(retried.attempts, 2);
    assert_eq!(retried.last_error.as_deref(), Some("timeout"));
    repo.fail(retried.id, "rejected").expect("should fail");

    // Only the first job is still in flight.
    assert_eq!(repo.requeue_in_flight().expect("should requeue"), 1);
    let recovered = repo.claim_due(now).expect("should claim").expect("requeued");
    assert_eq!(recovered.id, jobs[0].id);
    assert_eq!(recovered.attempts, 2);
}

#[test]
fn messages_settle_and_count_by_status() {
    let test_db = common::TestDb::new();
    let repo = DieselRepository::new(test_db.pool());

    let product = repo
        .create_product(&new_product("B0MSG00001", "Mensagem"))
        .expect("should create product");
    let campaign = repo
        .create_campaign(&new_campaign(vec![product.id]))
        .expect("should create campaign");

    let mut ids = Vec::new();
    for phone in ["11911111111", "11922222222", "11933333333"] {
        let message = repo
            .create_message(&NewMessage {
                campaign_id: campaign.id,
                product_id: product.id,
                recipient: RecipientPhone::new(phone).expect("valid phone"),
                body: "🔥 OFERTA DO DIA".to_string(),
                short_link: None,
            })
            .expect("should create message");
        assert_eq!(message.status, MessageStatus::Pending);
        ids.push(message.id);
    }

    let sent_at = Utc::now().naive_utc();
    repo.mark_message_sent(ids[0], Some("SM123"), sent_at)
        .expect("should mark sent");
    repo.mark_message_failed(ids[1], "invalid number")
        .expect("should mark failed");

    let count = |status| {
        repo.count_messages(campaign.id, status)
            .expect("should count")
    };
    assert_eq!(count(MessageStatus::Pending), 1);
    assert_eq!(count(MessageStatus::Sent), 1);
    assert_eq!(count(MessageStatus::Failed), 1);

    let sent = repo
        .get_message_by_id(ids[0])
        .expect("should query")
        .expect("message exists");
    assert_eq!(sent.provider_message_id.as_deref(), Some("SM123"));
    assert!(sent.sent_at.is_some());

    let listed = repo.list_messages(campaign.id).expect("should list");
    assert_eq!(listed.iter().map(|m| m.id).collect::<Vec<_>>(), ids);
    assert_eq!(listed[1].error_message.as_deref(), Some("invalid number"));
}

#[test]
fn stored_prices_round_trip_through_cents() {
    let test_db = common::TestDb::new();
    let repo = DieselRepository::new(test_db.pool());

    assert!(Price::new(Decimal::new(4, 3)).is_err());

    let mut cheap = new_product("B0CENT0001", "Parafuso");
    cheap.price = Price::new(Decimal::new(5, 3)).expect("rounds up to one cent");
    let mut odd = new_product("B0CENT0002", "Arruela");
    odd.price = Price::new(Decimal::new(19999, 3)).expect("valid price");
    odd.previous_price = Some(Price::new(Decimal::new(299999, 4)).expect("valid price"));

    let cheap = repo.create_product(&cheap).expect("should create product");
    let odd = repo.create_product(&odd).expect("should create product");
    assert_eq!(cheap.price.get(), Decimal::new(1, 2));
    assert_eq!(odd.price.get(), Decimal::new(2000, 2));
    assert_eq!(
        odd.previous_price.map(|p| p.get()),
        Some(Decimal::new(3000, 2))
    );

    let (total, items) = repo
        .list_products(ProductListQuery::default())
        .expect("every stored price reads back");
    assert_eq!(total, 2);
    assert_eq!(items.len(), 2);
}

fn queued(
    campaign: &ofertas::domain::campaign::Campaign,
    product: &ofertas::domain::product::Product,
    phone: &str,
    delay: Duration,
) -> QueuedMessage {
    QueuedMessage {
        message: NewMessage {
            campaign_id: campaign.id,
            product_id: product.id,
            recipient: RecipientPhone::new(phone).expect("valid phone"),
            body: format!("{} por {}", product.title, product.price),
            short_link: None,
        },
        delay,
        max_attempts: 3,
    }
}

#[test]
fn start_dispatch_is_all_or_nothing() {
    let test_db = common::TestDb::new();
    let repo = DieselRepository::new(test_db.pool());

    let product = repo
        .create_product(&new_product("B0DISPATCH", "Caixa de som"))
        .expect("should create product");
    let campaign = repo
        .create_campaign(&new_campaign(vec![product.id]))
        .expect("should create campaign");
    let now = Utc::now().naive_utc();

    // The second job cannot be scheduled, after the first rows were written.
    let broken = vec![
        queued(&campaign, &product, "11911111111", Duration::ZERO),
        queued(&campaign, &product, "11922222222", Duration::MAX),
    ];
    let err = repo
        .start_dispatch(campaign.id, &broken, now)
        .expect_err("unschedulable job");
    assert!(matches!(err, RepositoryError::ValidationError(_)));

    let stored = repo
        .get_campaign_by_id(campaign.id)
        .expect("should query")
        .expect("campaign exists");
    assert_eq!(stored.status, CampaignStatus::Draft);
    assert!(stored.started_at.is_none());
    assert!(repo.list_messages(campaign.id).expect("should list").is_empty());
    assert!(repo.claim_due(now).expect("should query").is_none());

    let batch = vec![
        queued(&campaign, &product, "11911111111", Duration::ZERO),
        queued(&campaign, &product, "11922222222", Duration::from_secs(6)),
    ];
    let jobs = repo
        .start_dispatch(campaign.id, &batch, now)
        .expect("should dispatch");
    let messages = repo.list_messages(campaign.id).expect("should list");
    assert_eq!(jobs.len(), 2);
    assert_eq!(messages.len(), 2);
    assert_eq!(jobs[0].payload.correlation_id, messages[0].id);
    assert_eq!(jobs[1].message_id, messages[1].id);
    assert_eq!(jobs[1].delay_ms, 6000);
    assert_eq!(jobs[1].payload.recipient.as_str(), "5511922222222");

    let stored = repo
        .get_campaign_by_id(campaign.id)
        .expect("should query")
        .expect("campaign exists");
    assert_eq!(stored.status, CampaignStatus::Sending);
    assert!(stored.started_at.is_some());

    let err = repo
        .start_dispatch(campaign.id, &batch, now)
        .expect_err("campaign already sending");
    assert!(matches!(err, RepositoryError::Conflict(_)));
    assert_eq!(repo.list_messages(campaign.id).expect("should list").len(), 2);
}

#[derive(QueryableByName)]
struct BusyTimeout {
    #[diesel(sql_type = Integer)]
    timeout: i32,
}

#[test]
fn pooled_connections_wait_on_locks() {
    let test_db = common::TestDb::new();
    let mut conn = test_db.pool().get().expect("should get connection");

    let row = diesel::sql_query("PRAGMA busy_timeout")
        .get_result::<BusyTimeout>(&mut conn)
        .expect("should read pragma");

    assert_eq!(row.timeout, BUSY_TIMEOUT_MS as i32);
}
