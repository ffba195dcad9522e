//! Integration tests for the lead repository.

use chooseme_core::leads::{ContactPreference, LeadInput, LeadType};
use chooseme_db::models::lead::LeadFilter;
use chooseme_db::repositories::LeadRepo;
use sqlx::PgPool;

fn new_lead(lead_type: LeadType, first_name: &str) -> LeadInput {
    LeadInput {
        lead_type,
        first_name: first_name.to_string(),
        last_name: Some("Garcia".to_string()),
        phone: "555-555-5555".to_string(),
        email: None,
        contact_preference: ContactPreference::Call,
        message: None,
        stock_id: None,
        vin: None,
        vehicle_summary: None,
        preferred_date: None,
        preferred_time: None,
        details: Some(serde_json::json!({ "trade_in": true })),
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_starts_as_new(pool: PgPool) {
    let lead = LeadRepo::create(&pool, &new_lead(LeadType::TestDrive, "Maria"))
        .await
        .unwrap();
    assert_eq!(lead.status, "new");
    assert_eq!(lead.lead_type, "test_drive");
    assert_eq!(lead.contact_preference, "call");
    assert_eq!(lead.source, "choose-me-auto-website");
    assert_eq!(lead.full_name(), "Maria Garcia");
    assert_eq!(lead.details, Some(serde_json::json!({ "trade_in": true })));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn list_filters_and_stats(pool: PgPool) {
    let a = LeadRepo::create(&pool, &new_lead(LeadType::Contact, "A")).await.unwrap();
    LeadRepo::create(&pool, &new_lead(LeadType::Contact, "B")).await.unwrap();
    LeadRepo::create(&pool, &new_lead(LeadType::Hold, "C")).await.unwrap();
    LeadRepo::update_status(&pool, a.id, "contacted").await.unwrap().unwrap();

    let contacts = LeadRepo::list(
        &pool,
        &LeadFilter {
            lead_type: Some("contact".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(contacts.len(), 2);

    let fresh = LeadRepo::list(
        &pool,
        &LeadFilter {
            status: Some("new".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(fresh.len(), 2);
    assert!(fresh.iter().all(|l| l.status == "new"));

    let stats = LeadRepo::stats(&pool).await.unwrap();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.new, 2);
    assert_eq!(stats.by_type["contact"], 2);
    assert_eq!(stats.by_type["hold"], 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn invalid_status_is_rejected_by_check_constraint(pool: PgPool) {
    let lead = LeadRepo::create(&pool, &new_lead(LeadType::Contact, "A")).await.unwrap();
    assert!(LeadRepo::update_status(&pool, lead.id, "archived").await.is_err());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn delete_removes_row(pool: PgPool) {
    let lead = LeadRepo::create(&pool, &new_lead(LeadType::Contact, "A")).await.unwrap();
    assert!(LeadRepo::delete(&pool, lead.id).await.unwrap());
    assert!(LeadRepo::find_by_id(&pool, lead.id).await.unwrap().is_none());
    assert!(LeadRepo::update_status(&pool, lead.id, "lost").await.unwrap().is_none());
}
