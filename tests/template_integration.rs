//! End-to-end template filling tests
//!
//! These tests drive `TemplateManager` against a seeded `MemoryStore`, the
//! same way the render endpoint does, without starting a server.

use std::collections::HashMap;

use chrono::{TimeZone, Utc};
use serde_json::json;
use uuid::Uuid;

use templator::store::{
    AttributeKind, ColumnSet, Condition, DataStore, EntityMetadata, EntityReference, FieldValue,
    MemoryStore, OptionMetadata, Query, Record, StoreSeed, UrlFormatter,
};
use templator::template::{
    scan, TemplateError, TemplateManager, TEMPLATE_ENTITY, USER_TEMPLATE_ENTITY,
};

const BASE_URL: &str = "https://crm/";

struct Crm {
    store: MemoryStore,
    deal: Record,
    account: Uuid,
    owner: Uuid,
}

/// A deal for customer "Acme" (owned by "Jane Roe") with two tasks
fn create_crm() -> Crm {
    let store = MemoryStore::new();

    store.insert_metadata(
        EntityMetadata::new("deal")
            .attribute(
                "ym_stage",
                AttributeKind::Picklist {
                    options: vec![
                        OptionMetadata { value: 1, label: "Negotiation".into() },
                        OptionMetadata { value: 2, label: "Won".into() },
                    ],
                },
            )
            .attribute("ym_close_date", AttributeKind::DateTime),
    );
    store.insert_metadata(EntityMetadata::new("account").attribute(
        "ym_site",
        AttributeKind::Text {
            format: Some("url".into()),
        },
    ));

    let owner = Uuid::new_v4();
    store.insert(Record::new("user", owner).with("name", "Jane Roe"));

    let account = Uuid::new_v4();
    store.insert(
        Record::new("account", account)
            .with("name", "Acme")
            .with("ym_site", "https://acme.test")
            .with("owner", EntityReference::new("user", owner)),
    );

    let deal = Record::new("deal", Uuid::new_v4())
        .with("name", "Acme renewal")
        .with("customer", EntityReference::new("account", account))
        .with("ym_stage", FieldValue::OptionSet(2))
        .with(
            "ym_close_date",
            FieldValue::DateTime(Utc.with_ymd_and_hms(2024, 5, 17, 9, 5, 0).unwrap()),
        );
    store.insert(deal.clone());

    for subject in ["Call", "Email"] {
        store.insert(
            Record::new("task", Uuid::new_v4())
                .with("deal_id", EntityReference::new("deal", deal.id))
                .with("ym_subject", subject),
        );
    }

    Crm {
        store,
        deal,
        account,
        owner,
    }
}

fn add_template(store: &MemoryStore, title: &str, subject: &str, body: &str) {
    store.insert(
        Record::new(TEMPLATE_ENTITY, Uuid::new_v4())
            .with("title", title)
            .with("subject", format!("<![CDATA[{}]]>", subject))
            .with("body", format!("<data><![CDATA[{}]]></data>", body)),
    );
}

fn manager<'a>(crm: &'a Crm, title: &str) -> TemplateManager<'a> {
    TemplateManager::with_template_name(&crm.store, BASE_URL, title).with_utc_offset_hours(0)
}

#[test]
fn test_hello_example() {
    let crm = create_crm();
    add_template(&crm.store, "Hello", "Hi", "Hello %;name;%");

    let email = manager(&crm, "Hello")
        .fill_template(&crm.deal.to_reference())
        .unwrap();
    assert_eq!(email.body, "Hello Acme renewal");
}

#[test]
fn test_full_deal_template() {
    let crm = create_crm();
    add_template(
        &crm.store,
        "Deal won",
        "Deal %;name;% is %;ym_stage;%",
        "<p>Customer: %;customer;% (%;customer.ym_site;%)</p>\
         <p>Account owner: %;customer.owner.name;%</p>\
         <p>Closes: %;ym_close_date;%</p>\
         <p>Tasks: %;RELATED_task-deal_id-ym_subject;%</p>\
         <p>%;RECORD_URL|Open deal;% %;REF_RECORD_URL_customer|Open account;%</p>",
    );

    let email = manager(&crm, "Deal won")
        .fill_template(&crm.deal.to_reference())
        .unwrap();

    assert_eq!(email.subject, "Deal Acme renewal is Won");
    assert!(email.body.contains("Customer: Acme (<a href='https://acme.test'>https://acme.test</a>)"));
    assert!(email.body.contains("Account owner: Jane Roe"));
    assert!(email.body.contains("Closes: 17.05.2024 09:05"));
    assert!(email.body.contains("Tasks: <ul><li>Call</li><li>Email</li></ul>"));
    assert!(email
        .body
        .contains(&format!("<a href=\"https://crm/deal/{}\">Open deal</a>", crm.deal.id)));
    assert!(email
        .body
        .contains(&format!("<a href=\"https://crm/account/{}\">Open account</a>", crm.account)));
    assert!(scan(&email.body).is_empty());
}

#[test]
fn test_unset_reference_link_left_in_place() {
    let crm = create_crm();
    add_template(&crm.store, "Owner", "s", "Owner: %;REF_RECORD_URL_owner|Owner;%");

    let email = manager(&crm, "Owner")
        .fill_template(&crm.deal.to_reference())
        .unwrap();
    assert_eq!(email.body, "Owner: %;REF_RECORD_URL_owner|Owner;%");
}

#[test]
fn test_missing_data_renders_empty() {
    let crm = create_crm();
    add_template(
        &crm.store,
        "Gaps",
        "s",
        "[%;ym_missing;%][%;owner.name;%][%;name.first;%]",
    );

    let email = manager(&crm, "Gaps")
        .fill_template(&crm.deal.to_reference())
        .unwrap();
    assert_eq!(email.body, "[][][]");
}

#[test]
fn test_related_override_filter() {
    let crm = create_crm();
    add_template(&crm.store, "Tasks", "s", "%;RELATED_task-deal_id-ym_subject;%");

    let mut manager = manager(&crm, "Tasks");
    manager.add_filter(
        "task-deal_id",
        Query::new("task")
            .condition(Condition::equal("deal_id", FieldValue::Id(crm.deal.id)))
            .condition(Condition::equal("ym_subject", "Email")),
    );

    let email = manager.fill_template(&crm.deal.to_reference()).unwrap();
    assert_eq!(email.body, "<ul><li>Email</li></ul>");
}

#[test]
fn test_extra_substitutions() {
    let crm = create_crm();
    add_template(&crm.store, "Ticket", "[&;ticket;&] %;name;%", "Ref &amp;;ticket;&amp;");

    let mut subs = HashMap::new();
    subs.insert("ticket".to_string(), "T-42".to_string());

    let email = manager(&crm, "Ticket")
        .fill_template_with(&crm.deal.to_reference(), &subs)
        .unwrap();
    assert_eq!(email.subject, "[T-42] Acme renewal");
    assert_eq!(email.body, "Ref T-42");
}

#[test]
fn test_user_template() {
    let crm = create_crm();
    let template_id = Uuid::new_v4();
    crm.store.insert(
        Record::new(USER_TEMPLATE_ENTITY, template_id)
            .with("ym_clean_subject", "About &quot;%;name;%&quot;")
            .with("ym_clean_template", "Owner %;customer.owner.name;%"),
    );

    let mut manager = TemplateManager::with_user_template(&crm.store, BASE_URL, template_id);
    let email = manager.fill_template(&crm.deal.to_reference()).unwrap();
    assert_eq!(email.subject, "About 'Acme renewal'");
    assert_eq!(email.body, "Owner Jane Roe");

    let raw = manager.fill_raw_template().unwrap();
    assert_eq!(raw.body, "Owner %;customer.owner.name;%");
}

#[test]
fn test_template_load_failures() {
    let crm = create_crm();
    add_template(&crm.store, "Twice", "a", "a");
    add_template(&crm.store, "Twice", "b", "b");

    let err = manager(&crm, "Twice")
        .fill_template(&crm.deal.to_reference())
        .unwrap_err();
    assert!(matches!(err, TemplateError::Ambiguous { count: 2, .. }));

    let err = manager(&crm, "Nope").fill_raw_template().unwrap_err();
    assert!(matches!(err, TemplateError::NotFound(_)));
}

struct CrmUrlFormatter;

impl UrlFormatter for CrmUrlFormatter {
    fn record_url(&self, base_url: &str, entity: &str, id: Uuid) -> String {
        format!("{}main.aspx?etn={}&id={}&pagetype=entityrecord", base_url, entity, id)
    }
}

#[test]
fn test_custom_url_formatter() {
    let crm = create_crm();
    add_template(&crm.store, "Link", "s", "%;REF_RECORD_URL_owner|Owner;%");
    let account = crm
        .store
        .retrieve("account", crm.account, &ColumnSet::All)
        .unwrap();

    let mut manager = TemplateManager::with_template_name(&crm.store, BASE_URL, "Link")
        .with_url_formatter(&CrmUrlFormatter);
    let email = manager.fill_template(&account.to_reference()).unwrap();
    assert_eq!(
        email.body,
        format!(
            " <a href=\"https://crm/main.aspx?etn=user&id={}&pagetype=entityrecord\">Owner</a> ",
            crm.owner
        )
    );
}

#[test]
fn test_seeded_store_round_trip() {
    let deal = Uuid::new_v4();
    let seed: StoreSeed = serde_json::from_value(json!({
        "records": [
            {"entity": "template", "id": Uuid::new_v4(), "fields": {
                "title": {"type": "text", "value": "Seeded"},
                "subject": {"type": "text", "value": "<![CDATA[%;ym_stage;%]]>"},
                "body": {"type": "text", "value": "<![CDATA[%;name;%]]>"}
            }},
            {"entity": "deal", "id": deal, "fields": {
                "name": {"type": "text", "value": "Seed deal"},
                "ym_stage": {"type": "option_set", "value": 1}
            }}
        ],
        "metadata": [
            {"entity": "deal", "attributes": [
                {"name": "ym_stage", "kind": "picklist", "options": [{"value": 1, "label": "Open"}]}
            ]}
        ]
    }))
    .unwrap();
    let store = MemoryStore::from_seed(seed);

    let mut manager = TemplateManager::with_template_name(&store, BASE_URL, "Seeded");
    let email = manager
        .fill_template(&EntityReference::new("deal", deal))
        .unwrap();
    assert_eq!(email.subject, "Open");
    assert_eq!(email.body, "Seed deal");
}
