//! Database seeder for Expenza development and testing.
//!
//! Seeds a test company with a full reporting chain, an approval rule
//! and flow, and an exchange rate snapshot for local development.
//!
//! Usage: cargo run --bin seeder

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use std::str::FromStr;
use uuid::Uuid;

use expenza_core::auth::hash_password;
use expenza_db::entities::{
    approval_flows, approval_rules, companies, employees, exchange_rates,
    sea_orm_active_enums::{ApproverRole, RuleKind, UserRole},
    users,
};

/// Test company ID (consistent for all seeds)
const TEST_COMPANY_ID: &str = "00000000-0000-0000-0000-000000000001";

/// Seeded users: (id, email, name, role, approver role, manager id).
///
/// Managers are listed before their reports so inserts satisfy the
/// foreign keys, and the chain bottoms out at the admin.
const TEST_USERS: &[(
    &str,
    &str,
    &str,
    UserRole,
    Option<ApproverRole>,
    Option<&str>,
)] = &[
    (
        "00000000-0000-0000-0000-000000000002",
        "admin@expenza.dev",
        "Ava Admin",
        UserRole::Admin,
        None,
        None,
    ),
    (
        "00000000-0000-0000-0000-000000000003",
        "cfo@expenza.dev",
        "Carol Chief",
        UserRole::Manager,
        Some(ApproverRole::Cfo),
        Some("00000000-0000-0000-0000-000000000002"),
    ),
    (
        "00000000-0000-0000-0000-000000000004",
        "director@expenza.dev",
        "Dan Director",
        UserRole::Manager,
        Some(ApproverRole::Director),
        Some("00000000-0000-0000-0000-000000000003"),
    ),
    (
        "00000000-0000-0000-0000-000000000005",
        "finance@expenza.dev",
        "Fiona Finance",
        UserRole::Manager,
        Some(ApproverRole::Finance),
        Some("00000000-0000-0000-0000-000000000004"),
    ),
    (
        "00000000-0000-0000-0000-000000000006",
        "manager@expenza.dev",
        "Mike Manager",
        UserRole::Manager,
        Some(ApproverRole::Manager),
        Some("00000000-0000-0000-0000-000000000005"),
    ),
    (
        "00000000-0000-0000-0000-000000000007",
        "employee@expenza.dev",
        "Eli Employee",
        UserRole::Employee,
        None,
        Some("00000000-0000-0000-0000-000000000006"),
    ),
];

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    println!("Connecting to database...");
    let db = expenza_db::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    println!("Seeding test company...");
    seed_test_company(&db).await;

    println!("Seeding test users...");
    seed_test_users(&db).await;

    println!("Seeding approval rule and flow...");
    seed_approval_config(&db).await;

    println!("Seeding exchange rates...");
    seed_exchange_rates(&db).await;

    println!("Seeding complete!");
}

fn test_company_id() -> Uuid {
    Uuid::parse_str(TEST_COMPANY_ID).unwrap()
}

/// Seeds the test company for development.
async fn seed_test_company(db: &DatabaseConnection) {
    if companies::Entity::find_by_id(test_company_id())
        .one(db)
        .await
        .ok()
        .flatten()
        .is_some()
    {
        println!("  Test company already exists, skipping...");
        return;
    }

    let company = companies::ActiveModel {
        id: Set(test_company_id()),
        name: Set("Test Company".to_string()),
        country: Set("United States".to_string()),
        currency_code: Set("USD".to_string()),
        created_at: Set(Utc::now().into()),
        updated_at: Set(Utc::now().into()),
    };

    if let Err(e) = company.insert(db).await {
        eprintln!("Failed to insert test company: {e}");
    } else {
        println!("  Created test company: Test Company (USD)");
    }
}

/// Seeds the full reporting chain: employee -> manager -> finance ->
/// director -> cfo -> admin.
async fn seed_test_users(db: &DatabaseConnection) {
    let password_hash = hash_password("password123").expect("Failed to hash seed password");

    for (id, email, name, role, approver_role, manager_id) in TEST_USERS {
        let user_id = Uuid::parse_str(id).unwrap();

        if users::Entity::find_by_id(user_id)
            .one(db)
            .await
            .ok()
            .flatten()
            .is_some()
        {
            println!("  User {email} already exists, skipping...");
            continue;
        }

        let user = users::ActiveModel {
            id: Set(user_id),
            company_id: Set(test_company_id()),
            email: Set((*email).to_string()),
            password_hash: Set(password_hash.clone()),
            name: Set((*name).to_string()),
            role: Set(*role),
            approver_role: Set(*approver_role),
            is_active: Set(true),
            created_at: Set(Utc::now().into()),
            updated_at: Set(Utc::now().into()),
        };
        if let Err(e) = user.insert(db).await {
            eprintln!("Failed to insert user {email}: {e}");
            continue;
        }

        let employee = employees::ActiveModel {
            id: Set(Uuid::new_v4()),
            company_id: Set(test_company_id()),
            user_id: Set(user_id),
            manager_id: Set(manager_id.map(|m| Uuid::parse_str(m).unwrap())),
            created_at: Set(Utc::now().into()),
            updated_at: Set(Utc::now().into()),
        };
        if let Err(e) = employee.insert(db).await {
            eprintln!("Failed to insert employee record for {email}: {e}");
        } else {
            println!("  Created user: {email}");
        }
    }
}

/// Seeds a hybrid approval rule with a three-step flow.
async fn seed_approval_config(db: &DatabaseConnection) {
    let existing = approval_rules::Entity::find().one(db).await.ok().flatten();
    if existing.is_some() {
        println!("  Approval rule already exists, skipping...");
        return;
    }

    let cfo_id = Uuid::parse_str("00000000-0000-0000-0000-000000000003").unwrap();
    let rule = approval_rules::ActiveModel {
        id: Set(Uuid::new_v4()),
        company_id: Set(test_company_id()),
        kind: Set(RuleKind::Hybrid),
        threshold: Set(Some(Decimal::from_str("0.6").unwrap())),
        specific_approver_id: Set(Some(cfo_id)),
        created_at: Set(Utc::now().into()),
        updated_at: Set(Utc::now().into()),
    };
    if let Err(e) = rule.insert(db).await {
        eprintln!("Failed to insert approval rule: {e}");
        return;
    }

    let flow = [
        (1, ApproverRole::Manager, true),
        (2, ApproverRole::Finance, false),
        (3, ApproverRole::Director, false),
    ];
    for (sequence, approver_role, is_mandatory) in flow {
        let step = approval_flows::ActiveModel {
            id: Set(Uuid::new_v4()),
            company_id: Set(test_company_id()),
            sequence: Set(sequence),
            approver_role: Set(approver_role),
            is_mandatory: Set(is_mandatory),
            created_at: Set(Utc::now().into()),
            updated_at: Set(Utc::now().into()),
        };
        if let Err(e) = step.insert(db).await {
            eprintln!("Failed to insert flow step {sequence}: {e}");
        }
    }

    println!("  Created hybrid rule (60% + CFO) with 3 flow steps");
}

/// Seeds an exchange rate snapshot quoted against USD.
async fn seed_exchange_rates(db: &DatabaseConnection) {
    let existing = exchange_rates::Entity::find().one(db).await.ok().flatten();
    if existing.is_some() {
        println!("  Exchange rates already exist, skipping...");
        return;
    }

    let today = Utc::now().date_naive();
    let rates = [
        ("EUR", "0.92"),
        ("GBP", "0.79"),
        ("JPY", "149.50"),
        ("IDR", "15750.00"),
    ];

    for (code, rate) in rates {
        let row = exchange_rates::ActiveModel {
            id: Set(Uuid::new_v4()),
            company_id: Set(test_company_id()),
            base_currency: Set("USD".to_string()),
            currency: Set(code.to_string()),
            rate: Set(Decimal::from_str(rate).unwrap()),
            effective_date: Set(today),
            created_at: Set(Utc::now().into()),
        };
        if let Err(e) = row.insert(db).await {
            eprintln!("Failed to insert rate for {code}: {e}");
        } else {
            println!("  Created rate: USD/{code} = {rate}");
        }
    }
}
