//! Demo data seeder - populates the database with a believable minimart.
//!
//! Run with: cargo run --bin seed-demo
//!
//! This creates:
//! - a small sari-sari catalog (sodas, snacks, canned goods, household)
//! - ~90 days of daily sales history with weekend and event uplift
//! - a handful of scheduled promo events (one running right now)
//! - today's raw till transactions, so the aggregate fallback has data

use chrono::{Datelike, Duration, NaiveDate, Utc, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, Set};
use tracing::info;
use uuid::Uuid;

use minimart_api::entities::{daily_sales, products, promo_events, sales_transactions};
use minimart_api::services::events::EventSource;

const HISTORY_DAYS: i64 = 90;

struct SeedProduct {
    name: &'static str,
    barcode: &'static str,
    brand: Option<&'static str>,
    category: &'static str,
    cost_price: Decimal,
    retail_price: Decimal,
    current_stock: i32,
    /// Expected units/day before uplift; 0.0 seeds a dead-stock item.
    base_velocity: f64,
}

fn catalog() -> Vec<SeedProduct> {
    vec![
        SeedProduct {
            name: "Coke Mismo 295ml",
            barcode: "544900000099",
            brand: Some("Coca-Cola"),
            category: "SODA",
            cost_price: dec!(18.00),
            retail_price: dec!(20.00),
            current_stock: 18,
            base_velocity: 9.0,
        },
        SeedProduct {
            name: "Sprite 500ml",
            barcode: "480198112005",
            brand: Some("Coca-Cola"),
            category: "SODA",
            cost_price: dec!(22.50),
            retail_price: dec!(25.00),
            current_stock: 30,
            base_velocity: 6.0,
        },
        SeedProduct {
            name: "Mountain Dew 500ml",
            barcode: "480392525114",
            brand: Some("Pepsi"),
            category: "SODA",
            cost_price: dec!(20.00),
            retail_price: dec!(22.00),
            current_stock: 4,
            base_velocity: 5.0,
        },
        SeedProduct {
            name: "Milo 22g Sachet",
            barcode: "955600121722",
            brand: Some("Nestle"),
            category: "BEVERAGES",
            cost_price: dec!(10.50),
            retail_price: dec!(12.00),
            current_stock: 60,
            base_velocity: 11.0,
        },
        SeedProduct {
            name: "Oishi Prawn Crackers 60g",
            barcode: "489120804013",
            brand: Some("Oishi"),
            category: "SNACK",
            cost_price: dec!(15.50),
            retail_price: dec!(17.60),
            current_stock: 12,
            base_velocity: 4.0,
        },
        SeedProduct {
            name: "555 Sardines in Tomato Sauce 155g",
            barcode: "748485200019",
            brand: Some("555"),
            category: "CANNED_GOODS",
            cost_price: dec!(22.00),
            retail_price: dec!(25.00),
            current_stock: 48,
            base_velocity: 7.0,
        },
        SeedProduct {
            name: "Argentina Corned Beef 260g",
            barcode: "748485800035",
            brand: Some("Argentina"),
            category: "CANNED_GOODS",
            cost_price: dec!(52.00),
            retail_price: dec!(57.50),
            current_stock: 0,
            base_velocity: 3.0,
        },
        SeedProduct {
            name: "Alaska Evaporated Milk 140ml",
            barcode: "480057511015",
            brand: Some("Alaska"),
            category: "DAIRY",
            cost_price: dec!(25.50),
            retail_price: dec!(28.20),
            current_stock: 25,
            base_velocity: 2.0,
        },
        SeedProduct {
            name: "Downy Sachet 20ml",
            barcode: "870021639476",
            brand: Some("Downy"),
            category: "HOUSEHOLD",
            cost_price: dec!(6.00),
            retail_price: dec!(7.00),
            current_stock: 90,
            base_velocity: 14.0,
        },
        SeedProduct {
            name: "Joy Dishwashing Liquid 475ml",
            barcode: "490243086729",
            brand: Some("Joy"),
            category: "HOUSEHOLD",
            cost_price: dec!(120.00),
            retail_price: dec!(134.00),
            current_stock: 8,
            base_velocity: 0.6,
        },
        // Gathers dust: stocked once, never moved.
        SeedProduct {
            name: "Party Sparklers 10s",
            barcode: "000000990017",
            brand: None,
            category: "SEASONAL",
            cost_price: dec!(30.00),
            retail_price: dec!(45.00),
            current_stock: 24,
            base_velocity: 0.0,
        },
    ]
}

struct SeedEvent {
    name: &'static str,
    source: EventSource,
    /// Days relative to today.
    start_offset: i64,
    end_offset: i64,
    multiplier: f64,
    affected_brand: Option<&'static str>,
    affected_category: Option<&'static str>,
}

fn events() -> Vec<SeedEvent> {
    vec![
        SeedEvent {
            name: "Coca-Cola Summer Push",
            source: EventSource::ManufacturerCampaign,
            start_offset: -40,
            end_offset: -26,
            multiplier: 2.5,
            affected_brand: Some("Coca-Cola"),
            affected_category: None,
        },
        SeedEvent {
            name: "Payday Sale",
            source: EventSource::StoreDiscount,
            start_offset: -2,
            end_offset: 3,
            multiplier: 2.0,
            affected_brand: None,
            affected_category: None,
        },
        SeedEvent {
            name: "Fiesta Weekend",
            source: EventSource::Holiday,
            start_offset: 9,
            end_offset: 11,
            multiplier: 3.0,
            affected_brand: None,
            affected_category: Some("SNACK"),
        },
    ]
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    info!("=== minimart-api demo seeder ===");

    let cfg = minimart_api::config::load_config()?;
    let db = minimart_api::db::establish_connection_from_app_config(&cfg).await?;
    minimart_api::db::run_migrations(&db).await?;

    // Seeded RNG so repeated runs produce the same history.
    let mut rng = StdRng::seed_from_u64(20250612);
    let today = Utc::now().date_naive();

    info!("Creating catalog...");
    let mut product_rows = Vec::new();
    for item in catalog() {
        let id = Uuid::new_v4();
        products::ActiveModel {
            id: Set(id),
            name: Set(item.name.to_string()),
            barcode: Set(Some(item.barcode.to_string())),
            brand: Set(item.brand.map(str::to_string)),
            category: Set(item.category.to_string()),
            cost_price: Set(item.cost_price),
            retail_price: Set(item.retail_price),
            current_stock: Set(item.current_stock),
            is_archived: Set(false),
            ..Default::default()
        }
        .insert(&db)
        .await?;
        product_rows.push((id, item));
    }
    info!("  {} products", product_rows.len());

    info!("Scheduling events...");
    let mut event_rows = Vec::new();
    for event in events() {
        let start = today + Duration::days(event.start_offset);
        let end = today + Duration::days(event.end_offset);
        promo_events::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(event.name.to_string()),
            source: Set(event.source.to_string()),
            start_date: Set(start),
            end_date: Set(end),
            multiplier: Set(event.multiplier),
            affected_brand: Set(event.affected_brand.map(str::to_string)),
            affected_category: Set(event.affected_category.map(str::to_string)),
            affected_product_ids: Set(None),
            ..Default::default()
        }
        .insert(&db)
        .await?;
        event_rows.push((start, end, event));
    }
    info!("  {} events", event_rows.len());

    info!("Generating {} days of sales history...", HISTORY_DAYS);
    let mut day_rows = 0usize;
    for offset in (1..=HISTORY_DAYS).rev() {
        let day = today - Duration::days(offset);
        for (product_id, item) in &product_rows {
            let units = simulate_day(&mut rng, item, day, &event_rows);
            if units == 0 {
                continue;
            }
            let revenue = item.retail_price * Decimal::from(units);
            let had_event = event_rows
                .iter()
                .any(|(start, end, _)| day >= *start && day <= *end);
            daily_sales::ActiveModel {
                product_id: Set(*product_id),
                sale_date: Set(day),
                units_sold: Set(units),
                revenue: Set(revenue),
                had_event: Set(had_event),
                ..Default::default()
            }
            .insert(&db)
            .await?;
            day_rows += 1;
        }
    }
    info!("  {} daily rollup rows", day_rows);

    info!("Ringing up today's transactions...");
    let mut till_rows = 0usize;
    for (product_id, item) in &product_rows {
        let units = simulate_day(&mut rng, item, today, &event_rows) / 2;
        for _ in 0..units.min(6) {
            let payment = if rng.gen_ratio(7, 10) { "CASH" } else { "GCASH" };
            sales_transactions::ActiveModel {
                id: Set(Uuid::new_v4()),
                product_id: Set(*product_id),
                quantity: Set(1),
                unit_price: Set(item.retail_price),
                total: Set(item.retail_price),
                status: Set(sales_transactions::STATUS_COMPLETED.to_string()),
                payment_method: Set(payment.to_string()),
                sold_at: Set(Utc::now() - chrono::Duration::minutes(rng.gen_range(5..600))),
            }
            .insert(&db)
            .await?;
            till_rows += 1;
        }
    }
    info!("  {} till lines", till_rows);

    info!("=== Seed complete ===");
    info!("Try these:");
    info!("  curl http://localhost:8080/api/v1/forecasts");
    info!("  curl http://localhost:8080/api/v1/forecasts/alerts");
    info!("  curl 'http://localhost:8080/api/v1/analytics/demand-series?window_days=30'");
    info!("  curl http://localhost:8080/api/v1/analytics/insights");
    info!("Or explore interactively at: http://localhost:8080/docs");

    Ok(())
}

/// One product-day of simulated demand: base velocity, a weekend bump,
/// Poisson-ish noise, and any overlapping event's multiplier.
fn simulate_day(
    rng: &mut StdRng,
    item: &SeedProduct,
    day: NaiveDate,
    events: &[(NaiveDate, NaiveDate, SeedEvent)],
) -> i32 {
    if item.base_velocity <= 0.0 {
        return 0;
    }

    let mut expected = item.base_velocity;
    if matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
        expected *= 1.3;
    }
    for (start, end, event) in events {
        let in_range = day >= *start && day <= *end;
        let in_scope = match (&event.affected_brand, &event.affected_category) {
            (None, None) => true,
            (brand, category) => {
                brand.as_deref() == item.brand || category.as_deref() == Some(item.category)
            }
        };
        if in_range && in_scope {
            expected *= event.multiplier;
            break;
        }
    }

    let noise = rng.gen_range(0.6..1.4);
    (expected * noise).round().max(0.0) as i32
}
