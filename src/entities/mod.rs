pub mod daily_sales;
pub mod products;
pub mod promo_events;
pub mod sales_transactions;
