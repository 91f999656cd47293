pub mod analytics;
pub mod forecasts;
