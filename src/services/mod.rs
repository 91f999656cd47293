// Storage-facing readers consumed by the forecast engine
pub mod catalog;
pub mod events;
pub mod history;

// Forecasting core: velocity, urgency tiers, reorder, demand series, insights
pub mod forecasting;
