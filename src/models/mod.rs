pub mod coordinates;
pub mod dashboard;
pub mod fake_provider;
pub mod history;
pub mod openweathermap;
pub mod provider;
