pub mod executor;
pub mod factory;
pub mod providers;
pub mod services;
