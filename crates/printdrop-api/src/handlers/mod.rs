pub mod backup;
pub mod health;
pub mod photos;
pub mod settings;
pub mod status;
