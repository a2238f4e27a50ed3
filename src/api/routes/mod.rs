pub mod capture;
pub mod history;
pub mod settings;
