pub mod fallback;
pub mod files;
pub mod health;
