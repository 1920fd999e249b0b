pub mod display;
pub mod logger;
pub mod message;
