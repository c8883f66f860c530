pub mod books;
pub mod health;
pub mod recommendations;

pub use books::get_book;
pub use health::health_check;
pub use recommendations::recommendations_config;
