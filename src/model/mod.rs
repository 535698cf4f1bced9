pub mod developer;
pub mod page;
pub mod release;
pub mod repository;

pub use developer::*;
pub use page::*;
pub use release::*;
pub use repository::*;
