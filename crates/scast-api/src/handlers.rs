//! Request handlers.

pub mod content;
pub mod generate;
pub mod health;
pub mod payments;
pub mod status;
pub mod users;

pub use content::*;
pub use generate::*;
pub use health::*;
pub use payments::*;
pub use status::*;
pub use users::*;
