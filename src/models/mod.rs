pub mod asset;
pub mod chat;
pub mod news;
pub mod response;
pub mod signal;
pub mod stock;

pub use asset::*;
pub use chat::*;
pub use news::*;
pub use response::*;
pub use signal::*;
pub use stock::*;
