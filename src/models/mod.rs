pub mod stock;
pub mod company;
pub mod response;

pub use stock::*;
pub use company::*;
pub use response::*;
