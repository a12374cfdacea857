pub mod failing;
pub mod shared;
pub mod site;

pub use failing::FailingStorage;
pub use shared::SharedSite;
pub use site::{DOMAIN, TestSite, day};
