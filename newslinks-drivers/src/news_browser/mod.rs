pub mod capability;
pub mod driver;
pub mod launch;
pub mod page;
