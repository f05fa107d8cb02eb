pub mod balance;
pub mod calculations;
pub mod eta;
pub mod service;
pub mod tasks;

pub use eta::EtaEngine;
pub use service::PileService;
pub use tasks::TaskEngine;
