pub mod event;
pub mod log;
pub mod proxy;
pub mod settings;

pub use event::*;
pub use log::*;
pub use proxy::*;
pub use settings::*;
