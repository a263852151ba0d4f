pub mod alert;
pub mod bar;
pub mod indicator;
pub mod signal;

pub use alert::*;
pub use bar::*;
pub use indicator::*;
pub use signal::*;
