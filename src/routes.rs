mod errors;
mod health_check;
mod helpers;
mod newsletters;
mod subscriptions;

pub use errors::ApiError;
pub use health_check::*;
pub use helpers::*;
pub use newsletters::*;
pub use subscriptions::*;
