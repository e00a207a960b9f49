// Payment processor adapters

pub mod mock;
pub mod stripe;

pub use mock::MockPaymentProcessor;
pub use stripe::StripePaymentProcessor;
