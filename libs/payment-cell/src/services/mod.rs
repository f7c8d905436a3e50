pub mod gateway;

pub use gateway::{PaymentGatewayClient, PaymentInitiator};
