pub mod checkout;
pub mod premium;
pub mod subscription;
