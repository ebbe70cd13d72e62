pub mod activate;
pub mod activation_email;
pub mod register;
pub mod resend_activation;
pub mod subscribers;
pub mod types;
