//! API handlers for the Unifind identity service.

pub mod health;
pub mod otp;
