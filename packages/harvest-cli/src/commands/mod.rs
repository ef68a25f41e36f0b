pub mod firms;
pub mod register;
pub mod tables;
