pub mod controller;
pub mod crud;
pub mod error;
pub mod route;
pub mod schema;
