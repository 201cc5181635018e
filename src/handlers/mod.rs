// handlers/mod.rs - route handlers
//
// resource: registry-driven CRUD shared by every table
// auth:     login (public) and the role-gated admin route
// system:   banner, health, fallback

pub mod auth;
pub mod resource;
pub mod system;
