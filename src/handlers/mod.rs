// handlers/mod.rs - HTTP request handlers organized by security level
//
// public    - no authentication (banner, health)
// protected - valid session (`AuthUser`)
// elevated  - valid session plus admin clearance (`AdminUser`)

pub mod elevated;
pub mod protected;
pub mod public;
