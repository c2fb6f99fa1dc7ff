// handlers/protected/mod.rs - Protected handlers (session required)
//
// Every handler here takes an `AuthUser`, so a missing or invalid bearer
// token is rejected with 401 before the handler body runs.
//
// Route Prefix: /api/* (tickets, comments, profile, teams, notifications)

pub mod comments; // Ticket comment threads and mention notifications
pub mod notifications; // The caller's own notifications
pub mod profile; // Self profile and avatar
pub mod teams; // Team catalogue
pub mod tickets; // Ticket list/create/show/update
