// handlers/elevated/mod.rs - Admin handlers (clearance required)
//
// Every handler here takes an `AdminUser`: the caller must hold a valid
// session and a profile whose clearance meets `security.admin_clearance`.
// Nothing is read or written before that check passes.
//
// Route Prefix: /api/admin/* and /api/profile/:user_id
//
// Every mutation writes its audit entries through the same unit of work as
// the change itself.

pub mod audit_logs; // Audit trail browsing
pub mod bulk; // Bulk status and team assignment
pub mod profiles; // Admin edit of another user's profile
pub mod users; // Single-user administration
