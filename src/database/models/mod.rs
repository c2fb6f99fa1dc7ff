pub mod audit;
pub mod comment;
pub mod notification;
pub mod page;
pub mod profile;
pub mod team;
pub mod ticket;

pub use audit::{AuditLogEntry, AuditQuery};
pub use comment::{Comment, CommentQuery};
pub use notification::{Notification, NotificationQuery};
pub use page::{Page, PageRequest, Pagination};
pub use profile::{Profile, ProfilePatch, ProfileQuery};
pub use team::Team;
pub use ticket::{Location, Ticket, TicketPatch, TicketQuery};
