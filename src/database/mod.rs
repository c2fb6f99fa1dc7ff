pub mod manager;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod query_builder;
pub mod repository;
pub mod rows;

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use repository::{
    AuditRepository, CommentRepository, NotificationRepository, ProfileRepository, Store, TeamRepository,
    TicketRepository, UnitOfWork,
};
