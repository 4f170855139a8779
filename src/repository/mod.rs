//! Repositories sit between the handlers and the stores: they own the
//! fallback chain for questions and the read-modify-write for users.

pub mod question;
pub mod user;

pub use question::QuestionRepository;
pub use user::UserRepository;
