//! Account management module.
//!
//! Registration, credential verification and account lookup.

mod models;
mod repository;
mod service;
mod store;

pub use models::{NewAccount, RegisterRequest, User, UserInfo};
pub use repository::UserRepository;
pub use service::UserService;
pub use store::AccountStore;
