//! Repository layer for database operations

pub mod contacts;
pub mod editors;
pub mod evaluations;
pub mod journals;
pub mod messages;
pub mod papers;
pub mod users;

use sqlx::{Pool, Postgres};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub users: users::UsersRepository,
    pub journals: journals::JournalsRepository,
    pub editors: editors::EditorsRepository,
    pub papers: papers::PapersRepository,
    pub evaluations: evaluations::EvaluationsRepository,
    pub messages: messages::MessagesRepository,
    pub contacts: contacts::ContactsRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            users: users::UsersRepository::new(pool.clone()),
            journals: journals::JournalsRepository::new(pool.clone()),
            editors: editors::EditorsRepository::new(pool.clone()),
            papers: papers::PapersRepository::new(pool.clone()),
            evaluations: evaluations::EvaluationsRepository::new(pool.clone()),
            messages: messages::MessagesRepository::new(pool.clone()),
            contacts: contacts::ContactsRepository::new(pool.clone()),
            pool,
        }
    }
}
