//! Basic example of the Anbar DI container.

use std::sync::Arc;

use anbar::Injectable;
use anbar::prelude::*;

// === Define your traits and types ===

pub trait Logger: Send + Sync {
    fn log(&self, msg: &str);
}

#[derive(Injectable)]
pub struct ConsoleLogger {
    #[inject(value = "LOG")]
    pub prefix: String,
}

impl Logger for ConsoleLogger {
    fn log(&self, msg: &str) {
        println!("[{}] {msg}", self.prefix);
    }
}

#[derive(Injectable)]
pub struct AuditLogger {
    #[inject(value = "AUDIT")]
    pub prefix: String,
}

impl Logger for AuditLogger {
    fn log(&self, msg: &str) {
        println!("[{}] {msg}", self.prefix);
    }
}

implements!(ConsoleLogger, AuditLogger => dyn Logger);

#[derive(Injectable)]
pub struct Config {
    #[inject(value = "postgres://localhost/myapp")]
    pub database_url: String,
    #[inject(value = "true")]
    pub debug: bool,
}

pub struct Database {
    url: String,
    logger: Arc<dyn Logger>,
}

impl Database {
    fn query(&self, sql: &str) -> String {
        self.logger.log(&format!("Executing: {sql}"));
        format!("Results from {}", self.url)
    }
}

#[derive(Injectable)]
pub struct UserRepository {
    #[inject]
    pub db: Arc<Database>,
}

impl UserRepository {
    fn find_user(&self, id: u64) -> String {
        self.db.query(&format!("SELECT * FROM users WHERE id = {id}"))
    }
}

#[derive(Injectable)]
pub struct UserService {
    #[inject]
    pub repo: Arc<UserRepository>,
    #[inject(qualifier = "AuditLogger")]
    pub audit: Arc<dyn Logger>,
}

impl UserService {
    fn get_user(&self, id: u64) -> String {
        self.audit.log(&format!("Getting user {id}"));
        self.repo.find_user(id)
    }
}

fn main() -> Result<()> {
    // Initialize tracing (logging)
    tracing_subscriber::fmt()
        .with_env_filter("anbar_container=debug")
        .init();

    let mut container = Container::new();
    container
        .component::<Config>(Options::default())?
        .component::<ConsoleLogger>(Options::default())?
        .component::<AuditLogger>(Options::default())?
        .binding(Binding::<dyn Logger>::to::<ConsoleLogger>().or::<AuditLogger>())?
        // Database is built by a factory from its resolved dependencies
        .factory(
            |config: Arc<Config>, logger: Arc<dyn Logger>| Database {
                url: config.database_url.clone(),
                logger,
            },
            Options::singleton(),
        )?
        .component::<UserRepository>(Options::default())?
        // UserService is rebuilt on every resolve
        .component::<UserService>(Options::prototype())?;
    container.finalize()?;

    println!("✅ Container finalized!");
    println!("{container:?}");

    let config = container.resolve::<Config>()?;
    println!("📋 Config: database_url={}, debug={}", config.database_url, config.debug);

    let service = container.resolve::<UserService>()?;
    println!("👤 {}", service.get_user(42));

    // A second resolve builds a new UserService around the same repository
    let service2 = container.resolve::<UserService>()?;
    println!("👤 {}", service2.get_user(7));
    println!("Same repository: {}", Arc::ptr_eq(&service.repo, &service2.repo));

    println!("\n🎉 Everything works!");
    Ok(())
}
