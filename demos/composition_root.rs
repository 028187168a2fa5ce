//! A small composition root wired through the container
//!
//! Run with:
//!   cargo run --example composition_root

use service_container::{
    service, type_key, Container, ContainerError, Describe, Env, Invokable, MethodTarget, Param,
    TypeDescriptor,
};
use std::sync::Arc;

#[derive(Debug, Clone)]
struct Config {
    dsn: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dsn: "postgres://localhost/app".into(),
        }
    }
}

impl Describe for Config {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::of::<Config>()
    }
}

struct Database {
    config: Arc<Config>,
    pool_size: usize,
}

impl Describe for Database {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::new(type_key::<Database>()).constructor(
            vec![
                Param::of::<Config>("config"),
                Param::value("pool_size").with_default(8_usize),
            ],
            |args| {
                Ok(Database {
                    config: args.get::<Config>(0)?,
                    pool_size: args.value::<usize>(1)?,
                })
            },
        )
    }
}

struct UserRepository {
    db: Arc<Database>,
}

impl UserRepository {
    fn describe_self(&self, table: &str) -> String {
        format!(
            "users in {} on {} (pool {})",
            table, self.db.config.dsn, self.db.pool_size
        )
    }
}

impl Describe for UserRepository {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::new(type_key::<UserRepository>())
            .constructor(vec![Param::of::<Database>("db")], |args| {
                Ok(UserRepository {
                    db: args.get::<Database>(0)?,
                })
            })
            .method(
                "summary",
                vec![Param::value("table").with_default("users".to_string())],
                |this: &UserRepository, args| Ok(this.describe_self(&args.value::<String>(0)?)),
            )
    }
}

fn main() -> Result<(), ContainerError> {
    #[cfg(feature = "logging-pretty")]
    service_container::logging::init();

    let container = Container::new();
    container
        .register::<Config>()
        .register::<Database>()
        .register::<UserRepository>();

    // One shared repository for the whole app
    container.single("users", type_key::<UserRepository>());
    let a = container.make("users")?;
    let b = container.make("users")?;
    println!("singleton shared: {}", Arc::ptr_eq(&a, &b));

    // Invoke a method on a freshly built receiver
    let summary = container.call_method(type_key::<UserRepository>(), "summary")?;
    println!("{}", summary.downcast_ref::<String>().map(String::as_str).unwrap_or("?"));

    // Inject a test config deep in the graph for a single call
    let env = Env::new().with(
        type_key::<Config>(),
        Config {
            dsn: "sqlite::memory:".into(),
        },
    );
    let test_repo = container.make_with(type_key::<UserRepository>(), &env)?;
    let summary = container.call_method(
        MethodTarget::instance(type_key::<UserRepository>(), test_repo),
        "summary",
    )?;
    println!("{}", summary.downcast_ref::<String>().map(String::as_str).unwrap_or("?"));

    // A plain value behind the map facade
    container.set("app.name", service("demo".to_string()));
    println!("exists: {}", container.exists("app.name"));

    // A factory with its own declared parameters
    let banner = Invokable::new(vec![Param::of::<Config>("config")], |args| {
        Ok(format!("connecting to {}", args.get::<Config>(0)?.dsn))
    });
    let line = container.call_function(&banner)?;
    println!("{}", line.downcast_ref::<String>().map(String::as_str).unwrap_or("?"));

    Ok(())
}
