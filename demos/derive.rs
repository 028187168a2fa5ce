//! Example demonstrating the #[derive(Constructible)] macro
//!
//! Run with:
//!   cargo run --example derive --features derive

use service_container::{Constructible, Container, Describe, Env, TypeDescriptor, type_key};
use std::sync::Arc;

#[allow(dead_code)]
struct Database {
    url: String,
}

impl Describe for Database {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::new(type_key::<Database>()).bare(|| Database {
            url: "postgres://localhost".into(),
        })
    }
}

#[allow(dead_code)]
#[derive(Default)]
struct Cache {
    size: usize,
}

impl Describe for Cache {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::of::<Cache>()
    }
}

// Service with injected dependencies
#[derive(Constructible)]
struct UserService {
    #[inject]
    db: Arc<Database>,
    #[inject]
    cache: Arc<Cache>,
    #[param(default = 30_u64)]
    timeout_secs: u64,
    // Non-injected field uses Default
    request_count: u64,
}

impl UserService {
    fn describe_self(&self) -> String {
        format!(
            "UserService on {} with cache size {} (timeout {}s, requests: {})",
            self.db.url, self.cache.size, self.timeout_secs, self.request_count
        )
    }
}

// Nested injection
#[derive(Constructible)]
struct ApiController {
    #[inject]
    users: Arc<UserService>,
    #[param(default = String::from("/api"))]
    prefix: String,
}

fn main() {
    let container = Container::new();
    container
        .register::<Database>()
        .register::<Cache>()
        .register::<UserService>()
        .register::<ApiController>();

    let api = container.make_type::<ApiController>().unwrap();
    println!("{} -> {}", api.prefix, api.users.describe_self());

    // Swap the cache for this call only
    let env = Env::new().with(type_key::<Cache>(), Cache { size: 4096 });
    let api = container
        .make_with(type_key::<ApiController>(), &env)
        .unwrap()
        .downcast::<ApiController>()
        .unwrap();
    println!("{} -> {}", api.prefix, api.users.describe_self());
}
