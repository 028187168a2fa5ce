//! Example demonstrating logging capabilities
//!
//! Run with JSON logging (production):
//! ```bash
//! cargo run --example logging --features logging-json
//! ```
//!
//! Run with pretty logging (development):
//! ```bash
//! cargo run --example logging --features logging-pretty
//! ```

use service_container::{service, Container, Env, Invokable, Param, TypeDescriptor};

#[allow(dead_code)]
#[derive(Default)]
struct Database {
    url: String,
}

fn main() {
    // Trace-level events from the container only
    service_container::logging::init_container_only();

    println!("=== Service Container Logging Demo ===\n");

    // logs: "Creating new container"
    let container = Container::new();

    // logs: "Registering type descriptor"
    container.register_type(TypeDescriptor::new("db").bare(|| Database {
        url: "postgres://localhost/mydb".into(),
    }));
    container.register_type(TypeDescriptor::interface("cache"));

    // logs: "Registering binding"
    container.single("database", "db");

    // logs: "Registering instance"
    container.instance("version", service("1.0.0"));

    // logs: "Caching singleton instance", then "Service resolved from instance cache"
    let _ = container.make("database");
    let _ = container.make("database");

    // logs: "Type cannot be instantiated"
    let _ = container.make("cache");

    // logs: "Plain parameter has no default value"
    let needs_port = Invokable::new(vec![Param::value("port")], |args| args.value::<u16>(0));
    let _ = container.call_function(&needs_port);

    // logs: "Parameter resolved from environment override"
    let uses_cache = Invokable::erased(vec![Param::class("cache", "cache")], |args| args.service(0));
    let env = Env::new().with("cache", "in-memory".to_string());
    let _ = container.call_function_with(&uses_cache, &env);

    // logs: "Removing binding and cached instance"
    container.remove("database");

    // logs: "Container cleared"
    container.clear();

    println!("\n=== Demo Complete ===");
    println!("Tip: Use --features logging-json for production (JSON output)");
    println!("     Use --features logging-pretty for development (colorful output)");
}
