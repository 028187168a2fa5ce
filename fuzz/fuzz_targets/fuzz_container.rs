#![no_main]

//! Fuzz target for registry and resolution operations
//!
//! Drives random sequences of bind/instance/remove/make over a small key
//! space and checks the cache and existence invariants after each step.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use service_container::{service, Container, ContainerError, Env, Invokable, Param, TypeDescriptor};
use std::sync::Arc;

const KEYS: [&str; 4] = ["leaf", "node", "abstract", "other"];

#[derive(Debug, Arbitrary)]
enum ContainerOp {
    Bind { key: u8, target: u8, singleton: bool },
    BindValue { key: u8, value: u32 },
    Instance { key: u8, value: u32 },
    Remove { key: u8 },
    Make { key: u8 },
    MakeSingleton { key: u8 },
    MakeWithEnv { key: u8, value: u32 },
    Bound { key: u8 },
    Clear,
}

fn key(index: u8) -> &'static str {
    KEYS[index as usize % KEYS.len()]
}

fn fixture() -> Container {
    let container = Container::new();
    container
        .register_type(TypeDescriptor::new("leaf").bare(|| 0_u32))
        .register_type(TypeDescriptor::new("node").constructor(
            vec![
                Param::class("leaf", "leaf"),
                Param::value("bonus").with_default(1_u32),
            ],
            |args| Ok(args.get::<u32>(0)?.wrapping_add(args.value::<u32>(1)?)),
        ))
        .register_type(TypeDescriptor::abstract_type("abstract"));
    container
}

fuzz_target!(|ops: Vec<ContainerOp>| {
    let container = fixture();

    for op in ops {
        match op {
            ContainerOp::Bind { key: k, target, singleton } => {
                container.bind(key(k), key(target), singleton);
            }
            ContainerOp::BindValue { key: k, value } => {
                container.set(key(k), service(value));
            }
            ContainerOp::Instance { key: k, value } => {
                let value = service(value);
                container.instance(key(k), Arc::clone(&value));
                // Cached instances always win
                let made = container.make(key(k)).expect("instance must resolve");
                assert!(Arc::ptr_eq(&made, &value));
            }
            ContainerOp::Remove { key: k } => {
                container.remove(key(k));
                assert!(!container.bound(key(k)));
                assert!(!container.exists(key(k)));
            }
            ContainerOp::Make { key: k } => match container.make(key(k)) {
                Ok(_) => {}
                Err(ContainerError::Uninstantiable { .. })
                | Err(ContainerError::UnknownType { .. })
                | Err(ContainerError::CyclicDependency { .. }) => {}
                Err(other) => panic!("unexpected error: {other}"),
            },
            ContainerOp::MakeSingleton { key: k } => {
                if let Ok(first) = container.make_singleton(key(k)) {
                    let second = container.make(key(k)).expect("cached singleton must resolve");
                    assert!(Arc::ptr_eq(&first, &second));
                }
            }
            ContainerOp::MakeWithEnv { key: k, value } => {
                let env = Env::new().with("leaf", value);
                let cached = match (container.make(key(k)), container.make(key(k))) {
                    (Ok(a), Ok(b)) if Arc::ptr_eq(&a, &b) => Some(a),
                    _ => None,
                };
                let _ = container.make_with(key(k), &env);
                // Overrides never replace a cached instance
                if let Some(cached) = cached {
                    let again = container.make(key(k)).expect("cached key must resolve");
                    assert!(Arc::ptr_eq(&cached, &again));
                }
            }
            ContainerOp::Bound { key: k } => {
                if container.exists(key(k)) {
                    assert!(container.bound(key(k)));
                }
            }
            ContainerOp::Clear => {
                container.clear();
                assert!(container.is_empty());
            }
        }
    }
});
