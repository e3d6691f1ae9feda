use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use anbar::{
    Binding, ComponentId, ConfigError, Container, Injectable, Options, Provider, ResolveError,
    Scope, Settings, SingletonState, implements,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

#[derive(Injectable)]
pub struct FixedClock {
    #[inject(value = "1700000000")]
    pub epoch: u64,
}

impl Clock for FixedClock {
    fn now(&self) -> u64 {
        self.epoch
    }
}

implements!(FixedClock => dyn Clock);

#[derive(Injectable)]
pub struct Session {
    #[inject]
    pub clock: Arc<dyn Clock>,
    pub requests: AtomicUsize,
}

#[test]
fn prototype_state_is_not_shared() {
    init_tracing();
    let mut container = Container::new();
    container
        .component::<FixedClock>(Options::default())
        .unwrap()
        .component::<Session>(Options::prototype())
        .unwrap()
        .binding(Binding::<dyn Clock>::to::<FixedClock>())
        .unwrap();
    container.finalize().unwrap();

    let first = container.resolve::<Session>().unwrap();
    first.requests.fetch_add(3, Ordering::SeqCst);
    let second = container.resolve::<Session>().unwrap();

    assert_eq!(second.requests.load(Ordering::SeqCst), 0);
    assert_eq!(first.clock.now(), 1_700_000_000);
    assert!(Arc::ptr_eq(&first.clock, &second.clock));
}

#[derive(Injectable)]
pub struct Request {
    #[inject]
    pub session: Arc<Session>,
}

#[test]
fn prototype_subtree_is_built_per_resolve() {
    init_tracing();
    let mut container = Container::new();
    container
        .component::<FixedClock>(Options::default())
        .unwrap()
        .component::<Session>(Options::prototype())
        .unwrap()
        .component::<Request>(Options::prototype())
        .unwrap()
        .binding(Binding::<dyn Clock>::to::<FixedClock>())
        .unwrap();
    container.finalize().unwrap();

    let first = container.resolve::<Request>().unwrap();
    let second = container.resolve::<Request>().unwrap();

    assert!(!Arc::ptr_eq(&first, &second));
    assert!(!Arc::ptr_eq(&first.session, &second.session));
    // The singleton at the bottom of both subtrees is shared.
    assert!(Arc::ptr_eq(&first.session.clock, &second.session.clock));
    assert_eq!(container.singleton_state(&ComponentId::of::<Session>()), None);
}

#[test]
fn singleton_state_moves_to_built() {
    init_tracing();
    let mut container = Container::new();
    container.component::<FixedClock>(Options::default()).unwrap();
    let id = ComponentId::of::<FixedClock>();
    assert_eq!(container.singleton_state(&id), None);

    container.finalize().unwrap();
    assert_eq!(container.singleton_state(&id), Some(SingletonState::Unbuilt));

    container.resolve::<FixedClock>().unwrap();
    assert_eq!(container.singleton_state(&id), Some(SingletonState::Built));
}

#[test]
fn concurrent_resolves_share_one_singleton() {
    static BUILDS: AtomicUsize = AtomicUsize::new(0);
    const THREADS: usize = 16;

    pub struct Pool {
        pub size: usize,
    }

    #[derive(Injectable)]
    pub struct Handler {
        #[inject]
        pub pool: Arc<Pool>,
    }

    init_tracing();
    let mut container = Container::new();
    container
        .factory(
            || {
                BUILDS.fetch_add(1, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(10));
                Pool { size: 4 }
            },
            Options::singleton(),
        )
        .unwrap()
        .component::<Handler>(Options::prototype())
        .unwrap();
    container.finalize().unwrap();

    let barrier = Barrier::new(THREADS);
    let handlers: Vec<Arc<Handler>> = thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    container.resolve::<Handler>().unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(BUILDS.load(Ordering::SeqCst), 1);
    assert!(handlers.iter().all(|h| Arc::ptr_eq(&h.pool, &handlers[0].pool)));
    assert!(!Arc::ptr_eq(&handlers[0], &handlers[1]));
    assert_eq!(handlers[0].pool.size, 4);
}

#[derive(Debug, thiserror::Error)]
#[error("connection refused")]
pub struct Refused;

pub struct Connection;

#[test]
fn failed_factory_is_reported_and_retried() {
    static ATTEMPTS: AtomicUsize = AtomicUsize::new(0);

    init_tracing();
    let mut container = Container::new();
    container
        .try_factory(
            || {
                if ATTEMPTS.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(Refused)
                } else {
                    Ok(Connection)
                }
            },
            Options::singleton(),
        )
        .unwrap();
    container.finalize().unwrap();

    match container.resolve::<Connection>() {
        Err(ResolveError::Factory { component, source }) => {
            assert_eq!(component, ComponentId::of::<Connection>());
            assert_eq!(source.to_string(), "connection refused");
        }
        Err(other) => panic!("Expected Factory, got: {other:?}"),
        Ok(_) => panic!("Expected Factory, got a connection"),
    }
    assert_eq!(
        container.singleton_state(&ComponentId::of::<Connection>()),
        Some(SingletonState::Unbuilt)
    );

    let first = container.resolve::<Connection>().unwrap();
    let second = container.resolve::<Connection>().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(ATTEMPTS.load(Ordering::SeqCst), 2);
}

#[test]
fn settings_from_json_set_default_scope() {
    init_tracing();
    let settings: Settings = serde_json::from_str(r#"{ "default-scope": "prototype" }"#).unwrap();
    let mut container = Container::with_settings(settings);
    container.component::<FixedClock>(Options::default()).unwrap();
    container.finalize().unwrap();

    let described = container.describe(&ComponentId::of::<FixedClock>()).unwrap();
    assert_eq!(described.scope(), Scope::Prototype);
    let a = container.resolve::<FixedClock>().unwrap();
    let b = container.resolve::<FixedClock>().unwrap();
    assert!(!Arc::ptr_eq(&a, &b));
}

struct ClockProvider;

impl Provider for ClockProvider {
    fn register(&self, container: &mut Container) -> Result<(), ConfigError> {
        container
            .component::<FixedClock>(Options::default())?
            .binding(Binding::<dyn Clock>::to::<FixedClock>())?;
        Ok(())
    }

    fn name(&self) -> &str {
        "clock"
    }
}

#[test]
fn providers_compose_into_one_container() -> anbar::Result<()> {
    init_tracing();
    let mut container = Container::new();
    container
        .install(&ClockProvider)?
        .component::<Session>(Options::default())?;
    container.finalize()?;

    let session = container.resolve::<Session>()?;
    assert_eq!(session.clock.now(), container.resolve_interface::<dyn Clock>()?.now());
    Ok(())
}
