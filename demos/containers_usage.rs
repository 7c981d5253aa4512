//! Container Usage Examples
//!
//! This example wires the four containers into a toy request dispatcher:
//! workers pull jobs from a blocking queue, memoize lookups in an expiring
//! cache, track sessions in a dual-key map and register themselves in a list.
//!
//! Run with: RUST_LOG=debug cargo run --example containers_usage

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use threaded_collections::config::ExpiringCacheConfig;
use threaded_collections::metrics::ContainerMetrics;
use threaded_collections::{BlockingQueue, DualKeyMap, Error, ExpiringCache, RwList};

#[derive(Debug, Clone)]
enum Job {
    Lookup { session: String, user_id: u32 },
    Logout { user_id: u32 },
}

struct Dispatcher {
    jobs: BlockingQueue<Job>,
    profiles: ExpiringCache<u32, String>,
    sessions: DualKeyMap<String, u32, Instant>,
    workers: RwList<String>,
}

fn slow_profile_lookup(user_id: u32) -> String {
    thread::sleep(Duration::from_millis(20));
    format!("profile-of-{user_id}")
}

fn worker(name: String, dispatcher: Arc<Dispatcher>) {
    if dispatcher.workers.add_if_absent(name.clone()).is_err() {
        println!("{name}: already registered");
        return;
    }

    loop {
        match dispatcher.jobs.dequeue_with_timeout(Duration::from_millis(200)) {
            Ok(Job::Lookup { session, user_id }) => {
                let profile = dispatcher.profiles.get_or_insert_with(
                    user_id,
                    Duration::from_millis(300),
                    || slow_profile_lookup(user_id),
                );
                match dispatcher.sessions.insert(session.clone(), user_id, Instant::now()) {
                    Ok(()) => println!("{name}: {session} -> {profile}"),
                    Err(err) => println!("{name}: {session} rejected: {err}"),
                }
            }
            Ok(Job::Logout { user_id }) => {
                if let Some((session, _)) = dispatcher.sessions.remove_by_key2(&user_id) {
                    println!("{name}: user {user_id} logged out of {session}");
                }
            }
            Err(Error::Timeout) => continue,
            Err(_) => break,
        }
    }

    dispatcher.workers.remove(&name);
    println!("{name}: stopped");
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("Container Usage Examples");
    println!("========================\n");

    let dispatcher = Arc::new(Dispatcher {
        jobs: BlockingQueue::new(),
        profiles: ExpiringCache::init(ExpiringCacheConfig {
            default_ttl: Duration::from_millis(300),
            sweep_interval: Some(Duration::from_millis(100)),
            ..ExpiringCacheConfig::default()
        }),
        sessions: DualKeyMap::new(),
        workers: RwList::new(),
    });

    let handles: Vec<_> = (0..3)
        .map(|i| {
            let dispatcher = Arc::clone(&dispatcher);
            thread::spawn(move || worker(format!("worker-{i}"), dispatcher))
        })
        .collect();

    for user_id in [1, 2, 1, 3, 2, 1] {
        dispatcher.jobs.enqueue(Job::Lookup {
            session: format!("sess-{user_id}"),
            user_id,
        });
    }
    // Same user, second session: breaks the one-session-per-user pairing.
    dispatcher.jobs.enqueue(Job::Lookup {
        session: "sess-1b".to_string(),
        user_id: 1,
    });
    dispatcher.jobs.enqueue(Job::Logout { user_id: 2 });

    thread::sleep(Duration::from_millis(300));
    println!("\nregistered workers: {:?}", dispatcher.workers);
    println!("active sessions: {:?}", dispatcher.sessions.snapshot_by_key1().keys().collect::<Vec<_>>());

    // Let the profile cache expire and be swept.
    thread::sleep(Duration::from_millis(500));
    println!("cached profiles after expiry: {}", dispatcher.profiles.len());

    dispatcher.jobs.close();
    for handle in handles {
        let _ = handle.join();
    }

    println!("\n{} metrics:", dispatcher.profiles.container_name());
    for (name, value) in dispatcher.profiles.metrics() {
        println!("  {name:>15}: {value}");
    }
    println!("{} metrics:", dispatcher.jobs.container_name());
    for (name, value) in dispatcher.jobs.metrics() {
        println!("  {name:>15}: {value}");
    }
}
