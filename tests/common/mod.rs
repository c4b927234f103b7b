//! Common test utilities for E2E tests
//!
//! Every backend is a SQLite file in a temporary directory, created with
//! the table layout the corresponding third-party tool uses and seeded
//! with a small, fixed data set.

#![allow(dead_code)]

pub mod schema_validator;

use axum::async_trait;
use banscomms::config::{self, DriverKind};
use banscomms::identity::{IdentityResolver, Profile};
use banscomms::{AppState, build_router};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::net::TcpListener;

pub const BASE_URL: &str = "https://bans.example.com";

// Players
pub const ALICE: &str = "76561198000000001";
pub const BOB: &str = "76561198000000002";
pub const CAROL: &str = "76561198000000003";
pub const DAVE: &str = "76561198000000004";
pub const ERIN: &str = "76561198000000005";

// Administrators. ADMIN_SHARED appears in every backend.
pub const ADMIN_ONE: &str = "76561197960265729";
pub const ADMIN_SHARED: &str = "76561197960265730";
pub const ADMIN_PISEX: &str = "76561197960265731";
pub const ADMIN_ZENITH: &str = "76561197960265732";

const IKS_SCHEMA: &[&str] = &[
    "CREATE TABLE admins (id INTEGER PRIMARY KEY, steam_id TEXT NOT NULL, name TEXT)",
    "CREATE TABLE admin_to_server (admin_id INTEGER NOT NULL, server_id INTEGER NOT NULL)",
    "CREATE TABLE bans (id INTEGER PRIMARY KEY, steam_id TEXT NOT NULL, name TEXT, reason TEXT, \
     created_at INTEGER NOT NULL, end_at INTEGER NOT NULL, duration INTEGER NOT NULL, \
     admin_id INTEGER, server_id INTEGER)",
    "CREATE TABLE comms (id INTEGER PRIMARY KEY, steam_id TEXT NOT NULL, name TEXT, reason TEXT, \
     created_at INTEGER NOT NULL, end_at INTEGER NOT NULL, duration INTEGER NOT NULL, \
     mute_type INTEGER NOT NULL, admin_id INTEGER, server_id INTEGER)",
];

const IKS_SEED: &[&str] = &[
    "INSERT INTO admins VALUES (1, '76561197960265729', 'AdminOne'), \
     (2, '76561197960265730', 'AdminShared')",
    "INSERT INTO admin_to_server VALUES (1, 1), (2, 2)",
    "INSERT INTO bans VALUES \
     (1, '76561198000000001', 'Alice', 'cheating', 1700000000, 0, 0, 1, NULL), \
     (2, '76561198000000002', 'Bob', 'toxic <b>chat</b>', 1700000100, 1700003700, 3600, 2, 1), \
     (3, '76561198000000003', 'Carol', 'wallhack', 1700000200, 1700086600, 86400, NULL, 2), \
     (4, '76561198000000001', 'Alice', 'ban evasion', 1700000300, 0, 0, 1, 2)",
    "INSERT INTO comms VALUES \
     (1, '76561198000000001', 'Alice', 'spam', 1700000000, 1700000600, 600, 0, 1, NULL), \
     (2, '76561198000000002', 'Bob', 'insults', 1700000050, 0, 0, 1, 2, 1), \
     (3, '76561198000000003', 'Carol', 'mic spam', 1700000070, 1700003670, 3600, 2, 2, 2)",
];

const PISEX_SCHEMA: &[&str] = &[
    "CREATE TABLE admins (id INTEGER PRIMARY KEY, steamid TEXT NOT NULL, name TEXT)",
    "CREATE TABLE admins_servers (admin_id INTEGER NOT NULL, server_id INTEGER NOT NULL)",
    "CREATE TABLE punishments (id INTEGER PRIMARY KEY, steamid TEXT NOT NULL, name TEXT, \
     punish_type INTEGER NOT NULL, reason TEXT, created INTEGER NOT NULL, \
     expires INTEGER NOT NULL, admin_id INTEGER, server_id INTEGER NOT NULL)",
];

const PISEX_SEED: &[&str] = &[
    "INSERT INTO admins VALUES (1, '76561197960265730', 'Shared'), \
     (2, '76561197960265731', 'PisexOnly')",
    "INSERT INTO admins_servers VALUES (1, 1), (2, 2)",
    "INSERT INTO punishments VALUES \
     (1, '76561198000000004', 'Dave', 0, 'aimbot', 1700000000, 0, 1, -1), \
     (2, '76561198000000005', 'Erin', 1, 'shouting', 1700000100, 1700000700, 2, 1), \
     (3, '76561198000000004', 'Dave', 2, 'spam', 1700000200, 1700003800, 1, 2), \
     (4, '76561198000000005', 'Erin', 0, 'griefing', 1700000300, 1700003900, 2, 2)",
];

const ZENITH_SCHEMA: &[&str] = &[
    "CREATE TABLE bans_players (id INTEGER PRIMARY KEY, steam_id TEXT NOT NULL, name TEXT)",
    "CREATE TABLE bans_player_ranks (id INTEGER PRIMARY KEY, player_id INTEGER NOT NULL, \
     server_ip TEXT NOT NULL)",
    "CREATE TABLE bans_punishments (id INTEGER PRIMARY KEY, player_id INTEGER NOT NULL, \
     admin_id INTEGER, type TEXT NOT NULL, reason TEXT, duration INTEGER NOT NULL, \
     created_at TEXT NOT NULL, expires_at TEXT, server_ip TEXT NOT NULL)",
];

const ZENITH_SEED: &[&str] = &[
    "INSERT INTO bans_players VALUES \
     (1, '76561198000000001', 'Alice'), \
     (2, '76561198000000002', 'Bob'), \
     (10, '76561197960265730', 'ZenShared'), \
     (11, '76561197960265732', 'ZenAdmin')",
    "INSERT INTO bans_player_ranks VALUES (1, 10, 'all'), (2, 11, '10.0.0.1:27015')",
    "INSERT INTO bans_punishments VALUES \
     (1, 1, 10, 'ban', 'cheating', 0, '2024-01-01 10:00:00', NULL, 'all'), \
     (2, 2, 11, 'mute', 'spam', 600, '2024-01-02 10:00:00', '2024-01-02 10:10:00', '10.0.0.1:27015'), \
     (3, 1, 11, 'silence', 'abuse', 3600, '2024-01-03 10:00:00', '2024-01-03 11:00:00', '10.0.0.2:27015'), \
     (4, 2, NULL, 'gag', 'mic spam', 0, '2024-01-04 10:00:00', NULL, 'all')",
];

const FRESH_BANS_SCHEMA: &[&str] = &[
    "CREATE TABLE amxadmins (id INTEGER PRIMARY KEY, steamid TEXT NOT NULL, nickname TEXT)",
    "CREATE TABLE bans (bid INTEGER PRIMARY KEY, player_id TEXT NOT NULL, player_nick TEXT, \
     admin_id TEXT, admin_nick TEXT, ban_reason TEXT, ban_created INTEGER NOT NULL, \
     ban_length INTEGER NOT NULL, server_ip TEXT NOT NULL)",
];

const FRESH_BANS_SEED: &[&str] = &[
    // STEAM_0:0:1 is ADMIN_SHARED; it holds one row per server
    "INSERT INTO amxadmins VALUES (1, 'STEAM_0:0:1', 'Shared'), (2, 'STEAM_0:0:1', 'Shared'), \
     (3, 'STEAM_0:1:0', 'AdminOne')",
    "INSERT INTO bans VALUES \
     (1, 'STEAM_0:1:19867136', 'Alice', 'STEAM_0:0:1', 'shared-old-nick', 'wallhack', 1700000000, 0, '10.0.0.1:27015'), \
     (2, 'STEAM_0:0:19867137', 'Bob', 'STEAM_0:1:0', 'one', 'speedhack', 1700000100, 60, '10.0.0.2:27015'), \
     (3, 'STEAM_0:1:19867136', 'Alice', 'CONSOLE', 'Console', 'evading', 1700000200, 1440, '10.0.0.1:27015')",
];

/// Schema layout for a backend kind
fn fixture_sql(kind: DriverKind) -> (&'static [&'static str], &'static [&'static str]) {
    match kind {
        DriverKind::Iks => (IKS_SCHEMA, IKS_SEED),
        DriverKind::Pisex => (PISEX_SCHEMA, PISEX_SEED),
        DriverKind::Zenith => (ZENITH_SCHEMA, ZENITH_SEED),
        DriverKind::FreshBans => (FRESH_BANS_SCHEMA, FRESH_BANS_SEED),
    }
}

/// Create and seed a SQLite backend database, returning its URL
pub async fn create_backend_db(dir: &TempDir, name: &str, kind: DriverKind) -> String {
    sqlx::any::install_default_drivers();

    let path = dir.path().join(format!("{name}.db"));
    let url = format!("sqlite:{}?mode=rwc", path.display());
    let pool = sqlx::AnyPool::connect(&url).await.unwrap();

    let (schema, seed) = fixture_sql(kind);
    for statement in schema.iter().chain(seed) {
        sqlx::query(statement).execute(&pool).await.unwrap();
    }
    pool.close().await;
    url
}

/// Run extra statements against a seeded backend database
pub async fn execute(url: &str, statements: &[&str]) {
    let pool = sqlx::AnyPool::connect(url).await.unwrap();
    for statement in statements {
        sqlx::query(statement).execute(&pool).await.unwrap();
    }
    pool.close().await;
}

/// Resolver serving a fixed profile table and recording every batch
#[derive(Default)]
pub struct StaticResolver {
    profiles: HashMap<String, Profile>,
    calls: Mutex<Vec<HashSet<String>>>,
}

impl StaticResolver {
    pub fn new(entries: &[(&str, &str)]) -> Self {
        let profiles = entries
            .iter()
            .map(|(id, name)| {
                (
                    id.to_string(),
                    Profile {
                        display_name: name.to_string(),
                        avatar_url: format!("https://avatars.example/{id}.jpg"),
                        canonical_id: id.to_string(),
                    },
                )
            })
            .collect();
        Self {
            profiles,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<HashSet<String>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl IdentityResolver for StaticResolver {
    async fn resolve_batch(&self, ids: &HashSet<String>) -> HashMap<String, Profile> {
        self.calls.lock().unwrap().push(ids.clone());
        ids.iter()
            .filter_map(|id| self.profiles.get(id).map(|p| (id.clone(), p.clone())))
            .collect()
    }
}

/// Configuration for a set of backends, without starting anything
pub fn test_config(backends: Vec<config::BackendConfig>) -> config::AppConfig {
    config::AppConfig {
        server: config::ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        identity: config::IdentityConfig {
            steam_api_key: None,
            steam_api_url: "http://127.0.0.1:9".to_string(),
            cache_ttl: 60,
            request_timeout: 5,
            batch_size: 100,
        },
        links: config::LinksConfig {
            base_url: BASE_URL.to_string(),
            placeholder_avatar: "assets/img/no_avatar.webp".to_string(),
        },
        listing: config::ListingConfig {
            default_per_page: 10,
            max_per_page: 50,
        },
        backends,
        logging: config::LoggingConfig {
            level: "info".to_string(),
            format: "pretty".to_string(),
        },
    }
}

pub fn backend_config(name: &str, kind: DriverKind, url: String) -> config::BackendConfig {
    config::BackendConfig {
        name: name.to_string(),
        driver: kind,
        database_url: url,
        server_scope_id: None,
        max_connections: 2,
    }
}

/// Seeded backends plus the application state built over them
pub struct TestBackends {
    pub state: AppState,
    pub resolver: Arc<StaticResolver>,
    pub _temp_dir: TempDir,
}

impl TestBackends {
    /// One backend of each kind, named after its driver
    pub async fn all() -> Self {
        Self::with(&[
            ("iks", DriverKind::Iks, None),
            ("pisex", DriverKind::Pisex, None),
            ("zenith", DriverKind::Zenith, None),
            ("fresh", DriverKind::FreshBans, None),
        ])
        .await
    }

    /// Backends given as (name, kind, configured scope)
    pub async fn with(specs: &[(&str, DriverKind, Option<&str>)]) -> Self {
        Self::with_resolver(specs, default_resolver()).await
    }

    pub async fn with_resolver(
        specs: &[(&str, DriverKind, Option<&str>)],
        resolver: StaticResolver,
    ) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let mut backends = Vec::new();
        for (name, kind, scope) in specs {
            let url = create_backend_db(&temp_dir, name, *kind).await;
            let mut backend = backend_config(name, *kind, url);
            backend.server_scope_id = scope.map(str::to_string);
            backends.push(backend);
        }

        let resolver = Arc::new(resolver);
        let state = AppState::with_identity(test_config(backends), resolver.clone())
            .await
            .unwrap();

        Self {
            state,
            resolver,
            _temp_dir: temp_dir,
        }
    }

    pub fn driver(&self, name: &str) -> Arc<dyn banscomms::driver::ListingDriver> {
        self.state.backends.get(name).unwrap().driver.clone()
    }
}

/// Profiles known to the default resolver; Carol and Bob stay unresolved
pub fn default_resolver() -> StaticResolver {
    StaticResolver::new(&[
        (ALICE, "Alice Live"),
        (ADMIN_ONE, "Admin One Live"),
        (ADMIN_SHARED, "Shared Admin Live"),
    ])
}

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub backends: TestBackends,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Serve one backend of each kind on an ephemeral port
    pub async fn new() -> Self {
        Self::serve(TestBackends::all().await).await
    }

    pub async fn serve(backends: TestBackends) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = build_router(backends.state.clone());

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr: format!("http://{addr}"),
            backends,
            client,
        }
    }

    /// Get base URL for API requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }
}
