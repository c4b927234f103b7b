//! E2E tests for punishment counts and administrator dedup

mod common;

use banscomms::config::DriverKind;
use banscomms::data::CountsSummary;
use banscomms::service::aggregate_counts;
use common::{ADMIN_ONE, ADMIN_PISEX, ADMIN_SHARED, ADMIN_ZENITH, TestBackends};
use std::collections::HashSet;

#[tokio::test]
async fn test_aggregate_counts_dedups_admins_across_backends() {
    let backends = TestBackends::all().await;

    let result = aggregate_counts(&backends.state.backends, false).await;

    assert_eq!(
        result.totals,
        CountsSummary {
            bans: 10,
            mutes: 5,
            gags: 3,
            admins: 4,
        }
    );

    let per_backend: Vec<(&str, CountsSummary)> = result
        .backends
        .iter()
        .map(|entry| (entry.backend.as_str(), entry.counts))
        .collect();
    assert_eq!(
        per_backend,
        vec![
            (
                "iks",
                CountsSummary {
                    bans: 4,
                    mutes: 2,
                    gags: 1,
                    admins: 2
                }
            ),
            (
                "pisex",
                CountsSummary {
                    bans: 2,
                    mutes: 1,
                    gags: 1,
                    admins: 1
                }
            ),
            (
                "zenith",
                CountsSummary {
                    bans: 1,
                    mutes: 2,
                    gags: 1,
                    admins: 1
                }
            ),
            // Both Fresh Bans admins were already seen, under Steam2 ids
            (
                "fresh",
                CountsSummary {
                    bans: 3,
                    mutes: 0,
                    gags: 0,
                    admins: 0
                }
            ),
        ]
    );
}

#[tokio::test]
async fn test_exclusion_set_collects_canonical_ids() {
    let backends = TestBackends::all().await;
    let mut seen = HashSet::new();

    for name in ["fresh", "iks", "pisex", "zenith"] {
        backends
            .driver(name)
            .get_counts(None, &mut seen, false)
            .await;
    }

    let expected: HashSet<String> = [ADMIN_ONE, ADMIN_SHARED, ADMIN_PISEX, ADMIN_ZENITH]
        .iter()
        .map(|id| id.to_string())
        .collect();
    assert_eq!(seen, expected);
}

#[tokio::test]
async fn test_pre_seeded_admins_are_not_counted() {
    let backends = TestBackends::with(&[("iks", DriverKind::Iks, None)]).await;
    let mut seen: HashSet<String> = [ADMIN_ONE.to_string()].into_iter().collect();

    let counts = backends
        .driver("iks")
        .get_counts(None, &mut seen, false)
        .await;

    assert_eq!(counts.admins, 1);
    assert!(seen.contains(ADMIN_SHARED));
}

#[tokio::test]
async fn test_scoped_counts_include_global_records() {
    let backends = TestBackends::with(&[("iks", DriverKind::Iks, None)]).await;
    let driver = backends.driver("iks");

    let counts = driver.get_counts(Some("1"), &mut HashSet::new(), false).await;
    assert_eq!(
        counts,
        CountsSummary {
            bans: 2,
            mutes: 1,
            gags: 1,
            admins: 1,
        }
    );

    // include_all_servers widens only the administrator set
    let counts = driver.get_counts(Some("1"), &mut HashSet::new(), true).await;
    assert_eq!(counts.bans, 2);
    assert_eq!(counts.admins, 2);
}

#[tokio::test]
async fn test_zenith_scoped_admins() {
    let backends = TestBackends::with(&[("zenith", DriverKind::Zenith, None)]).await;
    let driver = backends.driver("zenith");

    let counts = driver
        .get_counts(Some("10.0.0.2:27015"), &mut HashSet::new(), false)
        .await;
    assert_eq!(
        counts,
        CountsSummary {
            bans: 1,
            mutes: 1,
            gags: 1,
            admins: 1,
        }
    );

    let counts = driver
        .get_counts(Some("10.0.0.2:27015"), &mut HashSet::new(), true)
        .await;
    assert_eq!(counts.admins, 2);
}

#[tokio::test]
async fn test_pisex_scoped_admins() {
    let backends = TestBackends::with(&[("pisex", DriverKind::Pisex, None)]).await;
    let driver = backends.driver("pisex");

    let mut seen = HashSet::new();
    let counts = driver.get_counts(Some("2"), &mut seen, false).await;
    assert_eq!(
        counts,
        CountsSummary {
            bans: 2,
            mutes: 0,
            gags: 1,
            admins: 1,
        }
    );
    assert!(seen.contains(ADMIN_PISEX));
}

#[tokio::test]
async fn test_failing_backend_counts_zero_and_others_continue() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let broken = common::create_backend_db(&temp_dir, "broken", DriverKind::Iks).await;
    let healthy = common::create_backend_db(&temp_dir, "healthy", DriverKind::Iks).await;
    let config = common::test_config(vec![
        common::backend_config("broken", DriverKind::Pisex, broken),
        common::backend_config("healthy", DriverKind::Iks, healthy),
    ]);
    let state = banscomms::AppState::with_identity(
        config,
        std::sync::Arc::new(common::StaticResolver::default()),
    )
    .await
    .unwrap();

    let result = aggregate_counts(&state.backends, false).await;

    assert_eq!(result.backends[0].counts, CountsSummary::default());
    assert_eq!(result.backends[1].counts.bans, 4);
    assert_eq!(result.totals.admins, 2);
}
