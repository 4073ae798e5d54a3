use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use wayfarer::config::{AccountSelection, AppConfig, BlockStep, RouteConfig, RouteSlot, SelectionItem};
use wayfarer::domain::{Account, AccountDirectory, PlanStep};
use wayfarer::planning::{regenerate_progress, ProgressStore, RouteGenerator};

const EVM_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

fn temp_progress() -> PathBuf {
    std::env::temp_dir()
        .join(format!("wayfarer-routes-{}", uuid::Uuid::new_v4()))
        .join("wallets_progress.json")
}

fn directory(count: usize) -> AccountDirectory {
    let accounts = (1..=count)
        .map(|i| Account::new(format!("acc-{}", i), EVM_KEY, None, None))
        .collect();
    AccountDirectory::new(accounts).unwrap()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn simple_route() -> RouteConfig {
    RouteConfig {
        slots: vec![
            RouteSlot::Choice {
                choice: strings(&["wrap_native"]),
            },
            RouteSlot::Choice {
                choice: strings(&["unwrap_native:Scroll"]),
            },
        ],
        blocks_count: (1, 1),
        home_network: "BeraChain".into(),
    }
}

fn fixed(name: &str) -> BlockStep {
    BlockStep::Fixed(name.to_string())
}

/// Two blocks, one taken, followed by the individual slot.
#[test]
fn one_block_then_the_individual_slot() {
    let generator = RouteGenerator::new(RouteConfig {
        slots: vec![
            RouteSlot::Blocks {
                blocks: vec![
                    vec![fixed("wrap_native"), fixed("unwrap_native")],
                    vec![fixed("transfer_native"), fixed("wrap_native:Scroll")],
                ],
            },
            RouteSlot::Choice {
                choice: strings(&["unwrap_native:Scroll", "transfer_native:Base"]),
            },
        ],
        blocks_count: (1, 1),
        home_network: "BeraChain".into(),
    })
    .unwrap();

    let first_block = vec![
        PlanStep::new("wrap_native", "BeraChain"),
        PlanStep::new("unwrap_native", "BeraChain"),
    ];
    let second_block = vec![
        PlanStep::new("transfer_native", "BeraChain"),
        PlanStep::new("wrap_native", "Scroll"),
    ];
    let tails = [
        PlanStep::new("unwrap_native", "Scroll"),
        PlanStep::new("transfer_native", "Base"),
    ];

    for seed in 0..32 {
        let mut rng = StdRng::seed_from_u64(seed);
        let route = generator.generate(&mut rng).unwrap();
        assert_eq!(route.len(), 3, "seed {seed}");
        let head = route[..2].to_vec();
        assert!(head == first_block || head == second_block, "seed {seed}: {route:?}");
        assert!(tails.contains(&route[2]), "seed {seed}: {route:?}");
    }
}

#[tokio::test]
async fn excluded_accounts_get_no_plan() {
    let mut config = AppConfig::default();
    config.route = simple_route();
    config.wallets.to_exclude = AccountSelection::List(vec![SelectionItem::Index(2)]);
    let store = ProgressStore::new(temp_progress());

    let progress = regenerate_progress(&config, &directory(3), &store).await.unwrap();
    assert_eq!(progress.accounts(), vec!["acc-1", "acc-3"]);
    assert!(progress.get("acc-2").is_none());
}

#[tokio::test]
async fn fresh_plans_start_at_zero() {
    let mut config = AppConfig::default();
    config.route = simple_route();
    let store = ProgressStore::new(temp_progress());

    regenerate_progress(&config, &directory(2), &store).await.unwrap();
    let progress = store.load().await.unwrap();
    for (_, plan) in progress.iter() {
        assert_eq!(plan.current_step, 0);
        assert_eq!(
            plan.route,
            vec![
                PlanStep::new("wrap_native", "BeraChain"),
                PlanStep::new("unwrap_native", "Scroll"),
            ]
        );
    }
}

/// Regeneration replaces the file instead of merging into it.
#[tokio::test]
async fn regeneration_truncates_previous_progress() {
    let mut config = AppConfig::default();
    config.route = simple_route();
    let store = ProgressStore::new(temp_progress());
    let accounts = directory(4);

    regenerate_progress(&config, &accounts, &store).await.unwrap();
    store.advance("acc-1").await.unwrap();
    assert_eq!(store.load().await.unwrap().len(), 4);

    config.wallets.to_work = AccountSelection::List(vec![SelectionItem::Range((1, 2))]);
    regenerate_progress(&config, &accounts, &store).await.unwrap();

    let progress = store.load().await.unwrap();
    assert_eq!(progress.accounts(), vec!["acc-1", "acc-2"]);
    assert_eq!(progress.get("acc-1").unwrap().current_step, 0);
}

/// A bad candidate leaves the existing file untouched.
#[tokio::test]
async fn unknown_action_fails_before_touching_the_file() {
    let mut config = AppConfig::default();
    config.route = simple_route();
    let store = ProgressStore::new(temp_progress());
    let accounts = directory(2);
    regenerate_progress(&config, &accounts, &store).await.unwrap();

    config.route.slots.push(RouteSlot::Choice {
        choice: strings(&["teleport"]),
    });
    assert!(regenerate_progress(&config, &accounts, &store).await.is_err());
    assert_eq!(store.load().await.unwrap().len(), 2);
}
