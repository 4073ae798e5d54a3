use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::info;

use super::progress::{Progress, ProgressStore};
use super::selection::select_accounts;
use crate::actions::resolve_action;
use crate::config::{AppConfig, BlockStep, RouteConfig, RouteSlot};
use crate::domain::{network_by_name, AccountDirectory, ActionPlan, PlanStep};
use crate::error::{Result, WayfarerError};

/// Candidate that omits its slot
pub const SKIP: &str = "skip";

/// A route unit before flattening: a whole block, or one individual slot
enum Unit<'a> {
    Block(&'a [BlockStep]),
    Slot(&'a [String]),
}

/// Builds per-account plans from the route grammar.
///
/// Every candidate is resolved when the generator is built, so an unknown
/// action or network fails before any account touches the network.
pub struct RouteGenerator {
    route: RouteConfig,
}

impl RouteGenerator {
    pub fn new(route: RouteConfig) -> Result<Self> {
        network_by_name(&route.home_network)?;

        for (index, slot) in route.slots.iter().enumerate() {
            match slot {
                RouteSlot::Choice { choice } => {
                    Self::validate_candidates(choice, &route.home_network, index)?;
                }
                RouteSlot::Blocks { blocks } => {
                    if blocks.is_empty() {
                        return Err(WayfarerError::Configuration(format!(
                            "route slot {} has no blocks",
                            index + 1
                        )));
                    }
                    for step in blocks.iter().flatten() {
                        Self::validate_candidates(&step.candidates(), &route.home_network, index)?;
                    }
                }
            }
        }

        Ok(Self { route })
    }

    fn validate_candidates(candidates: &[String], home: &str, index: usize) -> Result<()> {
        if candidates.is_empty() {
            return Err(WayfarerError::Configuration(format!(
                "route slot {} has no candidates",
                index + 1
            )));
        }
        for candidate in candidates {
            resolve_candidate(candidate, home)?;
        }
        Ok(())
    }

    /// One route: blocks are pooled, shuffled and truncated, individual
    /// slots go back to their configured index.
    pub fn generate(&self, rng: &mut impl Rng) -> Result<Vec<PlanStep>> {
        let has_blocks = self
            .route
            .slots
            .iter()
            .any(|slot| matches!(slot, RouteSlot::Blocks { .. }));

        let mut units: Vec<Unit> = Vec::new();
        if has_blocks {
            let mut pool: Vec<&[BlockStep]> = Vec::new();
            let mut individual: Vec<(usize, &[String])> = Vec::new();
            for (index, slot) in self.route.slots.iter().enumerate() {
                match slot {
                    RouteSlot::Blocks { blocks } => pool.extend(blocks.iter().map(Vec::as_slice)),
                    RouteSlot::Choice { choice } => individual.push((index, choice.as_slice())),
                }
            }

            pool.shuffle(rng);
            let (min, max) = self.route.blocks_count;
            let count = rng.gen_range(min.min(max)..=max).min(pool.len());
            units.extend(pool.into_iter().take(count).map(Unit::Block));

            for (position, choice) in individual {
                let position = position.min(units.len());
                units.insert(position, Unit::Slot(choice));
            }
        } else {
            for slot in &self.route.slots {
                if let RouteSlot::Choice { choice } = slot {
                    units.push(Unit::Slot(choice));
                }
            }
        }

        let home = self.route.home_network.as_str();
        let mut route = Vec::new();
        for unit in units {
            match unit {
                Unit::Slot(choice) => route.extend(pick_candidate(choice, home, rng)?),
                Unit::Block(steps) => {
                    for step in steps {
                        route.extend(pick_candidate(&step.candidates(), home, rng)?);
                    }
                }
            }
        }
        Ok(route)
    }
}

fn pick_candidate(candidates: &[String], home: &str, rng: &mut impl Rng) -> Result<Option<PlanStep>> {
    match candidates.choose(rng) {
        Some(candidate) => resolve_candidate(candidate, home),
        None => Ok(None),
    }
}

/// `action[:Network]` to a plan step; `skip` yields nothing
fn resolve_candidate(raw: &str, home: &str) -> Result<Option<PlanStep>> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case(SKIP) {
        return Ok(None);
    }

    let (name, network) = match raw.split_once(':') {
        Some((name, network)) => (name, network),
        None => (raw, home),
    };
    let descriptor = resolve_action(name)?;
    let network = network_by_name(descriptor.fixed_network.unwrap_or(network))?;

    Ok(Some(PlanStep::new(descriptor.kind.as_str(), network.name)))
}

/// Regenerate the progress file for the selected accounts.
///
/// All plans are built in memory first; the file is only truncated and
/// rewritten once every plan resolved.
pub async fn regenerate_progress(
    config: &AppConfig,
    directory: &AccountDirectory,
    store: &ProgressStore,
) -> Result<Progress> {
    let generator = RouteGenerator::new(config.route.clone())?;
    let mut rng = StdRng::from_entropy();

    let accounts = select_accounts(&directory.names(), &config.wallets, &mut rng);
    let mut progress = Progress::new();
    for account in accounts {
        let route = generator.generate(&mut rng)?;
        progress.insert(account, ActionPlan::new(route));
    }

    store.reset().await?;
    store.save_all(&progress).await?;
    info!(
        "Successfully generated {} classic routes in {}",
        progress.len(),
        store.path().display()
    );
    Ok(progress)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn route(slots: Vec<RouteSlot>, blocks_count: (usize, usize)) -> RouteConfig {
        RouteConfig {
            slots,
            blocks_count,
            home_network: "BeraChain".into(),
        }
    }

    #[test]
    fn skip_and_network_suffix() {
        assert_eq!(resolve_candidate("skip", "BeraChain").unwrap(), None);
        assert_eq!(
            resolve_candidate("wrap_native:Scroll", "BeraChain").unwrap(),
            Some(PlanStep::new("wrap_native", "Scroll"))
        );
        assert_eq!(
            resolve_candidate("unwrap_native", "BeraChain").unwrap(),
            Some(PlanStep::new("unwrap_native", "BeraChain"))
        );
    }

    #[test]
    fn transfer_eth_always_targets_ethereum() {
        assert_eq!(
            resolve_candidate("transfer_eth:Scroll", "BeraChain").unwrap(),
            Some(PlanStep::new("transfer_eth", "Ethereum"))
        );
    }

    #[test]
    fn unknown_names_fail_when_building() {
        let bad_action = route(
            vec![RouteSlot::Choice {
                choice: names(&["wrap_native", "bridge_everything"]),
            }],
            (1, 1),
        );
        assert!(matches!(
            RouteGenerator::new(bad_action),
            Err(WayfarerError::Configuration(_))
        ));

        let bad_network = route(
            vec![RouteSlot::Blocks {
                blocks: vec![vec![BlockStep::Fixed("wrap_native:Atlantis".into())]],
            }],
            (1, 1),
        );
        assert!(RouteGenerator::new(bad_network).is_err());
    }

    #[test]
    fn slots_without_blocks_keep_order() {
        let generator = RouteGenerator::new(route(
            vec![
                RouteSlot::Choice {
                    choice: names(&["wrap_native"]),
                },
                RouteSlot::Choice {
                    choice: names(&["skip"]),
                },
                RouteSlot::Choice {
                    choice: names(&["unwrap_native"]),
                },
            ],
            (1, 1),
        ))
        .unwrap();

        let mut rng = StdRng::seed_from_u64(3);
        let plan = generator.generate(&mut rng).unwrap();
        assert_eq!(
            plan,
            vec![
                PlanStep::new("wrap_native", "BeraChain"),
                PlanStep::new("unwrap_native", "BeraChain"),
            ]
        );
    }

    #[test]
    fn block_count_is_clamped_to_pool() {
        let generator = RouteGenerator::new(route(
            vec![RouteSlot::Blocks {
                blocks: vec![
                    vec![BlockStep::Fixed("wrap_native".into())],
                    vec![BlockStep::Fixed("unwrap_native".into())],
                ],
            }],
            (5, 9),
        ))
        .unwrap();

        let mut rng = StdRng::seed_from_u64(11);
        let plan = generator.generate(&mut rng).unwrap();
        assert_eq!(plan.len(), 2);
    }
}
