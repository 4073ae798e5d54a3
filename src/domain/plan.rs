use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One `(action, network)` pair, persisted as `"action:network"`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlanStep {
    pub action: String,
    pub network: String,
}

impl PlanStep {
    pub fn new(action: impl Into<String>, network: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            network: network.into(),
        }
    }
}

impl std::fmt::Display for PlanStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.action, self.network)
    }
}

impl FromStr for PlanStep {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.split_once(':') {
            Some((action, network)) if !action.trim().is_empty() && !network.trim().is_empty() => {
                Ok(Self::new(action.trim(), network.trim()))
            }
            _ => Err(format!("route entry \"{}\" is not <action>:<network>", raw)),
        }
    }
}

impl TryFrom<String> for PlanStep {
    type Error = String;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

impl From<PlanStep> for String {
    fn from(step: PlanStep) -> Self {
        step.to_string()
    }
}

/// Ordered route for one account plus its resume cursor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionPlan {
    pub current_step: usize,
    pub route: Vec<PlanStep>,
}

impl ActionPlan {
    pub fn new(route: Vec<PlanStep>) -> Self {
        Self {
            current_step: 0,
            route,
        }
    }

    pub fn current(&self) -> Option<&PlanStep> {
        self.route.get(self.current_step)
    }

    pub fn is_complete(&self) -> bool {
        self.current_step >= self.route.len()
    }

    pub fn remaining(&self) -> usize {
        self.route.len().saturating_sub(self.current_step)
    }

    /// Move the cursor past the step that just completed
    pub fn advance(&mut self) {
        if !self.is_complete() {
            self.current_step += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_keeps_network_names_with_spaces() {
        let step: PlanStep = "wrap_native:BNB Chain".parse().unwrap();
        assert_eq!(step.action, "wrap_native");
        assert_eq!(step.network, "BNB Chain");
        assert_eq!(step.to_string(), "wrap_native:BNB Chain");
    }

    #[test]
    fn step_without_network_is_rejected() {
        assert!("wrap_native".parse::<PlanStep>().is_err());
        assert!(":BeraChain".parse::<PlanStep>().is_err());
    }

    #[test]
    fn plan_serializes_in_progress_file_shape() {
        let plan = ActionPlan::new(vec![
            PlanStep::new("wrap_native", "BeraChain"),
            PlanStep::new("transfer_eth", "Ethereum"),
        ]);
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "current_step": 0,
                "route": ["wrap_native:BeraChain", "transfer_eth:Ethereum"]
            })
        );
    }

    #[test]
    fn advance_stops_at_the_end() {
        let mut plan = ActionPlan::new(vec![PlanStep::new("wrap_native", "BeraChain")]);
        assert_eq!(plan.remaining(), 1);
        plan.advance();
        assert!(plan.is_complete());
        plan.advance();
        assert_eq!(plan.current_step, 1);
        assert!(plan.current().is_none());
    }
}
