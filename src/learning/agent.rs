//! Tabular Q-learning agent that votes for an egress candidate.
//!
//! States are coarse string keys (`"{node}_{hazards}_{occupancy/10}"`), actions
//! are egress node ids. The agent is a ranking heuristic, not a trained policy:
//! its vote only sets the `rlRecommended` flag and the analysis confidence.

use hashbrown::HashMap;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::config::AgentConfig;
use crate::model::{Hazard, Node};

/// Epsilon-greedy Q-learning over egress candidates.
#[derive(Debug, Clone)]
pub struct RouteAgent {
    config: AgentConfig,
    q_table: HashMap<String, HashMap<String, f64>>,
    exploration_rate: f64,
    episodes: u64,
    rng: ChaCha20Rng,
}

impl RouteAgent {
    pub fn new(config: AgentConfig, seed: u64) -> Self {
        Self {
            exploration_rate: config.exploration,
            config,
            q_table: HashMap::new(),
            episodes: 0,
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }

    pub fn episodes(&self) -> u64 {
        self.episodes
    }

    pub fn exploration_rate(&self) -> f64 {
        self.exploration_rate
    }

    pub fn states(&self) -> usize {
        self.q_table.len()
    }

    /// Learned value of `action` in `state`; unseen pairs are worth 0.
    pub fn q_value(&self, state: &str, action: &str) -> f64 {
        self.q_table
            .get(state)
            .and_then(|actions| actions.get(action))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn state_key(node_id: &str, hazard_count: usize, occupancy: u32) -> String {
        format!("{node_id}_{hazard_count}_{}", occupancy / 10)
    }

    /// Pick one of `actions`: random while exploring, otherwise the highest
    /// Q-value with the first candidate winning ties.
    pub fn choose_action<'a>(&mut self, state: &str, actions: &'a [String]) -> Option<&'a str> {
        if actions.is_empty() {
            return None;
        }
        if self.episodes < self.config.exploration_episodes
            && self.rng.gen_range(0.0..1.0) < self.exploration_rate
        {
            let pick = self.rng.gen_range(0..actions.len());
            return Some(actions[pick].as_str());
        }

        let values = self.q_table.entry(state.to_string()).or_default();
        let mut best = actions[0].as_str();
        let mut best_value = values.get(best).copied().unwrap_or(0.0);
        for action in &actions[1..] {
            let value = values.get(action).copied().unwrap_or(0.0);
            if value > best_value {
                best_value = value;
                best = action.as_str();
            }
        }
        Some(best)
    }

    /// `Q(s,a) += α · (r + γ · max Q(s',·) − Q(s,a))`.
    pub fn update_q(
        &mut self,
        state: &str,
        action: &str,
        reward: f64,
        next_state: Option<&str>,
        next_actions: &[String],
    ) {
        let max_next = next_state
            .and_then(|s| self.q_table.get(s))
            .map(|values| {
                next_actions
                    .iter()
                    .map(|a| values.get(a).copied().unwrap_or(0.0))
                    .fold(0.0, f64::max)
            })
            .unwrap_or(0.0);

        let (alpha, gamma) = (self.config.learning_rate, self.config.discount);
        let values = self.q_table.entry(state.to_string()).or_default();
        let current = values.get(action).copied().unwrap_or(0.0);
        values.insert(action.to_string(), current + alpha * (reward + gamma * max_next - current));
    }

    /// Reward for moving to `target`: distance penalty, egress bonus and a
    /// penalty per hazard closer than the hazard radius.
    pub fn reward(&self, target: &Node, distance: f64, hazards: &[Hazard], reached_egress: bool) -> f64 {
        let mut reward = -distance * self.config.distance_penalty;
        if reached_egress {
            reward += self.config.egress_reward;
        }
        for hazard in hazards {
            let d = hazard.distance_to(target.x, target.y);
            if d < self.config.hazard_radius {
                reward -= self.config.hazard_penalty * (1.0 - d / self.config.hazard_radius);
            }
        }
        reward
    }

    /// Learn from a finished evacuation: on success each step along the route
    /// is rewarded by `10 − timeTaken`. Exploration decays either way.
    pub fn train_on_evacuation(&mut self, route: &[String], success: bool, time_taken: f64) {
        self.episodes += 1;
        if success {
            for pair in route.windows(2) {
                let state = Self::state_key(&pair[0], 0, 0);
                let next_state = Self::state_key(&pair[1], 0, 0);
                self.update_q(&state, &pair[1], 10.0 - time_taken, Some(&next_state), &[]);
            }
        }
        self.exploration_rate = self
            .config
            .min_exploration
            .max(self.config.exploration * (-(self.episodes as f64) / self.config.exploration_decay).exp());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NodeId, NodeKind};

    fn actions() -> Vec<String> {
        (1..=4).map(|i| format!("stair-2-{i}")).collect()
    }

    fn greedy_agent() -> RouteAgent {
        let config = AgentConfig { exploration: 0.0, ..AgentConfig::default() };
        RouteAgent::new(config, 1)
    }

    #[test]
    fn test_state_key_buckets_occupancy() {
        assert_eq!(RouteAgent::state_key("node-2-0-0-0", 1, 37), "node-2-0-0-0_1_3");
        assert_eq!(RouteAgent::state_key("stair-1-1", 0, 0), "stair-1-1_0_0");
    }

    #[test]
    fn test_greedy_prefers_highest_value() {
        let mut agent = greedy_agent();
        let actions = actions();
        assert_eq!(agent.choose_action("s", &actions), Some("stair-2-1"));
        agent.update_q("s", "stair-2-3", 10.0, None, &[]);
        assert_eq!(agent.choose_action("s", &actions), Some("stair-2-3"));
        assert!(agent.choose_action("s", &[]).is_none());
    }

    #[test]
    fn test_q_update_rule() {
        let mut agent = greedy_agent();
        agent.update_q("next", "a", 20.0, None, &[]);
        agent.update_q("s", "a", 5.0, Some("next"), &["a".to_string()]);
        // 0 + 0.1 · (5 + 0.9 · 2 − 0)
        assert!((agent.q_value("s", "a") - 0.68).abs() < 1e-12);
    }

    #[test]
    fn test_exploration_is_seeded() {
        let config = AgentConfig { exploration: 1.0, ..AgentConfig::default() };
        let actions = actions();
        let picks = |seed| {
            let mut agent = RouteAgent::new(config.clone(), seed);
            (0..16).map(|_| agent.choose_action("s", &actions).unwrap().to_string()).collect::<Vec<_>>()
        };
        assert_eq!(picks(7), picks(7));
    }

    #[test]
    fn test_reward_penalizes_nearby_hazards() {
        let agent = greedy_agent();
        let stair = Node::new(NodeId(0), "stair-2-1", 2, 4.0, 4.0, NodeKind::Staircase);
        let clear = agent.reward(&stair, 10.0, &[], true);
        assert!((clear - 99.0).abs() < 1e-12);
        let near = agent.reward(&stair, 10.0, &[Hazard::fire(6.0, 4.0, 10)], true);
        assert!((near - (99.0 - 25.0)).abs() < 1e-12);
    }

    #[test]
    fn test_training_decays_exploration() {
        let mut agent = RouteAgent::new(AgentConfig::default(), 3);
        let route: Vec<String> = vec!["node-1-0-0-0".into(), "stair-1-1".into()];
        agent.train_on_evacuation(&route, true, 2.0);
        assert_eq!(agent.episodes(), 1);
        assert!(agent.exploration_rate() < 0.2);
        assert!(agent.q_value("node-1-0-0-0_0_0", "stair-1-1") > 0.0);
        for _ in 0..5_000 {
            agent.train_on_evacuation(&route, false, 0.0);
        }
        assert_eq!(agent.exploration_rate(), 0.05);
    }
}
