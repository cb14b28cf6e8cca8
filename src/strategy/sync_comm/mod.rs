//! Synchronized communication strategy (SynchComm)
//!
//! Players agree on ranks and share their statistics without any message
//! channel. Everything rides on collisions and on every player counting the
//! same rounds.
//!
//! # Phases
//!
//! 1. **Fixation**: pull uniformly random arms until one round passes without
//!    a collision; that arm becomes the external rank. Lasts
//!    `T0 = ceil(K·e·ln T)` rounds for everyone.
//! 2. **Estimation**: player `r` waits on arm `r` for `2r` rounds, then hops
//!    `r+1, r+2, …`. Every lower-ranked hopper passes over a waiting player
//!    exactly once, so collisions count the players (M) and, while waiting,
//!    the players ranked below (internal rank). Ends at `T0 + 2K`.
//! 3. **Exploration**: cycle through the active arms, `2^(p+1)` pulls per arm
//!    in round `p`.
//! 4. **Communication**: broadcast the per-arm reward sums bit by bit through
//!    deliberate collisions (see [`schedule`]), then run the same
//!    accept/reject test on identical data as every other player.
//! 5. **Exploitation**: stay on the accepted arm for the rest of the run.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{Result, StrategyError};

use super::{Observation, PlayerStrategy, StrategyState};

pub mod schedule;

use schedule::{bit_is_set, quantize, CommSchedule, CommSlot};

/// Phase of a [`SynchComm`] player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynchCommPhase {
    /// Searching for a collision-free arm (external rank)
    Fixation,
    /// Counting players and computing the internal rank
    Estimation,
    /// Pulling every active arm in turn
    Exploration,
    /// Exchanging statistics through collisions
    Communication,
    /// Committed to an accepted arm
    Exploitation {
        /// The arm this player occupies until the horizon
        arm: usize,
    },
}

/// How an arm left the active set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmOutcome {
    /// Provably among the best M arms
    Accepted,
    /// Provably outside the best M arms
    Rejected,
}

/// SynchComm player
#[derive(Debug, Clone)]
pub struct SynchComm {
    state: StrategyState,
    rng: StdRng,

    phase: SynchCommPhase,
    fixation_rounds: usize,
    t_phase: usize,
    round_number: usize,
    last_action: usize,

    ext_rank: Option<usize>,
    int_rank: usize,
    num_players: usize,

    active_arms: Vec<usize>,
    outcomes: Vec<Option<ArmOutcome>>,
    last_phase_stats: Vec<f64>,
    sums: Vec<f64>,
    team_pulls: Vec<u64>,
}

impl SynchComm {
    /// Strategy name
    pub const NAME: &'static str = "SynchComm";

    /// Create a new player
    ///
    /// # Arguments
    /// * `num_arms` - Number of arms (K)
    /// * `horizon` - Number of rounds (T), shared by all players
    /// * `rng` - Source for the fixation draws
    pub fn new(num_arms: usize, horizon: usize, mut rng: StdRng) -> Result<Self> {
        let state = StrategyState::new(num_arms, horizon)?;
        let fixation_rounds =
            (num_arms as f64 * std::f64::consts::E * (horizon as f64).ln()).ceil() as usize;
        let last_action = rng.gen_range(0..num_arms);

        Ok(Self {
            state,
            rng,
            phase: SynchCommPhase::Fixation,
            fixation_rounds,
            t_phase: 0,
            round_number: 0,
            last_action,
            ext_rank: None,
            int_rank: 0,
            num_players: 1,
            active_arms: (0..num_arms).collect(),
            outcomes: vec![None; num_arms],
            last_phase_stats: vec![0.0; num_arms],
            sums: vec![0.0; num_arms],
            team_pulls: vec![0; num_arms],
        })
    }

    /// Create a new player with a seeded generator
    pub fn with_seed(num_arms: usize, horizon: usize, seed: u64) -> Result<Self> {
        Self::new(num_arms, horizon, StdRng::seed_from_u64(seed))
    }

    /// Current phase
    pub fn phase(&self) -> SynchCommPhase {
        self.phase
    }

    /// Length of the fixation phase (T0)
    pub fn fixation_rounds(&self) -> usize {
        self.fixation_rounds
    }

    /// External rank, `None` until fixed
    pub fn ext_rank(&self) -> Option<usize> {
        self.ext_rank
    }

    /// Rank among the players still exploring
    pub fn int_rank(&self) -> usize {
        self.int_rank
    }

    /// Estimated number of players still exploring
    pub fn num_players(&self) -> usize {
        self.num_players
    }

    /// Current exploration/communication round
    pub fn round_number(&self) -> usize {
        self.round_number
    }

    /// Arms neither accepted nor rejected yet, in increasing order
    pub fn active_arms(&self) -> &[usize] {
        &self.active_arms
    }

    /// How `arm` left the active set, if it did
    pub fn outcome(&self, arm: usize) -> Option<ArmOutcome> {
        self.outcomes.get(arm).copied().flatten()
    }

    /// Population-wide reward sums (own rewards plus decoded peer sums)
    pub fn sums(&self) -> &[f64] {
        &self.sums
    }

    /// Population-wide pull counts behind [`Self::sums`]
    pub fn team_pulls(&self) -> &[u64] {
        &self.team_pulls
    }

    fn schedule(&self) -> CommSchedule {
        CommSchedule::new(self.num_players, self.active_arms.len(), self.round_number)
    }

    fn active_arm(&self, index: usize) -> Result<usize> {
        self.active_arms.get(index).copied().ok_or_else(|| {
            StrategyError::Desynchronized(format!(
                "no active arm at index {} ({} active)",
                index,
                self.active_arms.len()
            ))
        })
    }

    /// Arm this player sits on outside of its own sending window
    fn seat(&self) -> Result<usize> {
        self.active_arm(self.int_rank)
    }

    fn play_fixation(&mut self) -> usize {
        match self.ext_rank {
            Some(rank) => rank,
            None => self.rng.gen_range(0..self.state.total_arms()),
        }
    }

    fn play_estimation(&self) -> usize {
        match self.ext_rank {
            Some(rank) if self.state.t <= self.fixation_rounds + 2 * rank => rank,
            _ => (self.last_action + 1) % self.state.total_arms(),
        }
    }

    fn play_exploration(&self) -> Result<usize> {
        let position = self
            .active_arms
            .iter()
            .position(|&arm| arm == self.last_action)
            .ok_or_else(|| {
                StrategyError::Desynchronized(format!(
                    "last arm {} is not active",
                    self.last_action
                ))
            })?;
        Ok(self.active_arms[(position + 1) % self.active_arms.len()])
    }

    fn play_communication(&self) -> Result<usize> {
        match self.schedule().slot(self.t_phase, self.int_rank) {
            CommSlot::Send { bit, channel, peer } => {
                let arm = self.active_arm(channel)?;
                if bit_is_set(quantize(self.last_phase_stats[arm]), bit) {
                    self.active_arm(peer)
                } else {
                    self.seat()
                }
            }
            CommSlot::Listen { .. } | CommSlot::Idle => self.seat(),
        }
    }

    fn on_fixation(&mut self, arm: usize, observation: Observation) -> SynchCommPhase {
        if self.ext_rank.is_none() && !observation.collided {
            tracing::debug!(arm, t = self.state.t, "fixed external rank");
            self.ext_rank = Some(arm);
        }

        if self.state.t != self.fixation_rounds {
            return SynchCommPhase::Fixation;
        }

        let rank = match self.ext_rank {
            Some(rank) => rank,
            None => {
                tracing::warn!(arm, "no collision-free arm found during fixation, keeping last arm");
                self.ext_rank = Some(arm);
                arm
            }
        };
        self.last_action = rank;
        SynchCommPhase::Estimation
    }

    fn on_estimation(&mut self, observation: Observation) -> SynchCommPhase {
        let waiting = self
            .ext_rank
            .is_some_and(|rank| self.state.t <= self.fixation_rounds + 2 * rank);

        if observation.collided {
            if waiting {
                self.int_rank += 1;
            }
            self.num_players += 1;
        }

        if self.state.t != self.fixation_rounds + 2 * self.state.total_arms() {
            return SynchCommPhase::Estimation;
        }

        // ceil(log2(M)): earlier rounds would carry no information
        self.round_number = self.num_players.next_power_of_two().trailing_zeros() as usize;
        self.t_phase = 0;
        tracing::debug!(
            ext_rank = ?self.ext_rank,
            int_rank = self.int_rank,
            num_players = self.num_players,
            "estimation finished"
        );
        SynchCommPhase::Exploration
    }

    fn on_exploration(&mut self, arm: usize, observation: Observation) -> SynchCommPhase {
        self.last_phase_stats[arm] += observation.reward;
        self.sums[arm] += observation.reward;
        self.t_phase += 1;

        if self.t_phase == (2 << self.round_number) * self.active_arms.len() {
            self.t_phase = 0;
            SynchCommPhase::Communication
        } else {
            SynchCommPhase::Exploration
        }
    }

    fn on_communication(&mut self, observation: Observation) -> Result<SynchCommPhase> {
        let schedule = self.schedule();

        if observation.collided {
            if let CommSlot::Listen { bit, channel, .. } = schedule.slot(self.t_phase, self.int_rank) {
                let arm = self.active_arm(channel)?;
                self.sums[arm] += (1u64 << bit) as f64;
            }
        }

        self.t_phase += 1;
        if self.t_phase >= schedule.len() || self.num_players <= 1 {
            self.eliminate()
        } else {
            Ok(SynchCommPhase::Communication)
        }
    }

    /// Accept/reject test at the end of a communication phase
    ///
    /// Every player runs this on the same sums and pull counts, so all of
    /// them remove the same arms. Thresholds use `K` and `M` from before the
    /// removals.
    fn eliminate(&mut self) -> Result<SynchCommPhase> {
        let pulls_this_round = (2u64 << self.round_number) * self.num_players as u64;
        for &arm in &self.active_arms {
            self.team_pulls[arm] += pulls_this_round;
        }

        let log_horizon = (self.state.horizon as f64).ln();
        let bounds: Vec<(f64, f64)> = self
            .active_arms
            .iter()
            .map(|&arm| {
                let n = self.team_pulls[arm] as f64;
                let mean = self.sums[arm] / n;
                let radius = (2.0 * log_horizon / n).sqrt();
                (mean - radius, mean + radius)
            })
            .collect();

        let num_active = self.active_arms.len();
        let mut accepted = Vec::new();
        let mut rejected = Vec::new();
        for (i, &arm) in self.active_arms.iter().enumerate() {
            let (low, up) = bounds[i];
            let better = bounds.iter().filter(|(other_low, _)| *other_low > up).count();
            let worse = bounds.iter().filter(|(_, other_up)| *other_up < low).count();

            if better >= self.num_players {
                tracing::debug!(ext_rank = ?self.ext_rank, arm, round = self.round_number, "rejected arm");
                rejected.push(arm);
            } else if worse + self.num_players >= num_active {
                tracing::debug!(ext_rank = ?self.ext_rank, arm, round = self.round_number, "accepted arm");
                accepted.push(arm);
            }
        }

        for &arm in &accepted {
            self.outcomes[arm] = Some(ArmOutcome::Accepted);
        }
        for &arm in &rejected {
            self.outcomes[arm] = Some(ArmOutcome::Rejected);
        }
        let outcomes = &self.outcomes;
        self.active_arms.retain(|&arm| outcomes[arm].is_none());
        self.num_players = self.num_players.saturating_sub(accepted.len());
        self.state.num_arms = self.active_arms.len();

        if accepted.len() > self.int_rank {
            let arm = accepted[self.int_rank];
            tracing::debug!(ext_rank = ?self.ext_rank, arm, t = self.state.t, "starts exploiting");
            self.last_action = arm;
            return Ok(SynchCommPhase::Exploitation { arm });
        }

        self.int_rank -= accepted.len();
        self.last_action = self.seat()?;
        self.round_number += 1;
        self.last_phase_stats.fill(0.0);
        self.t_phase = 0;
        Ok(SynchCommPhase::Exploration)
    }
}

impl PlayerStrategy for SynchComm {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn state(&self) -> &StrategyState {
        &self.state
    }

    fn select_arm(&mut self) -> Result<usize> {
        self.state.ensure_ready()?;
        let arm = match self.phase {
            SynchCommPhase::Fixation => self.play_fixation(),
            SynchCommPhase::Estimation => self.play_estimation(),
            SynchCommPhase::Exploration => self.play_exploration()?,
            SynchCommPhase::Communication => self.play_communication()?,
            SynchCommPhase::Exploitation { arm } => arm,
        };
        self.state.begin_round(arm)
    }

    fn update(&mut self, arm: usize, observation: Observation) -> Result<()> {
        self.state.end_round(arm)?;
        self.state.record(arm, observation);
        self.last_action = arm;

        self.phase = match self.phase {
            SynchCommPhase::Fixation => self.on_fixation(arm, observation),
            SynchCommPhase::Estimation => self.on_estimation(observation),
            SynchCommPhase::Exploration => self.on_exploration(arm, observation),
            SynchCommPhase::Communication => self.on_communication(observation)?,
            phase @ SynchCommPhase::Exploitation { .. } => phase,
        };

        self.state.t += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::testing::play_round;

    fn players(count: usize, num_arms: usize, horizon: usize, seed: u64) -> Vec<SynchComm> {
        (0..count)
            .map(|i| SynchComm::with_seed(num_arms, horizon, seed + i as u64).unwrap())
            .collect()
    }

    #[test]
    fn test_fixation_length() {
        let player = SynchComm::with_seed(4, 2000, 0).unwrap();
        // ceil(4 * e * ln 2000) = ceil(82.65)
        assert_eq!(player.fixation_rounds(), 83);
        assert_eq!(player.phase(), SynchCommPhase::Fixation);
        assert_eq!(player.active_arms(), &[0, 1, 2, 3]);
    }

    #[test]
    fn test_single_player_fixes_on_first_round() {
        let mut player = SynchComm::with_seed(3, 500, 1).unwrap();
        let arm = player.select_arm().unwrap();
        player.update(arm, Observation::new(0.5, false)).unwrap();
        assert_eq!(player.ext_rank(), Some(arm));

        // Stays on its arm for the rest of fixation
        for _ in 0..10 {
            assert_eq!(player.select_arm().unwrap(), arm);
            player.update(arm, Observation::new(0.5, false)).unwrap();
        }
    }

    #[test]
    fn test_collision_delays_fixation() {
        let mut player = SynchComm::with_seed(3, 500, 2).unwrap();
        let arm = player.select_arm().unwrap();
        player.update(arm, Observation::new(0.0, true)).unwrap();
        assert_eq!(player.ext_rank(), None);
    }

    #[test]
    fn test_estimation_finds_ranks_and_player_count() {
        let means = [0.9, 0.7, 0.5, 0.3, 0.1];
        let mut group = players(3, 5, 1000, 40);
        let end_of_estimation = group[0].fixation_rounds() + 2 * 5 + 1;

        for _ in 0..end_of_estimation {
            play_round(&mut group, &means);
        }

        let mut by_ext_rank: Vec<&SynchComm> = group.iter().collect();
        by_ext_rank.sort_by_key(|p| p.ext_rank());
        for (expected_int_rank, player) in by_ext_rank.iter().enumerate() {
            assert_eq!(player.phase(), SynchCommPhase::Exploration);
            assert_eq!(player.num_players(), 3);
            assert_eq!(player.int_rank(), expected_int_rank);
            // ceil(log2(3))
            assert_eq!(player.round_number(), 2);
        }

        let mut ext_ranks: Vec<_> = group.iter().filter_map(|p| p.ext_rank()).collect();
        ext_ranks.sort_unstable();
        ext_ranks.dedup();
        assert_eq!(ext_ranks.len(), 3);
    }

    #[test]
    fn test_single_player_exploits_best_arm() {
        let means = [0.9, 0.5, 0.1];
        let mut group = players(1, 3, 2000, 3);

        for _ in 0..2000 {
            play_round(&mut group, &means);
        }

        let player = &group[0];
        assert_eq!(player.num_players(), 0);
        assert_eq!(player.phase(), SynchCommPhase::Exploitation { arm: 0 });
        assert_eq!(player.outcome(0), Some(ArmOutcome::Accepted));
        assert_eq!(player.outcome(1), Some(ArmOutcome::Rejected));
        assert_eq!(player.outcome(2), Some(ArmOutcome::Rejected));
        assert!(player.active_arms().is_empty());
    }

    #[test]
    fn test_two_players_share_statistics() {
        // 0/1 rewards survive the integer channel without loss
        let means = [1.0, 1.0, 0.0, 0.0];
        let mut group = players(2, 4, 2000, 11);
        let mut active_history = vec![group[0].active_arms().to_vec()];

        for _ in 0..2000 {
            play_round(&mut group, &means);
            let active = group[0].active_arms().to_vec();
            if active != *active_history.last().unwrap() {
                active_history.push(active);
            }
            // Both players hold identical reconstructed statistics after
            // every completed communication phase
            if group.iter().all(|p| p.phase() == SynchCommPhase::Exploration) {
                assert_eq!(group[0].active_arms(), group[1].active_arms());
                assert_eq!(group[0].team_pulls(), group[1].team_pulls());
            }
        }

        // Active arms only ever shrink
        for pair in active_history.windows(2) {
            assert!(pair[1].len() < pair[0].len());
            assert!(pair[1].iter().all(|arm| pair[0].contains(arm)));
        }

        let mut exploited: Vec<usize> = group
            .iter()
            .map(|p| match p.phase() {
                SynchCommPhase::Exploitation { arm } => arm,
                other => panic!("player still in {:?}", other),
            })
            .collect();
        exploited.sort_unstable();
        assert_eq!(exploited, vec![0, 1]);
    }

    #[test]
    fn test_misuse_is_rejected() {
        let mut player = SynchComm::with_seed(3, 100, 5).unwrap();
        assert!(matches!(
            player.update(0, Observation::new(1.0, false)),
            Err(StrategyError::OutOfOrder { .. })
        ));

        let arm = player.select_arm().unwrap();
        assert!(player.select_arm().is_err());
        assert_eq!(
            player.update((arm + 1) % 3, Observation::new(1.0, false)),
            Err(StrategyError::ArmMismatch {
                selected: arm,
                reported: (arm + 1) % 3
            })
        );
        assert_eq!(player.state().t, 0);
    }
}
