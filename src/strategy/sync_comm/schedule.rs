//! Communication-phase bit schedule
//!
//! During a communication phase the players take turns by internal rank.
//! Rank `i` owns the window `[i·W, (i+1)·W)` with
//! `W = (M-1)·K·(round_number+2)`. Inside a window the local offset
//! `t0 = t_phase mod W` decomposes as
//!
//! ```text
//! t0 = bit + (round_number+2)·(channel + K·peer_offset)
//! ```
//!
//! so every (peer, active arm, bit) triple gets exactly one time step. The
//! sender pulls the receiver's seat `active_arms[peer]` to transmit a one
//! and its own seat to transmit a zero; every other player sits on its own
//! seat and reads a collision as a one.

/// Role of a player at one communication time step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommSlot {
    /// This player owns the window and addresses `peer`
    Send {
        /// Bit position of the statistic
        bit: u32,
        /// Index into the active arm list of the arm being described
        channel: usize,
        /// Internal rank of the receiving player
        peer: usize,
    },

    /// Another player owns the window, a collision means `bit` is set
    Listen {
        /// Internal rank of the sending player
        sender: usize,
        /// Bit position of the statistic
        bit: u32,
        /// Index into the active arm list of the arm being described
        channel: usize,
    },

    /// Nothing to exchange (single player or past the end of the phase)
    Idle,
}

/// Timing parameters of one communication phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommSchedule {
    /// Number of active players (M)
    pub num_players: usize,

    /// Number of active arms (K)
    pub num_arms: usize,

    /// Exploration/communication round index
    pub round_number: usize,
}

impl CommSchedule {
    /// Create a schedule for the given round
    pub fn new(num_players: usize, num_arms: usize, round_number: usize) -> Self {
        Self {
            num_players,
            num_arms,
            round_number,
        }
    }

    /// Bits sent per statistic
    pub fn bits(&self) -> usize {
        self.round_number + 2
    }

    /// Length of one sender's window
    pub fn window(&self) -> usize {
        self.num_players.saturating_sub(1) * self.num_arms * self.bits()
    }

    /// Total length of the phase
    pub fn len(&self) -> usize {
        self.num_players * self.window()
    }

    /// True when there is nobody to talk to
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Role of the player with internal rank `int_rank` at `t_phase`
    pub fn slot(&self, t_phase: usize, int_rank: usize) -> CommSlot {
        let window = self.window();
        if window == 0 || t_phase >= self.len() {
            return CommSlot::Idle;
        }

        let bits = self.bits();
        let t0 = t_phase % window;
        let bit = t0 % bits;
        let channel = (t0 / bits) % self.num_arms;
        let sender = t_phase / window;

        if sender == int_rank {
            let offset = (t0 - bit - bits * channel) / (bits * self.num_arms);
            let peer = if offset >= int_rank { offset + 1 } else { offset };
            CommSlot::Send {
                bit: bit as u32,
                channel,
                peer,
            }
        } else {
            CommSlot::Listen {
                sender,
                bit: bit as u32,
                channel,
            }
        }
    }
}

/// Integer form of a statistic as it goes over the collision channel
pub fn quantize(statistic: f64) -> u64 {
    if statistic.is_finite() && statistic > 0.0 {
        statistic as u64
    } else {
        0
    }
}

/// Whether bit `bit` of `value` is set
pub fn bit_is_set(value: u64, bit: u32) -> bool {
    bit < u64::BITS && (value >> bit) & 1 == 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lengths() {
        let schedule = CommSchedule::new(3, 4, 1);
        assert_eq!(schedule.bits(), 3);
        assert_eq!(schedule.window(), 2 * 4 * 3);
        assert_eq!(schedule.len(), 3 * 24);

        let single = CommSchedule::new(1, 4, 5);
        assert!(single.is_empty());
        assert_eq!(single.slot(0, 0), CommSlot::Idle);
    }

    #[test]
    fn test_every_triple_gets_one_step() {
        let schedule = CommSchedule::new(3, 4, 2);
        for sender in 0..3 {
            let mut seen = std::collections::HashSet::new();
            for t in sender * schedule.window()..(sender + 1) * schedule.window() {
                match schedule.slot(t, sender) {
                    CommSlot::Send { bit, channel, peer } => {
                        assert_ne!(peer, sender);
                        assert!(peer < 3);
                        assert!(channel < 4);
                        assert!((bit as usize) < schedule.bits());
                        assert!(seen.insert((peer, channel, bit)));
                    }
                    other => panic!("sender should be sending, got {:?}", other),
                }
            }
            assert_eq!(seen.len(), 2 * 4 * schedule.bits());
        }
    }

    #[test]
    fn test_listeners_agree_with_sender() {
        let schedule = CommSchedule::new(3, 2, 0);
        for t in 0..schedule.len() {
            let sender = t / schedule.window();
            let CommSlot::Send { bit, channel, .. } = schedule.slot(t, sender) else {
                panic!("owner of the window must send");
            };
            for rank in (0..3).filter(|&r| r != sender) {
                assert_eq!(
                    schedule.slot(t, rank),
                    CommSlot::Listen {
                        sender,
                        bit,
                        channel
                    }
                );
            }
        }
    }

    #[test]
    fn test_statistic_round_trip() {
        // Sender encodes one statistic per active arm; each receiver rebuilds
        // it purely from the collisions it observes on its own seat.
        for (num_players, num_arms, round_number) in [(2, 4, 1), (3, 3, 2), (4, 5, 0)] {
            let schedule = CommSchedule::new(num_players, num_arms, round_number);
            let max = 1u64 << schedule.bits();
            let stats: Vec<Vec<u64>> = (0..num_players)
                .map(|p| (0..num_arms).map(|k| (p as u64 * 7 + k as u64 * 3 + 1) % max).collect())
                .collect();

            let mut received = vec![vec![vec![0u64; num_arms]; num_players]; num_players];
            for t in 0..schedule.len() {
                let sender = t / schedule.window();
                let CommSlot::Send { bit, channel, peer } = schedule.slot(t, sender) else {
                    panic!("owner of the window must send");
                };
                let collision = bit_is_set(stats[sender][channel], bit);
                if !collision {
                    continue;
                }
                match schedule.slot(t, peer) {
                    CommSlot::Listen {
                        sender: from,
                        bit,
                        channel,
                    } => received[peer][from][channel] += 1 << bit,
                    other => panic!("receiver should listen, got {:?}", other),
                }
            }

            for receiver in 0..num_players {
                for sender in (0..num_players).filter(|&s| s != receiver) {
                    assert_eq!(received[receiver][sender], stats[sender]);
                }
            }
        }
    }

    #[test]
    fn test_quantize() {
        assert_eq!(quantize(5.9), 5);
        assert_eq!(quantize(0.0), 0);
        assert_eq!(quantize(-1.0), 0);
        assert_eq!(quantize(f64::NAN), 0);
        assert!(bit_is_set(5, 0));
        assert!(!bit_is_set(5, 1));
        assert!(bit_is_set(5, 2));
        assert!(!bit_is_set(5, 70));
    }
}
