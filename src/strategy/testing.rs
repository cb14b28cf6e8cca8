//! Lockstep harness for strategy unit tests

use super::{Observation, PlayerStrategy};

/// Play one round: every player selects, collisions are resolved, every
/// player is updated. Rewards are deterministic (`means[arm]`, zero on
/// collision). Returns the chosen arms.
pub(crate) fn play_round<S: PlayerStrategy>(players: &mut [S], means: &[f64]) -> Vec<usize> {
    let choices: Vec<usize> = players
        .iter_mut()
        .map(|p| p.select_arm().unwrap())
        .collect();

    for (player, &arm) in players.iter_mut().zip(&choices) {
        let collided = choices.iter().filter(|&&other| other == arm).count() > 1;
        let reward = if collided { 0.0 } else { means[arm] };
        player.update(arm, Observation::new(reward, collided)).unwrap();
    }

    choices
}
