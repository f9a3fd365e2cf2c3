use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::CallError;

/// Inclusive range of seconds a delay is drawn from, uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelayRange {
    pub min_secs: f64,
    pub max_secs: f64,
}

impl DelayRange {
    pub const fn new(min_secs: f64, max_secs: f64) -> Self {
        Self { min_secs, max_secs }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.min_secs >= self.max_secs {
            return Duration::from_secs_f64(self.min_secs);
        }
        Duration::from_secs_f64(rng.gen_range(self.min_secs..=self.max_secs))
    }

    pub fn contains(&self, delay: Duration) -> bool {
        delay >= Duration::from_secs_f64(self.min_secs)
            && delay <= Duration::from_secs_f64(self.max_secs)
    }

    fn validate(&self, name: &str) -> Result<(), CallError> {
        let finite = self.min_secs.is_finite() && self.max_secs.is_finite();
        if !finite || self.min_secs < 0.0 || self.min_secs > self.max_secs {
            return Err(CallError::config(format!(
                "{name} delay range [{}, {}] is invalid",
                self.min_secs, self.max_secs
            )));
        }
        Ok(())
    }
}

/// Timing of a simulated conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationPacing {
    /// Gap before each scripted line after the first.
    pub scripted_delay: DelayRange,
    /// Gap before each filler line once the script is used up.
    pub filler_delay: DelayRange,
    /// How long a line stays on screen: floor plus a per-character share.
    pub display_floor: Duration,
    pub display_per_char: Duration,
}

impl Default for ConversationPacing {
    fn default() -> Self {
        Self {
            scripted_delay: DelayRange::new(8.0, 15.0),
            filler_delay: DelayRange::new(20.0, 30.0),
            display_floor: Duration::from_secs(2),
            display_per_char: Duration::from_millis(100),
        }
    }
}

impl ConversationPacing {
    pub fn validate(&self) -> Result<(), CallError> {
        self.scripted_delay.validate("scripted")?;
        self.filler_delay.validate("filler")
    }

    /// Rough speaking time for a line; grows with its length.
    pub fn display_duration(&self, line: &str) -> Duration {
        let chars = line.chars().count() as u32;
        self.display_floor + self.display_per_char.saturating_mul(chars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn sampled_delays_stay_in_range() {
        let pacing = ConversationPacing::default();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10_000 {
            let scripted = pacing.scripted_delay.sample(&mut rng);
            assert!(scripted >= Duration::from_secs(8) && scripted <= Duration::from_secs(15));
            let filler = pacing.filler_delay.sample(&mut rng);
            assert!(filler >= Duration::from_secs(20) && filler <= Duration::from_secs(30));
        }
    }

    #[test]
    fn degenerate_range_is_constant() {
        let range = DelayRange::new(8.0, 8.0);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(range.sample(&mut rng), Duration::from_secs(8));
        assert!(range.contains(Duration::from_secs(8)));
        assert!(!range.contains(Duration::from_millis(8001)));
    }

    #[test]
    fn display_duration_grows_with_length() {
        let pacing = ConversationPacing::default();
        assert_eq!(pacing.display_duration(""), Duration::from_secs(2));
        assert_eq!(pacing.display_duration("Almost home?"), Duration::from_millis(3200));
        assert!(
            pacing.display_duration("I'll meet you at the station.")
                > pacing.display_duration("Almost home?")
        );
    }

    #[test]
    fn inverted_or_negative_ranges_are_rejected() {
        let mut pacing = ConversationPacing::default();
        assert!(pacing.validate().is_ok());

        pacing.scripted_delay = DelayRange::new(15.0, 8.0);
        assert!(matches!(pacing.validate(), Err(CallError::Config(_))));

        pacing.scripted_delay = DelayRange::new(8.0, 15.0);
        pacing.filler_delay = DelayRange::new(-1.0, 30.0);
        assert!(pacing.validate().is_err());

        pacing.filler_delay = DelayRange::new(20.0, f64::NAN);
        assert!(pacing.validate().is_err());
    }
}
