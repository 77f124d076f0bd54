// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Neural Backdrop - Tunables
//
// Every constant that shapes the animation. The host may pass a partial
// object; missing fields fall back to the defaults below.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::NodeType;

// ---------------------------------------------------------------------------
// Span
// ---------------------------------------------------------------------------

/// Closed range a per-entity attribute is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub min: f64,
    pub max: f64,
}

impl Span {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.max > self.min {
            rng.gen_range(self.min..self.max)
        } else {
            self.min
        }
    }

    pub fn contains(&self, v: f64) -> bool {
        v >= self.min && v <= self.max
    }

    fn validate(&self, field: &'static str) -> Result<(), ConfigError> {
        if !(self.max - self.min).is_finite() || self.min > self.max {
            return Err(ConfigError::InvalidSpan {
                field,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Per-type profile
// ---------------------------------------------------------------------------

/// Shape and wiring of one node class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TypeProfile {
    pub base_size: f64,
    /// Each velocity component is `(u - 0.5) * speed`, `u ~ U[0,1)`.
    pub speed: f64,
    pub max_fan_out: usize,
    /// Candidates at or beyond this distance are never connected.
    pub max_distance: f64,
    /// Probability that an in-range candidate is accepted.
    pub acceptance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TypeProfiles {
    pub primary: TypeProfile,
    pub secondary: TypeProfile,
    pub tertiary: TypeProfile,
}

impl Default for TypeProfiles {
    fn default() -> Self {
        Self {
            primary: TypeProfile {
                base_size: 3.0,
                speed: 0.2,
                max_fan_out: 8,
                max_distance: 180.0,
                acceptance: 0.7,
            },
            secondary: TypeProfile {
                base_size: 2.0,
                speed: 0.4,
                max_fan_out: 5,
                max_distance: 120.0,
                acceptance: 0.5,
            },
            tertiary: TypeProfile {
                base_size: 1.5,
                speed: 0.4,
                max_fan_out: 3,
                max_distance: 120.0,
                acceptance: 0.5,
            },
        }
    }
}

impl TypeProfiles {
    pub fn get(&self, node_type: NodeType) -> &TypeProfile {
        match node_type {
            NodeType::Primary => &self.primary,
            NodeType::Secondary => &self.secondary,
            NodeType::Tertiary => &self.tertiary,
        }
    }
}

// ---------------------------------------------------------------------------
// Resize policy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizePolicy {
    /// Scale positions to the new extent, keep topology and packets.
    #[default]
    Rescale,
    /// Build a fresh topology for the new extent and drop live packets.
    Rebuild,
}

// ---------------------------------------------------------------------------
// BackdropConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackdropConfig {
    pub node_count: usize,
    pub primary_ratio: f64,
    pub secondary_ratio: f64,
    pub profiles: TypeProfiles,
    pub phase_speed: Span,
    pub hue: Span,

    pub energy_drift: f64,
    pub emission_threshold: f64,
    /// Simulated seconds a node must wait between emissions.
    pub emission_cooldown: f64,
    /// Independent chance that each outbound edge carries a packet on emission.
    pub emission_probability: f64,
    /// Simulated seconds per tick.
    pub time_step: f64,

    pub packet_speed: Span,
    pub packet_size: Span,
    pub packet_hue_jitter: f64,
    pub packet_progress_scale: f64,
    /// Soft cap on live packets; creations beyond it are skipped.
    pub packet_cap: usize,
    /// Energy added to the destination when a packet arrives.
    pub arrival_energy: f64,

    pub edge_cutoff: f64,
    pub recency_window: f64,
    pub trail_len: usize,
    pub trail_spacing: f64,
    pub background_alpha: f64,

    /// Velocity multiplier applied on each wall bounce. 1.0 is lossless.
    pub bounce_damping: f64,
    pub pointer_radius: f64,
    pub pointer_boost: f64,

    pub resize_policy: ResizePolicy,
    pub seed: Option<u64>,
}

impl Default for BackdropConfig {
    fn default() -> Self {
        Self {
            node_count: 90,
            primary_ratio: 0.22,
            secondary_ratio: 0.34,
            profiles: TypeProfiles::default(),
            phase_speed: Span::new(0.015, 0.04),
            hue: Span::new(180.0, 260.0),

            energy_drift: 0.01,
            emission_threshold: 0.8,
            emission_cooldown: 2.0,
            emission_probability: 0.3,
            time_step: 0.016,

            packet_speed: Span::new(0.8, 2.0),
            packet_size: Span::new(1.0, 3.0),
            packet_hue_jitter: 15.0,
            packet_progress_scale: 0.01,
            packet_cap: 300,
            arrival_energy: 0.05,

            edge_cutoff: 200.0,
            recency_window: 1.0,
            trail_len: 3,
            trail_spacing: 0.1,
            background_alpha: 0.95,

            bounce_damping: 1.0,
            pointer_radius: 150.0,
            pointer_boost: 0.05,

            resize_policy: ResizePolicy::Rescale,
            seed: None,
        }
    }
}

impl BackdropConfig {
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    /// Leading primaries and secondaries for `node_count` nodes.
    pub fn type_counts(&self) -> (usize, usize) {
        let n = self.node_count as f64;
        let primary = ((n * self.primary_ratio).round() as usize).min(self.node_count);
        let cumulative = (n * (self.primary_ratio + self.secondary_ratio)).round() as usize;
        let secondary = cumulative.min(self.node_count).saturating_sub(primary);
        (primary, secondary)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        unit("primary_ratio", self.primary_ratio)?;
        unit("secondary_ratio", self.secondary_ratio)?;
        if self.primary_ratio + self.secondary_ratio > 1.0 + 1e-9 {
            return Err(ConfigError::RatioOverflow {
                primary: self.primary_ratio,
                secondary: self.secondary_ratio,
            });
        }
        for node_type in NodeType::ALL {
            let p = self.profiles.get(node_type);
            non_negative("profile.base_size", p.base_size)?;
            non_negative("profile.speed", p.speed)?;
            non_negative("profile.max_distance", p.max_distance)?;
            unit("profile.acceptance", p.acceptance)?;
        }
        self.phase_speed.validate("phase_speed")?;
        non_negative("phase_speed.min", self.phase_speed.min)?;
        self.hue.validate("hue")?;

        unit("energy_drift", self.energy_drift)?;
        unit("emission_threshold", self.emission_threshold)?;
        non_negative("emission_cooldown", self.emission_cooldown)?;
        unit("emission_probability", self.emission_probability)?;
        if !(self.time_step.is_finite() && self.time_step > 0.0) {
            return Err(ConfigError::OutOfRange {
                field: "time_step",
                value: self.time_step,
                min: f64::MIN_POSITIVE,
                max: f64::MAX,
            });
        }

        self.packet_speed.validate("packet_speed")?;
        if self.packet_speed.min <= 0.0 {
            return Err(ConfigError::OutOfRange {
                field: "packet_speed.min",
                value: self.packet_speed.min,
                min: f64::MIN_POSITIVE,
                max: f64::MAX,
            });
        }
        self.packet_size.validate("packet_size")?;
        non_negative("packet_hue_jitter", self.packet_hue_jitter)?;
        non_negative("packet_progress_scale", self.packet_progress_scale)?;
        unit("arrival_energy", self.arrival_energy)?;

        non_negative("edge_cutoff", self.edge_cutoff)?;
        non_negative("recency_window", self.recency_window)?;
        non_negative("trail_spacing", self.trail_spacing)?;
        unit("background_alpha", self.background_alpha)?;

        unit("bounce_damping", self.bounce_damping)?;
        non_negative("pointer_radius", self.pointer_radius)?;
        unit("pointer_boost", self.pointer_boost)?;
        Ok(())
    }
}

fn unit(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            min: 0.0,
            max: 1.0,
        })
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            min: 0.0,
            max: f64::MAX,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(BackdropConfig::default().validate().is_ok());
    }

    #[test]
    fn test_default_type_split() {
        // 90 nodes: 20 primary, 30 secondary, 40 tertiary
        let cfg = BackdropConfig::default();
        assert_eq!(cfg.type_counts(), (20, 30));
    }

    #[test]
    fn test_type_split_degenerate_counts() {
        let cfg = BackdropConfig {
            node_count: 0,
            ..BackdropConfig::default()
        };
        assert_eq!(cfg.type_counts(), (0, 0));

        let cfg = BackdropConfig {
            node_count: 3,
            primary_ratio: 1.0,
            secondary_ratio: 0.0,
            ..BackdropConfig::default()
        };
        assert_eq!(cfg.type_counts(), (3, 0));
    }

    #[test]
    fn test_ratio_overflow_rejected() {
        let cfg = BackdropConfig {
            primary_ratio: 0.7,
            secondary_ratio: 0.5,
            ..BackdropConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::RatioOverflow { .. })));
    }

    #[test]
    fn test_probability_out_of_range_rejected() {
        let cfg = BackdropConfig {
            emission_probability: 1.5,
            ..BackdropConfig::default()
        };
        match cfg.validate() {
            Err(ConfigError::OutOfRange { field, .. }) => {
                assert_eq!(field, "emission_probability")
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_inverted_span_rejected() {
        let cfg = BackdropConfig {
            packet_speed: Span::new(2.0, 1.0),
            ..BackdropConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidSpan { .. })));
    }

    #[test]
    fn test_negative_phase_speed_rejected() {
        let cfg = BackdropConfig {
            phase_speed: Span::new(-0.04, -0.015),
            ..BackdropConfig::seeded(1)
        };
        match cfg.validate() {
            Err(ConfigError::OutOfRange { field, .. }) => assert_eq!(field, "phase_speed.min"),
            other => panic!("unexpected: {:?}", other),
        }

        let still = BackdropConfig {
            phase_speed: Span::new(0.0, 0.0),
            ..BackdropConfig::default()
        };
        assert!(still.validate().is_ok());
    }

    #[test]
    fn test_energy_drift_bounded_to_unit() {
        for drift in [f64::MAX, 1.5, -0.1, f64::NAN] {
            let cfg = BackdropConfig {
                energy_drift: drift,
                ..BackdropConfig::default()
            };
            match cfg.validate() {
                Err(ConfigError::OutOfRange { field, .. }) => assert_eq!(field, "energy_drift"),
                other => panic!("drift {drift}: unexpected {:?}", other),
            }
        }
    }

    #[test]
    fn test_span_with_overflowing_width_rejected() {
        let cfg = BackdropConfig {
            hue: Span::new(-f64::MAX, f64::MAX),
            ..BackdropConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidSpan { field: "hue", .. })
        ));

        let cfg = BackdropConfig {
            packet_speed: Span::new(1.0, f64::INFINITY),
            ..BackdropConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidSpan { .. })));
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let cfg: BackdropConfig =
            serde_json::from_str(r#"{"node_count": 12, "resize_policy": "rebuild", "seed": 7}"#)
                .unwrap();
        assert_eq!(cfg.node_count, 12);
        assert_eq!(cfg.resize_policy, ResizePolicy::Rebuild);
        assert_eq!(cfg.seed, Some(7));
        assert_eq!(cfg.edge_cutoff, 200.0);
    }

    #[test]
    fn test_span_sample_within_bounds() {
        use rand::SeedableRng;
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(3);
        let span = Span::new(0.8, 2.0);
        for _ in 0..100 {
            assert!(span.contains(span.sample(&mut rng)));
        }
        assert_eq!(Span::new(1.0, 1.0).sample(&mut rng), 1.0);
    }
}
