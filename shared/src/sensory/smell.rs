use bevy::math::Vec3;

use crate::registry::AgentId;

/// A point emitter as seen by the smell sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScentSource {
    pub id: AgentId,
    pub position: Vec3,
    /// Current (already faded) intensity
    pub intensity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SmellReading {
    Detected {
        /// Unit vector from the sniffer toward the source
        direction: Vec3,
        distance: f32,
        source: AgentId,
    },
    #[default]
    NotDetected,
}

impl SmellReading {
    pub fn is_detected(&self) -> bool {
        matches!(self, SmellReading::Detected { .. })
    }

    pub fn distance(&self) -> Option<f32> {
        match *self {
            SmellReading::Detected { distance, .. } => Some(distance),
            SmellReading::NotDetected => None,
        }
    }

    pub fn direction(&self) -> Option<Vec3> {
        match *self {
            SmellReading::Detected { direction, .. } => Some(direction),
            SmellReading::NotDetected => None,
        }
    }
}

/// Nearest source strictly inside `range`. Fully faded sources are ignored.
pub fn smell<'a>(
    origin: Vec3,
    sources: impl IntoIterator<Item = &'a ScentSource>,
    range: f32,
) -> SmellReading {
    let nearest = sources
        .into_iter()
        .filter(|s| s.intensity > 0.0)
        .map(|s| (s, origin.distance(s.position)))
        .filter(|(_, distance)| *distance < range)
        .min_by(|(_, a), (_, b)| a.total_cmp(b));

    match nearest {
        Some((source, distance)) => SmellReading::Detected {
            direction: (source.position - origin).normalize_or_zero(),
            distance,
            source: source.id,
        },
        None => SmellReading::NotDetected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(id: u64, position: Vec3) -> ScentSource {
        ScentSource {
            id: AgentId(id),
            position,
            intensity: 1.0,
        }
    }

    #[test]
    fn test_nothing_to_smell() {
        assert_eq!(smell(Vec3::ZERO, &[], 50.0), SmellReading::NotDetected);
    }

    #[test]
    fn test_picks_nearest_source() {
        let sources = [
            source(1, Vec3::new(30.0, 0.0, 0.0)),
            source(2, Vec3::new(0.0, 0.0, -10.0)),
        ];
        let reading = smell(Vec3::ZERO, &sources, 50.0);
        assert_eq!(
            reading,
            SmellReading::Detected {
                direction: Vec3::NEG_Z,
                distance: 10.0,
                source: AgentId(2),
            }
        );
    }

    #[test]
    fn test_range_is_exclusive() {
        let sources = [source(1, Vec3::new(50.0, 0.0, 0.0))];
        assert!(!smell(Vec3::ZERO, &sources, 50.0).is_detected());
    }

    #[test]
    fn test_faded_sources_are_ignored() {
        let mut faded = source(1, Vec3::X);
        faded.intensity = 0.0;
        let sources = [faded, source(2, Vec3::new(0.0, 20.0, 0.0))];
        assert_eq!(smell(Vec3::ZERO, &sources, 50.0).distance(), Some(20.0));
    }
}
