use std::fmt;
use std::ops::RangeInclusive;
use std::sync::Arc;

use rand::RngCore;
use thiserror::Error;

use crate::model::{Question, RemainderPolicy};
use crate::topics::Topic;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RegistryError {
    #[error("a registry needs at least one topic")]
    NoTopics,
    #[error("{total} sublevels cannot be shared by {topics} topics")]
    TooFewSublevels { total: u32, topics: usize },
    #[error("sublevel {sublevel} is outside 1..={total}")]
    OutOfRange { sublevel: u32, total: u32 },
    #[error("expected a range starting at {expected}, found {found}")]
    NotContiguous { expected: u32, found: u32 },
    #[error("range {start}..={end} is empty")]
    EmptyRange { start: u32, end: u32 },
    #[error("ranges cover 1..={covered} but the run has {total} sublevels")]
    Incomplete { covered: u32, total: u32 },
}

/// A topic and the sublevels it governs.
#[derive(Clone)]
pub struct TopicSlot {
    topic: Arc<dyn Topic>,
    start: u32,
    end: u32,
}

impl TopicSlot {
    #[must_use]
    pub fn topic(&self) -> &dyn Topic {
        self.topic.as_ref()
    }

    #[must_use]
    pub fn range(&self) -> RangeInclusive<u32> {
        self.start..=self.end
    }
}

impl fmt::Debug for TopicSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TopicSlot")
            .field("topic", &self.topic.name())
            .field("start", &self.start)
            .field("end", &self.end)
            .finish()
    }
}

/// Result of `TopicRegistry::resolve`.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedTopic<'a> {
    pub slot: &'a TopicSlot,
    /// `sublevel - start`, zero-based.
    pub local_index: u32,
}

impl ResolvedTopic<'_> {
    #[must_use]
    pub fn topic(&self) -> &dyn Topic {
        self.slot.topic()
    }
}

/// Ordered topics whose ranges partition `1..=total_sublevels`.
#[derive(Debug, Clone)]
pub struct TopicRegistry {
    slots: Vec<TopicSlot>,
    total_sublevels: u32,
}

impl TopicRegistry {
    /// Split `total_sublevels` across `topics` as evenly as possible.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::NoTopics` for an empty list and
    /// `RegistryError::TooFewSublevels` when some topic would get no
    /// sublevel at all.
    pub fn partitioned(
        topics: Vec<Arc<dyn Topic>>,
        total_sublevels: u32,
        remainder: RemainderPolicy,
    ) -> Result<Self, RegistryError> {
        let count = topics.len();
        if count == 0 {
            return Err(RegistryError::NoTopics);
        }
        let n = u32::try_from(count).map_err(|_| RegistryError::TooFewSublevels {
            total: total_sublevels,
            topics: count,
        })?;
        if total_sublevels < n {
            return Err(RegistryError::TooFewSublevels {
                total: total_sublevels,
                topics: count,
            });
        }

        let base = total_sublevels / n;
        let extra = total_sublevels % n;
        let last = n - 1;

        let mut slots = Vec::with_capacity(count);
        let mut start = 1_u32;
        for (i, topic) in (0_u32..).zip(topics) {
            let size = match remainder {
                RemainderPolicy::LastTopic if i == last => base + extra,
                RemainderPolicy::LastTopic => base,
                RemainderPolicy::Spread if i < extra => base + 1,
                RemainderPolicy::Spread => base,
            };
            let end = start + size - 1;
            slots.push(TopicSlot { topic, start, end });
            start = end + 1;
        }

        Ok(Self {
            slots,
            total_sublevels,
        })
    }

    /// Use explicit ranges, which must be contiguous from 1 and end at
    /// `total_sublevels`.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError` describing the first gap, overlap, or
    /// shortfall.
    pub fn from_ranges(
        ranges: Vec<(Arc<dyn Topic>, RangeInclusive<u32>)>,
        total_sublevels: u32,
    ) -> Result<Self, RegistryError> {
        if ranges.is_empty() {
            return Err(RegistryError::NoTopics);
        }

        let mut slots = Vec::with_capacity(ranges.len());
        let mut expected = 1_u32;
        for (topic, range) in ranges {
            let (start, end) = range.into_inner();
            if start != expected {
                return Err(RegistryError::NotContiguous {
                    expected,
                    found: start,
                });
            }
            if end < start {
                return Err(RegistryError::EmptyRange { start, end });
            }
            slots.push(TopicSlot { topic, start, end });
            expected = end.saturating_add(1);
        }

        let covered = expected - 1;
        if covered != total_sublevels {
            return Err(RegistryError::Incomplete {
                covered,
                total: total_sublevels,
            });
        }

        Ok(Self {
            slots,
            total_sublevels,
        })
    }

    #[must_use]
    pub fn total_sublevels(&self) -> u32 {
        self.total_sublevels
    }

    #[must_use]
    pub fn slots(&self) -> &[TopicSlot] {
        &self.slots
    }

    /// Find the topic governing `sublevel`.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::OutOfRange` outside `1..=total_sublevels`.
    pub fn resolve(&self, sublevel: u32) -> Result<ResolvedTopic<'_>, RegistryError> {
        let out_of_range = RegistryError::OutOfRange {
            sublevel,
            total: self.total_sublevels,
        };
        if sublevel == 0 || sublevel > self.total_sublevels {
            return Err(out_of_range);
        }

        let idx = self.slots.partition_point(|slot| slot.end < sublevel);
        let slot = self.slots.get(idx).ok_or(out_of_range)?;
        Ok(ResolvedTopic {
            slot,
            local_index: sublevel - slot.start,
        })
    }

    /// Resolve `sublevel` and generate a fresh question for it.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::OutOfRange` outside `1..=total_sublevels`.
    pub fn generate(&self, sublevel: u32, rng: &mut dyn RngCore) -> Result<Question, RegistryError> {
        let resolved = self.resolve(sublevel)?;
        Ok(resolved.topic().generate(resolved.local_index, rng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Answer, Question};

    #[derive(Debug)]
    struct Named(&'static str);

    impl Topic for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn generate(&self, local_index: u32, _rng: &mut dyn RngCore) -> Question {
            Question::new(self.0, format!("#{local_index}"), Answer::Open)
        }
    }

    fn topics(names: &[&'static str]) -> Vec<Arc<dyn Topic>> {
        names
            .iter()
            .map(|n| Arc::new(Named(n)) as Arc<dyn Topic>)
            .collect()
    }

    fn ranges(registry: &TopicRegistry) -> Vec<RangeInclusive<u32>> {
        registry.slots().iter().map(TopicSlot::range).collect()
    }

    #[test]
    fn remainder_goes_to_last_topic() {
        let registry =
            TopicRegistry::partitioned(topics(&["a", "b", "c"]), 11, RemainderPolicy::LastTopic)
                .unwrap();
        assert_eq!(ranges(&registry), vec![1..=3, 4..=6, 7..=11]);
    }

    #[test]
    fn spread_remainder_over_first_topics() {
        let registry =
            TopicRegistry::partitioned(topics(&["a", "b", "c"]), 11, RemainderPolicy::Spread)
                .unwrap();
        assert_eq!(ranges(&registry), vec![1..=4, 5..=8, 9..=11]);
    }

    #[test]
    fn every_sublevel_resolves_to_exactly_one_topic() {
        for total in [4_u32, 5, 17, 500] {
            for policy in [RemainderPolicy::LastTopic, RemainderPolicy::Spread] {
                let registry =
                    TopicRegistry::partitioned(topics(&["a", "b", "c", "d"]), total, policy)
                        .unwrap();
                for n in 1..=total {
                    let hits = registry
                        .slots()
                        .iter()
                        .filter(|s| s.range().contains(&n))
                        .count();
                    assert_eq!(hits, 1, "sublevel {n} of {total}");
                    let resolved = registry.resolve(n).unwrap();
                    assert!(resolved.slot.range().contains(&n));
                    assert_eq!(resolved.local_index, n - resolved.slot.range().start());
                }
                let last = registry.slots().last().unwrap();
                assert_eq!(*last.range().end(), total);
            }
        }
    }

    #[test]
    fn resolve_rejects_out_of_range() {
        let registry =
            TopicRegistry::partitioned(topics(&["a"]), 3, RemainderPolicy::LastTopic).unwrap();
        assert_eq!(
            registry.resolve(0).unwrap_err(),
            RegistryError::OutOfRange {
                sublevel: 0,
                total: 3
            }
        );
        assert!(registry.resolve(4).is_err());
    }

    #[test]
    fn too_few_sublevels() {
        let err = TopicRegistry::partitioned(topics(&["a", "b", "c"]), 2, RemainderPolicy::LastTopic)
            .unwrap_err();
        assert_eq!(err, RegistryError::TooFewSublevels { total: 2, topics: 3 });
        assert_eq!(
            TopicRegistry::partitioned(Vec::new(), 2, RemainderPolicy::LastTopic).unwrap_err(),
            RegistryError::NoTopics
        );
    }

    #[test]
    fn explicit_ranges_must_tile() {
        let mut t = topics(&["a", "b"]);
        let b = t.pop().unwrap();
        let a = t.pop().unwrap();

        let ok = TopicRegistry::from_ranges(vec![(a.clone(), 1..=2), (b.clone(), 3..=5)], 5)
            .unwrap();
        assert_eq!(ok.resolve(3).unwrap().topic().name(), "b");

        assert_eq!(
            TopicRegistry::from_ranges(vec![(a.clone(), 1..=2), (b.clone(), 4..=5)], 5)
                .unwrap_err(),
            RegistryError::NotContiguous {
                expected: 3,
                found: 4
            }
        );
        assert_eq!(
            TopicRegistry::from_ranges(vec![(a, 1..=2), (b, 3..=4)], 5).unwrap_err(),
            RegistryError::Incomplete {
                covered: 4,
                total: 5
            }
        );
    }

    #[test]
    fn generate_passes_local_index() {
        let registry =
            TopicRegistry::partitioned(topics(&["a", "b"]), 6, RemainderPolicy::LastTopic)
                .unwrap();
        let mut rng = rand::rng();
        let q = registry.generate(5, &mut rng).unwrap();
        assert_eq!(q.topic(), "b");
        assert_eq!(q.prompt(), "#1");
    }
}
