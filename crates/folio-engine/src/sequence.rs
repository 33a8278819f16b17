//! Fractional ordering keys for siblings.
//!
//! New siblings get sequence values interpolated inside an open interval
//! around the insertion point, so no existing sibling has to move.

use serde::{Deserialize, Serialize};

use crate::blocks::Block;
use crate::model::{BlockId, BlockRecord};

/// Width of the interval used when two neighbours share a sequence.
pub const COLLISION_EPSILON: f64 = 0.1;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SequenceError {
    #[error("Target block not found in parent: {0}")]
    TargetNotFound(BlockId),
}

/// Anything that sits in a sibling list and carries a sequence.
pub trait Sequenced {
    fn sequence(&self) -> f64;
    fn block_id(&self) -> Option<&BlockId>;
}

impl<S: Sequenced> Sequenced for &S {
    fn sequence(&self) -> f64 {
        (**self).sequence()
    }

    fn block_id(&self) -> Option<&BlockId> {
        (**self).block_id()
    }
}

impl Sequenced for Block {
    fn sequence(&self) -> f64 {
        Block::sequence(self)
    }

    fn block_id(&self) -> Option<&BlockId> {
        self.id()
    }
}

impl Sequenced for BlockRecord {
    fn sequence(&self) -> f64 {
        self.sequence
    }

    fn block_id(&self) -> Option<&BlockId> {
        self.id.as_ref()
    }
}

/// Where new siblings go, relative to the existing ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsertTarget {
    /// Before every existing sibling.
    Start,
    /// Next to the sibling with this id.
    Block(BlockId),
    /// After every existing sibling (the "type here" input at the end).
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    Before,
    #[default]
    After,
}

/// Result of [`allocate`]: where to splice and the open interval to fill.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Allocation {
    /// Index in the sibling list at which the new siblings are spliced in.
    pub insert_index: usize,
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

impl Allocation {
    pub fn step(&self) -> f64 {
        (self.end - self.start) / (self.count as f64 + 1.0)
    }

    /// The `count` evenly spaced values strictly inside `(start, end)`.
    pub fn values(&self) -> Vec<f64> {
        let step = self.step();
        (1..=self.count)
            .map(|i| self.start + step * i as f64)
            .collect()
    }
}

/// Compute the interval for `count` new siblings placed at `target`.
///
/// Fails with [`SequenceError::TargetNotFound`] when `target` names a block
/// that is not among `siblings`; nothing should be mutated in that case.
pub fn allocate<S: Sequenced>(
    siblings: &[S],
    target: &InsertTarget,
    position: Position,
    count: usize,
) -> Result<Allocation, SequenceError> {
    let n = count as f64;
    let (insert_index, start, end) = match target {
        InsertTarget::Start => prepend(siblings, n),
        InsertTarget::End => match siblings.last() {
            Some(last) => {
                let start = last.sequence();
                (siblings.len(), start, start + n + 1.0)
            }
            None => prepend(siblings, n),
        },
        InsertTarget::Block(id) => {
            let index = siblings
                .iter()
                .position(|s| s.block_id() == Some(id))
                .ok_or_else(|| SequenceError::TargetNotFound(id.clone()))?;
            let current = siblings[index].sequence();
            match position {
                Position::After => match siblings.get(index + 1) {
                    Some(next) => (index + 1, current, next.sequence()),
                    None => (index + 1, current, current + n + 1.0),
                },
                Position::Before if index == 0 => (0, current - (n + 1.0), current),
                Position::Before => (index, siblings[index - 1].sequence(), current),
            }
        }
    };

    let end = if start == end {
        log::warn!(
            "Logic Error: sibling sequences collide at {start}, falling back to an interval of {COLLISION_EPSILON}"
        );
        start + COLLISION_EPSILON
    } else {
        if start > end {
            log::warn!("Logic Error: sibling sequences out of order ({start} > {end})");
        }
        end
    };

    Ok(Allocation {
        insert_index,
        start,
        end,
        count,
    })
}

/// `(-1, n)` when that interval stays below the first sibling, otherwise the
/// same interval as inserting before the first sibling.
fn prepend<S: Sequenced>(siblings: &[S], n: f64) -> (usize, f64, f64) {
    match siblings.first() {
        Some(first) if first.sequence() <= n - 1.0 => {
            let end = first.sequence();
            (0, end - (n + 1.0), end)
        }
        _ => (0, -1.0, n),
    }
}

/// Give nested children dense sequences `0, 1, 2, ...` in list order.
///
/// Used on freshly parsed records whose top level is placed by [`allocate`].
pub fn fix_nested(records: &mut [BlockRecord]) {
    for record in records {
        for (index, child) in record.children.iter_mut().enumerate() {
            child.sequence = index as f64;
        }
        fix_nested(&mut record.children);
    }
}

/// Evenly spaced replacement sequences `1..=len` for a sibling list whose
/// intervals have shrunk too far.
pub fn renormalized(len: usize) -> impl Iterator<Item = f64> {
    (1..=len).map(|i| i as f64)
}

/// Whether sequences strictly increase in list order.
pub fn is_strictly_increasing<S: Sequenced>(siblings: &[S]) -> bool {
    siblings
        .windows(2)
        .all(|pair| pair[0].sequence() < pair[1].sequence())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn siblings(sequences: &[f64]) -> Vec<BlockRecord> {
        sequences
            .iter()
            .enumerate()
            .map(|(i, seq)| {
                let mut record = BlockRecord::new("paragraph");
                record.id = Some(BlockId::Remote(i as i64 + 1));
                record.sequence = *seq;
                record
            })
            .collect()
    }

    fn target(id: i64) -> InsertTarget {
        InsertTarget::Block(BlockId::Remote(id))
    }

    #[rstest]
    // between two siblings
    #[case(&[10.0, 20.0], target(1), Position::After, 4, 1, 10.0, 20.0)]
    // after the last sibling
    #[case(&[10.0], target(1), Position::After, 4, 1, 10.0, 15.0)]
    // before the first sibling
    #[case(&[10.0], target(1), Position::Before, 4, 0, 5.0, 10.0)]
    // before a middle sibling
    #[case(&[10.0, 20.0, 30.0], target(3), Position::Before, 1, 2, 20.0, 30.0)]
    // prepend to an empty list
    #[case(&[], InsertTarget::Start, Position::Before, 4, 0, -1.0, 4.0)]
    // prepend above existing siblings
    #[case(&[100.0], InsertTarget::Start, Position::Before, 4, 0, -1.0, 4.0)]
    // append through the input sentinel
    #[case(&[100.0], InsertTarget::End, Position::After, 4, 1, 100.0, 105.0)]
    // append to an empty list
    #[case(&[], InsertTarget::End, Position::After, 2, 0, -1.0, 2.0)]
    fn allocation_scenarios(
        #[case] seqs: &[f64],
        #[case] target: InsertTarget,
        #[case] position: Position,
        #[case] count: usize,
        #[case] insert_index: usize,
        #[case] start: f64,
        #[case] end: f64,
    ) {
        let alloc = allocate(&siblings(seqs), &target, position, count).unwrap();
        assert_eq!((alloc.insert_index, alloc.start, alloc.end), (insert_index, start, end));
    }

    #[test]
    fn interpolates_evenly_between_neighbours() {
        let alloc = allocate(&siblings(&[10.0, 20.0]), &target(1), Position::After, 4).unwrap();
        assert_eq!(alloc.values(), vec![12.0, 14.0, 16.0, 18.0]);
    }

    #[test]
    fn append_after_last_leaves_headroom() {
        let alloc = allocate(&siblings(&[10.0]), &target(1), Position::After, 4).unwrap();
        assert_eq!(alloc.values(), vec![11.0, 12.0, 13.0, 14.0]);
    }

    #[test]
    fn prepend_before_first() {
        let alloc = allocate(&siblings(&[10.0]), &target(1), Position::Before, 4).unwrap();
        assert_eq!(alloc.values(), vec![6.0, 7.0, 8.0, 9.0]);
    }

    #[test]
    fn start_falls_back_below_low_first_sibling() {
        // Given a first sibling at 0, the plain (-1, n) interval would collide
        let alloc = allocate(&siblings(&[0.0, 1.0]), &InsertTarget::Start, Position::Before, 2)
            .unwrap();

        // Then the values still land below it
        assert_eq!((alloc.start, alloc.end), (-3.0, 0.0));
        assert!(alloc.values().iter().all(|v| *v < 0.0));
    }

    #[test]
    fn missing_target_is_an_error() {
        let err = allocate(&siblings(&[1.0, 2.0]), &target(99), Position::After, 1).unwrap_err();
        assert_eq!(err, SequenceError::TargetNotFound(BlockId::Remote(99)));
        assert_eq!(err.to_string(), "Target block not found in parent: 99");
    }

    #[test]
    fn colliding_neighbours_use_epsilon_interval() {
        let alloc = allocate(&siblings(&[5.0, 5.0]), &target(1), Position::After, 1).unwrap();
        assert_eq!((alloc.start, alloc.end), (5.0, 5.0 + COLLISION_EPSILON));
        assert!(alloc.values()[0] > 5.0);
    }

    #[rstest]
    #[case(InsertTarget::Start, Position::Before)]
    #[case(target(1), Position::Before)]
    #[case(target(1), Position::After)]
    #[case(target(2), Position::Before)]
    #[case(target(3), Position::After)]
    #[case(InsertTarget::End, Position::After)]
    fn insertion_keeps_sequences_increasing(#[case] target: InsertTarget, #[case] position: Position) {
        // Given
        let mut list = siblings(&[1.0, 2.0, 3.0]);

        // When three values are spliced in at the allocated index
        let alloc = allocate(&list, &target, position, 3).unwrap();
        let new: Vec<BlockRecord> = alloc
            .values()
            .into_iter()
            .map(|seq| {
                let mut record = BlockRecord::new("text");
                record.sequence = seq;
                record
            })
            .collect();
        list.splice(alloc.insert_index..alloc.insert_index, new);

        // Then
        assert!(is_strictly_increasing(&list));
    }

    #[test]
    fn fix_nested_numbers_children_recursively() {
        let mut records = vec![BlockRecord::new("list").with_children(vec![
            BlockRecord::new("item").with_children(vec![
                BlockRecord::new("text"),
                BlockRecord::new("text"),
            ]),
            BlockRecord::new("item"),
        ])];
        records[0].sequence = 42.0;

        fix_nested(&mut records);

        assert_eq!(records[0].sequence, 42.0);
        assert_eq!(records[0].children[1].sequence, 1.0);
        assert_eq!(records[0].children[0].children[1].sequence, 1.0);
    }

    #[test]
    fn renormalized_is_dense_from_one() {
        assert_eq!(renormalized(3).collect::<Vec<_>>(), vec![1.0, 2.0, 3.0]);
    }
}
