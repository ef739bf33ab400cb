//! Interaction record
//!
//! Collects "touch" events (a particle entering a jaw, a particle being
//! absorbed, ...) from many particles processed concurrently. Every logging
//! call reserves its own slot from [`RecordIndex`] with a single atomic
//! increment, so writers never contend on a shared cursor.
//!
//! ```rust
//! use collkit_core::{InteractionSink, InteractionTable, InteractionType, Particle, ParticleSnapshot};
//!
//! let table = InteractionTable::new(16);
//! let particle = Particle::new(3).with_x(1.0e-3, 0.0);
//! table.log(InteractionType::EnterJawLeft, ParticleSnapshot::capture(&particle));
//! assert_eq!(table.len(), 1);
//! ```

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::Result;
use crate::particle::LocalParticle;

/// Kind of interaction being recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionType {
    /// Particle reached the face of the left jaw
    EnterJawLeft,
    /// Particle reached the face of the right jaw
    EnterJawRight,
    /// Particle was absorbed by a jaw
    Absorbed,
}

impl std::fmt::Display for InteractionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InteractionType::EnterJawLeft => write!(f, "Enter Jaw L"),
            InteractionType::EnterJawRight => write!(f, "Enter Jaw R"),
            InteractionType::Absorbed => write!(f, "Absorbed"),
        }
    }
}

/// Copy of the particle coordinates at the moment of an interaction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParticleSnapshot {
    /// Particle identifier
    pub particle_id: i64,
    /// Horizontal position in the frame active when logging
    pub x: f64,
    /// Horizontal momentum
    pub px: f64,
    /// Vertical position
    pub y: f64,
    /// Vertical momentum
    pub py: f64,
    /// Longitudinal position
    pub s: f64,
    /// Relative momentum deviation
    pub delta: f64,
    /// Survival state
    pub state: i64,
}

impl ParticleSnapshot {
    /// Capture the coordinates of any particle representation
    pub fn capture<P: LocalParticle + ?Sized>(part: &P) -> Self {
        Self {
            particle_id: part.particle_id(),
            x: part.x(),
            px: part.px(),
            y: part.y(),
            py: part.py(),
            s: part.s(),
            delta: part.delta(),
            state: part.state(),
        }
    }
}

/// One stored interaction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    /// Slot the record was written into
    pub slot: usize,
    /// What happened
    pub interaction: InteractionType,
    /// Particle coordinates at that moment
    pub particle: ParticleSnapshot,
}

/// Destination for interaction events
///
/// Implementations must be safe to call from many threads at once.
pub trait InteractionSink: Send + Sync {
    /// Append an event for a particle.
    fn log(&self, interaction: InteractionType, particle: ParticleSnapshot);
}

/// Fixed-capacity slot allocator
#[derive(Debug)]
pub struct RecordIndex {
    next: AtomicUsize,
    capacity: usize,
    dropped: AtomicUsize,
}

impl RecordIndex {
    /// Create an allocator handing out slots `0..capacity`
    pub fn new(capacity: usize) -> Self {
        Self {
            next: AtomicUsize::new(0),
            capacity,
            dropped: AtomicUsize::new(0),
        }
    }

    /// Reserve the next free slot, or `None` when the table is full
    pub fn reserve(&self) -> Option<usize> {
        let slot = self.next.fetch_add(1, Ordering::Relaxed);
        if slot < self.capacity {
            return Some(slot);
        }
        if self.dropped.fetch_add(1, Ordering::Relaxed) == 0 {
            tracing::warn!(
                "Interaction record full ({} slots); further events are dropped",
                self.capacity
            );
        }
        None
    }

    /// Number of slots handed out
    pub fn reserved(&self) -> usize {
        self.next.load(Ordering::Relaxed).min(self.capacity)
    }

    /// Number of reservations refused because the table was full
    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Total number of slots
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Forget all reservations
    pub fn reset(&mut self) {
        *self.next.get_mut() = 0;
        *self.dropped.get_mut() = 0;
    }
}

/// In-memory interaction table
#[derive(Debug)]
pub struct InteractionTable {
    index: RecordIndex,
    slots: Box<[Mutex<Option<InteractionRecord>>]>,
}

impl InteractionTable {
    /// Create a table with room for `capacity` records
    pub fn new(capacity: usize) -> Self {
        let slots = (0..capacity).map(|_| Mutex::new(None)).collect();
        Self {
            index: RecordIndex::new(capacity),
            slots,
        }
    }

    /// Slot allocator of this table
    pub fn index(&self) -> &RecordIndex {
        &self.index
    }

    /// Number of records written
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.lock().is_some()).count()
    }

    /// Whether no record was written
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of events that did not fit
    pub fn dropped(&self) -> usize {
        self.index.dropped()
    }

    /// All written records in slot order
    pub fn records(&self) -> Vec<InteractionRecord> {
        self.slots.iter().filter_map(|slot| *slot.lock()).collect()
    }

    /// Records of one interaction type, in slot order
    pub fn records_of(&self, interaction: InteractionType) -> Vec<InteractionRecord> {
        self.records()
            .into_iter()
            .filter(|r| r.interaction == interaction)
            .collect()
    }

    /// Empty the table
    pub fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot.get_mut() = None;
        }
        self.index.reset();
    }

    /// Write all records as a JSON array
    pub fn write_json<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, &self.records())?;
        Ok(())
    }
}

impl InteractionSink for InteractionTable {
    fn log(&self, interaction: InteractionType, particle: ParticleSnapshot) {
        if let Some(slot) = self.index.reserve() {
            *self.slots[slot].lock() = Some(InteractionRecord {
                slot,
                interaction,
                particle,
            });
        }
    }
}
