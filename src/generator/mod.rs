//! Synthetic parent/child data generator.
//!
//! Produces a lazy, finite sequence of [`GenerationUnit`]s: one parent row
//! plus its fixed-size batch of child rows. Generation is driven by a seeded
//! RNG, so every call to [`Generator::units`] replays the same sequence.

use fake::faker::company::en::CompanyName;
use fake::rand::SeedableRng as _;
use fake::Fake;
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};
use std::iter::FusedIterator;
use uuid::Uuid;

/// Upper bound (exclusive) of generated child values
pub const MAX_CHILD_VALUE: f64 = 1000.0;

/// A row destined for the parent table
#[derive(Debug, Clone, PartialEq)]
pub struct Parent {
    pub id: Uuid,
    pub name: String,
}

/// A row destined for the child table. The child's own id is assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Child {
    pub parent_id: Uuid,
    pub value: f64,
}

/// One parent together with the children that reference it
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationUnit {
    pub parent: Parent,
    pub children: Vec<Child>,
}

impl GenerationUnit {
    /// Split the unit into its parent and the owned child batch
    pub fn into_parts(self) -> (Parent, Vec<Child>) {
        (self.parent, self.children)
    }
}

/// Description of a dataset: how many parents, how many children each, and the seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generator {
    parents: usize,
    children_per_parent: usize,
    seed: u64,
}

impl Generator {
    pub fn new(parents: usize, children_per_parent: usize, seed: u64) -> Self {
        Self {
            parents,
            children_per_parent,
            seed,
        }
    }

    pub fn parents(&self) -> usize {
        self.parents
    }

    pub fn children_per_parent(&self) -> usize {
        self.children_per_parent
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Total number of child rows the dataset contains
    pub fn total_children(&self) -> usize {
        self.parents.saturating_mul(self.children_per_parent)
    }

    /// Start a fresh pass over the dataset.
    ///
    /// Each call returns an independent iterator that yields the same units in
    /// the same order.
    pub fn units(&self) -> Units {
        let mut rng = StdRng::seed_from_u64(self.seed);
        // fake builds on an older rand, so names draw from their own RNG.
        let names = NameRng::seed_from_u64(rng.random());
        Units {
            rng,
            names,
            remaining: self.parents,
            children_per_parent: self.children_per_parent,
        }
    }
}

type NameRng = fake::rand::rngs::StdRng;

/// Single-pass iterator over generation units, in parent-index order
pub struct Units {
    rng: StdRng,
    names: NameRng,
    remaining: usize,
    children_per_parent: usize,
}

impl Units {
    fn next_id(&mut self) -> Uuid {
        let hi = self.rng.random::<u64>().to_be_bytes();
        let lo = self.rng.random::<u64>().to_be_bytes();
        let mut bytes = [0u8; 16];
        bytes[..8].copy_from_slice(&hi);
        bytes[8..].copy_from_slice(&lo);
        uuid::Builder::from_random_bytes(bytes).into_uuid()
    }
}

impl Iterator for Units {
    type Item = GenerationUnit;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let id = self.next_id();
        let name: String = CompanyName().fake_with_rng(&mut self.names);
        let children = (0..self.children_per_parent)
            .map(|_| Child {
                parent_id: id,
                value: self.rng.random_range(0.0..MAX_CHILD_VALUE),
            })
            .collect();

        Some(GenerationUnit {
            parent: Parent { id, name },
            children,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Units {}

impl FusedIterator for Units {}
