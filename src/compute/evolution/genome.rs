//! Genes, genomes and the random operations that create and mutate them.
//!
//! Provides random generation, crossover, and mutation operations.

use std::sync::Arc;

use rand::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::{GenomeConfig, MutationConfig, ReproductionConfig};

/// Divisor converting a gene's integer weight to a real weight.
pub const WEIGHT_SCALE: f32 = 8192.0;

/// Raw source/sink indices span 15 bits.
pub const INDEX_MASK: u16 = 0x7fff;

/// Size of a packed gene in bytes.
pub const GENE_BYTES: usize = 6;

/// Where a connection takes its input from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    Sensor,
    Neuron,
}

/// Where a connection delivers its output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SinkKind {
    Neuron,
    Action,
}

/// A single weighted connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Gene {
    pub source: SourceKind,
    pub source_index: u16,
    pub sink: SinkKind,
    pub sink_index: u16,
    pub weight: i16,
}

impl Gene {
    /// Connection weight as a real number (roughly -4.0..4.0).
    #[inline]
    pub fn weight_f32(&self) -> f32 {
        self.weight as f32 / WEIGHT_SCALE
    }

    /// Pack into the low 48 bits: source kind, source index, sink kind,
    /// sink index, weight.
    pub fn to_bits(&self) -> u64 {
        let source = matches!(self.source, SourceKind::Sensor) as u64;
        let sink = matches!(self.sink, SinkKind::Action) as u64;
        (source << 47)
            | (((self.source_index & INDEX_MASK) as u64) << 32)
            | (sink << 31)
            | (((self.sink_index & INDEX_MASK) as u64) << 16)
            | (self.weight as u16 as u64)
    }

    /// Big-endian bytes of `to_bits`.
    pub fn to_bytes(&self) -> [u8; GENE_BYTES] {
        let bytes = self.to_bits().to_be_bytes();
        let mut out = [0u8; GENE_BYTES];
        out.copy_from_slice(&bytes[8 - GENE_BYTES..]);
        out
    }
}

/// Ordered, non-empty list of genes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Gene>", into = "Vec<Gene>")]
pub struct Genome {
    genes: Vec<Gene>,
}

/// Error returned when deserializing a genome without genes.
#[derive(Debug, thiserror::Error)]
#[error("genome must contain at least one gene")]
pub struct EmptyGenomeError;

impl TryFrom<Vec<Gene>> for Genome {
    type Error = EmptyGenomeError;

    fn try_from(genes: Vec<Gene>) -> Result<Self, Self::Error> {
        if genes.is_empty() {
            Err(EmptyGenomeError)
        } else {
            Ok(Self { genes })
        }
    }
}

impl From<Genome> for Vec<Gene> {
    fn from(genome: Genome) -> Self {
        genome.genes
    }
}

impl Genome {
    /// Create a genome. Panics if `genes` is empty.
    pub fn new(genes: Vec<Gene>) -> Self {
        assert!(!genes.is_empty(), "genome must contain at least one gene");
        Self { genes }
    }

    #[inline]
    pub fn genes(&self) -> &[Gene] {
        &self.genes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.genes.len()
    }

    /// Always false; kept for API symmetry with `len`.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Presentation color derived from a handful of genome bits, so that
    /// related genomes tend to share a color.
    pub fn color(&self) -> [u8; 3] {
        const MAX_COLOR: u8 = 0xb0;
        const MAX_LUMA: u32 = 0xb0;

        let front = self.genes[0];
        let back = self.genes[self.genes.len() - 1];
        let bit = |b: bool, shift: u8| (b as u8) << shift;

        let c = bit(self.genes.len() & 1 == 1, 0)
            | bit(front.source == SourceKind::Sensor, 1)
            | bit(back.source == SourceKind::Sensor, 2)
            | bit(front.sink == SinkKind::Action, 3)
            | bit(back.sink == SinkKind::Action, 4)
            | bit(front.source_index & 1 == 1, 5)
            | bit(front.sink_index & 1 == 1, 6)
            | bit(back.source_index & 1 == 1, 7);

        let mut rgb = [c, (c & 0x1f) << 3, (c & 0x07) << 5];

        // Keep agents visible against a light background
        let luma = (3 * rgb[0] as u32 + 4 * rgb[1] as u32 + rgb[2] as u32) / 8;
        if luma > MAX_LUMA {
            for v in &mut rgb {
                if *v > MAX_COLOR {
                    *v %= MAX_COLOR;
                }
            }
        }
        rgb
    }
}

/// Random number generator wrapper for genome operations.
#[derive(Debug, Clone)]
pub struct GenomeRng {
    rng: StdRng,
}

impl GenomeRng {
    /// Create from seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Underlying generator, for placement and barrier layout.
    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Uniformly random gene.
    pub fn random_gene(&mut self) -> Gene {
        Gene {
            source: if self.rng.gen_bool(0.5) {
                SourceKind::Sensor
            } else {
                SourceKind::Neuron
            },
            source_index: self.rng.gen_range(0..=INDEX_MASK),
            sink: if self.rng.gen_bool(0.5) {
                SinkKind::Action
            } else {
                SinkKind::Neuron
            },
            sink_index: self.rng.gen_range(0..=INDEX_MASK),
            weight: self.rng.r#gen(),
        }
    }

    /// Random genome with a length inside the initial bounds.
    pub fn random_genome(&mut self, config: &GenomeConfig) -> Genome {
        let len = self
            .rng
            .gen_range(config.initial_length_min..=config.initial_length_max)
            .max(1);
        Genome::new((0..len).map(|_| self.random_gene()).collect())
    }

    /// Build a child genome from a list of parent genomes ordered best
    /// first.
    pub fn child_genome(
        &mut self,
        parents: &[Arc<Genome>],
        reproduction: &ReproductionConfig,
        mutation: &MutationConfig,
        max_length: usize,
    ) -> Genome {
        assert!(!parents.is_empty(), "child genome needs at least one parent");

        let (idx1, idx2) = if reproduction.choose_parents_by_fitness && parents.len() > 1 {
            // Lower indices score higher, and idx2 always beats idx1
            let idx1 = self.rng.gen_range(1..parents.len());
            (idx1, self.rng.gen_range(0..idx1))
        } else {
            (
                self.rng.gen_range(0..parents.len()),
                self.rng.gen_range(0..parents.len()),
            )
        };
        let g1 = parents[idx1].genes();
        let g2 = parents[idx2].genes();

        let mut genes = if reproduction.sexual {
            let (longer, shorter) = if g1.len() > g2.len() {
                (g1, g2)
            } else {
                (g2, g1)
            };
            let mut genes = longer.to_vec();
            self.overlay_slice(&mut genes, shorter);

            // Crop to the mean parent length, rounding up half the time
            let mut sum = g1.len() + g2.len();
            if sum % 2 == 1 && self.rng.gen_bool(0.5) {
                sum += 1;
            }
            self.crop_length(&mut genes, sum / 2);
            genes
        } else {
            g2.to_vec()
        };

        self.insert_or_delete(&mut genes, mutation, max_length);
        self.apply_point_mutations(&mut genes, mutation.point_mutation_rate);

        debug_assert!(genes.len() <= max_length);
        Genome::new(genes)
    }

    /// Copy a random slice of `shorter` over the same positions of `genes`.
    fn overlay_slice(&mut self, genes: &mut [Gene], shorter: &[Gene]) {
        let mut start = self.rng.gen_range(0..shorter.len());
        let mut end = self.rng.gen_range(0..=shorter.len());
        if start > end {
            std::mem::swap(&mut start, &mut end);
        }
        genes[start..end].copy_from_slice(&shorter[start..end]);
    }

    /// Trim from the front or back (chosen at random) down to `length`.
    fn crop_length(&mut self, genes: &mut Vec<Gene>, length: usize) {
        if length == 0 || genes.len() <= length {
            return;
        }
        if self.rng.gen_bool(0.5) {
            genes.drain(..genes.len() - length);
        } else {
            genes.truncate(length);
        }
    }

    /// With the configured probability, delete one gene or append a new one.
    fn insert_or_delete(
        &mut self,
        genes: &mut Vec<Gene>,
        mutation: &MutationConfig,
        max_length: usize,
    ) {
        if self.rng.r#gen::<f32>() >= mutation.insertion_deletion_rate {
            return;
        }
        if self.rng.r#gen::<f32>() < mutation.deletion_ratio {
            if genes.len() > 1 {
                let idx = self.rng.gen_range(0..genes.len());
                genes.remove(idx);
            }
        } else if genes.len() < max_length {
            genes.push(self.random_gene());
        }
    }

    /// One bit-flip trial per gene.
    fn apply_point_mutations(&mut self, genes: &mut [Gene], rate: f32) {
        for _ in 0..genes.len() {
            if self.rng.r#gen::<f32>() < rate {
                self.flip_random_bit(genes);
            }
        }
    }

    /// Flip a single bit in a random gene.
    fn flip_random_bit(&mut self, genes: &mut [Gene]) {
        let idx = self.rng.gen_range(0..genes.len());
        let gene = &mut genes[idx];
        let chance: f32 = self.rng.r#gen();

        if chance < 0.2 {
            gene.source = match gene.source {
                SourceKind::Sensor => SourceKind::Neuron,
                SourceKind::Neuron => SourceKind::Sensor,
            };
        } else if chance < 0.4 {
            gene.sink = match gene.sink {
                SinkKind::Neuron => SinkKind::Action,
                SinkKind::Action => SinkKind::Neuron,
            };
        } else if chance < 0.6 {
            gene.source_index ^= 1 << self.rng.gen_range(0..15);
        } else if chance < 0.8 {
            gene.sink_index ^= 1 << self.rng.gen_range(0..15);
        } else {
            gene.weight ^= (1u16 << self.rng.gen_range(1..16)) as i16;
        }
    }
}
