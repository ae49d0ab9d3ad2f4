//! Genome similarity metrics.

use crate::schema::SimilarityMetric;

use super::genome::{GENE_BYTES, Gene, Genome};

/// Genes compared by the Jaro-Winkler metric.
const JARO_WINKLER_GENES: usize = 20;

/// Most adjacent pairs sampled by `genetic_diversity`.
const DIVERSITY_SAMPLES: usize = 1000;

/// Similarity of two genomes in `[0, 1]`, 1 meaning identical.
///
/// The result is symmetric in its arguments for every metric.
pub fn genome_similarity(metric: SimilarityMetric, a: &Genome, b: &Genome) -> f32 {
    match metric {
        SimilarityMetric::HammingBits => hamming_bits(a.genes(), b.genes()),
        SimilarityMetric::HammingBytes => hamming_bytes(a.genes(), b.genes()),
        SimilarityMetric::JaroWinkler => {
            (jaro_winkler(a.genes(), b.genes()) + jaro_winkler(b.genes(), a.genes())) / 2.0
        }
    }
}

/// Matching-bit fraction. Genes beyond the shorter genome count as
/// half-mismatched.
fn hamming_bits(a: &[Gene], b: &[Gene]) -> f32 {
    const GENE_BITS: usize = GENE_BYTES * 8;

    let max_len = a.len().max(b.len());
    if max_len == 0 {
        return 1.0;
    }
    let common = a.len().min(b.len());
    let differing: usize = a
        .iter()
        .zip(b)
        .map(|(x, y)| (x.to_bits() ^ y.to_bits()).count_ones() as usize)
        .sum::<usize>()
        + (max_len - common) * GENE_BITS / 2;

    let total = (max_len * GENE_BITS) as f32;
    // Random bit strings differ in about half their bits; scale so that
    // they land near zero
    1.0 - (2.0 * differing as f32 / total).min(1.0)
}

/// Fraction of equal bytes over the longer genome.
fn hamming_bytes(a: &[Gene], b: &[Gene]) -> f32 {
    let max_len = a.len().max(b.len());
    if max_len == 0 {
        return 1.0;
    }
    let equal: usize = a
        .iter()
        .zip(b)
        .map(|(x, y)| {
            x.to_bytes()
                .iter()
                .zip(y.to_bytes().iter())
                .filter(|(p, q)| p == q)
                .count()
        })
        .sum();
    equal as f32 / (max_len * GENE_BYTES) as f32
}

/// Jaro-Winkler similarity treating each gene as one symbol.
fn jaro_winkler(a: &[Gene], b: &[Gene]) -> f32 {
    let a = &a[..a.len().min(JARO_WINKLER_GENES)];
    let b = &b[..b.len().min(JARO_WINKLER_GENES)];
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let window = (a.len().max(b.len()) / 2).saturating_sub(1);
    let mut a_matched = vec![false; a.len()];
    let mut b_matched = vec![false; b.len()];
    let mut matches = 0usize;

    for (i, gene) in a.iter().enumerate() {
        let lo = i.saturating_sub(window);
        let hi = (i + window + 1).min(b.len());
        for j in lo..hi {
            if !b_matched[j] && b[j] == *gene {
                a_matched[i] = true;
                b_matched[j] = true;
                matches += 1;
                break;
            }
        }
    }
    if matches == 0 {
        return 0.0;
    }

    let mut transpositions = 0usize;
    let mut j = 0;
    for (i, gene) in a.iter().enumerate() {
        if !a_matched[i] {
            continue;
        }
        while !b_matched[j] {
            j += 1;
        }
        if *gene != b[j] {
            transpositions += 1;
        }
        j += 1;
    }

    let m = matches as f32;
    let jaro = (m / a.len() as f32 + m / b.len() as f32 + (m - (transpositions / 2) as f32) / m)
        / 3.0;

    let prefix = a.iter().zip(b).take(4).take_while(|(x, y)| x == y).count();
    jaro + prefix as f32 * 0.1 * (1.0 - jaro)
}

/// One minus the mean similarity of adjacent genome pairs, sampling at
/// most a fixed number of pairs. Returns 0 for fewer than two genomes.
pub fn genetic_diversity<'a, I>(metric: SimilarityMetric, genomes: I) -> f32
where
    I: IntoIterator<Item = &'a Genome>,
{
    let genomes: Vec<&Genome> = genomes
        .into_iter()
        .take(DIVERSITY_SAMPLES + 1)
        .collect();
    if genomes.len() < 2 {
        return 0.0;
    }
    let pairs = genomes.len() - 1;
    let total: f32 = genomes
        .windows(2)
        .map(|w| genome_similarity(metric, w[0], w[1]))
        .sum();
    1.0 - total / pairs as f32
}
