//! Genome compiler and feed-forward evaluation.
//!
//! A genome is compiled once per individual into a `NeuralNet`:
//!
//! 1. Raw indices are reduced modulo the neuron, sensor and action counts.
//!    Distinct raw indices may alias to the same node.
//! 2. Neurons that feed nothing but themselves are culled together with
//!    every connection into them, repeatedly until nothing changes.
//! 3. Surviving neurons are renumbered densely and connections are reordered
//!    so that all neuron sinks precede all action sinks.
//!
//! `feed_forward` relies on that ordering: neuron outputs are latched once,
//! at the first action-sink connection.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::evolution::{Gene, Genome, SinkKind, SourceKind};
use crate::schema::Action;

/// Output of a neuron before its first latch.
pub const INITIAL_NEURON_OUTPUT: f32 = 0.5;

/// Catalogue sizes a genome is compiled against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkShape {
    pub max_neurons: u16,
    pub sensor_count: usize,
    pub action_count: usize,
}

/// Internal neuron state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neuron {
    /// Latched output in `[-1, 1]`.
    pub output: f32,
    /// False for neurons with no input other than themselves. Their output
    /// stays at the initial value.
    pub driven: bool,
}

/// Compiled network of an individual.
#[derive(Debug, Clone, Default)]
pub struct NeuralNet {
    connections: Arc<[Gene]>,
    neurons: Vec<Neuron>,
}

#[derive(Debug, Default, Clone, Copy)]
struct Node {
    outputs: usize,
    self_inputs: usize,
    other_inputs: usize,
}

impl NeuralNet {
    /// Compile a genome. An empty result is valid and drives no action.
    pub fn compile(genome: &Genome, shape: NetworkShape) -> Self {
        assert!(
            shape.max_neurons > 0 && shape.sensor_count > 0 && shape.action_count > 0,
            "network shape {:?} has an empty catalogue",
            shape
        );

        let mut connections = renumber(genome.genes(), shape);
        let mut nodes = node_table(&connections);
        cull_useless_neurons(&mut connections, &mut nodes);

        // Keys in ascending order map to 0..len
        let dense: BTreeMap<u16, u16> = nodes
            .keys()
            .enumerate()
            .map(|(i, &key)| (key, i as u16))
            .collect();
        let remap = |index: u16| -> u16 {
            match dense.get(&index) {
                Some(&i) => i,
                None => panic!("neuron {} missing from node table", index),
            }
        };

        let mut ordered = Vec::with_capacity(connections.len());
        for sink in [SinkKind::Neuron, SinkKind::Action] {
            for gene in connections.iter().filter(|g| g.sink == sink) {
                let mut gene = *gene;
                if gene.source == SourceKind::Neuron {
                    gene.source_index = remap(gene.source_index);
                }
                if gene.sink == SinkKind::Neuron {
                    gene.sink_index = remap(gene.sink_index);
                }
                ordered.push(gene);
            }
        }

        let neurons = nodes
            .values()
            .map(|node| Neuron {
                output: INITIAL_NEURON_OUTPUT,
                driven: node.other_inputs > 0,
            })
            .collect();

        Self {
            connections: ordered.into(),
            neurons,
        }
    }

    #[inline]
    pub fn connections(&self) -> &[Gene] {
        &self.connections
    }

    #[inline]
    pub fn neurons(&self) -> &[Neuron] {
        &self.neurons
    }

    /// True when every connection was culled.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Which catalogue actions have at least one incoming connection.
    pub fn driven_actions(&self, action_count: usize) -> Vec<bool> {
        let mut driven = vec![false; action_count];
        for gene in self.connections.iter().filter(|g| g.sink == SinkKind::Action) {
            if let Some(slot) = driven.get_mut(gene.sink_index as usize) {
                *slot = true;
            }
        }
        driven
    }

    /// Evaluate the network and pair every connected action with its level.
    /// Actions without an incoming connection express no intention and are
    /// left out, so an unconnected setter keeps its previous value instead
    /// of being reset to its zero-level value (see DESIGN.md, "Unconnected
    /// actions").
    pub fn action_levels<F>(&mut self, actions: &[Action], sense: F) -> Vec<(Action, f32)>
    where
        F: FnMut(usize) -> f32,
    {
        let driven = self.driven_actions(actions.len());
        let levels = self.feed_forward(actions.len(), sense);
        actions
            .iter()
            .zip(levels)
            .zip(driven)
            .filter(|(_, driven)| *driven)
            .map(|((&action, level), _)| (action, level))
            .collect()
    }

    /// Evaluate the network once and return the summed level of every
    /// action, indexed by catalogue position.
    ///
    /// `sense` is called with a sensor index each time a sensor connection
    /// is visited.
    pub fn feed_forward<F>(&mut self, action_count: usize, mut sense: F) -> Vec<f32>
    where
        F: FnMut(usize) -> f32,
    {
        let mut accumulators = vec![0.0f32; self.neurons.len()];
        let mut levels = vec![0.0f32; action_count];
        let mut latched = false;

        for gene in self.connections.iter() {
            if gene.sink == SinkKind::Action && !latched {
                for (neuron, &acc) in self.neurons.iter_mut().zip(&accumulators) {
                    if neuron.driven {
                        neuron.output = acc.tanh();
                    }
                }
                latched = true;
            }

            let input = match gene.source {
                SourceKind::Sensor => sense(gene.source_index as usize),
                SourceKind::Neuron => self.neurons[gene.source_index as usize].output,
            };
            let value = input * gene.weight_f32();

            match gene.sink {
                SinkKind::Neuron => accumulators[gene.sink_index as usize] += value,
                SinkKind::Action => levels[gene.sink_index as usize] += value,
            }
        }

        levels
    }
}

/// Reduce every raw index into the range of its kind.
fn renumber(genes: &[Gene], shape: NetworkShape) -> Vec<Gene> {
    genes
        .iter()
        .map(|gene| {
            let mut gene = *gene;
            gene.source_index = match gene.source {
                SourceKind::Neuron => gene.source_index % shape.max_neurons,
                SourceKind::Sensor => (gene.source_index as usize % shape.sensor_count) as u16,
            };
            gene.sink_index = match gene.sink {
                SinkKind::Neuron => gene.sink_index % shape.max_neurons,
                SinkKind::Action => (gene.sink_index as usize % shape.action_count) as u16,
            };
            gene
        })
        .collect()
}

fn node_table(connections: &[Gene]) -> BTreeMap<u16, Node> {
    let mut nodes: BTreeMap<u16, Node> = BTreeMap::new();
    for gene in connections {
        if gene.sink == SinkKind::Neuron {
            let node = nodes.entry(gene.sink_index).or_default();
            if gene.source == SourceKind::Neuron && gene.source_index == gene.sink_index {
                node.self_inputs += 1;
            } else {
                node.other_inputs += 1;
            }
        }
        if gene.source == SourceKind::Neuron {
            nodes.entry(gene.source_index).or_default().outputs += 1;
        }
    }
    nodes
}

/// Remove neurons whose only outputs loop back into themselves, until a
/// fixpoint is reached.
fn cull_useless_neurons(connections: &mut Vec<Gene>, nodes: &mut BTreeMap<u16, Node>) {
    loop {
        let useless: Vec<u16> = nodes
            .iter()
            .filter(|(_, node)| node.outputs == node.self_inputs)
            .map(|(&key, _)| key)
            .collect();
        if useless.is_empty() {
            break;
        }

        for key in useless {
            connections.retain(|gene| {
                let feeds = gene.sink == SinkKind::Neuron && gene.sink_index == key;
                if feeds
                    && gene.source == SourceKind::Neuron
                    && gene.source_index != key
                    && let Some(source) = nodes.get_mut(&gene.source_index)
                {
                    source.outputs -= 1;
                }
                !feeds
            });
            nodes.remove(&key);
        }
    }
}
