use itertools::Itertools;
use rand::RngCore;
use rand_distr::{Distribution, Normal, NormalError, Uniform};

use crate::arena::error::PolicyError;
use crate::arena::evaluator::{Candidate, DecisionPolicy, Observation};

#[derive(Clone, Debug, PartialEq)]
pub struct Gene {
    pub in_node_id: usize,
    pub out_node_id: usize,
    pub weight: f64,
}

impl Gene {
    pub fn create(in_node_id: usize, out_node_id: usize, weight: f64) -> Gene {
        Gene { in_node_id, out_node_id, weight }
    }
}

/// A fully connected sensor -> output network. The last sensor node is a
/// bias that always reads 1.
#[derive(Clone, Debug)]
pub struct Organism {
    pub genes: Vec<Gene>,
    pub n_sensor_nodes: usize,
    pub n_output_nodes: usize,
    pub fitness: f64,
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-4.9 * x).exp())
}

impl Organism {
    pub fn create_from_genes(genes: Vec<Gene>, n_sensor_nodes: usize, n_output_nodes: usize) -> Organism {
        debug_assert!(
            genes.iter().all(|g| g.in_node_id < n_sensor_nodes && g.out_node_id >= n_sensor_nodes),
            "Genes must connect a sensor node to an output node"
        );
        Organism { genes, n_sensor_nodes, n_output_nodes, fitness: 0. }
    }

    pub fn init<R: RngCore>(rng: &mut R, n_sensor_nodes: usize, n_output_nodes: usize) -> Organism {
        let between = Uniform::from(-1.0..1.0);
        let genes = (0..n_output_nodes)
            .cartesian_product(0..n_sensor_nodes)
            .map(|(out_node_ind, in_node_id)| Gene::create(in_node_id, out_node_ind + n_sensor_nodes, between.sample(rng)))
            .collect();
        Organism::create_from_genes(genes, n_sensor_nodes, n_output_nodes)
    }

    /// `sensor_values` excludes the bias node.
    pub fn activate(&self, sensor_values: &[f64]) -> Result<Vec<f64>, PolicyError> {
        if sensor_values.len() + 1 != self.n_sensor_nodes {
            return Err(PolicyError::InputSize { expected: self.n_sensor_nodes - 1, actual: sensor_values.len() });
        }
        let sensor = |id: usize| sensor_values.get(id).copied().unwrap_or(1.0);

        let mut sums = vec![0.; self.n_output_nodes];
        for gene in &self.genes {
            sums[gene.out_node_id - self.n_sensor_nodes] += gene.weight * sensor(gene.in_node_id);
        }
        Ok(sums.into_iter().map(sigmoid).collect())
    }

    /// Perturbs each weight with probability `rate` by a draw from N(0, scale).
    /// Fails without touching the genes when `scale` is negative or not finite.
    pub fn mutate_weights<R: RngCore>(&mut self, rng: &mut R, rate: f64, scale: f64) -> Result<(), NormalError> {
        let between = Uniform::from(0.0..1.0);
        if scale < 0. {
            return Err(NormalError::BadVariance);
        }
        let normal = Normal::new(0., scale)?;
        for gene in self.genes.iter_mut() {
            if between.sample(rng) < rate {
                gene.weight += normal.sample(rng);
            }
        }
        Ok(())
    }
}

impl DecisionPolicy for Organism {
    fn decide(&mut self, observation: &Observation) -> Result<Vec<f64>, PolicyError> {
        self.activate(observation)
    }
}

impl Candidate for Organism {
    fn fitness(&self) -> f64 {
        self.fitness
    }

    fn fitness_mut(&mut self) -> &mut f64 {
        &mut self.fitness
    }
}
