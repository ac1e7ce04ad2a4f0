// projeto: lstmpredict
// file: src/neural/model.rs
// Rebuilds the fitted network from its serialized weights; forward pass only

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::PredictError;
use crate::neural::metrics::TrainingMetrics;

#[derive(Debug, Serialize, Deserialize)]
pub struct LSTMLayerWeights {
    pub w_input: Array2<f32>,
    pub u_input: Array2<f32>,
    pub b_input: Array1<f32>,
    pub w_forget: Array2<f32>,
    pub u_forget: Array2<f32>,
    pub b_forget: Array1<f32>,
    pub w_output: Array2<f32>,
    pub u_output: Array2<f32>,
    pub b_output: Array1<f32>,
    pub w_cell: Array2<f32>,
    pub u_cell: Array2<f32>,
    pub b_cell: Array1<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModelWeights {
    pub experiment_id: u64,
    pub layers: Vec<LSTMLayerWeights>,
    pub w_final: Array1<f32>,
    pub b_final: f32,
    pub series_min: f32,
    pub series_max: f32,
    pub time_steps: usize,
    pub hidden_size: usize,
    pub num_layers: usize,
    pub timestamp: String,
    pub metrics: TrainingMetrics,
}

struct LSTMCell {
    hidden_size: usize,
    weights: LSTMLayerWeights,
}

impl LSTMCell {
    fn forward(
        &self,
        input: &Array1<f32>,
        h_prev: &Array1<f32>,
        c_prev: &Array1<f32>,
    ) -> (Array1<f32>, Array1<f32>) {
        let w = &self.weights;
        let i_t = (w.w_input.dot(input) + w.u_input.dot(h_prev) + &w.b_input).mapv(sigmoid);
        let f_t = (w.w_forget.dot(input) + w.u_forget.dot(h_prev) + &w.b_forget).mapv(sigmoid);
        let o_t = (w.w_output.dot(input) + w.u_output.dot(h_prev) + &w.b_output).mapv(sigmoid);
        let g_t = (w.w_cell.dot(input) + w.u_cell.dot(h_prev) + &w.b_cell).mapv(tanh);

        let c_t = &f_t * c_prev + &i_t * &g_t;
        let h_t = &o_t * &c_t.mapv(tanh);

        (h_t, c_t)
    }
}

fn sigmoid(x: f32) -> f32 {
    if x > 500.0 {
        1.0
    } else if x < -500.0 {
        0.0
    } else {
        1.0 / (1.0 + (-x).exp())
    }
}

fn tanh(x: f32) -> f32 {
    if x > 20.0 {
        1.0
    } else if x < -20.0 {
        -1.0
    } else {
        x.tanh()
    }
}

pub struct MultiLayerLSTM {
    layers: Vec<LSTMCell>,
    w_final: Array1<f32>,
    b_final: f32,
}

impl MultiLayerLSTM {
    pub fn from_weights(weights: ModelWeights) -> Result<Self, PredictError> {
        if weights.layers.is_empty() {
            return Err(PredictError::Model("Model artifact has no layers".to_string()));
        }
        let mut layers = Vec::with_capacity(weights.layers.len());
        for layer in weights.layers {
            let hidden_size = layer.w_input.shape()[0];
            if hidden_size == 0 {
                return Err(PredictError::Model("Layer with zero hidden size".to_string()));
            }
            layers.push(LSTMCell {
                hidden_size,
                weights: layer,
            });
        }
        Ok(Self {
            layers,
            w_final: weights.w_final,
            b_final: weights.b_final,
        })
    }

    pub fn forward(&self, window: &[f32], _training: bool) -> f32 {
        let hidden_size = self.layers[0].hidden_size;
        let num_layers = self.layers.len();
        let mut h_states = vec![Array1::zeros(hidden_size); num_layers];
        let mut c_states = vec![Array1::zeros(hidden_size); num_layers];

        for &value in window {
            let input = Array1::from_vec(vec![value]);
            for j in 0..num_layers {
                let (h_new, c_new) = if j == 0 {
                    self.layers[j].forward(&input, &h_states[j], &c_states[j])
                } else {
                    let below = h_states[j - 1].clone();
                    self.layers[j].forward(&below, &h_states[j], &c_states[j])
                };
                h_states[j] = h_new;
                c_states[j] = c_new;
            }
        }

        self.w_final.dot(&h_states[num_layers - 1]) + self.b_final
    }

    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }
}
