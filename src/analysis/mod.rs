pub mod features;
pub mod head_to_head;
pub mod logistic;
pub mod matchups;
pub mod merger;
pub mod metrics;
pub mod normalizer;
pub mod player_stats;
pub mod predictor;
pub mod scaler;
pub mod trainer;
