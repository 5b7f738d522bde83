pub mod case;
pub mod generator;
pub mod sampler;
