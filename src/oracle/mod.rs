pub mod deepseek;

pub use deepseek::DeepSeekOracle;
