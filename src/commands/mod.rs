pub mod generate;
pub mod upscale;

pub use generate::run_generate;
pub use upscale::run_upscale;
