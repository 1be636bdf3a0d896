pub mod resolver;
pub mod rng;
pub mod seed;

pub use resolver::AuthResolver;
pub use rng::OracleRng;
pub use seed::{recover_seed, unix_now, ReferenceDraws, SeedWindow};
