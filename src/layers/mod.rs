pub mod layer;
pub mod linear;
pub mod relu;
pub mod sigmoid;

pub use layer::Layer;
pub use linear::LinearT;
pub use relu::ReLUT;
pub use sigmoid::SigmoidT;
