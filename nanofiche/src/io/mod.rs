/// Serializable representations of instances and solutions
pub mod ext_repr;

mod export;
mod import;

/// SVG previews of packing results
pub mod svg;

#[doc(inline)]
pub use export::export;
#[doc(inline)]
pub use import::{import, natural_order_key};
