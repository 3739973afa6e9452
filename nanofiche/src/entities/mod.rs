mod bin;
mod envelope;
mod instance;
mod item;
mod reserve;
mod result;
mod tile;

#[doc(inline)]
pub use bin::Bin;
#[doc(inline)]
pub use envelope::{Envelope, EnvelopeConfig, EnvelopeOutline, EnvelopeShape, Sizing};
#[doc(inline)]
pub use instance::Instance;
#[doc(inline)]
pub use item::Item;
#[doc(inline)]
pub use reserve::{Corner, RESERVE_RECT_ASPECT, ReserveAnchor, ReserveShape, ReserveSize, ReserveZone};
#[doc(inline)]
pub use result::{GridLines, PackingResult};
#[doc(inline)]
pub use tile::Tile;
