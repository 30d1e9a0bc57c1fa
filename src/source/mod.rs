//! Data sources feeding the publisher
//!
//! The lifecycle controller is agnostic about where the mapping comes
//! from; anything that can produce an ordered record sequence plugs in
//! through [`DataSource`].

pub mod assets;

pub use assets::AssetSource;

use crate::codec::AssetRecords;
use crate::error::Result;

/// Producer of the key/value records that end up in the segment
///
/// `load` is called once at startup and once per reload, always from the
/// controller's own thread. Record order is preserved on the wire; later
/// duplicates win when a reader decodes the mapping.
pub trait DataSource {
    fn load(&mut self) -> Result<AssetRecords>;
}
