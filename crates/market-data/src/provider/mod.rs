//! Fund data provider abstraction and implementations.
//!
//! The `FundDataProvider` trait is the seam between the domain services and
//! any concrete upstream. The sole implementation today talks to Eastmoney's
//! public fund endpoints; alternatives slot in by implementing the trait.

mod traits;

pub mod eastmoney;

pub use eastmoney::{EastmoneyProvider, ProviderConfig};
pub use traits::FundDataProvider;
