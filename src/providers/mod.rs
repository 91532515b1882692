//! Concrete embed providers.
//!
//! Each submodule owns one provider: its descriptor (pattern, endpoint,
//! settings schema) and whatever pipeline hooks it needs. [`all`] is the
//! full roster in registration order; the registry filters it down to the
//! enabled set at construction time.

mod bandcamp;
mod boxcom;
mod facebook;
mod twitch;
mod vevo;

pub use bandcamp::Bandcamp;
pub use boxcom::BoxCom;
pub use facebook::Facebook;
pub use twitch::Twitch;
pub use vevo::Vevo;

use crate::embedder::Provider;

/// Every known provider, in registration order.
pub fn all() -> Vec<Box<dyn Provider>> {
    vec![
        Box::new(Bandcamp),
        Box::new(BoxCom),
        Box::new(Twitch),
        Box::new(Vevo),
        Box::new(Facebook),
    ]
}
