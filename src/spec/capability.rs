//! Capability tags: what a node produces.
//!
//! Two layers share the same names:
//! - `Capability` is the runtime value checked by the application operator
//!   (JSON compositions only have this one).
//! - `Tag` types are zero-sized markers so Rust composition code gets the same
//!   check from the compiler through `graph::Typed<T>`.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Capability(Cow<'static, str>);

impl Capability {
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Type-level capability marker.
pub trait Tag {
    const CAPABILITY: Capability;
}

macro_rules! capabilities {
    ($($(#[$doc:meta])* $ty:ident => $konst:ident = $name:literal;)*) => {
        $(
            pub const $konst: Capability = Capability::from_static($name);

            $(#[$doc])*
            #[derive(Debug)]
            pub enum $ty {}

            impl Tag for $ty {
                const CAPABILITY: Capability = $konst;
            }
        )*
    };
}

capabilities! {
    /// A raw network interface.
    Network => NETWORK = "network";
    /// Link-layer framing.
    Ethernet => ETHERNET = "ethernet";
    /// IPv4 address resolution.
    Arp => ARP = "arp";
    Ipv4 => IPV4 = "ipv4";
    Ipv6 => IPV6 = "ipv6";
    /// An IP layer able to carry both families.
    DualStackIp => DUAL_STACK_IP = "dual-stack-ip";
    /// Connection establishment racing both families.
    HappyEyeballs => HAPPY_EYEBALLS = "happy-eyeballs";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_by_name() {
        assert_eq!(Capability::new("ipv4"), IPV4);
        assert_ne!(IPV4, IPV6);
        assert_eq!(<Ethernet as Tag>::CAPABILITY, ETHERNET);
    }

    #[test]
    fn deserializes_from_plain_string() {
        let cap: Capability = serde_json::from_str("\"dual-stack-ip\"").unwrap();
        assert_eq!(cap, DUAL_STACK_IP);
        assert_eq!(cap.to_string(), "dual-stack-ip");
    }
}
