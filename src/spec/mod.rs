//! Spec layer: what a device implementation declares about itself.
//!
//! It owns:
//! - capability tags (runtime values and type-level markers)
//! - versions, ranges and package declarations
//! - device descriptors and their authoring-time validation

pub mod capability;
pub mod descriptor;
pub mod version;

pub use capability::{
    ARP, Arp, Capability, DUAL_STACK_IP, DualStackIp, ETHERNET, Ethernet, HAPPY_EYEBALLS,
    HappyEyeballs, IPV4, IPV6, Ipv4, Ipv6, NETWORK, Network, Tag,
};
pub use descriptor::{Descriptor, DescriptorBuilder, EmitFn, Emission};
pub use version::{Package, Version, VersionConstraint, VersionRange};
