//! Standard device catalog: one descriptor per concrete layer implementation,
//! plus typed composition helpers over them.

use crate::error::ConfigError;
use crate::graph::{ConfigRun, Params, Typed};
use crate::spec::{
    ARP, Arp, DUAL_STACK_IP, Descriptor, DualStackIp, ETHERNET, Ethernet, HAPPY_EYEBALLS,
    HappyEyeballs, IPV4, IPV6, Ipv4, Ipv6, NETWORK, Network, Package,
};
use std::collections::BTreeMap;

fn tcpip(sublib: &str) -> Package {
    Package::new("tcpip").min("8.0").max("9.0").sublib(sublib)
}

/// The standard descriptors, addressable by field for typed composition.
#[derive(Debug, Clone)]
pub struct Devices {
    pub tap: Descriptor,
    pub ethernet: Descriptor,
    pub arp: Descriptor,
    pub ipv4_static: Descriptor,
    pub ipv4_dhcp: Descriptor,
    pub ipv6: Descriptor,
    pub dual_stack: Descriptor,
    pub happy_eyeballs: Descriptor,
}

impl Devices {
    pub fn standard() -> Result<Self, ConfigError> {
        Ok(Self {
            tap: Descriptor::builder("tap", NETWORK)
                .prefix("net")
                .module("netif::Tap")
                .package(Package::new("netif-tap").min("0.9").max("1.0"))
                .optional("device")
                .build()?,
            ethernet: Descriptor::builder("ethernet", ETHERNET)
                .module("ethernet::Ethernet")
                .input(NETWORK)
                .package(Package::new("ethernet").min("3.0").max("4.0"))
                .build()?,
            arp: Descriptor::builder("arp", ARP)
                .module("arp::Arp")
                .input(ETHERNET)
                .package(Package::new("arp").min("3.0").max("4.0"))
                .build()?,
            ipv4_static: Descriptor::builder("ipv4_static", IPV4)
                .prefix("ipv4")
                .module("tcpip::ipv4::Static")
                .inputs([ETHERNET, ARP])
                .package(tcpip("ipv4"))
                .optional("network")
                .optional("gateway")
                .build()?,
            ipv4_dhcp: Descriptor::builder("ipv4_dhcp", IPV4)
                .prefix("ipv4")
                .module("dhcp_client::Ipv4")
                .inputs([NETWORK, ETHERNET, ARP])
                .package(tcpip("ipv4"))
                .package(Package::new("dhcp-client").min("1.5").max("2.0"))
                .optional("requests")
                .build()?,
            ipv6: Descriptor::builder("ipv6", IPV6)
                .module("tcpip::ipv6::Stack")
                .inputs([NETWORK, ETHERNET])
                .package(tcpip("ipv6"))
                .optional("address")
                .optional("gateway")
                .optional("handle_ra")
                .build()?,
            dual_stack: Descriptor::builder("dual_stack", DUAL_STACK_IP)
                .prefix("ip")
                .module("tcpip::ip::DualStack")
                .inputs([IPV4, IPV6])
                .package(tcpip("ip"))
                .optional("ipv4_only")
                .optional("ipv6_only")
                .build()?,
            happy_eyeballs: Descriptor::builder("happy_eyeballs", HAPPY_EYEBALLS)
                .prefix("he")
                .module("happy_eyeballs::Connector")
                .input(DUAL_STACK_IP)
                .package(Package::new("happy-eyeballs").min("1.1").max("2.0"))
                .optional("aaaa_timeout")
                .optional("connect_delay")
                .optional("connect_timeout")
                .optional("resolve_timeout")
                .optional("resolve_retries")
                .optional("timer_interval")
                .build()?,
        })
    }

    pub fn all(&self) -> [&Descriptor; 8] {
        [
            &self.tap,
            &self.ethernet,
            &self.arp,
            &self.ipv4_static,
            &self.ipv4_dhcp,
            &self.ipv6,
            &self.dual_stack,
            &self.happy_eyeballs,
        ]
    }

    pub fn tap(&self, run: &mut ConfigRun, params: Params) -> Result<Typed<Network>, ConfigError> {
        run.apply_typed(&self.tap, vec![], params)
    }

    pub fn ethernet(
        &self,
        run: &mut ConfigRun,
        net: &Typed<Network>,
    ) -> Result<Typed<Ethernet>, ConfigError> {
        run.apply_typed(&self.ethernet, vec![net.node().clone()], Params::new())
    }

    pub fn arp(
        &self,
        run: &mut ConfigRun,
        eth: &Typed<Ethernet>,
    ) -> Result<Typed<Arp>, ConfigError> {
        run.apply_typed(&self.arp, vec![eth.node().clone()], Params::new())
    }

    pub fn ipv4_static(
        &self,
        run: &mut ConfigRun,
        eth: &Typed<Ethernet>,
        arp: &Typed<Arp>,
        params: Params,
    ) -> Result<Typed<Ipv4>, ConfigError> {
        run.apply_typed(
            &self.ipv4_static,
            vec![eth.node().clone(), arp.node().clone()],
            params,
        )
    }

    pub fn ipv4_dhcp(
        &self,
        run: &mut ConfigRun,
        net: &Typed<Network>,
        eth: &Typed<Ethernet>,
        arp: &Typed<Arp>,
        params: Params,
    ) -> Result<Typed<Ipv4>, ConfigError> {
        run.apply_typed(
            &self.ipv4_dhcp,
            vec![net.node().clone(), eth.node().clone(), arp.node().clone()],
            params,
        )
    }

    pub fn ipv6(
        &self,
        run: &mut ConfigRun,
        net: &Typed<Network>,
        eth: &Typed<Ethernet>,
        params: Params,
    ) -> Result<Typed<Ipv6>, ConfigError> {
        run.apply_typed(
            &self.ipv6,
            vec![net.node().clone(), eth.node().clone()],
            params,
        )
    }

    pub fn dual_stack(
        &self,
        run: &mut ConfigRun,
        v4: &Typed<Ipv4>,
        v6: &Typed<Ipv6>,
        params: Params,
    ) -> Result<Typed<DualStackIp>, ConfigError> {
        run.apply_typed(
            &self.dual_stack,
            vec![v4.node().clone(), v6.node().clone()],
            params,
        )
    }

    pub fn happy_eyeballs(
        &self,
        run: &mut ConfigRun,
        ip: &Typed<DualStackIp>,
        params: Params,
    ) -> Result<Typed<HappyEyeballs>, ConfigError> {
        run.apply_typed(&self.happy_eyeballs, vec![ip.node().clone()], params)
    }
}

/// Name-keyed descriptor registry.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    devices: BTreeMap<String, Descriptor>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn standard() -> Result<Self, ConfigError> {
        let mut catalog = Self::new();
        for descriptor in Devices::standard()?.all() {
            catalog.register(descriptor.clone())?;
        }
        Ok(catalog)
    }

    pub fn register(&mut self, descriptor: Descriptor) -> Result<(), ConfigError> {
        if self.devices.contains_key(descriptor.name()) {
            return Err(ConfigError::MalformedDescriptor {
                descriptor: descriptor.name().to_string(),
                reason: "a device with this name is already registered".to_string(),
            });
        }
        self.devices.insert(descriptor.name().to_string(), descriptor);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Descriptor> {
        self.devices.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Descriptor> {
        self.devices.values()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}
